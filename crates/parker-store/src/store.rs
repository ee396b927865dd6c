use std::ops::{Deref, DerefMut};

use parker_core::config::ParkerConfig;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{FromRow, MySql};
use tracing::{debug, error, info, instrument};

use crate::db;
use crate::error::{Result, StoreError};
use crate::models::{Schedule, ScheduleRow, User, UserRow};
use crate::timefmt;

/// Upper bound on pooled connections held against the server.
const MAX_CONNECTIONS: u32 = 5;

const DUE_SCHEDULES_SQL: &str = "\
    SELECT username, CAST(startTime AS CHAR) AS startTime, \
           CAST(endTime AS CHAR) AS endTime, area, \
           CAST(nextParkTime AS CHAR) AS nextParkTime, \
           progress, message, sessions \
    FROM schedules \
    WHERE progress <> 'complete' AND startTime < NOW()";

const SAVE_SCHEDULE_SQL: &str = "\
    UPDATE schedules \
    SET progress = ?, nextParkTime = ?, endTime = ?, message = ?, sessions = ? \
    WHERE username = ? AND startTime = ?";

const USER_SELECT_SQL: &str = "\
    SELECT username, name, email, passwordHash, plate, cycleLength \
    FROM user \
    WHERE username = ?";

/// MySQL-backed store for parking schedules and their owners.
///
/// Stateless between calls: every operation takes its own connection from the
/// pool and hands it back when done. Concurrent pollers coordinate through
/// the row-level semantics of the UPDATE, not through in-process locks.
pub struct ScheduleStore {
    pool: MySqlPool,
}

impl ScheduleStore {
    /// Connect to the server and make sure the schema is usable.
    ///
    /// An unreachable server or a failed schema bootstrap comes back as an
    /// error; embedding processes are expected to treat that as fatal.
    pub async fn connect(config: &ParkerConfig) -> Result<Self> {
        // No database in the options: the schema may not exist yet and is
        // created on first acquire.
        let opts = MySqlConnectOptions::new()
            .host(&config.db_host)
            .port(config.db_port)
            .username(&config.db_user)
            .password(&config.mysql_root_password);

        info!(
            host = %config.db_host,
            port = config.db_port,
            username = %config.db_user,
            "connecting to MySQL"
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        // Surface a broken or uncreatable schema now instead of on the
        // first poll.
        store.acquire().await?;
        Ok(store)
    }

    /// The underlying pool, for callers that need raw access.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Take a connection with the schema verified, created if missing, and
    /// selected as current.
    async fn acquire(&self) -> Result<StoreConn> {
        let mut conn = self.pool.acquire().await?;
        if db::schema_exists(&mut conn).await? {
            db::select_schema(&mut conn).await?;
        } else {
            info!("creating database");
            db::initialise(&mut conn).await?;
        }
        Ok(StoreConn { conn })
    }

    /// Schedules past their start time and not yet complete.
    ///
    /// Always yields a batch: any failure is logged and produces an empty
    /// vec, so a polling loop skips the tick instead of dying.
    #[instrument(skip(self))]
    pub async fn fetch_due_schedules(&self) -> Vec<Schedule> {
        match self.due_schedules().await {
            Ok(schedules) => schedules,
            Err(e) => {
                error!(error = %e, "failed to retrieve schedules");
                Vec::new()
            }
        }
    }

    async fn due_schedules(&self) -> Result<Vec<Schedule>> {
        let mut conn = self.acquire().await?;
        let rows = sqlx::query(DUE_SCHEDULES_SQL)
            .fetch_all(&mut *conn)
            .await?;

        let mut schedules = Vec::with_capacity(rows.len());
        for row in &rows {
            match ScheduleRow::from_row(row) {
                Ok(raw) => schedules.push(Schedule::from(raw)),
                Err(e) => error!(error = %e, "failed to map schedule row"),
            }
        }
        debug!(count = schedules.len(), "fetched due schedules");
        Ok(schedules)
    }

    /// Persist a state transition for the row keyed by
    /// `(username, start_time)`.
    ///
    /// Overwrites progress, next park time, end time, message and session
    /// count. Returns the number of rows matched: 0 means no such schedule
    /// exists, which is not an error.
    #[instrument(skip(self, schedule), fields(username = %schedule.username))]
    pub async fn save_schedule(&self, schedule: &Schedule) -> Result<u64> {
        let mut conn = self.acquire().await?;
        let result = sqlx::query(SAVE_SCHEDULE_SQL)
            .bind(schedule.progress.to_string())
            .bind(timefmt::encode(schedule.next_park_time))
            .bind(timefmt::encode(schedule.end_time))
            .bind(&schedule.message)
            .bind(schedule.sessions)
            .bind(&schedule.username)
            .bind(timefmt::encode(schedule.start_time))
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Look up a user by name, converting the stored cycle length to a
    /// duration.
    ///
    /// A missing user is an error: callers need this record to perform the
    /// parking action, so absence must be loud.
    #[instrument(skip(self))]
    pub async fn fetch_user(&self, username: &str) -> Result<User> {
        let mut conn = self.acquire().await?;
        let row = sqlx::query_as::<_, UserRow>(USER_SELECT_SQL)
            .bind(username)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(raw) => Ok(User::from(raw)),
            None => Err(StoreError::UserNotFound {
                username: username.to_string(),
            }),
        }
    }
}

/// Scoped connection that records its return to the pool.
struct StoreConn {
    conn: PoolConnection<MySql>,
}

impl Drop for StoreConn {
    fn drop(&mut self) {
        info!("closing MySQL connection");
    }
}

impl Deref for StoreConn {
    type Target = MySqlConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for StoreConn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}
