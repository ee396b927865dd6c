use sqlx::mysql::MySqlConnection;

use crate::error::Result;

/// Database holding the user and schedules tables.
pub const SCHEMA_NAME: &str = "peter_parker";

const CREATE_USER_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS user (
        username     VARCHAR(50) NOT NULL,
        name         VARCHAR(50) NOT NULL,
        email        VARCHAR(50) NOT NULL,
        passwordHash VARCHAR(100) NOT NULL,
        cycleLength  INT unsigned DEFAULT 60,
        plate        VARCHAR(50) NOT NULL,
        PRIMARY KEY (username)
    )";

const CREATE_SCHEDULES_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS schedules (
        username     VARCHAR(50) NOT NULL,
        startTime    datetime NOT NULL,
        endTime      datetime NOT NULL,
        area         INT unsigned NOT NULL,
        nextParkTime datetime NOT NULL,
        progress     VARCHAR(50) NOT NULL DEFAULT 'pending',
        message      VARCHAR(500) NOT NULL DEFAULT '',
        sessions     INT unsigned DEFAULT 0,
        PRIMARY KEY (username, startTime),
        KEY schedule_user_time (username) USING BTREE,
        FOREIGN KEY (username) REFERENCES user(username)
    )";

fn create_database_sql() -> String {
    format!("CREATE DATABASE IF NOT EXISTS {SCHEMA_NAME}")
}

fn use_schema_sql() -> String {
    format!("USE {SCHEMA_NAME}")
}

/// Whether the schema has already been created.
///
/// Read from the server catalog rather than inferred from IF NOT EXISTS, so a
/// first run can be told apart from a steady-state connection.
pub(crate) async fn schema_exists(conn: &mut MySqlConnection) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM INFORMATION_SCHEMA.SCHEMATA WHERE SCHEMA_NAME = ?")
            .bind(SCHEMA_NAME)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}

/// Create the database and both tables, then select the schema.
///
/// Safe to call on every startup, `IF NOT EXISTS` throughout. DDL runs
/// unprepared over the text protocol.
pub(crate) async fn initialise(conn: &mut MySqlConnection) -> Result<()> {
    sqlx::raw_sql(&create_database_sql())
        .execute(&mut *conn)
        .await?;
    select_schema(conn).await?;
    sqlx::raw_sql(CREATE_USER_TABLE_SQL).execute(&mut *conn).await?;
    sqlx::raw_sql(CREATE_SCHEDULES_TABLE_SQL)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Make the schema current for this connection. `USE` is only valid in the
/// text protocol.
pub(crate) async fn select_schema(conn: &mut MySqlConnection) -> Result<()> {
    sqlx::raw_sql(&use_schema_sql()).execute(&mut *conn).await?;
    Ok(())
}
