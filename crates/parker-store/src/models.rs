use chrono::{DateTime, Duration, Local};

use crate::timefmt;

/// Lifecycle state of a schedule.
///
/// The set is open: workers may write states this crate does not know, and
/// those round-trip through the store unchanged. Only `Complete` is excluded
/// from polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Waiting for its next parking attempt.
    Pending,
    /// A worker is currently driving this schedule.
    InProgress,
    /// Finished; never polled again.
    Complete,
    /// The last attempt failed.
    Failed,
    /// A state written by a worker that this crate does not recognise.
    Other(String),
}

impl Default for Progress {
    fn default() -> Self {
        Progress::Pending
    }
}

impl From<&str> for Progress {
    fn from(s: &str) -> Self {
        match s {
            "pending" => Progress::Pending,
            "in_progress" => Progress::InProgress,
            "complete" => Progress::Complete,
            "failed" => Progress::Failed,
            other => Progress::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Progress::Pending => "pending",
            Progress::InProgress => "in_progress",
            Progress::Complete => "complete",
            Progress::Failed => "failed",
            Progress::Other(other) => other.as_str(),
        };
        write!(f, "{s}")
    }
}

/// A registered account plus its parking cadence.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// How often a parking action repeats. Stored as whole minutes.
    pub cycle_length: Duration,
    pub plate: String,
}

/// One recurring parking job, keyed by `(username, start_time)`.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub username: String,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    /// Zone identifier for the parking target.
    pub area: u32,
    /// Next moment a worker should act; advances as sessions complete.
    pub next_park_time: DateTime<Local>,
    pub progress: Progress,
    /// Free-text diagnostic from the last processing attempt.
    pub message: String,
    /// Parking sessions completed so far.
    pub sessions: u32,
}

/// Row shape produced by the schedule queries. Time columns arrive as text
/// (selected with CAST) and are decoded here, per field, with the zero-time
/// fallback.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ScheduleRow {
    pub username: String,
    #[sqlx(rename = "startTime")]
    pub start_time: String,
    #[sqlx(rename = "endTime")]
    pub end_time: String,
    pub area: u32,
    #[sqlx(rename = "nextParkTime")]
    pub next_park_time: String,
    pub progress: String,
    pub message: String,
    pub sessions: u32,
}

impl From<ScheduleRow> for Schedule {
    fn from(row: ScheduleRow) -> Self {
        Self {
            username: row.username,
            start_time: timefmt::decode(&row.start_time),
            end_time: timefmt::decode(&row.end_time),
            area: row.area,
            next_park_time: timefmt::decode(&row.next_park_time),
            progress: Progress::from(row.progress.as_str()),
            message: row.message,
            sessions: row.sessions,
        }
    }
}

/// Row shape produced by the user lookup.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub username: String,
    pub name: String,
    pub email: String,
    #[sqlx(rename = "passwordHash")]
    pub password_hash: String,
    pub plate: String,
    #[sqlx(rename = "cycleLength")]
    pub cycle_length: u32,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            username: row.username,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            plate: row.plate,
            cycle_length: Duration::minutes(i64::from(row.cycle_length)),
        }
    }
}
