use thiserror::Error;

/// Errors from schedule and user persistence operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested user does not exist.
    #[error("user not found: {username}")]
    UserNotFound { username: String },

    /// A MySQL operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
