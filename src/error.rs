use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] Box<figment::Error>),

    // Programmer error: a required argument was absent or carries a value the store rejects
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Error: {0}")]
    Error(String),
}

impl ScheduleError {
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        ScheduleError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// True when the underlying failure is a SQLite constraint violation
    /// (UNIQUE, CHECK, NOT NULL or FOREIGN KEY).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            ScheduleError::DatabaseError(RusqliteError::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
