//! Typed error type for the db crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("row not found")]
    NotFound,

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("invalid stored value at '{0}': {1}")]
    Malformed(String, serde_json::Error),
}

impl From<DbError> for flowcraft_context::ContextError {
    fn from(err: DbError) -> Self {
        flowcraft_context::ContextError::Store(err.to_string())
    }
}

impl From<DbError> for flowcraft_coordination::CoordinationError {
    fn from(err: DbError) -> Self {
        flowcraft_coordination::CoordinationError::Store(err.to_string())
    }
}

impl From<DbError> for flowcraft_queue::QueueError {
    fn from(err: DbError) -> Self {
        flowcraft_queue::QueueError::Driver(err.to_string())
    }
}

impl From<DbError> for flowcraft_distributed::DistributedError {
    fn from(err: DbError) -> Self {
        flowcraft_distributed::DistributedError::Status(err.to_string())
    }
}
