//! Context-layer errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    /// The backing store (remote, for an async context) could not be reached
    /// or returned a malformed record.
    #[error("context store error: {0}")]
    Store(String),

    /// Serializing or deserializing a context snapshot failed.
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
