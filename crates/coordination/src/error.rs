use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("coordination store error: {0}")]
    Store(String),

    #[error("value at '{0}' is not a valid counter")]
    NotACounter(String),
}
