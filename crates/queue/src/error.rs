use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is closed")]
    Closed,

    #[error("queue driver error: {0}")]
    Driver(String),

    #[error("job handler failed: {0}")]
    Handler(String),
}
