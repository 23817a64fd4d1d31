pub use crate::AppState;

pub mod executions;
pub mod webhooks;
pub mod workflows;
