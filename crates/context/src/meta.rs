//! Execution metadata threaded through every node activation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// The parts of a [`crate::Context`] that describe *where* a node is
/// running rather than *what it holds* — run id, blueprint id, the node
/// currently active, when the run started, environment variables visible
/// to nodes, and the run's single cancellation signal.
#[derive(Debug, Clone)]
pub struct ExecutionMeta {
    pub run_id: Uuid,
    pub blueprint_id: String,
    pub node_id: String,
    pub started_at: DateTime<Utc>,
    pub environment: HashMap<String, String>,
    pub cancellation: CancellationToken,
}

impl ExecutionMeta {
    pub fn new(run_id: Uuid, blueprint_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            run_id,
            blueprint_id: blueprint_id.into(),
            node_id: node_id.into(),
            started_at: Utc::now(),
            environment: HashMap::new(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Derive metadata for a different node within the same run, sharing
    /// the same cancellation token.
    pub fn for_node(&self, node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            ..self.clone()
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
