//! The job payload carried on the queue (spec §6) — bit-exact serializable,
//! and deliberately thin: the full context lives in the context store
//! keyed by `run_id`, never on the queue itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub run_id: Uuid,
    pub blueprint_id: String,
    pub node_id: String,
}

impl Job {
    pub fn new(run_id: Uuid, blueprint_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            run_id,
            blueprint_id: blueprint_id.into(),
            node_id: node_id.into(),
        }
    }
}
