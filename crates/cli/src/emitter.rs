//! A `tracing`-backed [`EventEmitter`] — the CLI's observability sink,
//! matching the teacher's `info!`/`warn!` usage in `executor.rs` rather
//! than introducing a bespoke logging format.

use flowcraft_engine::{Event, EventEmitter, EventKind};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEmitter;

impl EventEmitter for TracingEmitter {
    fn emit(&self, event: Event) {
        match event.kind {
            EventKind::NodeError | EventKind::WorkflowStall => {
                tracing::warn!(run_id = %event.run_id, blueprint_id = %event.blueprint_id, node_id = ?event.node_id, error = ?event.error, "{:?}", event.kind);
            }
            _ => {
                tracing::debug!(run_id = %event.run_id, blueprint_id = %event.blueprint_id, node_id = ?event.node_id, "{:?}", event.kind);
            }
        }
    }
}
