//! The adapter's overridable hooks (spec §4.8) — everything host-specific
//! about binding a run to a backing context store and delivering its final
//! result. Queueing itself is a separate concern, covered by
//! `flowcraft_queue::QueueDriver`.

use std::sync::Arc;

use async_trait::async_trait;
use flowcraft_context::AsyncContext;
use uuid::Uuid;

use crate::error::DistributedError;
use crate::status::FinalResult;

#[async_trait]
pub trait DistributedHooks: Send + Sync {
    /// Bind to the state store backing this run's context.
    async fn create_context(
        &self,
        run_id: Uuid,
        blueprint_id: &str,
    ) -> Result<Arc<dyn AsyncContext>, DistributedError>;

    /// Durable delivery point for end consumers — called exactly once, when
    /// the run reaches a terminal status.
    async fn publish_final_result(&self, run_id: Uuid, result: FinalResult) -> Result<(), DistributedError>;

    /// Liveness bookkeeping hook; the default is a no-op beyond the
    /// adapter's own `StatusStore::touch` call.
    async fn on_job_start(&self, _run_id: Uuid, _blueprint_id: &str, _node_id: &str) -> Result<(), DistributedError> {
        Ok(())
    }
}
