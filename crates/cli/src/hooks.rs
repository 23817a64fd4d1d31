//! The CLI's `DistributedHooks` binding — context lives in Postgres, final
//! results are logged (no separate delivery system is part of this crate).

use std::sync::Arc;

use async_trait::async_trait;
use flowcraft_context::{AsyncContext, ExecutionMeta};
use flowcraft_db::{DbPool, PgContext};
use flowcraft_distributed::{DistributedError, DistributedHooks, FinalResult};
use uuid::Uuid;

pub struct DbHooks {
    pool: DbPool,
}

impl DbHooks {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DistributedHooks for DbHooks {
    async fn create_context(
        &self,
        run_id: Uuid,
        blueprint_id: &str,
    ) -> Result<Arc<dyn AsyncContext>, DistributedError> {
        Ok(Arc::new(PgContext::new(self.pool.clone(), ExecutionMeta::new(run_id, blueprint_id, ""))))
    }

    async fn publish_final_result(&self, run_id: Uuid, result: FinalResult) -> Result<(), DistributedError> {
        tracing::info!(%run_id, status = %result.status, reason = ?result.reason, "run finished");
        Ok(())
    }
}
