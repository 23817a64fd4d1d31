//! The status store (spec §6's final-result record plus the bookkeeping
//! the reconciliation sweep needs) — one record per run, `lastUpdated`
//! touched at least on `onJobStart` and on final publication.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DistributedError;

/// The wire shape handed to [`crate::hooks::DistributedHooks::publish_final_result`]
/// — exactly spec §6's final-result record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResult {
    pub status: String,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub last_updated: i64,
}

/// The status store's internal record — a superset of [`FinalResult`]
/// carrying the `blueprint_id` the reconciliation sweep needs to reload a
/// stale run's blueprint, something the minimal wire record has no reason
/// to carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatusRecord {
    pub run_id: Uuid,
    pub blueprint_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub last_updated: i64,
}

impl RunStatusRecord {
    pub fn running(run_id: Uuid, blueprint_id: impl Into<String>) -> Self {
        Self {
            run_id,
            blueprint_id: blueprint_id.into(),
            status: "running".to_string(),
            reason: None,
            last_updated: Utc::now().timestamp(),
        }
    }
}

#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn write(&self, record: RunStatusRecord) -> Result<(), DistributedError>;

    /// Bump `lastUpdated` without otherwise changing the record — liveness
    /// bookkeeping called from `onJobStart`.
    async fn touch(&self, run_id: Uuid) -> Result<(), DistributedError>;

    async fn get(&self, run_id: Uuid) -> Result<Option<RunStatusRecord>, DistributedError>;

    /// Runs still marked `running` whose `lastUpdated` is older than
    /// `threshold` — the reconciliation sweep's input.
    async fn stale_running(&self, threshold: Duration) -> Result<Vec<RunStatusRecord>, DistributedError>;
}

/// In-memory reference implementation for tests and the single-process
/// CLI worker.
#[derive(Default)]
pub struct InMemoryStatusStore {
    records: Mutex<HashMap<Uuid, RunStatusRecord>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn write(&self, record: RunStatusRecord) -> Result<(), DistributedError> {
        self.records.lock().unwrap_or_else(|p| p.into_inner()).insert(record.run_id, record);
        Ok(())
    }

    async fn touch(&self, run_id: Uuid) -> Result<(), DistributedError> {
        let mut records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(record) = records.get_mut(&run_id) {
            record.last_updated = Utc::now().timestamp();
        }
        Ok(())
    }

    async fn get(&self, run_id: Uuid) -> Result<Option<RunStatusRecord>, DistributedError> {
        Ok(self.records.lock().unwrap_or_else(|p| p.into_inner()).get(&run_id).cloned())
    }

    async fn stale_running(&self, threshold: Duration) -> Result<Vec<RunStatusRecord>, DistributedError> {
        let cutoff = Utc::now().timestamp() - threshold.as_secs() as i64;
        Ok(self
            .records
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .filter(|r| r.status == "running" && r.last_updated < cutoff)
            .cloned()
            .collect())
    }
}
