//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models — they carry no orchestration behaviour.
//! Domain types live in `flowcraft-model`/`flowcraft-distributed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted blueprint definition row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub name: String,
    /// Full JSON blueprint (nodes, edges, trigger, …).
    pub definition: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// One `(run_id, key)` attribute of a run's context (spec §6's "attributes
/// are context keys, writes are per-attribute").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContextEntryRow {
    pub run_id: Uuid,
    pub key: String,
    pub value: serde_json::Value,
}

/// A run-status row — the Postgres-backed shape of
/// `flowcraft_distributed::RunStatusRecord`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RunStatusRow {
    pub run_id: Uuid,
    pub blueprint_id: String,
    pub status: String,
    pub reason: Option<String>,
    pub last_updated: i64,
}

/// A coordination-store row (spec §4.9/§6): a numeric counter or a lock
/// token, with an absolute unix-seconds expiry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CoordinationEntryRow {
    pub key: String,
    pub value: String,
    pub expires_at: i64,
}

/// A queued job row — the Postgres-backed shape of `flowcraft_queue::Job`,
/// with the queue's own delivery bookkeeping attached.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub run_id: Uuid,
    pub blueprint_id: String,
    pub node_id: String,
    pub status: String,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
