//! The coordination store contract (spec §4.9) — the atomic primitives the
//! distributed adapter uses for at-most-once-per-edge progression and for
//! advisory locks around a predecessor's completion.
//!
//! Keys used by the distributed adapter: `<run_id>:<target_node_id>:join`
//! (counter), `<run_id>:<node_id>:lock` (lease), `<run_id>:status`
//! (overall, via [`crate::CoordinationStore::get`]/`set_if_not_exist`).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CoordinationError;

#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Atomically increment a counter, creating it at 1 if absent, and
    /// (re)set its expiry. Returns the post-increment count.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CoordinationError>;

    /// Lease/lock primitive: set `key` to `value` only if it doesn't
    /// already hold an unexpired value. Returns whether this call acquired
    /// it.
    async fn set_if_not_exist(&self, key: &str, value: String, ttl: Duration) -> Result<bool, CoordinationError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CoordinationError>;

    async fn delete(&self, key: &str) -> Result<(), CoordinationError>;
}
