//! `flowcraft-db` — the Postgres-backed ambient persistence layer: a
//! connection pool, typed row structs, blueprint repository functions, and
//! the three store implementations the distributed adapter and coordination
//! store traits abstract over (`PgContext`, `PgStatusStore`,
//! `PgCoordinationStore`), plus a durable `PgQueue` driver.
//!
//! No orchestration logic lives here — that is `flowcraft-engine`'s and
//! `flowcraft-distributed`'s job.

pub mod context_store;
pub mod coordination_store;
pub mod error;
pub mod models;
pub mod pool;
pub mod queue_store;
pub mod repository;
pub mod status_store;

pub use context_store::PgContext;
pub use coordination_store::PgCoordinationStore;
pub use error::DbError;
pub use pool::{create_pool, run_migrations, DbPool};
pub use queue_store::PgQueue;
pub use status_store::PgStatusStore;
