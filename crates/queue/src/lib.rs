//! `flowcraft-queue` — the queue driver contract the distributed adapter
//! depends on (spec §4.8/§6), plus an in-memory reference driver for the
//! single-process CLI worker and for tests that must not require a broker.

pub mod driver;
pub mod error;
pub mod job;
pub mod memory;

pub use driver::{JobHandler, QueueDriver};
pub use error::QueueError;
pub use job::Job;
pub use memory::InMemoryQueue;
