//! `flowcraft-context` — per-run key/value state.
//!
//! Two variants share one interface in spirit: the synchronous, in-process
//! [`Context`] and the [`AsyncContext`] trait that either a remote store or
//! [`SyncContextView`] (wrapping the in-process variant) implements. Node
//! code is always written against `AsyncContext`.

pub mod async_context;
pub mod error;
pub mod meta;
pub mod serializer;
pub mod sync_context;
pub mod view;

pub use async_context::AsyncContext;
pub use error::ContextError;
pub use meta::ExecutionMeta;
pub use serializer::{JsonSerializer, Serializer};
pub use sync_context::Context;
pub use view::SyncContextView;
