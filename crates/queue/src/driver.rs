//! The `QueueDriver` contract (spec §4.8's overridable `enqueueJob`/
//! `processJobs`/`stop` hooks) — the distributed adapter depends only on
//! this trait, never on a concrete transport.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::QueueError;
use crate::job::Job;

/// Invoked once per delivered job. Returning `Ok` acknowledges the job;
/// returning `Err` leaves it to the driver's own redelivery contract.
pub type JobHandler = Arc<dyn Fn(Job) -> BoxFuture<'static, Result<(), QueueError>> + Send + Sync>;

#[async_trait]
pub trait QueueDriver: Send + Sync {
    /// Persist one work item.
    async fn enqueue_job(&self, job: Job) -> Result<(), QueueError>;

    /// Start consuming; invoke `handler` for every delivered job until
    /// [`QueueDriver::stop`] is called or the driver is closed.
    async fn process_jobs(&self, handler: JobHandler) -> Result<(), QueueError>;

    /// Halt consumption cooperatively; in-flight handler calls are allowed
    /// to finish.
    async fn stop(&self);
}
