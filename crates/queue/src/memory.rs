//! An in-memory `QueueDriver` — the single-process CLI worker and the
//! engine's own tests use this instead of a broker.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::driver::{JobHandler, QueueDriver};
use crate::error::QueueError;
use crate::job::Job;

/// Backed by an unbounded `mpsc` channel. `process_jobs` takes the
/// receiver out of the `Mutex` on first call — a second concurrent call
/// returns [`QueueError::Closed`], matching the "one consumer per driver
/// instance" shape every queue broker the teacher could plausibly swap in
/// also assumes.
pub struct InMemoryQueue {
    sender: mpsc::UnboundedSender<Job>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Job>>>,
    cancellation: CancellationToken,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            cancellation: CancellationToken::new(),
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueDriver for InMemoryQueue {
    async fn enqueue_job(&self, job: Job) -> Result<(), QueueError> {
        self.sender.send(job).map_err(|e| QueueError::Driver(e.to_string()))
    }

    async fn process_jobs(&self, handler: JobHandler) -> Result<(), QueueError> {
        let mut receiver = self
            .receiver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or(QueueError::Closed)?;

        loop {
            tokio::select! {
                biased;
                job = receiver.recv() => {
                    match job {
                        None => return Ok(()),
                        Some(job) => {
                            if let Err(e) = handler(job).await {
                                tracing::warn!(error = %e, "queue job handler failed");
                            }
                        }
                    }
                }
                _ = self.cancellation.cancelled() => return Ok(()),
            }
        }
    }

    async fn stop(&self) {
        self.cancellation.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn enqueued_jobs_are_delivered_to_handler() {
        let queue = Arc::new(InMemoryQueue::new());
        let seen = Arc::new(AtomicUsize::new(0));

        queue
            .enqueue_job(Job::new(Uuid::new_v4(), "bp", "a"))
            .await
            .unwrap();
        queue
            .enqueue_job(Job::new(Uuid::new_v4(), "bp", "b"))
            .await
            .unwrap();
        queue.stop().await;

        let seen_clone = seen.clone();
        let handler: JobHandler = Arc::new(move |_job| {
            let seen = seen_clone.clone();
            Box::pin(async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        });

        queue.process_jobs(handler).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_consumer_is_rejected() {
        let queue = Arc::new(InMemoryQueue::new());
        queue.stop().await;

        let noop: JobHandler = Arc::new(|_job| Box::pin(async { Ok(()) }));
        queue.process_jobs(noop.clone()).await.unwrap();
        assert!(matches!(queue.process_jobs(noop).await, Err(QueueError::Closed)));
    }
}
