//! Postgres-backed [`QueueDriver`] — a durable alternative to
//! `flowcraft_queue::InMemoryQueue` for a multi-process deployment, grounded
//! directly on the teacher's `db::repository::jobs` polling loop
//! (`SELECT ... FOR UPDATE SKIP LOCKED`), adapted to the three-field
//! `{run_id, blueprint_id, node_id}` job shape instead of the teacher's
//! `job_queue` schema.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use flowcraft_queue::{Job, JobHandler, QueueDriver, QueueError};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::JobRow;
use crate::DbError;

pub struct PgQueue {
    pool: PgPool,
    poll_interval: Duration,
    cancellation: CancellationToken,
}

impl PgQueue {
    pub fn new(pool: PgPool, poll_interval: Duration) -> Self {
        Self { pool, poll_interval, cancellation: CancellationToken::new() }
    }

    /// Atomically claim the oldest pending job, if any.
    async fn fetch_next(&self) -> Result<Option<JobRow>, DbError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as!(
            JobRow,
            r#"
            SELECT id, run_id, blueprint_id, node_id, status, attempts, created_at, updated_at
            FROM job_queue
            WHERE status = 'pending'
            ORDER BY created_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(ref job) = row {
            sqlx::query!(
                r#"UPDATE job_queue SET status = 'processing', attempts = attempts + 1, updated_at = $1 WHERE id = $2"#,
                Utc::now(),
                job.id,
            )
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }

        Ok(row)
    }

    async fn mark_done(&self, id: Uuid, ok: bool) -> Result<(), DbError> {
        let status = if ok { "completed" } else { "pending" };
        sqlx::query!(
            r#"UPDATE job_queue SET status = $1, updated_at = $2 WHERE id = $3"#,
            status,
            Utc::now(),
            id,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl QueueDriver for PgQueue {
    async fn enqueue_job(&self, job: Job) -> Result<(), QueueError> {
        sqlx::query!(
            r#"
            INSERT INTO job_queue (id, run_id, blueprint_id, node_id, status, attempts, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'pending', 0, $5, $5)
            "#,
            Uuid::new_v4(),
            job.run_id,
            job.blueprint_id,
            job.node_id,
            Utc::now(),
        )
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    /// Polls `job_queue` on `poll_interval`, dispatching one claimed job at
    /// a time to `handler`. Runs until [`PgQueue::stop`] is called.
    async fn process_jobs(&self, handler: JobHandler) -> Result<(), QueueError> {
        loop {
            if self.cancellation.is_cancelled() {
                return Ok(());
            }

            match self.fetch_next().await.map_err(QueueError::from)? {
                Some(row) => {
                    let job = Job::new(row.run_id, row.blueprint_id, row.node_id);
                    let ok = handler(job).await.is_ok();
                    self.mark_done(row.id, ok).await.map_err(QueueError::from)?;
                }
                None => {
                    tokio::select! {
                        biased;
                        _ = self.cancellation.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
            }
        }
    }

    async fn stop(&self) {
        self.cancellation.cancel();
    }
}
