//! Postgres-backed [`StatusStore`] — one row per run in `run_status`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use flowcraft_distributed::{DistributedError, RunStatusRecord, StatusStore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::RunStatusRow;
use crate::DbError;

pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: RunStatusRow) -> RunStatusRecord {
    RunStatusRecord {
        run_id: row.run_id,
        blueprint_id: row.blueprint_id,
        status: row.status,
        reason: row.reason,
        last_updated: row.last_updated,
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn write(&self, record: RunStatusRecord) -> Result<(), DistributedError> {
        sqlx::query!(
            r#"
            INSERT INTO run_status (run_id, blueprint_id, status, reason, last_updated)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (run_id) DO UPDATE
                SET blueprint_id = EXCLUDED.blueprint_id,
                    status = EXCLUDED.status,
                    reason = EXCLUDED.reason,
                    last_updated = EXCLUDED.last_updated
            "#,
            record.run_id,
            record.blueprint_id,
            record.status,
            record.reason,
            record.last_updated,
        )
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    async fn touch(&self, run_id: Uuid) -> Result<(), DistributedError> {
        sqlx::query!(
            r#"UPDATE run_status SET last_updated = $1 WHERE run_id = $2"#,
            Utc::now().timestamp(),
            run_id,
        )
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    async fn get(&self, run_id: Uuid) -> Result<Option<RunStatusRecord>, DistributedError> {
        let row = sqlx::query_as!(
            RunStatusRow,
            r#"SELECT run_id, blueprint_id, status, reason, last_updated FROM run_status WHERE run_id = $1"#,
            run_id,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(row.map(row_to_record))
    }

    async fn stale_running(&self, threshold: Duration) -> Result<Vec<RunStatusRecord>, DistributedError> {
        let cutoff = Utc::now().timestamp() - threshold.as_secs() as i64;
        let rows = sqlx::query_as!(
            RunStatusRow,
            r#"
            SELECT run_id, blueprint_id, status, reason, last_updated
            FROM run_status
            WHERE status = 'running' AND last_updated < $1
            "#,
            cutoff,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(row_to_record).collect())
    }
}
