//! Postgres-backed [`CoordinationStore`] (spec §4.9) — `increment` and
//! `set_if_not_exist` as single atomic statements via `INSERT ... ON
//! CONFLICT`, in place of the teacher's `SELECT ... FOR UPDATE SKIP LOCKED`
//! (that pattern claims one row among many candidates; here there is
//! exactly one row per key and the conflict itself is the atomicity we
//! need).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use flowcraft_coordination::{CoordinationError, CoordinationStore};
use sqlx::PgPool;

use crate::DbError;

pub struct PgCoordinationStore {
    pool: PgPool,
}

impl PgCoordinationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CoordinationStore for PgCoordinationStore {
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CoordinationError> {
        let expires_at = Utc::now().timestamp() + ttl.as_secs() as i64;

        let row = sqlx::query!(
            r#"
            INSERT INTO coordination_entries (key, value, expires_at)
            VALUES ($1, '1', $2)
            ON CONFLICT (key) DO UPDATE
                SET value = CASE
                        WHEN coordination_entries.expires_at < $3 THEN '1'
                        ELSE (coordination_entries.value::bigint + 1)::text
                    END,
                    expires_at = $2
            RETURNING value
            "#,
            key,
            expires_at,
            Utc::now().timestamp(),
        )
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        row.value
            .parse::<u64>()
            .map_err(|_| CoordinationError::NotACounter(key.to_string()))
    }

    async fn set_if_not_exist(&self, key: &str, value: String, ttl: Duration) -> Result<bool, CoordinationError> {
        let expires_at = Utc::now().timestamp() + ttl.as_secs() as i64;
        let now = Utc::now().timestamp();

        let result = sqlx::query!(
            r#"
            INSERT INTO coordination_entries (key, value, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at
                WHERE coordination_entries.expires_at < $4
            "#,
            key,
            value,
            expires_at,
            now,
        )
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CoordinationError> {
        let now = Utc::now().timestamp();
        let row = sqlx::query!(
            r#"SELECT value FROM coordination_entries WHERE key = $1 AND expires_at >= $2"#,
            key,
            now,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(row.map(|r| r.value))
    }

    async fn delete(&self, key: &str) -> Result<(), CoordinationError> {
        sqlx::query!(r#"DELETE FROM coordination_entries WHERE key = $1"#, key)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
