//! Postgres-backed [`AsyncContext`] — one row per `(run_id, key)` attribute
//! (spec §6), so sibling workers writing distinct keys never contend on the
//! same row.

use std::collections::HashMap;

use async_trait::async_trait;
use flowcraft_context::{AsyncContext, Context, ContextError, ExecutionMeta};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ContextEntryRow;
use crate::DbError;

/// Binds one run's context to its rows in the `context_entries` table.
pub struct PgContext {
    pool: PgPool,
    run_id: Uuid,
    meta: ExecutionMeta,
}

impl PgContext {
    pub fn new(pool: PgPool, meta: ExecutionMeta) -> Self {
        let run_id = meta.run_id;
        Self { pool, run_id, meta }
    }
}

#[async_trait]
impl AsyncContext for PgContext {
    async fn get(&self, key: &str) -> Result<Option<Value>, ContextError> {
        let row = sqlx::query_as!(
            ContextEntryRow,
            r#"SELECT run_id, key, value FROM context_entries WHERE run_id = $1 AND key = $2"#,
            self.run_id,
            key,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(row.map(|r| r.value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), ContextError> {
        sqlx::query!(
            r#"
            INSERT INTO context_entries (run_id, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (run_id, key) DO UPDATE SET value = EXCLUDED.value
            "#,
            self.run_id,
            key,
            value,
        )
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool, ContextError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn delete(&self, key: &str) -> Result<Option<Value>, ContextError> {
        let row = sqlx::query_as!(
            ContextEntryRow,
            r#"DELETE FROM context_entries WHERE run_id = $1 AND key = $2 RETURNING run_id, key, value"#,
            self.run_id,
            key,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(row.map(|r| r.value))
    }

    async fn keys(&self) -> Result<Vec<String>, ContextError> {
        let rows = sqlx::query!(r#"SELECT key FROM context_entries WHERE run_id = $1"#, self.run_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(rows.into_iter().map(|r| r.key).collect())
    }

    async fn to_json(&self) -> Result<Value, ContextError> {
        let rows = sqlx::query_as!(
            ContextEntryRow,
            r#"SELECT run_id, key, value FROM context_entries WHERE run_id = $1"#,
            self.run_id,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let map: serde_json::Map<String, Value> = rows.into_iter().map(|r| (r.key, r.value)).collect();
        Ok(Value::Object(map))
    }

    /// Realised as an in-process [`Context`], per the contract: a
    /// sub-workflow's inner run is bounded and short-lived, so there is no
    /// need to materialize it as further rows.
    async fn create_scope(
        &self,
        overlay: HashMap<String, Value>,
        meta: ExecutionMeta,
    ) -> Result<Context, ContextError> {
        let snapshot = self.to_json().await?;
        let mut initial: HashMap<String, Value> = match snapshot {
            Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        initial.extend(overlay);
        Ok(Context::with_initial(meta, initial))
    }

    fn meta(&self) -> ExecutionMeta {
        self.meta.clone()
    }
}
