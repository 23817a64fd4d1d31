use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use flowcraft_db::repository::workflows as wf_repo;
use flowcraft_model::Blueprint;
use serde_json::Value;

use super::executions::initial_state;
use super::AppState;

/// A blueprint opts into webhook delivery via its free-form `metadata`:
/// `{"webhook": {"path": "<path>"}}`. The blueprint model itself (spec
/// §4.1) has no first-class trigger concept — this is purely an API-layer
/// convention over the existing `metadata` field.
fn webhook_path(blueprint: &Blueprint) -> Option<&str> {
    blueprint.metadata.as_ref()?.get("webhook")?.get("path")?.as_str()
}

pub async fn handle_webhook(
    Path(path): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let rows = wf_repo::list_workflows(&state.pool).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let matched = rows.into_iter().find_map(|row| {
        let blueprint: Blueprint = serde_json::from_value(row.definition.clone()).ok()?;
        (webhook_path(&blueprint)? == path).then_some((row, blueprint))
    });

    let (_row, blueprint) = matched.ok_or(StatusCode::NOT_FOUND)?;

    state
        .adapter
        .submit_run(blueprint, initial_state(payload))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::ACCEPTED, Json(serde_json::json!({"message": "webhook accepted"}))))
}
