use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use flowcraft_db::repository::workflows as wf_repo;
use flowcraft_distributed::RunStatusRecord;
use flowcraft_model::Blueprint;
use serde_json::Value;
use uuid::Uuid;

use super::AppState;

#[derive(serde::Deserialize)]
pub struct ExecuteWorkflowDto {
    #[serde(default)]
    pub input: Value,
}

#[derive(serde::Serialize)]
pub struct ExecuteWorkflowResponse {
    pub run_id: Uuid,
}

/// Object-shaped input seeds the run's initial state key-by-key; any other
/// shape (including absent/`null`) is carried under a single `input` key,
/// matching the teacher's convention of passing the raw request payload
/// straight through to the worker.
pub(crate) fn initial_state(input: Value) -> HashMap<String, Value> {
    match input {
        Value::Object(map) => map.into_iter().collect(),
        Value::Null => HashMap::new(),
        other => HashMap::from([("input".to_string(), other)]),
    }
}

pub async fn execute(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<ExecuteWorkflowDto>,
) -> Result<(StatusCode, Json<ExecuteWorkflowResponse>), StatusCode> {
    let row = match wf_repo::get_workflow(&state.pool, id).await {
        Ok(row) => row,
        Err(flowcraft_db::DbError::NotFound) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let blueprint: Blueprint =
        serde_json::from_value(row.definition).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let run_id = state
        .adapter
        .submit_run(blueprint, initial_state(payload.input))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::ACCEPTED, Json(ExecuteWorkflowResponse { run_id })))
}

pub async fn run_status(
    Path(run_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<RunStatusRecord>, StatusCode> {
    match state.adapter.status_of(run_id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
