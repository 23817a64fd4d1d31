use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use flowcraft_db::repository::workflows as wf_repo;
use flowcraft_model::Blueprint;
use serde_json::Value;
use uuid::Uuid;

use super::AppState;

#[derive(serde::Deserialize)]
pub struct CreateWorkflowDto {
    pub name: String,
    pub definition: Value,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<flowcraft_db::models::WorkflowRow>>, StatusCode> {
    wf_repo::list_workflows(&state.pool)
        .await
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn get(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<flowcraft_db::models::WorkflowRow>, StatusCode> {
    match wf_repo::get_workflow(&state.pool, id).await {
        Ok(wf) => Ok(Json(wf)),
        Err(flowcraft_db::DbError::NotFound) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Validates `definition` as a well-formed blueprint (spec §4.1) before
/// persisting it — structural validation (duplicate ids, dangling edges,
/// unknown implementations) happens later, at submit-run time, once the
/// implementation registry is known.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkflowDto>,
) -> Result<(StatusCode, Json<flowcraft_db::models::WorkflowRow>), StatusCode> {
    if serde_json::from_value::<Blueprint>(payload.definition.clone()).is_err() {
        return Err(StatusCode::BAD_REQUEST);
    }

    wf_repo::create_workflow(&state.pool, &payload.name, payload.definition)
        .await
        .map(|wf| (StatusCode::CREATED, Json(wf)))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn delete(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    match wf_repo::delete_workflow(&state.pool, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(flowcraft_db::DbError::NotFound) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
