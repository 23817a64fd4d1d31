//! `flowcraft-api` crate — HTTP REST surface (spec §6's external interfaces,
//! given an HTTP face).
//!
//! Exposes:
//!   GET    /api/v1/workflows
//!   POST   /api/v1/workflows
//!   GET    /api/v1/workflows/:id
//!   DELETE /api/v1/workflows/:id
//!   POST   /api/v1/workflows/:id/execute
//!   GET    /api/v1/runs/:id
//!   POST   /webhook/:path

pub mod handlers;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use flowcraft_db::DbPool;
use flowcraft_distributed::DistributedAdapter;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub adapter: Arc<DistributedAdapter>,
}

pub async fn serve(bind: &str, pool: DbPool, adapter: Arc<DistributedAdapter>) -> Result<(), std::io::Error> {
    let state = AppState { pool, adapter };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let api_router = Router::new()
        .route("/workflows", get(handlers::workflows::list).post(handlers::workflows::create))
        .route("/workflows/:id", get(handlers::workflows::get).delete(handlers::workflows::delete))
        .route("/workflows/:id/execute", post(handlers::executions::execute))
        .route("/runs/:id", get(handlers::executions::run_status));

    let app = Router::new()
        .nest("/api/v1", api_router)
        .route("/webhook/:path", post(handlers::webhooks::handle_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await
}
