//! HTTP API surface.

mod jobs;
mod prices;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::main_lib::AppState;

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "Chainprice Token Price API" }))
}

pub fn app_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/price", post(prices::resolve_price))
        .route("/price-history", post(prices::price_history))
        .route("/schedule", post(jobs::schedule_backfill))
        .route("/stop/{job_id}", delete(jobs::stop_job))
        .route("/status/{job_id}", get(jobs::job_status))
        .route("/jobs", get(jobs::list_jobs));

    Router::new()
        .route("/", get(root))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
