use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub version: String,
}

/// Plain-text liveness check.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Server is running", body = String)
    ),
    tag = "system"
)]
pub async fn root() -> &'static str {
    "Backend server is running!"
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_ok = state.store.ensure_ready().await.is_ok();

    Json(HealthResponse {
        status: if storage_ok { "ok" } else { "degraded" }.to_string(),
        storage: if storage_ok { "ready" } else { "unavailable" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
