use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Which backend answered -- always the mock here.
    pub service: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
}

/// GET /health -- liveness probe for the mock backend.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "mock-backend",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Mount health check routes (intended for root level).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
