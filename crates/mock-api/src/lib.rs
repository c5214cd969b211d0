//! Mock generation server for local SpriteForge development.
//!
//! Simulates the real sprite-generation backend behind the same HTTP
//! surface: batch create/run/status with deterministic time-based
//! progress, and pipeline run/status/log with staged completion. All
//! state is in-memory and resets on restart. Swappable with a real job
//! runner without touching the client's status poller -- the poller
//! only relies on the state machine, never on timing.

pub mod config;
pub mod error;
pub mod routes;
pub mod simulator;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Build the full application router.
///
/// Batch routes live under `/api/batch`, pipeline routes under
/// `/pipeline`, and the health check at root level, matching the
/// surface the control panel consumes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/batch", routes::batch::router())
        .nest("/pipeline", routes::pipeline::router())
        .with_state(state)
}
