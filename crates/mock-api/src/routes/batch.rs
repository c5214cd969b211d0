//! Batch job routes.
//!
//! ```text
//! POST /api/batch/create       -> create_batch
//! POST /api/batch/run/{id}     -> run_batch
//! GET  /api/batch/status/{id}  -> batch_status
//! ```

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use spriteforge_core::batch::Batch;

use crate::error::AppResult;
use crate::state::AppState;

/// Request body for batch creation. Fields default to the demo
/// character/preset pair, matching the fixtures.
#[derive(Debug, Deserialize, Default)]
pub struct CreateBatchRequest {
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub motion: Option<String>,
}

/// Acknowledgement returned by create and run.
#[derive(Debug, Serialize)]
pub struct BatchAckResponse {
    pub status: &'static str,
    pub batch_id: String,
}

/// POST /api/batch/create
///
/// Allocates a new batch in `created` state. The server owns id
/// generation so client-side ids can never collide with server state.
async fn create_batch(
    State(state): State<AppState>,
    Json(request): Json<CreateBatchRequest>,
) -> AppResult<Json<BatchAckResponse>> {
    let character = request.character.as_deref().unwrap_or("goblin");
    let motion = request.motion.as_deref().unwrap_or("goblin_sneak");

    let batch_id = state.mock.create_batch(character, motion);

    Ok(Json(BatchAckResponse {
        status: "ok",
        batch_id,
    }))
}

/// POST /api/batch/run/{id}
///
/// Starts a created batch. Resets the progress baseline to the moment
/// this call is accepted, not the create time. 404 for unknown ids.
async fn run_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BatchAckResponse>> {
    state.mock.run_batch(&id)?;

    Ok(Json(BatchAckResponse {
        status: "started",
        batch_id: id,
    }))
}

/// GET /api/batch/status/{id}
///
/// Returns the current simulated snapshot. Progress is monotone and
/// saturating; once completed, the attached result never changes.
async fn batch_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Batch>> {
    let batch = state.mock.batch_status(&id)?;
    Ok(Json(batch))
}

/// Routes mounted at `/api/batch`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_batch))
        .route("/run/{id}", post(run_batch))
        .route("/status/{id}", get(batch_status))
}
