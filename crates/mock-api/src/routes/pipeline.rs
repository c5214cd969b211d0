//! Pipeline run routes.
//!
//! ```text
//! POST /pipeline/run              -> run_pipeline
//! GET  /pipeline/status/{project} -> pipeline_status
//! GET  /pipeline/log/{project}    -> pipeline_log   (?lines=N)
//! ```

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use spriteforge_core::stage::StageMap;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Default number of log lines returned when `?lines` is absent.
const DEFAULT_LOG_LINES: usize = 200;

#[derive(Debug, Deserialize)]
pub struct RunPipelineRequest {
    #[serde(default)]
    pub project_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunPipelineResponse {
    pub status: &'static str,
    pub job_id: String,
}

#[derive(Debug, Serialize)]
pub struct PipelineStatusResponse {
    pub stages: StageMap,
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub lines: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PipelineLogResponse {
    pub log: String,
}

/// POST /pipeline/run
///
/// Starts a multi-stage run for a project. 400 when `project_name` is
/// missing, 404 for an unknown project. Not idempotent: a second call
/// restarts the run; clients are expected to guard their own trigger.
async fn run_pipeline(
    State(state): State<AppState>,
    Json(request): Json<RunPipelineRequest>,
) -> AppResult<Json<RunPipelineResponse>> {
    let project = request
        .project_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest("project_name is required".to_string()))?;

    let job_id = state.mock.run_pipeline(project)?;

    Ok(Json(RunPipelineResponse {
        status: "ok",
        job_id,
    }))
}

/// GET /pipeline/status/{project}
///
/// Stage map in fixed pipeline order, with required/completed flags.
async fn pipeline_status(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> AppResult<Json<PipelineStatusResponse>> {
    let stages = state.mock.pipeline_stages(&project)?;
    Ok(Json(PipelineStatusResponse { stages }))
}

/// GET /pipeline/log/{project}?lines=N
///
/// Tail of the run log. Meant to be fetched once, after the run
/// reaches its terminal state.
async fn pipeline_log(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<PipelineLogResponse>> {
    let lines = query.lines.unwrap_or(DEFAULT_LOG_LINES);
    let log = state.mock.pipeline_log(&project, lines)?;
    Ok(Json(PipelineLogResponse { log }))
}

/// Routes mounted at `/pipeline`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/run", post(run_pipeline))
        .route("/status/{project}", get(pipeline_status))
        .route("/log/{project}", get(pipeline_log))
}
