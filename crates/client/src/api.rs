//! REST client for the generation server's batch and pipeline endpoints.
//!
//! Wraps the HTTP surface (batch create/run/status, pipeline run/status/
//! log) using [`reqwest`] and normalizes error responses into
//! [`JobClientError`] variants the poller can classify.

use serde::Deserialize;
use spriteforge_core::batch::Batch;
use spriteforge_core::stage::StageMap;

/// HTTP client for a single generation server (real or mock).
pub struct JobClient {
    client: reqwest::Client,
    base_url: String,
}

/// Response returned by the batch create and run endpoints.
#[derive(Debug, Deserialize)]
pub struct BatchAck {
    /// Human-readable status word (`"ok"`, `"started"`).
    pub status: String,
    /// Server-allocated batch identifier.
    pub batch_id: String,
}

/// Response returned by `POST /pipeline/run`.
#[derive(Debug, Deserialize)]
pub struct PipelineAck {
    pub status: String,
    /// Server-allocated identifier for this run.
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
struct PipelineStatusResponse {
    stages: StageMap,
}

#[derive(Debug, Deserialize)]
struct PipelineLogResponse {
    log: String,
}

/// JSON body carried by server error responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Errors from the generation server REST layer.
///
/// The variant encodes the failure kind from the error-handling policy:
/// validation and not-found failures are terminal for the flow that hit
/// them, while transport and server faults are transient during polling.
#[derive(Debug, thiserror::Error)]
pub enum JobClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the request as malformed (HTTP 400).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced batch or project is unknown (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The server failed internally (HTTP 5xx).
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status code.
    #[error("unexpected status {status}: {message}")]
    Unexpected { status: u16, message: String },
}

impl JobClientError {
    /// Whether a polling loop should keep going after this error.
    ///
    /// Network blips and 5xx responses are retried on the next tick;
    /// validation and not-found failures abort the flow immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            JobClientError::Transport(_) | JobClientError::Server { .. }
        )
    }
}

impl JobClient {
    /// Create a client for the server at `base_url`, e.g.
    /// `http://localhost:5001`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`] (useful
    /// for connection pooling).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a new batch for a character and motion preset.
    ///
    /// The server allocates the id; the client never generates one, so
    /// it cannot collide with server state.
    pub async fn create_batch(
        &self,
        character: &str,
        motion: &str,
    ) -> Result<BatchAck, JobClientError> {
        let body = serde_json::json!({
            "character": character,
            "motion": motion,
        });

        let response = self
            .client
            .post(format!("{}/api/batch/create", self.base_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Start a created batch.
    ///
    /// Resets the server-side progress baseline to the moment the run
    /// call is accepted. Fails with [`JobClientError::NotFound`] for an
    /// unknown id.
    pub async fn run_batch(&self, batch_id: &str) -> Result<BatchAck, JobClientError> {
        let response = self
            .client
            .post(format!("{}/api/batch/run/{}", self.base_url, batch_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current status/progress/result snapshot of a batch.
    pub async fn batch_status(&self, batch_id: &str) -> Result<Batch, JobClientError> {
        let response = self
            .client
            .get(format!("{}/api/batch/status/{}", self.base_url, batch_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Start a multi-stage pipeline run for a project.
    ///
    /// Not idempotent: two concurrent calls may start two overlapping
    /// runs server-side. Callers must guard against double-invocation
    /// (the [`Session`](crate::session::Session) does).
    pub async fn run_pipeline(&self, project: &str) -> Result<PipelineAck, JobClientError> {
        let body = serde_json::json!({
            "project_name": project,
        });

        let response = self
            .client
            .post(format!("{}/pipeline/run", self.base_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the stage map of a project's pipeline run.
    pub async fn pipeline_status(&self, project: &str) -> Result<StageMap, JobClientError> {
        let response = self
            .client
            .get(format!("{}/pipeline/status/{}", self.base_url, project))
            .send()
            .await?;

        let status: PipelineStatusResponse = Self::parse_response(response).await?;
        Ok(status.stages)
    }

    /// Fetch the tail of a project's pipeline log.
    ///
    /// Called once, after the run reaches its terminal state.
    pub async fn pipeline_log(
        &self,
        project: &str,
        max_lines: usize,
    ) -> Result<String, JobClientError> {
        let response = self
            .client
            .get(format!(
                "{}/pipeline/log/{}?lines={}",
                self.base_url, project, max_lines
            ))
            .send()
            .await?;

        let log: PipelineLogResponse = Self::parse_response(response).await?;
        Ok(log.log)
    }

    // ---- private helpers ----

    /// Map a non-success response to the matching error variant, using
    /// the HTTP status as the failure kind and the JSON `error` field
    /// as display text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, JobClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.text().await {
            Ok(body) => serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body),
            Err(_) => "<unreadable body>".to_string(),
        };

        Err(match status.as_u16() {
            400 => JobClientError::Validation(message),
            404 => JobClientError::NotFound(message),
            code if code >= 500 => JobClientError::Server {
                status: code,
                message,
            },
            code => JobClientError::Unexpected {
                status: code,
                message,
            },
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, JobClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
