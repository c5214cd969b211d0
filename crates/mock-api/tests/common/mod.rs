use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use spriteforge_mock_api::simulator::MockTiming;
use spriteforge_mock_api::state::{AppState, MockState};

/// Build the application router with the default (contract) timing:
/// 1% batch progress per 120 ms, 2 s per pipeline stage.
pub fn build_app() -> Router {
    spriteforge_mock_api::app(AppState::new(MockState::default()))
}

/// Build the application router with custom simulated timing.
#[allow(dead_code)]
pub fn build_app_with_timing(timing: MockTiming) -> Router {
    spriteforge_mock_api::app(AppState::new(MockState::new(timing)))
}

/// Issue a GET request against the router.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request must build"),
    )
    .await
    .expect("request must not fail at the transport level")
}

/// Issue a POST request with a JSON body against the router.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request must build"),
    )
    .await
    .expect("request must not fail at the transport level")
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body must be collectable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body must be valid JSON")
}

/// Assert a response is an error with the given status and an `error`
/// message in the JSON body.
pub async fn assert_error(response: Response, status: StatusCode) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert!(
        json["error"].is_string(),
        "error responses must carry an 'error' message, got: {json}"
    );
}
