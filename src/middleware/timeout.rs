use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::response::Json;
use axum::{BoxError, Router};
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;

use crate::error::ErrorBody;

pub trait RequestTimeoutExt<S> {
    fn with_request_timeout(self, timeout: Duration) -> Self;
}

async fn handle_timeout_error(err: BoxError) -> (StatusCode, Json<ErrorBody>) {
    if err.is::<Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(ErrorBody::new("Request timed out")),
        )
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Internal server error")),
        )
    }
}

impl<S> RequestTimeoutExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Answer `408 Request Timeout` for requests that take longer than `timeout`
    fn with_request_timeout(self, timeout: Duration) -> Router<S> {
        self.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(timeout)),
        )
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn slow_requests_get_a_json_408() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    "late"
                }),
            )
            .with_request_timeout(Duration::from_millis(20));

        let req = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Request timed out" }));
    }

    #[tokio::test]
    async fn fast_requests_pass_through() {
        let app = Router::new()
            .route("/fast", get(|| async { "ok" }))
            .with_request_timeout(Duration::from_secs(5));

        let req = Request::builder().uri("/fast").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
