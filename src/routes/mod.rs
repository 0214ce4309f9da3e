pub mod posts;

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Router;

use crate::error::ErrorBody;
use crate::middleware::logging::HttpLoggingExt;
use crate::middleware::timeout::RequestTimeoutExt;

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found")))
}

/// The whole HTTP surface: `/posts` plus a JSON fallback for anything else.
pub fn app(post_svc: posts::PostsRouteState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/posts", posts::router().with_state(post_svc))
        .fallback(not_found)
        .with_http_logging()
        .with_request_timeout(request_timeout)
}
