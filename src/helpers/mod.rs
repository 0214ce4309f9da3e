//! Extractors whose rejections turn into JSON `{"error": ...}` responses
//! instead of axum's plain-text defaults.

use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum_macros::FromRequest;
use serde::Deserialize;

use crate::error::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// The `{id}` segment of `/posts/{id}`.
#[derive(Debug, Clone, Copy, Deserialize, axum_macros::FromRequestParts)]
#[serde(transparent)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PostId(pub i32);

/// The `/posts` query string. A repeated `term` keeps its first value.
#[derive(Debug, Default)]
pub struct SearchParams {
    pub term: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for SearchParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        let term = pairs
            .into_iter()
            .find(|(key, _)| key == "term")
            .map(|(_, value)| value);
        Ok(Self { term })
    }
}

impl SearchParams {
    /// The search term, if one was given and is non-empty.
    pub fn term(&self) -> Option<&str> {
        self.term.as_deref().filter(|t| !t.is_empty())
    }
}
