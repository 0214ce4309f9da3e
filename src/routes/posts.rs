use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, ErrorBody};
use crate::helpers::{JsonBody, PostId, SearchParams};
use crate::models::post::{
    utc_timestamp, CreatePost, Post, UpdatePost, UpdatedPost, REQUIRED_ON_UPDATE,
};
use crate::services::posts::PostService;

pub type PostsRouteState = Arc<dyn PostService>;

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

#[tracing::instrument(skip_all)]
async fn create_post(
    State(svc): State<PostsRouteState>,
    JsonBody(payload): JsonBody<CreatePost>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let new_post = payload
        .validate()
        .map_err(|msg| AppError::Validation(msg.to_owned()))?;

    let post = svc.create_post(&new_post).await?;
    info!(id = post.id, "post created");

    Ok((StatusCode::CREATED, Json(post)))
}

#[tracing::instrument(skip_all, fields(id = id))]
async fn update_post(
    State(svc): State<PostsRouteState>,
    PostId(id): PostId,
    JsonBody(payload): JsonBody<UpdatePost>,
) -> Result<Json<UpdatedPost>, AppError> {
    if !payload.names_required_field() {
        return Err(AppError::Validation(REQUIRED_ON_UPDATE.to_owned()));
    }

    let now = Utc::now().naive_utc();
    if !svc.update_post(id, &payload.changes(now)).await? {
        return Err(AppError::NotFound);
    }
    info!("post updated");

    Ok(Json(UpdatedPost {
        id,
        fields: payload,
        updated_at: utc_timestamp(now),
    }))
}

// 204 is kept for parity with existing clients; hyper drops the body on the wire.
#[tracing::instrument(skip_all, fields(id = id))]
async fn delete_post(
    State(svc): State<PostsRouteState>,
    PostId(id): PostId,
) -> Result<(StatusCode, Json<MessageBody>), AppError> {
    if !svc.delete_post(id).await? {
        return Err(AppError::NotFound);
    }
    info!("post deleted");

    Ok((
        StatusCode::NO_CONTENT,
        Json(MessageBody {
            message: "Post deleted successfully",
        }),
    ))
}

#[tracing::instrument(skip_all, fields(id = id))]
async fn get_post(
    State(svc): State<PostsRouteState>,
    PostId(id): PostId,
) -> Result<Json<Post>, AppError> {
    svc.get_post(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

#[tracing::instrument(skip_all)]
async fn list_posts(
    State(svc): State<PostsRouteState>,
    params: SearchParams,
) -> Result<Json<Vec<Post>>, AppError> {
    let posts = svc.list_posts(params.term()).await?;
    Ok(Json(posts))
}

async fn method_not_allowed() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::new("Method not allowed")),
    )
}

pub fn router() -> Router<PostsRouteState> {
    Router::new()
        .route(
            "/",
            get(list_posts)
                .post(create_post)
                .fallback(method_not_allowed),
        )
        .route(
            "/:id",
            get(get_post)
                .put(update_post)
                .delete(delete_post)
                .fallback(method_not_allowed),
        )
}
