mod db;
mod memory;

pub use db::PostServiceDb;
pub use memory::PostServiceMem;

use axum::async_trait;

use crate::models::post::{NewPost, Post, PostChanges};

/// Storage behind the `/posts` routes.
///
/// Every call borrows whatever connection it needs for the duration of the
/// call and gives it back on every exit path.
#[async_trait]
pub trait PostService<E = anyhow::Error>: Send + Sync {
    /// Inserts the post and returns it as stored, generated `id` included.
    async fn create_post(&self, post: &NewPost) -> Result<Post, E>;
    async fn get_post(&self, id: i32) -> Result<Option<Post>, E>;
    /// All posts in `id` order, optionally narrowed to those whose title,
    /// content or category contains `term`, ignoring case.
    async fn list_posts(&self, term: Option<&str>) -> Result<Vec<Post>, E>;
    /// Returns `false` when no post has this `id`.
    async fn update_post(&self, id: i32, changes: &PostChanges) -> Result<bool, E>;
    /// Returns `false` when no post has this `id`.
    async fn delete_post(&self, id: i32) -> Result<bool, E>;
}

/// The `LIKE` pattern used for a search term.
pub(crate) fn search_pattern(term: &str) -> String {
    format!("%{}%", term.to_lowercase())
}
