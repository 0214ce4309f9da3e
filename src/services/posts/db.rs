use anyhow::Context;
use axum::async_trait;
use diesel::mysql::Mysql;
use diesel::prelude::*;
use diesel_async::pooled_connection::deadpool::{Hook, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncMysqlConnection, RunQueryDsl};

use super::{search_pattern, PostService};
use crate::config::DbCfg;
use crate::models::post::{NewPost, Post, PostChanges, PostRow};
use crate::schema::posts;
use crate::services;

diesel::sql_function!(fn last_insert_id() -> diesel::sql_types::Unsigned<diesel::sql_types::BigInt>);
diesel::sql_function!(fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text);

/// `SELECT` for the list endpoint, `id` ascending. With a term, keeps rows
/// whose title, content or category contains it, ignoring case.
fn list_query(term: Option<&str>) -> posts::BoxedQuery<'static, Mysql> {
    let query = posts::table.order(posts::id.asc()).into_boxed();
    match term {
        Some(term) => {
            let pattern = search_pattern(term);
            query.filter(
                lower(posts::title)
                    .like(pattern.clone())
                    .or(lower(posts::content).like(pattern.clone()))
                    .or(lower(posts::category).like(pattern)),
            )
        }
        None => query,
    }
}

#[derive(Clone)]
pub struct PostServiceDb {
    db: services::Pool,
}

impl PostServiceDb {
    pub fn new(db: services::Pool) -> Self {
        Self { db }
    }

    /// Builds the connection pool. Connections are opened lazily.
    pub fn connect(cfg: &DbCfg) -> anyhow::Result<Self> {
        let mgr = AsyncDieselConnectionManager::<AsyncMysqlConnection>::new(cfg.database_url());

        let pool = Pool::builder(mgr)
            .max_size(cfg.pool_max_size)
            .wait_timeout(Some(cfg.pool_wait_timeout()))
            .post_create(Hook::async_fn(|_conn, metrics| {
                tracing::trace!(target: "dbpool::post_create", ?metrics, "Post-create");
                Box::pin(async { Ok(()) })
            }))
            .runtime(deadpool::Runtime::Tokio1)
            .build()?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl PostService<anyhow::Error> for PostServiceDb {
    async fn create_post(&self, new_post: &NewPost) -> anyhow::Result<Post> {
        let mut conn = self.db.get().await?;

        diesel::insert_into(posts::table)
            .values(new_post)
            .execute(&mut conn)
            .await?;

        // LAST_INSERT_ID() is per connection, so this must reuse `conn`.
        let new_id: u64 = diesel::select(last_insert_id())
            .get_result(&mut conn)
            .await?;
        let new_id = i32::try_from(new_id).context("generated id out of range")?;

        let row = posts::table
            .find(new_id)
            .select(PostRow::as_select())
            .first(&mut conn)
            .await?;

        Ok(row.into())
    }

    async fn get_post(&self, id: i32) -> anyhow::Result<Option<Post>> {
        let mut conn = self.db.get().await?;

        let row = posts::table
            .find(id)
            .select(PostRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(row.map(Post::from))
    }

    async fn list_posts(&self, term: Option<&str>) -> anyhow::Result<Vec<Post>> {
        let mut conn = self.db.get().await?;

        let rows: Vec<PostRow> = list_query(term).load(&mut conn).await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn update_post(&self, id: i32, changes: &PostChanges) -> anyhow::Result<bool> {
        let mut conn = self.db.get().await?;

        let affected = diesel::update(posts::table.find(id))
            .set(changes)
            .execute(&mut conn)
            .await?;

        Ok(affected > 0)
    }

    async fn delete_post(&self, id: i32) -> anyhow::Result<bool> {
        let mut conn = self.db.get().await?;

        let affected = diesel::delete(posts::table.find(id))
            .execute(&mut conn)
            .await?;

        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use diesel::debug_query;

    use super::*;

    #[test]
    fn search_ors_lowercased_likes_across_three_columns() {
        let sql = debug_query::<Mysql, _>(&list_query(Some("Cat"))).to_string();

        assert!(sql.contains("lower(`posts`.`title`) LIKE ?"), "{sql}");
        assert!(sql.contains("lower(`posts`.`content`) LIKE ?"), "{sql}");
        assert!(sql.contains("lower(`posts`.`category`) LIKE ?"), "{sql}");
        assert_eq!(sql.matches(" OR ").count(), 2, "{sql}");
        assert_eq!(sql.matches(r#""%cat%""#).count(), 3, "{sql}");
        assert!(sql.contains("ORDER BY `posts`.`id` ASC"), "{sql}");
    }

    #[test]
    fn search_leaves_wildcards_in_the_pattern() {
        let sql = debug_query::<Mysql, _>(&list_query(Some("a_c%"))).to_string();
        assert!(sql.contains(r#""%a_c%%""#), "{sql}");
    }

    #[test]
    fn list_without_term_has_no_filter() {
        let sql = debug_query::<Mysql, _>(&list_query(None)).to_string();

        assert!(!sql.contains("WHERE"), "{sql}");
        assert!(sql.contains("ORDER BY `posts`.`id` ASC"), "{sql}");
    }

    #[test]
    fn update_sets_only_supplied_columns() {
        let changes = PostChanges {
            title: Some("Renamed".into()),
            content: None,
            category: None,
            tags: None,
            updated_at: Utc::now().naive_utc(),
        };
        let stmt = diesel::update(posts::table.find(7)).set(&changes);
        let sql = debug_query::<Mysql, _>(&stmt).to_string();

        assert!(sql.starts_with("UPDATE `posts` SET"), "{sql}");
        assert!(sql.contains("`title` = ?"), "{sql}");
        assert!(sql.contains("`updatedAt` = ?"), "{sql}");
        assert!(!sql.contains("`content`"), "{sql}");
        assert!(!sql.contains("`category`"), "{sql}");
        assert!(!sql.contains("`tags`"), "{sql}");
        assert!(sql.contains("`posts`.`id` = ?"), "{sql}");
    }

    #[test]
    fn update_with_tags_writes_the_joined_string() {
        let changes = PostChanges {
            title: None,
            content: Some("body".into()),
            category: None,
            tags: Some("a,b".into()),
            updated_at: Utc::now().naive_utc(),
        };
        let stmt = diesel::update(posts::table.find(7)).set(&changes);
        let sql = debug_query::<Mysql, _>(&stmt).to_string();

        assert!(sql.contains("`content` = ?"), "{sql}");
        assert!(sql.contains("`tags` = ?"), "{sql}");
        assert!(sql.contains(r#""a,b""#), "{sql}");
        assert!(!sql.contains("`title`"), "{sql}");
    }
}
