use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use axum::async_trait;
use dashmap::DashMap;

use super::{search_pattern, PostService};
use crate::models::post::{NewPost, Post, PostChanges, PostRow};

/// Keeps rows in process memory. Used when `store = "memory"` and by the
/// router tests. Rows are stored exactly as the `posts` table would hold
/// them, so tags go through the same comma encoding.
#[derive(Clone, Default)]
pub struct PostServiceMem {
    rows: Arc<DashMap<i32, PostRow>>,
    last_id: Arc<AtomicI32>,
}

impl PostServiceMem {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostService<anyhow::Error> for PostServiceMem {
    async fn create_post(&self, new_post: &NewPost) -> anyhow::Result<Post> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = PostRow {
            id,
            title: new_post.title.clone(),
            content: new_post.content.clone(),
            category: new_post.category.clone(),
            tags: Some(new_post.tags.clone()),
            updated_at: None,
        };
        self.rows.insert(id, row.clone());
        Ok(row.into())
    }

    async fn get_post(&self, id: i32) -> anyhow::Result<Option<Post>> {
        Ok(self.rows.get(&id).map(|row| row.value().clone().into()))
    }

    async fn list_posts(&self, term: Option<&str>) -> anyhow::Result<Vec<Post>> {
        let pattern = term.map(search_pattern);
        let mut rows: Vec<PostRow> = self
            .rows
            .iter()
            .filter(|row| match &pattern {
                Some(pattern) => [&row.title, &row.content, &row.category]
                    .into_iter()
                    .any(|col| like(&col.to_lowercase(), pattern)),
                None => true,
            })
            .map(|row| row.value().clone())
            .collect();
        rows.sort_by_key(|row| row.id);

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn update_post(&self, id: i32, changes: &PostChanges) -> anyhow::Result<bool> {
        match self.rows.get_mut(&id) {
            Some(mut row) => {
                changes.apply_to(row.value_mut());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, id: i32) -> anyhow::Result<bool> {
        Ok(self.rows.remove(&id).is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    AnyRun,
    AnyOne,
    Literal(char),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::AnyRun,
            '_' => Token::AnyOne,
            // MySQL's default LIKE escape; a trailing backslash is literal
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            c => Token::Literal(c),
        });
    }
    tokens
}

/// SQL `LIKE` matching: `%` is any run of characters, `_` exactly one.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let tokens = tokenize(pattern);

    let (mut t, mut p) = (0, 0);
    // position of the last `%` and the text index it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(Token::AnyRun) => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(Token::AnyOne) => {
                t += 1;
                p += 1;
            }
            Some(Token::Literal(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star, absorbed)) => {
                    backtrack = Some((star, absorbed + 1));
                    p = star + 1;
                    t = absorbed + 1;
                }
                None => return false,
            },
        }
    }

    tokens[p..].iter().all(|tok| *tok == Token::AnyRun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn new_post(title: &str, category: &str) -> NewPost {
        NewPost {
            title: title.into(),
            content: "body".into(),
            category: category.into(),
            tags: "a,b".into(),
        }
    }

    #[test]
    fn like_wildcards() {
        assert!(like("hello world", "%lo w%"));
        assert!(like("abc", "a_c"));
        assert!(!like("abbc", "a_c"));
        assert!(like("abbc", "a%c"));
        assert!(like("", "%"));
        assert!(!like("", "_"));
        assert!(like("aaa", "%a"));
        assert!(!like("abc", "%d%"));
    }

    #[test]
    fn like_escapes() {
        assert!(like("50%", "50\\%"));
        assert!(!like("500", "50\\%"));
        assert!(like("a_b", "a\\_b"));
        assert!(!like("axb", "a\\_b"));
    }

    #[tokio::test]
    async fn ids_are_assigned_in_order() {
        let svc = PostServiceMem::new();
        let first = svc.create_post(&new_post("one", "x")).await.unwrap();
        let second = svc.create_post(&new_post("two", "x")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.tags, vec!["a", "b"]);
        assert!(first.updated_at.is_none());
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let svc = PostServiceMem::new();
        let first = svc.create_post(&new_post("one", "x")).await.unwrap();
        assert!(svc.delete_post(first.id).await.unwrap());
        assert!(!svc.delete_post(first.id).await.unwrap());

        let second = svc.create_post(&new_post("two", "x")).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_across_columns() {
        let svc = PostServiceMem::new();
        svc.create_post(&new_post("Cats", "pets")).await.unwrap();
        svc.create_post(&new_post("Dogs", "PETS")).await.unwrap();
        svc.create_post(&new_post("Rust", "code")).await.unwrap();

        let pets = svc.list_posts(Some("Pet")).await.unwrap();
        assert_eq!(pets.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);

        let all = svc.list_posts(None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn update_of_missing_row_reports_false() {
        let svc = PostServiceMem::new();
        let changes = PostChanges {
            title: Some("t".into()),
            content: None,
            category: None,
            tags: None,
            updated_at: Utc::now().naive_utc(),
        };
        assert!(!svc.update_post(42, &changes).await.unwrap());
    }
}
