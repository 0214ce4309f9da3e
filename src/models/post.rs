use chrono::{NaiveDateTime, SecondsFormat, TimeZone, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize, Serializer};

pub const REQUIRED_ON_CREATE: &str = "Title, content, and category are required";
pub const REQUIRED_ON_UPDATE: &str = "At least one of title, content, and category is required";

const TAG_SEPARATOR: &str = ",";

/// Joins tags into the single string stored in the `tags` column.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(TAG_SEPARATOR)
}

/// Splits a stored `tags` value back into a list. NULL and the empty string
/// both decode to no tags.
pub fn split_tags(stored: Option<&str>) -> Vec<String> {
    match stored {
        None | Some("") => Vec::new(),
        Some(s) => s.split(TAG_SEPARATOR).map(str::to_owned).collect(),
    }
}

/// RFC 3339 in UTC with a trailing `Z`, e.g. `2024-05-01T10:22:03.123456Z`.
pub fn utc_timestamp(at: NaiveDateTime) -> String {
    Utc.from_utc_datetime(&at)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn serialize_timestamp<S: Serializer>(at: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
    match at {
        Some(at) => s.serialize_str(&utc_timestamp(*at)),
        None => s.serialize_none(),
    }
}

// a row as it sits in the `posts` table
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::mysql::Mysql))]
pub struct PostRow {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

// the output of the read handlers and `create_post`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(rename = "updatedAt", serialize_with = "serialize_timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            tags: split_tags(row.tags.as_deref()),
            id: row.id,
            title: row.title,
            content: row.content,
            category: row.category,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::mysql::Mysql))]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: String,
}

// the input to our `create_post` handler
#[derive(Debug, Default, Deserialize)]
pub struct CreatePost {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl CreatePost {
    /// Rejects the payload unless `title`, `content` and `category` are all
    /// present and non-empty.
    pub fn validate(self) -> Result<NewPost, &'static str> {
        fn required(field: Option<String>) -> Result<String, &'static str> {
            field.filter(|v| !v.is_empty()).ok_or(REQUIRED_ON_CREATE)
        }

        Ok(NewPost {
            title: required(self.title)?,
            content: required(self.content)?,
            category: required(self.category)?,
            tags: join_tags(&self.tags.unwrap_or_default()),
        })
    }
}

// the input to our `update_post` handler; a JSON null counts as absent
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdatePost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl UpdatePost {
    /// Presence check only: `{"title": ""}` passes.
    pub fn names_required_field(&self) -> bool {
        self.title.is_some() || self.content.is_some() || self.category.is_some()
    }

    pub fn changes(&self, updated_at: NaiveDateTime) -> PostChanges {
        PostChanges {
            title: self.title.clone(),
            content: self.content.clone(),
            category: self.category.clone(),
            tags: self.tags.as_deref().map(join_tags),
            updated_at,
        }
    }
}

/// Columns written by an update. `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::mysql::Mysql))]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl PostChanges {
    pub fn apply_to(&self, row: &mut PostRow) {
        if let Some(title) = &self.title {
            row.title.clone_from(title);
        }
        if let Some(content) = &self.content {
            row.content.clone_from(content);
        }
        if let Some(category) = &self.category {
            row.category.clone_from(category);
        }
        if let Some(tags) = &self.tags {
            row.tags = Some(tags.clone());
        }
        row.updated_at = Some(self.updated_at);
    }
}

// the output of `update_post`: the submitted fields, not a re-read
#[derive(Debug, Serialize)]
pub struct UpdatedPost {
    pub id: i32,
    #[serde(flatten)]
    pub fields: UpdatePost,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}
