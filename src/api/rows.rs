//! Parsing of raw backend rows into strict models.
//!
//! The backend returns loosely-typed JSON: ids may be numbers or strings,
//! joined profiles may be null, aggregates come back as nested arrays. Every
//! row goes through here before the rest of the crate sees it; rows that do
//! not satisfy the model invariants are dropped with a warning.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Comment, CommentId, Post, PostId, ProfileId, ProfileRef};

/// Why a row could not be turned into a model
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    /// The row does not have the expected shape
    #[error("malformed row: {0}")]
    Malformed(String),

    /// A required field is null or missing
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// An identifier is neither a non-empty string nor a number
    #[error("invalid identifier in `{0}`")]
    InvalidId(&'static str),

    /// A timestamp could not be parsed
    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),
}

/// A raw row shape that maps onto a model
pub trait Row: for<'de> Deserialize<'de> {
    /// The strict model produced from the row
    type Model;

    /// Label used in logs
    const KIND: &'static str;

    /// Validate and convert
    fn into_model(self) -> Result<Self::Model, RowError>;
}

/// Parse a single JSON value as `R`
pub fn parse_row<R: Row>(value: Value) -> Result<R::Model, RowError> {
    let row: R = serde_json::from_value(value).map_err(|e| RowError::Malformed(e.to_string()))?;
    row.into_model()
}

/// Parse a list of rows, dropping (and logging) the invalid ones
pub fn parse_rows<R: Row>(values: Vec<Value>) -> Vec<R::Model> {
    values
        .into_iter()
        .filter_map(|value| match parse_row::<R>(value) {
            Ok(model) => Some(model),
            Err(e) => {
                tracing::warn!("Dropping invalid {} row: {e}", R::KIND);
                None
            }
        })
        .collect()
}

// ==================== Row Types ====================

/// `posts` row with the joined author and comment count
#[derive(Debug, Deserialize)]
pub struct PostRow {
    id: Value,
    created_at: Option<String>,
    image_url: Option<String>,
    #[serde(default)]
    image_blurhash: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default)]
    author: Option<ProfileRow>,
    #[serde(default)]
    comments: Option<Vec<CountRow>>,
}

/// `comments` row with the joined author
#[derive(Debug, Deserialize)]
pub struct CommentRow {
    id: Value,
    post_id: Value,
    content: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default)]
    author: Option<ProfileRow>,
}

/// `comments_likes` row with the joined liker profile
#[derive(Debug, Deserialize)]
pub struct LikerRow {
    profiles: Option<ProfileRow>,
}

/// Row returned by an insert with `return=representation`
#[derive(Debug, Deserialize)]
pub struct InsertedRow {
    id: Value,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: u32,
}

impl Row for PostRow {
    type Model = Post;
    const KIND: &'static str = "post";

    fn into_model(self) -> Result<Post, RowError> {
        let image_url = non_empty(self.image_url).ok_or(RowError::MissingField("image_url"))?;
        let created_at = parse_timestamp(self.created_at.as_deref())?;
        let author = resolve_author(self.author, self.user_id.as_ref())?;

        Ok(Post {
            id: PostId::new(parse_id(&self.id, "id")?),
            created_at,
            image_url,
            image_blurhash: non_empty(self.image_blurhash),
            description: self.description.unwrap_or_default(),
            author,
            comment_count: self
                .comments
                .and_then(|counts| counts.first().map(|c| c.count))
                .unwrap_or(0),
        })
    }
}

impl Row for CommentRow {
    type Model = Comment;
    const KIND: &'static str = "comment";

    fn into_model(self) -> Result<Comment, RowError> {
        let content = non_empty(self.content).ok_or(RowError::MissingField("content"))?;

        Ok(Comment {
            id: CommentId::new(parse_id(&self.id, "id")?),
            post_id: PostId::new(parse_id(&self.post_id, "post_id")?),
            author: resolve_author(self.author, self.user_id.as_ref())?,
            content,
            created_at: parse_timestamp(self.created_at.as_deref())?,
        })
    }
}

impl Row for LikerRow {
    type Model = ProfileRef;
    const KIND: &'static str = "like";

    fn into_model(self) -> Result<ProfileRef, RowError> {
        self.profiles
            .ok_or(RowError::MissingField("profiles"))?
            .into_profile()
    }
}

impl Row for InsertedRow {
    type Model = String;
    const KIND: &'static str = "inserted";

    fn into_model(self) -> Result<String, RowError> {
        parse_id(&self.id, "id")
    }
}

impl ProfileRow {
    fn into_profile(self) -> Result<ProfileRef, RowError> {
        Ok(ProfileRef {
            id: ProfileId::new(parse_id(&self.id, "author.id")?),
            name: non_empty(self.name),
            avatar_url: non_empty(self.avatar_url),
        })
    }
}

// ==================== Field Parsing ====================

fn resolve_author(author: Option<ProfileRow>, user_id: Option<&Value>) -> Result<ProfileRef, RowError> {
    match (author, user_id) {
        (Some(author), _) => author.into_profile(),
        (None, Some(user_id)) => Ok(ProfileRef::new(parse_id(user_id, "user_id")?)),
        (None, None) => Err(RowError::MissingField("author")),
    }
}

fn parse_id(value: &Value, field: &'static str) -> Result<String, RowError> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(RowError::InvalidId(field)),
    }
}

/// Backend timestamps are RFC 3339, or naive UTC for `timestamp` columns
fn parse_timestamp(raw: Option<&str>) -> Result<DateTime<Utc>, RowError> {
    let raw = raw.ok_or(RowError::MissingField("created_at"))?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|_| RowError::InvalidTimestamp(raw.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_post_row_with_numeric_ids() {
        let post = parse_row::<PostRow>(json!({
            "id": 42,
            "created_at": "2026-03-01T10:00:00.123456+00:00",
            "image_url": "https://cdn.example/a.jpg",
            "image_blurhash": "LEHV6nWB2yk8pyo0adR*.7kCMdnj",
            "description": null,
            "user_id": "u1",
            "author": { "id": "u1", "name": null, "avatar_url": "https://cdn.example/u1.png" },
            "comments": [{ "count": 7 }]
        }))
        .unwrap();

        assert_eq!(post.id.as_str(), "42");
        assert_eq!(post.description, "");
        assert_eq!(post.comment_count, 7);
        assert_eq!(post.author.name, None);
        assert_eq!(post.author.avatar_url.as_deref(), Some("https://cdn.example/u1.png"));
        assert_eq!(post.created_at.date_naive().to_string(), "2026-03-01");
    }

    #[test]
    fn test_post_row_falls_back_to_user_id() {
        let post = parse_row::<PostRow>(json!({
            "id": "p1",
            "created_at": "2026-03-01T10:00:00",
            "image_url": "https://cdn.example/a.jpg",
            "user_id": 9
        }))
        .unwrap();

        assert_eq!(post.author.id.as_str(), "9");
        assert_eq!(post.comment_count, 0);
        assert!(post.image_blurhash.is_none());
        assert_eq!(post.created_at, Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_post_row_rejects_missing_image() {
        let err = parse_row::<PostRow>(json!({
            "id": 1,
            "created_at": "2026-03-01T10:00:00Z",
            "image_url": "  ",
            "user_id": "u1"
        }))
        .unwrap_err();

        assert_eq!(err, RowError::MissingField("image_url"));
    }

    #[test]
    fn test_parse_rows_drops_invalid() {
        let rows = vec![
            json!({ "id": 1, "post_id": 5, "content": "nice", "created_at": "2026-03-01T10:00:00Z", "user_id": "u1" }),
            json!({ "id": 2, "post_id": 5, "content": "   ", "created_at": "2026-03-01T10:00:00Z", "user_id": "u1" }),
            json!({ "id": 3, "post_id": 5, "content": "late", "created_at": "yesterday", "user_id": "u1" }),
            json!({ "id": null, "post_id": 5, "content": "x", "created_at": "2026-03-01T10:00:00Z", "user_id": "u1" }),
            json!("not an object"),
        ];

        let comments = parse_rows::<CommentRow>(rows);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id.as_str(), "1");
        assert_eq!(comments[0].post_id.as_str(), "5");
    }

    #[test]
    fn test_liker_rows() {
        let likers = parse_rows::<LikerRow>(vec![
            json!({ "profiles": { "id": "u1", "name": "Ana", "avatar_url": null } }),
            json!({ "profiles": null }),
        ]);

        assert_eq!(likers.len(), 1);
        assert_eq!(likers[0].display_name(), "Ana");
    }
}
