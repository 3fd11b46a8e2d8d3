//! Hosted backend client (PostgREST rows + object storage)

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;

use crate::config::BackendConfig;
use crate::models::{Comment, CommentId, Post, PostId, ProfileId, ProfileRef};

use super::rows::{CommentRow, InsertedRow, LikerRow, PostRow, parse_row, parse_rows};
use super::{RemoteGateway, UploadOptions};

/// Columns selected for posts, with the author and comment count embedded
const POST_SELECT: &str = "*,author:profiles(id,name,avatar_url),comments(count)";

/// Columns selected for comments, with the author embedded
const COMMENT_SELECT: &str = "*,author:profiles(id,name,avatar_url)";

/// Columns selected for comment likes (liker profile only)
const LIKER_SELECT: &str = "profiles(id,name,avatar_url)";

/// Hosted backend client
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    bucket: String,
}

impl SupabaseClient {
    /// Create a client from backend configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            bucket: config.bucket.clone(),
        })
    }

    /// Build REST (rows) URL
    fn rest_url(&self, table: &str, query: &str) -> String {
        format!("{}/rest/v1/{}?{}", self.base_url, table, query)
    }

    /// Build storage URL for an object
    fn storage_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(object_name)
        )
    }

    /// Attach the API key and bearer token
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {token}"))
    }

    /// Run a row query and return the raw JSON rows
    async fn select(&self, table: &str, query: &str) -> Result<Vec<Value>> {
        let url = self.rest_url(table, query);
        tracing::debug!("GET {url}");

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .with_context(|| format!("Failed to query {table}"))?;

        let response = ensure_success(response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {table} response"))
    }

    /// Insert a row and return the id the backend assigned
    async fn insert<T: Serialize>(&self, table: &str, row: &T) -> Result<String> {
        let url = self.rest_url(table, "select=id");
        tracing::debug!("POST {url}");

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .with_context(|| format!("Failed to insert into {table}"))?;

        let response = ensure_success(response).await?;

        let rows: Vec<Value> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {table} insert response"))?;

        let row = rows
            .into_iter()
            .next()
            .with_context(|| format!("Backend returned no row for {table} insert"))?;

        parse_row::<InsertedRow>(row).with_context(|| format!("Invalid {table} insert response"))
    }
}

impl RemoteGateway for SupabaseClient {
    async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<Post>> {
        let mut query = format!(
            "select={}&order=created_at.desc",
            urlencoding::encode(POST_SELECT)
        );
        if let Some(limit) = limit {
            query.push_str(&format!("&limit={limit}"));
        }

        let rows = self.select("posts", &query).await?;
        Ok(parse_rows::<PostRow>(rows))
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<Post>> {
        let query = format!(
            "select={}&id=eq.{}&limit=1",
            urlencoding::encode(POST_SELECT),
            urlencoding::encode(id.as_str())
        );

        let rows = self.select("posts", &query).await?;
        match rows.into_iter().next() {
            Some(row) => parse_row::<PostRow>(row)
                .map(Some)
                .context("Invalid post row"),
            None => Ok(None),
        }
    }

    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>> {
        let query = format!(
            "select={}&post_id=eq.{}&order=created_at.asc",
            urlencoding::encode(COMMENT_SELECT),
            urlencoding::encode(post_id.as_str())
        );

        let rows = self.select("comments", &query).await?;
        Ok(parse_rows::<CommentRow>(rows))
    }

    async fn create_comment(
        &self,
        post_id: &PostId,
        content: &str,
        author: &ProfileId,
    ) -> Result<CommentId> {
        let row = NewCommentRow {
            post_id: post_id.as_str(),
            content,
            user_id: author.as_str(),
        };

        self.insert("comments", &row).await.map(CommentId::new)
    }

    async fn create_post(
        &self,
        image_url: &str,
        description: &str,
        author: &ProfileId,
    ) -> Result<PostId> {
        let row = NewPostRow {
            image_url,
            description,
            user_id: author.as_str(),
        };

        self.insert("posts", &row).await.map(PostId::new)
    }

    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: &UploadOptions,
    ) -> Result<()> {
        let url = self.storage_url(object_name);
        tracing::debug!("POST {url} ({} bytes)", bytes.len());

        let response = self
            .authorized(self.client.post(&url))
            .header("Content-Type", content_type)
            .header("Cache-Control", format!("max-age={}", options.cache_control))
            .header("x-upsert", options.upsert.to_string())
            .body(bytes)
            .send()
            .await
            .context("Failed to upload object")?;

        ensure_success(response).await?;
        Ok(())
    }

    fn public_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(object_name)
        )
    }

    async fn list_comment_likers(&self, comment_id: &CommentId) -> Result<Vec<ProfileRef>> {
        let query = format!(
            "select={}&comment_id=eq.{}",
            urlencoding::encode(LIKER_SELECT),
            urlencoding::encode(comment_id.as_str())
        );

        let rows = self.select("comments_likes", &query).await?;
        Ok(parse_rows::<LikerRow>(rows))
    }
}

/// Turn non-2xx responses into errors carrying the backend's message
async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body);

    anyhow::bail!("Backend error {status}: {message}");
}

// ==================== API Types ====================

#[derive(Debug, Serialize)]
struct NewPostRow<'a> {
    image_url: &'a str,
    description: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct NewCommentRow<'a> {
    post_id: &'a str,
    content: &'a str,
    user_id: &'a str,
}
