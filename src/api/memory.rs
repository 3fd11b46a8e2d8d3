//! In-process backend with the same semantics as the hosted one.
//!
//! Ids and timestamps are assigned here the way the backend assigns them,
//! uploads honour upsert, and public URLs are derived from the object name.
//! Used by demo mode and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, bail};
use chrono::{DateTime, Duration, Utc};

use crate::models::{Comment, CommentId, LikeEdge, Post, PostId, ProfileId, ProfileRef};

use super::{RemoteGateway, UploadOptions};

/// Base of the public URLs issued for stored objects
const PUBLIC_BASE_URL: &str = "memory://user_content";

/// A stored object
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object bytes
    pub bytes: Vec<u8>,
    /// Content type sent with the upload
    pub content_type: String,
    /// Cache directive sent with the upload
    pub cache_control: String,
}

#[derive(Default)]
struct State {
    profiles: HashMap<ProfileId, ProfileRef>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    likes: Vec<LikeEdge>,
    objects: HashMap<String, StoredObject>,
    next_id: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl State {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    /// Server clock: strictly increasing so rows created back to back still order
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp
            && now <= last
        {
            now = last + Duration::milliseconds(1);
        }
        self.last_timestamp = Some(now);
        now
    }

    fn profile(&self, id: &ProfileId) -> ProfileRef {
        self.profiles
            .get(id)
            .cloned()
            .unwrap_or_else(|| ProfileRef::new(id.clone()))
    }
}

/// Thread-safe in-memory backend
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

impl MemoryGateway {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile so posts and comments embed its name and avatar
    pub fn insert_profile(&self, profile: ProfileRef) {
        self.lock().profiles.insert(profile.id.clone(), profile);
    }

    /// Insert a post row as-is (seeding)
    pub fn insert_post(&self, post: Post) {
        let mut state = self.lock();
        state.profiles.entry(post.author.id.clone()).or_insert_with(|| post.author.clone());
        state.posts.push(post);
    }

    /// Insert a comment row as-is (seeding)
    pub fn insert_comment(&self, comment: Comment) {
        let mut state = self.lock();
        if let Some(post) = state.posts.iter_mut().find(|p| p.id == comment.post_id) {
            post.comment_count += 1;
        }
        state.comments.push(comment);
    }

    /// Record a like on a comment
    pub fn like_comment(&self, comment_id: &CommentId, profile_id: &ProfileId) {
        let edge = LikeEdge {
            comment_id: comment_id.clone(),
            profile_id: profile_id.clone(),
        };
        let mut state = self.lock();
        if !state.likes.contains(&edge) {
            state.likes.push(edge);
        }
    }

    /// Look up a stored object
    pub fn object(&self, object_name: &str) -> Option<StoredObject> {
        self.lock().objects.get(object_name).cloned()
    }

    /// Names of all stored objects
    pub fn object_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().objects.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of post rows
    pub fn post_count(&self) -> usize {
        self.lock().posts.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RemoteGateway for MemoryGateway {
    async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<Post>> {
        let state = self.lock();
        let mut posts = state.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<Post>> {
        Ok(self.lock().posts.iter().find(|p| &p.id == id).cloned())
    }

    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>> {
        let state = self.lock();
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| &c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn create_comment(
        &self,
        post_id: &PostId,
        content: &str,
        author: &ProfileId,
    ) -> Result<CommentId> {
        let mut state = self.lock();
        let Some(post) = state.posts.iter_mut().find(|p| &p.id == post_id) else {
            bail!("post {post_id} does not exist");
        };
        post.comment_count += 1;

        let id = CommentId::new(state.next_id());
        let comment = Comment {
            id: id.clone(),
            post_id: post_id.clone(),
            author: state.profile(author),
            content: content.to_string(),
            created_at: state.now(),
        };
        state.comments.push(comment);
        Ok(id)
    }

    async fn create_post(
        &self,
        image_url: &str,
        description: &str,
        author: &ProfileId,
    ) -> Result<PostId> {
        if image_url.trim().is_empty() {
            bail!("image_url is required");
        }

        let mut state = self.lock();
        let id = PostId::new(state.next_id());
        let post = Post {
            id: id.clone(),
            created_at: state.now(),
            image_url: image_url.to_string(),
            image_blurhash: None,
            description: description.to_string(),
            author: state.profile(author),
            comment_count: 0,
        };
        state.posts.push(post);
        Ok(id)
    }

    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: &UploadOptions,
    ) -> Result<()> {
        let mut state = self.lock();
        if !options.upsert && state.objects.contains_key(object_name) {
            bail!("The resource already exists");
        }

        state.objects.insert(
            object_name.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
                cache_control: options.cache_control.clone(),
            },
        );
        Ok(())
    }

    fn public_url(&self, object_name: &str) -> String {
        format!("{PUBLIC_BASE_URL}/{}", urlencoding::encode(object_name))
    }

    async fn list_comment_likers(&self, comment_id: &CommentId) -> Result<Vec<ProfileRef>> {
        let state = self.lock();
        Ok(state
            .likes
            .iter()
            .filter(|edge| &edge.comment_id == comment_id)
            .map(|edge| state.profile(&edge.profile_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_created_rows_are_ordered() {
        let gateway = MemoryGateway::new();
        let author = ProfileId::new("u1");

        let first = gateway.create_post("memory://a", "", &author).await.unwrap();
        let second = gateway.create_post("memory://b", "", &author).await.unwrap();

        let posts = gateway.list_posts(None).await.unwrap();
        assert_eq!(posts[0].id, second);
        assert_eq!(posts[1].id, first);
        assert!(posts[0].created_at > posts[1].created_at);

        let limited = gateway.list_posts(Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_upsert() {
        let gateway = MemoryGateway::new();
        let upsert = UploadOptions::default();
        let strict = UploadOptions {
            upsert: false,
            ..UploadOptions::default()
        };

        gateway.upload("a.jpg", vec![1], "image/jpeg", &upsert).await.unwrap();
        gateway.upload("a.jpg", vec![2], "image/jpeg", &upsert).await.unwrap();
        assert_eq!(gateway.object("a.jpg").unwrap().bytes, vec![2]);

        assert!(gateway.upload("a.jpg", vec![3], "image/jpeg", &strict).await.is_err());
        assert_eq!(gateway.object("a.jpg").unwrap().bytes, vec![2]);
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_fails() {
        let gateway = MemoryGateway::new();
        let result = gateway
            .create_comment(&PostId::new("404"), "hello", &ProfileId::new("u1"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_likers_embed_profiles() {
        let gateway = MemoryGateway::new();
        gateway.insert_profile(ProfileRef {
            id: ProfileId::new("u2"),
            name: Some("Bea".to_string()),
            avatar_url: None,
        });
        let comment = CommentId::new("c1");
        gateway.like_comment(&comment, &ProfileId::new("u2"));
        gateway.like_comment(&comment, &ProfileId::new("u2"));
        gateway.like_comment(&comment, &ProfileId::new("u3"));

        let likers = gateway.list_comment_likers(&comment).await.unwrap();
        assert_eq!(likers.len(), 2);
        assert_eq!(likers[0].display_name(), "Bea");
        assert!(likers[1].needs_onboarding());
    }
}
