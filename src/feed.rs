//! The home feed: ordered posts and the post currently in view.

use std::collections::HashSet;
use std::sync::Arc;

use crate::api::RemoteGateway;
use crate::config::FeedConfig;
use crate::error::{Error, Result};
use crate::models::{Post, PostId};

/// Holds the session's posts, newest first
pub struct FeedStore<G> {
    gateway: Arc<G>,
    config: FeedConfig,
    posts: Vec<Post>,
    visible: Option<PostId>,
}

impl<G: RemoteGateway> FeedStore<G> {
    /// Create an empty feed
    pub fn new(gateway: Arc<G>, config: FeedConfig) -> Self {
        Self {
            gateway,
            config,
            posts: Vec::new(),
            visible: None,
        }
    }

    /// Fetch the feed and replace the local posts.
    ///
    /// On failure the previous posts stay in place.
    pub async fn refresh(&mut self) -> Result<&[Post]> {
        let fetched = self
            .gateway
            .list_posts(self.config.limit())
            .await
            .map_err(|e| Error::fetch("posts", &e))?;

        let posts = normalize(fetched);
        tracing::debug!("Feed refreshed with {} posts", posts.len());

        self.posts = posts;
        if !self.visible.as_ref().is_some_and(|id| self.post(id).is_some()) {
            self.visible = self.posts.first().map(|p| p.id.clone());
        }

        Ok(&self.posts)
    }

    /// Posts, newest first
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Whether nothing has been loaded
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Find a loaded post
    pub fn post(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|p| &p.id == id)
    }

    /// Find a post locally, falling back to the backend.
    ///
    /// Returns `None` when the post does not exist (anymore).
    pub async fn resolve(&self, id: &PostId) -> Result<Option<Post>> {
        if let Some(post) = self.post(id) {
            return Ok(Some(post.clone()));
        }

        self.gateway
            .get_post(id)
            .await
            .map_err(|e| Error::fetch("post", &e))
    }

    /// Record the post currently in view
    pub fn set_visible(&mut self, id: PostId) {
        self.visible = Some(id);
    }

    /// The post in view, or the newest post when the recorded one is not loaded
    pub fn visible_post(&self) -> Option<&Post> {
        self.visible
            .as_ref()
            .and_then(|id| self.post(id))
            .or_else(|| self.posts.first())
    }

    /// Low-quality rendition of the visible post for the ambient background
    pub fn background_preview_url(&self) -> Option<String> {
        self.visible_post().map(|post| {
            post.preview_url(
                self.config.preview_size,
                self.config.preview_size,
                self.config.preview_quality,
            )
        })
    }
}

/// Sort newest first (ties by id), drop duplicates and posts without an image
fn normalize(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

    let mut seen = HashSet::new();
    posts.retain(|post| {
        if post.image_url.trim().is_empty() {
            tracing::warn!("Skipping post {} without an image", post.id);
            return false;
        }
        seen.insert(post.id.clone())
    });
    posts
}
