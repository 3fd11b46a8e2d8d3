//! Entry point for notification taps.
//!
//! A tapped notification names a post; the core turns it into a navigation
//! request for whatever layer owns screens. Whether the post still exists is
//! that layer's business, see [`open_detail`].

use serde_json::Value;
use tokio::sync::mpsc;

use crate::api::RemoteGateway;
use crate::comments::CommentThreads;
use crate::error::Result;
use crate::feed::FeedStore;
use crate::models::{Comment, Post, PostId};

/// Key of the post identifier in notification data
const POST_ID_KEY: &str = "post_id";

/// Requests for the navigation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationRequest {
    /// Show a single post with its comments
    Post(PostId),
}

/// Turns notification taps into navigation requests
#[derive(Debug, Clone)]
pub struct NotificationRouter {
    sender: mpsc::UnboundedSender<NavigationRequest>,
}

impl NotificationRouter {
    /// Create a router and the receiver the navigation layer listens on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NavigationRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Ask the navigation layer to show a post. Never fails.
    pub fn open_post(&self, post_id: impl Into<PostId>) {
        let post_id = post_id.into();
        if post_id.as_str().trim().is_empty() {
            tracing::debug!("Ignoring open request without a post id");
            return;
        }

        tracing::debug!("Opening post {post_id}");
        if self.sender.send(NavigationRequest::Post(post_id)).is_err() {
            tracing::debug!("Navigation layer is gone; dropping open request");
        }
    }

    /// Route a notification's data payload (`{"post_id": ...}`)
    pub fn handle_notification(&self, data: &Value) {
        match data.get(POST_ID_KEY) {
            Some(Value::String(id)) => self.open_post(id.as_str()),
            Some(Value::Number(id)) => self.open_post(id.to_string()),
            _ => tracing::debug!("Notification without a post id: {data}"),
        }
    }
}

/// A post with its comments, as shown on the post screen
#[derive(Debug, Clone)]
pub struct PostDetail {
    /// The post
    pub post: Post,
    /// Its comments, oldest first
    pub comments: Vec<Comment>,
}

/// Resolve a navigation target into a post and its loaded comment thread.
///
/// Returns `None` when the post no longer exists; comments are only fetched
/// for posts that do.
pub async fn open_detail<G: RemoteGateway>(
    feed: &FeedStore<G>,
    threads: &mut CommentThreads<G>,
    post_id: &PostId,
) -> Result<Option<PostDetail>> {
    let Some(post) = feed.resolve(post_id).await? else {
        tracing::info!("Post {post_id} no longer exists");
        return Ok(None);
    };

    let comments = threads.load(post_id).await?.comments().to_vec();
    Ok(Some(PostDetail { post, comments }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Call, MockGateway};
    use crate::config::FeedConfig;
    use crate::models::ProfileRef;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_open_post_emits_request() {
        let (router, mut rx) = NotificationRouter::new();
        router.open_post("42");

        assert_eq!(rx.try_recv().unwrap(), NavigationRequest::Post(PostId::new("42")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_open_missing_post_without_listener() {
        let (router, rx) = NotificationRouter::new();
        drop(rx);

        // Must complete quietly
        router.open_post("missing-id");
        router.open_post("");
    }

    #[test]
    fn test_handle_notification_payloads() {
        let (router, mut rx) = NotificationRouter::new();

        router.handle_notification(&json!({ "post_id": "abc" }));
        router.handle_notification(&json!({ "post_id": 7 }));
        router.handle_notification(&json!({ "other": 1 }));
        router.handle_notification(&json!({ "post_id": null }));

        assert_eq!(rx.try_recv().unwrap(), NavigationRequest::Post(PostId::new("abc")));
        assert_eq!(rx.try_recv().unwrap(), NavigationRequest::Post(PostId::new("7")));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_open_detail() {
        let gateway = Arc::new(MockGateway::new());
        gateway.inner.insert_post(Post {
            id: PostId::new("p1"),
            created_at: Utc::now(),
            image_url: "memory://user_content/p1.jpg".to_string(),
            image_blurhash: None,
            description: "hello".to_string(),
            author: ProfileRef::new("u1"),
            comment_count: 0,
        });
        gateway
            .inner
            .create_comment(&PostId::new("p1"), "hi", &"u2".into())
            .await
            .unwrap();

        let feed = FeedStore::new(Arc::clone(&gateway), FeedConfig::default());
        let mut threads = CommentThreads::new(Arc::clone(&gateway));

        let detail = open_detail(&feed, &mut threads, &PostId::new("p1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.post.description, "hello");
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(threads.comments(&PostId::new("p1")).len(), 1);

        let missing = open_detail(&feed, &mut threads, &PostId::new("missing-id"))
            .await
            .unwrap();
        assert!(missing.is_none());
        assert_eq!(gateway.count(Call::ListComments), 1);
    }
}
