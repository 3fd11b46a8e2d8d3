//! Comment threads, one per post, created on demand.
//!
//! Submitting a comment reloads the whole thread from the backend instead of
//! inserting locally, so the thread always matches the server's ids,
//! timestamps and comments made concurrently by others.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::api::RemoteGateway;
use crate::error::{Error, Result};
use crate::models::{Comment, CommentId, PostId, ProfileId, ProfileRef};

/// The loaded comments of one post, oldest first
#[derive(Debug, Clone)]
pub struct CommentThread {
    post_id: PostId,
    comments: Vec<Comment>,
}

impl CommentThread {
    /// Post this thread belongs to
    pub const fn post_id(&self) -> &PostId {
        &self.post_id
    }

    /// Comments, oldest first
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Number of comments
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// Whether nobody commented yet
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

/// Owns the comment threads of the posts being displayed
pub struct CommentThreads<G> {
    gateway: Arc<G>,
    threads: HashMap<PostId, CommentThread>,
}

impl<G: RemoteGateway> CommentThreads<G> {
    /// Create an empty store
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            threads: HashMap::new(),
        }
    }

    /// Fetch all comments of a post and replace its thread.
    ///
    /// On failure the previous thread (if any) stays in place.
    pub async fn load(&mut self, post_id: &PostId) -> Result<&CommentThread> {
        let mut comments = self
            .gateway
            .list_comments(post_id)
            .await
            .map_err(|e| Error::fetch("comments", &e))?;

        comments.retain(|c| &c.post_id == post_id);
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let mut seen = HashSet::new();
        comments.retain(|c| seen.insert(c.id.clone()));
        tracing::debug!("Loaded {} comments for post {post_id}", comments.len());

        let thread = CommentThread {
            post_id: post_id.clone(),
            comments,
        };
        Ok(self
            .threads
            .entry(post_id.clone())
            .insert_entry(thread)
            .into_mut())
    }

    /// Post a comment as `author`, then reload the thread.
    ///
    /// Blank content is rejected before any network call. An `Ok` means the
    /// comment was created; callers clear their input only then. A failed
    /// reload after a successful create still returns the new id and keeps
    /// the previous thread.
    pub async fn submit(
        &mut self,
        post_id: &PostId,
        content: &str,
        author: &ProfileId,
    ) -> Result<CommentId> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation("Comment cannot be empty".to_string()));
        }

        let comment_id = self
            .gateway
            .create_comment(post_id, content, author)
            .await
            .map_err(|e| Error::create("comment", &e))?;
        tracing::debug!("Created comment {comment_id} on post {post_id}");

        if let Err(e) = self.load(post_id).await {
            tracing::warn!("Comment {comment_id} created but reloading post {post_id} failed: {e}");
        }
        Ok(comment_id)
    }

    /// The loaded thread of a post
    pub fn thread(&self, post_id: &PostId) -> Option<&CommentThread> {
        self.threads.get(post_id)
    }

    /// Loaded comments of a post (empty when not loaded)
    pub fn comments(&self, post_id: &PostId) -> &[Comment] {
        match self.thread(post_id) {
            Some(thread) => thread.comments(),
            None => &[],
        }
    }

    /// Forget the thread of a post that is no longer displayed
    pub fn evict(&mut self, post_id: &PostId) -> bool {
        self.threads.remove(post_id).is_some()
    }

    /// Keep only the threads of the given posts
    pub fn retain<'a>(&mut self, displayed: impl IntoIterator<Item = &'a PostId>) {
        let displayed: HashSet<&PostId> = displayed.into_iter().collect();
        self.threads.retain(|id, _| displayed.contains(id));
    }

    /// Profiles that liked a comment
    pub async fn likers(&self, comment_id: &CommentId) -> Result<Vec<ProfileRef>> {
        let mut likers = self
            .gateway
            .list_comment_likers(comment_id)
            .await
            .map_err(|e| Error::fetch("likes", &e))?;

        let mut seen = HashSet::new();
        likers.retain(|profile| seen.insert(profile.id.clone()));
        Ok(likers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Call, MockGateway};
    use crate::models::{Post, ProfileRef};
    use chrono::{TimeZone, Utc};
    use tokio_test::{assert_err, assert_ok};

    fn seeded() -> (Arc<MockGateway>, PostId) {
        let gateway = Arc::new(MockGateway::new());
        let post_id = PostId::new("p1");
        gateway.inner.insert_post(Post {
            id: post_id.clone(),
            created_at: Utc::now(),
            image_url: "memory://user_content/p1.jpg".to_string(),
            image_blurhash: None,
            description: String::new(),
            author: ProfileRef::new("u1"),
            comment_count: 0,
        });
        (gateway, post_id)
    }

    fn comment(id: &str, post: &str, t: i64) -> Comment {
        Comment {
            id: CommentId::new(id),
            post_id: PostId::new(post),
            author: ProfileRef::new("u1"),
            content: format!("comment {id}"),
            created_at: Utc.timestamp_opt(t, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_blank_submissions_never_reach_network() {
        let (gateway, post_id) = seeded();
        let mut threads = CommentThreads::new(Arc::clone(&gateway));
        assert_ok!(threads.submit(&post_id, "first", &"u1".into()).await);
        let before = threads.comments(&post_id).to_vec();
        let calls_before = gateway.calls().len();

        for blank in ["", "   ", "\n\t"] {
            let err = assert_err!(threads.submit(&post_id, blank, &"u1".into()).await);
            assert!(matches!(err, Error::Validation(_)));
        }

        assert_eq!(gateway.calls().len(), calls_before);
        assert_eq!(threads.comments(&post_id), before.as_slice());
    }

    #[tokio::test]
    async fn test_submit_reloads_canonical_thread() {
        let (gateway, post_id) = seeded();
        let mut threads = CommentThreads::new(Arc::clone(&gateway));
        assert_ok!(threads.load(&post_id).await);
        assert!(threads.thread(&post_id).unwrap().is_empty());

        // Someone else comments in the meantime
        gateway
            .inner
            .create_comment(&post_id, "from elsewhere", &"u2".into())
            .await
            .unwrap();

        let id = assert_ok!(threads.submit(&post_id, "  mine  ", &"u1".into()).await);

        let comments = threads.comments(&post_id);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "from elsewhere");
        assert_eq!(comments[1].id, id);
        assert_eq!(comments[1].content, "mine");
        assert_eq!(
            gateway.calls(),
            vec![Call::ListComments, Call::CreateComment, Call::ListComments]
        );
    }

    #[tokio::test]
    async fn test_failed_submit_leaves_thread_unchanged() {
        let (gateway, post_id) = seeded();
        let mut threads = CommentThreads::new(Arc::clone(&gateway));
        assert_ok!(threads.submit(&post_id, "first", &"u1".into()).await);
        let before = threads.comments(&post_id).to_vec();

        gateway.fail(Call::CreateComment, 1);
        let err = assert_err!(threads.submit(&post_id, "second", &"u1".into()).await);

        assert!(matches!(err, Error::Create { what: "comment", .. }));
        assert_eq!(threads.comments(&post_id), before.as_slice());
    }

    #[tokio::test]
    async fn test_load_sorts_and_is_idempotent() {
        let (gateway, post_id) = seeded();
        gateway.set_comments(vec![
            comment("3", "p1", 30),
            comment("1", "p1", 10),
            comment("x", "other", 5),
            comment("2", "p1", 10),
        ]);
        let mut threads = CommentThreads::new(Arc::clone(&gateway));

        let first = assert_ok!(threads.load(&post_id).await).comments().to_vec();
        let second = assert_ok!(threads.load(&post_id).await).comments().to_vec();

        let ids: Vec<&str> = first.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_thread() {
        let (gateway, post_id) = seeded();
        let mut threads = CommentThreads::new(Arc::clone(&gateway));
        assert_ok!(threads.submit(&post_id, "kept", &"u1".into()).await);

        gateway.fail(Call::ListComments, 1);
        let err = assert_err!(threads.load(&post_id).await);

        assert!(matches!(err, Error::Fetch { what: "comments", .. }));
        assert_eq!(threads.comments(&post_id)[0].content, "kept");
    }

    #[tokio::test]
    async fn test_failed_reload_still_confirms_comment() {
        let (gateway, post_id) = seeded();
        let mut threads = CommentThreads::new(Arc::clone(&gateway));
        assert_ok!(threads.load(&post_id).await);

        gateway.fail(Call::ListComments, 1);
        let id = assert_ok!(threads.submit(&post_id, "hello", &"u1".into()).await);

        // Thread is stale until the next load, but the comment exists once
        assert!(threads.comments(&post_id).is_empty());
        assert_eq!(gateway.count(Call::CreateComment), 1);

        let comments = assert_ok!(threads.load(&post_id).await).comments().to_vec();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, id);
    }

    #[tokio::test]
    async fn test_load_drops_non_adjacent_duplicates() {
        let (gateway, post_id) = seeded();
        gateway.set_comments(vec![
            comment("1", "p1", 10),
            comment("2", "p1", 20),
            comment("1", "p1", 30),
        ]);
        let mut threads = CommentThreads::new(Arc::clone(&gateway));

        let thread = assert_ok!(threads.load(&post_id).await);
        let ids: Vec<&str> = thread.comments().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_evict_and_retain() {
        let (gateway, post_id) = seeded();
        let mut threads = CommentThreads::new(Arc::clone(&gateway));
        let other = PostId::new("p2");
        assert_ok!(threads.load(&post_id).await);
        assert_ok!(threads.load(&other).await);

        threads.retain([&post_id]);
        assert!(threads.thread(&post_id).is_some());
        assert!(threads.thread(&other).is_none());

        assert!(threads.evict(&post_id));
        assert!(!threads.evict(&post_id));
        assert!(threads.comments(&post_id).is_empty());
    }

    #[tokio::test]
    async fn test_likers() {
        let (gateway, post_id) = seeded();
        let mut threads = CommentThreads::new(Arc::clone(&gateway));
        let comment_id = assert_ok!(threads.submit(&post_id, "like me", &"u1".into()).await);
        gateway.inner.like_comment(&comment_id, &"u2".into());
        gateway.inner.like_comment(&comment_id, &"u3".into());

        let likers = assert_ok!(threads.likers(&comment_id).await);
        let ids: Vec<&str> = likers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["u2", "u3"]);

        gateway.fail(Call::ListLikers, 1);
        let err = assert_err!(threads.likers(&comment_id).await);
        assert!(matches!(err, Error::Fetch { what: "likes", .. }));
    }
}
