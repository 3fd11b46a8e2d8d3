//! Scripted gateway for tests: records calls, injects failures, runs hooks.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow};

use crate::models::{Comment, CommentId, Post, PostId, ProfileId, ProfileRef};

use super::memory::MemoryGateway;
use super::{RemoteGateway, UploadOptions};

/// Gateway operations, for call assertions and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    ListPosts,
    GetPost,
    ListComments,
    CreateComment,
    CreatePost,
    Upload,
    ListLikers,
}

type Hook = Box<dyn Fn() + Send>;

/// Wraps [`MemoryGateway`] with scripting knobs
#[derive(Default)]
pub struct MockGateway {
    pub inner: MemoryGateway,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<Call, usize>>,
    posts: Mutex<Option<Vec<Post>>>,
    comments: Mutex<Option<Vec<Comment>>>,
    after_upload: Mutex<Option<Hook>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` calls of `call` fail
    pub fn fail(&self, call: Call, times: usize) {
        self.failures.lock().unwrap().insert(call, times);
    }

    /// Return exactly these posts (in this order) from `list_posts`
    pub fn set_posts(&self, posts: Vec<Post>) {
        *self.posts.lock().unwrap() = Some(posts);
    }

    /// Return exactly these comments (in this order) from `list_comments`
    pub fn set_comments(&self, comments: Vec<Comment>) {
        *self.comments.lock().unwrap() = Some(comments);
    }

    /// Run `hook` right after each successful upload
    pub fn after_upload(&self, hook: impl Fn() + Send + 'static) {
        *self.after_upload.lock().unwrap() = Some(Box::new(hook));
    }

    /// How many times `call` was made
    pub fn count(&self, call: Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    /// All calls in order
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);

        let mut failures = self.failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(&call)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(anyhow!("injected {call:?} failure"));
        }
        Ok(())
    }
}

impl RemoteGateway for MockGateway {
    async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<Post>> {
        self.record(Call::ListPosts)?;
        let scripted = self.posts.lock().unwrap().clone();
        match scripted {
            Some(posts) => Ok(posts),
            None => self.inner.list_posts(limit).await,
        }
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<Post>> {
        self.record(Call::GetPost)?;
        self.inner.get_post(id).await
    }

    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>> {
        self.record(Call::ListComments)?;
        let scripted = self.comments.lock().unwrap().clone();
        match scripted {
            Some(comments) => Ok(comments),
            None => self.inner.list_comments(post_id).await,
        }
    }

    async fn create_comment(
        &self,
        post_id: &PostId,
        content: &str,
        author: &ProfileId,
    ) -> Result<CommentId> {
        self.record(Call::CreateComment)?;
        self.inner.create_comment(post_id, content, author).await
    }

    async fn create_post(
        &self,
        image_url: &str,
        description: &str,
        author: &ProfileId,
    ) -> Result<PostId> {
        self.record(Call::CreatePost)?;
        self.inner.create_post(image_url, description, author).await
    }

    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: &UploadOptions,
    ) -> Result<()> {
        self.record(Call::Upload)?;
        self.inner
            .upload(object_name, bytes, content_type, options)
            .await?;
        if let Some(hook) = self.after_upload.lock().unwrap().as_ref() {
            hook();
        }
        Ok(())
    }

    fn public_url(&self, object_name: &str) -> String {
        self.inner.public_url(object_name)
    }

    async fn list_comment_likers(&self, comment_id: &CommentId) -> Result<Vec<ProfileRef>> {
        self.record(Call::ListLikers)?;
        self.inner.list_comment_likers(comment_id).await
    }
}
