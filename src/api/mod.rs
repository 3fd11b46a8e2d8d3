//! Backend gateway: rows, object storage and public URLs

#[cfg(test)]
pub(crate) mod mock;

pub mod memory;
pub mod rows;
pub mod supabase;

pub use memory::MemoryGateway;
pub use supabase::SupabaseClient;

use anyhow::Result;

use crate::models::{Comment, CommentId, Post, PostId, ProfileId, ProfileRef};

/// Directives sent along with an object upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Cache lifetime in seconds, as sent in the cache-control directive
    pub cache_control: String,
    /// Overwrite an existing object with the same name instead of failing
    pub upsert: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            cache_control: "3600".to_string(),
            upsert: true,
        }
    }
}

/// The narrow backend contract the core consumes.
///
/// Implementations return strict models; loosely-typed backend rows are
/// parsed at this boundary (see [`rows`]). Transport timeouts surface as
/// ordinary errors.
#[allow(async_fn_in_trait)]
pub trait RemoteGateway {
    /// List posts, newest first when the backend supports ordering
    async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<Post>>;

    /// Fetch a single post; `None` when it does not exist
    async fn get_post(&self, id: &PostId) -> Result<Option<Post>>;

    /// List all comments of a post
    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>>;

    /// Insert a comment, returning its server-assigned id
    async fn create_comment(
        &self,
        post_id: &PostId,
        content: &str,
        author: &ProfileId,
    ) -> Result<CommentId>;

    /// Insert a post row, returning its server-assigned id
    async fn create_post(
        &self,
        image_url: &str,
        description: &str,
        author: &ProfileId,
    ) -> Result<PostId>;

    /// Store an object
    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: &UploadOptions,
    ) -> Result<()>;

    /// Public URL of a stored object (derived locally, no round trip)
    fn public_url(&self, object_name: &str) -> String;

    /// Profiles that liked a comment
    async fn list_comment_likers(&self, comment_id: &CommentId) -> Result<Vec<ProfileRef>>;
}

/// Unified gateway that wraps the available backends
pub enum Gateway {
    /// Hosted backend over REST
    Supabase(supabase::SupabaseClient),
    /// In-process backend (demo mode)
    Memory(memory::MemoryGateway),
}

impl RemoteGateway for Gateway {
    async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<Post>> {
        match self {
            Gateway::Supabase(g) => g.list_posts(limit).await,
            Gateway::Memory(g) => g.list_posts(limit).await,
        }
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<Post>> {
        match self {
            Gateway::Supabase(g) => g.get_post(id).await,
            Gateway::Memory(g) => g.get_post(id).await,
        }
    }

    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>> {
        match self {
            Gateway::Supabase(g) => g.list_comments(post_id).await,
            Gateway::Memory(g) => g.list_comments(post_id).await,
        }
    }

    async fn create_comment(
        &self,
        post_id: &PostId,
        content: &str,
        author: &ProfileId,
    ) -> Result<CommentId> {
        match self {
            Gateway::Supabase(g) => g.create_comment(post_id, content, author).await,
            Gateway::Memory(g) => g.create_comment(post_id, content, author).await,
        }
    }

    async fn create_post(
        &self,
        image_url: &str,
        description: &str,
        author: &ProfileId,
    ) -> Result<PostId> {
        match self {
            Gateway::Supabase(g) => g.create_post(image_url, description, author).await,
            Gateway::Memory(g) => g.create_post(image_url, description, author).await,
        }
    }

    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: &UploadOptions,
    ) -> Result<()> {
        match self {
            Gateway::Supabase(g) => g.upload(object_name, bytes, content_type, options).await,
            Gateway::Memory(g) => g.upload(object_name, bytes, content_type, options).await,
        }
    }

    fn public_url(&self, object_name: &str) -> String {
        match self {
            Gateway::Supabase(g) => g.public_url(object_name),
            Gateway::Memory(g) => g.public_url(object_name),
        }
    }

    async fn list_comment_likers(&self, comment_id: &CommentId) -> Result<Vec<ProfileRef>> {
        match self {
            Gateway::Supabase(g) => g.list_comment_likers(comment_id).await,
            Gateway::Memory(g) => g.list_comment_likers(comment_id).await,
        }
    }
}
