//! Data models for Comuna

mod comment;
mod draft;
mod ids;
mod post;
mod profile;

pub use comment::{Comment, LikeEdge};
pub use draft::{DraftPost, UploadState};
pub use ids::{CommentId, PostId, ProfileId};
pub use post::{Post, relative_time};
pub use profile::ProfileRef;
