//! Comment and like models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentId, PostId, ProfileId, ProfileRef};

/// A comment attached to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Backend identifier
    pub id: CommentId,
    /// Post this comment belongs to
    pub post_id: PostId,
    /// Who wrote it
    pub author: ProfileRef,
    /// Comment text (trimmed, never empty)
    pub content: String,
    /// When the comment was created
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Get relative time string (e.g., "5m", "2h", "3d")
    pub fn relative_time(&self) -> String {
        super::post::relative_time(self.created_at, Utc::now())
    }
}

/// A profile liking a comment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LikeEdge {
    /// The liked comment
    pub comment_id: CommentId,
    /// The profile that liked it
    pub profile_id: ProfileId,
}
