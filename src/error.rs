//! Error types surfaced by the Comuna core
//!
//! Every variant carries a message fit for showing to the user. Failures never
//! clear local state, so callers can always retry.

use thiserror::Error;

use crate::media::TransformError;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the feed, comment and publish flows
#[derive(Debug, Error)]
pub enum Error {
    /// The source image could not be read or decoded
    #[error("Error preparing image: {0}")]
    Transform(#[from] TransformError),

    /// Object storage rejected or failed the upload
    #[error("Error uploading image: {0}")]
    Upload(String),

    /// A row insert (post or comment) failed
    #[error("Error creating {what}: {message}")]
    Create {
        /// What was being created ("post", "comment")
        what: &'static str,
        /// Gateway failure message
        message: String,
    },

    /// Reading feed, comments or likers failed
    #[error("Error fetching {what}: {message}")]
    Fetch {
        /// What was being fetched ("posts", "comments", ...)
        what: &'static str,
        /// Gateway failure message
        message: String,
    },

    /// Input rejected before any network call
    #[error("{0}")]
    Validation(String),

    /// The publish flow was abandoned by the caller
    #[error("Publishing was cancelled")]
    Cancelled,
}

impl Error {
    /// Upload failure from a gateway error
    pub(crate) fn upload(err: &anyhow::Error) -> Self {
        Self::Upload(format!("{err:#}"))
    }

    /// Create failure from a gateway error
    pub(crate) fn create(what: &'static str, err: &anyhow::Error) -> Self {
        Self::Create {
            what,
            message: format!("{err:#}"),
        }
    }

    /// Fetch failure from a gateway error
    pub(crate) fn fetch(what: &'static str, err: &anyhow::Error) -> Self {
        Self::Fetch {
            what,
            message: format!("{err:#}"),
        }
    }

    /// Whether the error was raised before anything touched the network
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Transform(_) | Self::Cancelled)
    }
}
