//! Draft post model used while publishing

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PostId;

/// Where a draft is in the publish pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    /// Asset selected, nothing started
    #[default]
    Idle,
    /// Resizing and re-encoding the image
    Transforming,
    /// Sending the encoded image to object storage
    Uploading,
    /// Creating the post row
    Creating,
    /// Post created
    Done,
    /// A step failed (or the flow was cancelled)
    Failed,
}

impl UploadState {
    /// Get state as string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Transforming => "transforming",
            Self::Uploading => "uploading",
            Self::Creating => "creating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether the pipeline may move from `self` to `next`
    pub const fn can_advance_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Transforming)
                | (Self::Transforming, Self::Uploading)
                | (Self::Uploading, Self::Creating)
                | (Self::Creating, Self::Done)
                | (Self::Transforming | Self::Uploading | Self::Creating, Self::Failed)
        )
    }

    /// Whether the draft reached a final state
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Progress label for status lines
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Transforming => "Preparing image...",
            Self::Uploading => "Uploading...",
            Self::Creating => "Posting...",
            Self::Done => "Posted",
            Self::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A post being published from a captured or selected image.
///
/// Only the publish pipeline that runs it mutates the state; callers read it
/// and drop the draft once it is terminal.
#[derive(Debug, Clone)]
pub struct DraftPost {
    /// Local identifier (for logs and UI keys)
    pub id: Uuid,
    source: PathBuf,
    description: String,
    state: UploadState,
    object_name: Option<String>,
    image_url: Option<String>,
    post_id: Option<PostId>,
    error: Option<String>,
    failed_step: Option<UploadState>,
}

impl DraftPost {
    /// Create an idle draft for a source image
    pub fn new(source: impl Into<PathBuf>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            description: description.into(),
            state: UploadState::Idle,
            object_name: None,
            image_url: None,
            post_id: None,
            error: None,
            failed_step: None,
        }
    }

    /// Start over from the same image and description
    pub fn retry(&self) -> Self {
        Self::new(self.source.clone(), self.description.clone())
    }

    /// Source image path
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Description entered by the user
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replace the description (only while idle)
    pub fn set_description(&mut self, description: impl Into<String>) {
        if self.state == UploadState::Idle {
            self.description = description.into();
        }
    }

    /// Current pipeline state
    pub const fn state(&self) -> UploadState {
        self.state
    }

    /// Object name used for the upload, once computed
    pub fn object_name(&self) -> Option<&str> {
        self.object_name.as_deref()
    }

    /// Public image URL, once the upload finished
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Created post id, once done
    pub const fn post_id(&self) -> Option<&PostId> {
        self.post_id.as_ref()
    }

    /// Failure message, once failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Step that was running when the draft failed
    pub const fn failed_step(&self) -> Option<UploadState> {
        self.failed_step
    }

    pub(crate) fn advance(&mut self, next: UploadState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid draft transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(draft = %self.id, from = %self.state, to = %next, "draft state change");
        self.state = next;
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.failed_step = Some(self.state);
        self.advance(UploadState::Failed);
    }

    pub(crate) fn set_object_name(&mut self, name: String) {
        self.object_name = Some(name);
    }

    pub(crate) fn set_image_url(&mut self, url: String) {
        self.image_url = Some(url);
    }

    pub(crate) fn complete(&mut self, post_id: PostId) {
        self.post_id = Some(post_id);
        self.advance(UploadState::Done);
    }
}
