//! Publishing a captured or selected image as a new post.
//!
//! A draft moves `idle -> transforming -> uploading -> creating -> done`, or to
//! `failed` from any working state. There is no automatic retry: callers start
//! a fresh draft with [`DraftPost::retry`], which also gets a fresh object name.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use uuid::Uuid;

use crate::api::{RemoteGateway, UploadOptions};
use crate::config::MediaConfig;
use crate::error::{Error, Result};
use crate::models::{DraftPost, PostId, ProfileId, UploadState};

use super::transform::MediaTransformer;

/// Name used when the source path has no usable file name
const FALLBACK_FILE_NAME: &str = "image.jpg";

/// Cancellation signal shared between the caller and a running publish.
///
/// Clones observe the same signal. Once cancelled, the pipeline makes no
/// further network calls.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Abandon the flow
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether the flow was abandoned
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the flow is abandoned
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Runs drafts through transform, upload and post creation
pub struct MediaPublishPipeline<G> {
    gateway: Arc<G>,
    transformer: MediaTransformer,
    upload_options: UploadOptions,
}

impl<G: RemoteGateway> MediaPublishPipeline<G> {
    /// Create a pipeline
    pub fn new(gateway: Arc<G>, transformer: MediaTransformer, upload_options: UploadOptions) -> Self {
        Self {
            gateway,
            transformer,
            upload_options,
        }
    }

    /// Create a pipeline from media settings
    pub fn from_config(gateway: Arc<G>, config: &MediaConfig) -> Self {
        let mut transformer = MediaTransformer::new(config.max_width, config.quality);
        if let Some(dir) = &config.scratch_dir {
            transformer = transformer.with_scratch_dir(dir);
        }

        Self::new(
            gateway,
            transformer,
            UploadOptions {
                cache_control: config.cache_control.clone(),
                upsert: config.upsert,
            },
        )
    }

    /// Publish an idle draft as `author`.
    ///
    /// On success the draft is `done` and carries the new post id. On failure
    /// it is `failed` with the same message as the returned error. The new post
    /// shows up in the feed on its next refresh.
    pub async fn publish(
        &self,
        draft: &mut DraftPost,
        author: &ProfileId,
        cancel: &CancelToken,
    ) -> Result<PostId> {
        if draft.state() != UploadState::Idle {
            return Err(Error::Validation(format!(
                "This draft is already {}; start a new one to publish again",
                draft.state()
            )));
        }

        draft.advance(UploadState::Transforming);

        match self.run(draft, author, cancel).await {
            Ok(post_id) => {
                tracing::info!(draft = %draft.id, post = %post_id, "Published post");
                draft.complete(post_id.clone());
                Ok(post_id)
            }
            Err(e) => {
                if matches!(e, Error::Cancelled) {
                    tracing::debug!(draft = %draft.id, "Publish cancelled during {}", draft.state());
                } else {
                    tracing::warn!(draft = %draft.id, "Publish failed during {}: {e}", draft.state());
                }
                draft.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        draft: &mut DraftPost,
        author: &ProfileId,
        cancel: &CancelToken,
    ) -> Result<PostId> {
        let transformed = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            result = self.transformer.transform(draft.source()) => result?,
        };

        let bytes = transformed.read_bytes().await?;
        let content_type = transformed.content_type();
        drop(transformed);
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let object_name = object_name(draft.source(), Utc::now());
        draft.set_object_name(object_name.clone());
        draft.advance(UploadState::Uploading);

        tracing::debug!("Uploading {object_name} ({} bytes)", bytes.len());
        self.gateway
            .upload(&object_name, bytes, content_type, &self.upload_options)
            .await
            .map_err(|e| Error::upload(&e))?;

        let image_url = self.gateway.public_url(&object_name);
        draft.set_image_url(image_url.clone());

        if cancel.is_cancelled() {
            tracing::warn!(
                object = %object_name,
                "Publish cancelled after upload; stored object is orphaned"
            );
            return Err(Error::Cancelled);
        }

        draft.advance(UploadState::Creating);
        self.gateway
            .create_post(&image_url, draft.description().trim(), author)
            .await
            .map_err(|e| Error::create("post", &e))
    }
}

/// Storage object name for an upload: millisecond timestamp, random
/// fragment and the sanitized source file name (with a `.jpg` extension).
pub fn object_name(source: &Path, now: DateTime<Utc>) -> String {
    let file_name = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(sanitize)
        .filter(|stem| !stem.is_empty())
        .map_or_else(|| FALLBACK_FILE_NAME.to_string(), |stem| format!("{stem}.jpg"));

    let nonce = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", now.timestamp_millis(), &nonce[..8], file_name)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}
