//! Media preparation and publishing.
//!
//! [`MediaTransformer`] turns a camera or gallery image into a bounded JPEG,
//! and [`MediaPublishPipeline`] takes a [`DraftPost`](crate::models::DraftPost)
//! from that image through upload to a created post.

pub mod publish;
pub mod transform;

pub use publish::{CancelToken, MediaPublishPipeline, object_name};
pub use transform::{
    DEFAULT_MAX_WIDTH, DEFAULT_QUALITY, MediaTransformer, TransformError, TransformedImage, fit_within,
};
