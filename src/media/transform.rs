//! Image preparation: bound the size and re-encode before upload.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Default bound for the long edge, in pixels
pub const DEFAULT_MAX_WIDTH: u32 = 1080;

/// Default lossy quality factor (0.0 - 1.0)
pub const DEFAULT_QUALITY: f32 = 0.8;

/// Content type of every transformed image
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

/// Why an image could not be prepared
#[derive(Debug, Error)]
pub enum TransformError {
    /// The source could not be opened or read
    #[error("could not read {}: {source}", path.display())]
    Unreadable {
        /// Source path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The source is not a decodable image
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Re-encoding failed
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Writing or reading the intermediate file failed
    #[error("could not store transformed image: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking worker died
    #[error("image worker failed: {0}")]
    Worker(String),
}

/// A transformed image backed by a temporary file.
///
/// The file is deleted when this value is dropped.
#[derive(Debug)]
pub struct TransformedImage {
    file: NamedTempFile,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl TransformedImage {
    /// Path of the encoded file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Content type of the encoded file
    pub const fn content_type(&self) -> &'static str {
        OUTPUT_CONTENT_TYPE
    }

    /// Read the encoded bytes for upload
    pub async fn read_bytes(&self) -> Result<Vec<u8>, TransformError> {
        Ok(tokio::fs::read(self.file.path()).await?)
    }
}

/// Resizes and re-encodes images for upload
#[derive(Debug, Clone)]
pub struct MediaTransformer {
    max_width: u32,
    quality: u8,
    scratch_dir: Option<PathBuf>,
}

impl Default for MediaTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WIDTH, DEFAULT_QUALITY)
    }
}

impl MediaTransformer {
    /// Create a transformer with a long-edge bound and a quality factor (0.0 - 1.0)
    pub fn new(max_width: u32, quality: f32) -> Self {
        Self {
            max_width: max_width.max(1),
            quality: quality_percent(quality),
            scratch_dir: None,
        }
    }

    /// Write intermediate files into `dir` instead of the system temp dir
    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Configured long-edge bound
    pub const fn max_width(&self) -> u32 {
        self.max_width
    }

    /// Configured JPEG quality (1 - 100)
    pub const fn quality(&self) -> u8 {
        self.quality
    }

    /// Decode, bound and re-encode `source` on the blocking pool
    pub async fn transform(&self, source: &Path) -> Result<TransformedImage, TransformError> {
        let source = source.to_path_buf();
        let this = self.clone();

        tokio::task::spawn_blocking(move || this.transform_blocking(&source))
            .await
            .map_err(|e| TransformError::Worker(e.to_string()))?
    }

    fn transform_blocking(&self, source: &Path) -> Result<TransformedImage, TransformError> {
        let unreadable = |source_err| TransformError::Unreadable {
            path: source.to_path_buf(),
            source: source_err,
        };

        let image = ImageReader::open(source)
            .map_err(unreadable)?
            .with_guessed_format()
            .map_err(unreadable)?
            .decode()
            .map_err(TransformError::Decode)?;

        let image = bound_size(image, self.max_width);
        let (width, height) = (image.width(), image.height());
        let rgb = image.to_rgb8();

        let mut builder = tempfile::Builder::new();
        builder.prefix("comuna-").suffix(".jpg");
        let mut file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        {
            let mut writer = BufWriter::new(file.as_file_mut());
            JpegEncoder::new_with_quality(&mut writer, self.quality)
                .encode_image(&rgb)
                .map_err(TransformError::Encode)?;
            writer.flush()?;
        }

        tracing::debug!(
            "Transformed {} to {width}x{height} (quality {})",
            source.display(),
            self.quality
        );

        Ok(TransformedImage {
            file,
            width,
            height,
        })
    }
}

/// Dimensions that fit `(width, height)` inside a `max` long edge, keeping
/// the aspect ratio. Never upscales.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let long = width.max(height);
    if long <= max || long == 0 {
        return (width, height);
    }

    let scale = |side: u32| {
        let scaled = (u64::from(side) * u64::from(max) + u64::from(long) / 2) / u64::from(long);
        u32::try_from(scaled).unwrap_or(max).max(1)
    };

    (scale(width), scale(height))
}

fn bound_size(image: DynamicImage, max: u32) -> DynamicImage {
    let (width, height) = fit_within(image.width(), image.height(), max);
    if (width, height) == (image.width(), image.height()) {
        return image;
    }
    image.resize_exact(width, height, FilterType::Triangle)
}

fn quality_percent(quality: f32) -> u8 {
    let quality = if quality.is_finite() { quality } else { DEFAULT_QUALITY };
    (quality.clamp(0.01, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 255) as u8, (y % 255) as u8, 128]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(4000, 3000, 1080), (1080, 810));
        assert_eq!(fit_within(3000, 4000, 1080), (810, 1080));
        assert_eq!(fit_within(1080, 1080, 1080), (1080, 1080));
        // Never upscales
        assert_eq!(fit_within(640, 480, 1080), (640, 480));
        assert_eq!(fit_within(10_000, 10, 1080), (1080, 1));
        assert_eq!(fit_within(0, 0, 1080), (0, 0));
    }

    #[test]
    fn test_quality_percent() {
        assert_eq!(quality_percent(0.8), 80);
        assert_eq!(quality_percent(1.5), 100);
        assert_eq!(quality_percent(0.0), 1);
        assert_eq!(quality_percent(f32::NAN), 80);
        assert_eq!(quality_percent(f32::INFINITY), 80);
        assert_eq!(MediaTransformer::new(1080, f32::NAN).quality(), 80);
    }

    #[tokio::test]
    async fn test_transform_downscales_and_encodes_jpeg() {
        let dir = tempdir().unwrap();
        let source = write_png(dir.path(), "wide.png", 400, 300);
        let transformer = MediaTransformer::new(108, 0.8);

        let out = transformer.transform(&source).await.unwrap();
        assert_eq!((out.width, out.height), (108, 81));

        let bytes = out.read_bytes().await.unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (108, 81));
    }

    #[tokio::test]
    async fn test_transform_keeps_small_images() {
        let dir = tempdir().unwrap();
        let source = write_png(dir.path(), "small.png", 64, 48);

        let out = MediaTransformer::default().transform(&source).await.unwrap();
        assert_eq!((out.width, out.height), (64, 48));
    }

    #[tokio::test]
    async fn test_intermediate_file_removed_on_drop() {
        let dir = tempdir().unwrap();
        let scratch = tempdir().unwrap();
        let source = write_png(dir.path(), "a.png", 32, 32);
        let transformer = MediaTransformer::default().with_scratch_dir(scratch.path());

        let out = transformer.transform(&source).await.unwrap();
        let path = out.path().to_path_buf();
        assert!(path.starts_with(scratch.path()));
        assert!(path.exists());

        drop(out);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unreadable_and_undecodable_sources() {
        let dir = tempdir().unwrap();
        let transformer = MediaTransformer::default();

        let missing = transformer.transform(&dir.path().join("missing.jpg")).await;
        assert!(matches!(missing, Err(TransformError::Unreadable { .. })));

        let garbage = dir.path().join("garbage.jpg");
        std::fs::write(&garbage, b"definitely not an image").unwrap();
        let result = transformer.transform(&garbage).await;
        assert!(matches!(result, Err(TransformError::Decode(_))));
    }
}
