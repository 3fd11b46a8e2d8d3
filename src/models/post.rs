//! Post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PostId, ProfileRef};

/// A published photo post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Backend identifier
    pub id: PostId,
    /// When the post was created
    pub created_at: DateTime<Utc>,
    /// Public URL of the uploaded image
    pub image_url: String,
    /// Compact placeholder encoding shown while the image loads
    pub image_blurhash: Option<String>,
    /// Free text written by the author (may be empty)
    pub description: String,
    /// Who posted it
    pub author: ProfileRef,
    /// Number of comments (denormalized by the backend)
    pub comment_count: u32,
}

impl Post {
    /// Get relative time string (e.g., "5m", "2h", "3d")
    pub fn relative_time(&self) -> String {
        relative_time(self.created_at, Utc::now())
    }

    /// URL of a resized, low-quality rendition of the image.
    ///
    /// The storage backend transforms images on the fly from these query
    /// parameters; the feed uses it for the blurred background preview.
    pub fn preview_url(&self, width: u32, height: u32, quality: u8) -> String {
        let separator = if self.image_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}width={}&height={}&quality={}",
            self.image_url, separator, width, height, quality
        )
    }

    /// Get a short preview of the description (for list display)
    pub fn description_preview(&self, max_chars: usize) -> String {
        let description = self.description.replace('\n', " ");
        if description.chars().count() <= max_chars {
            description
        } else {
            let cut: String = description
                .chars()
                .take(max_chars.saturating_sub(3))
                .collect();
            format!("{cut}...")
        }
    }
}

/// Format the distance between `then` and `now` compactly ("42s", "5m", "2h", "3d", "Jan 05")
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(then);

    if duration.num_seconds() < 60 {
        format!("{}s", duration.num_seconds().max(0))
    } else if duration.num_minutes() < 60 {
        format!("{}m", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d", duration.num_days())
    } else {
        then.format("%b %d").to_string()
    }
}
