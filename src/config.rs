//! Configuration module for Comuna

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::media::{DEFAULT_MAX_WIDTH, DEFAULT_QUALITY};
use crate::models::ProfileId;
use crate::paths;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Profile that authors posts and comments made from this client
    #[serde(default)]
    pub author_id: Option<String>,

    /// Backend connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Image preparation and upload
    #[serde(default)]
    pub media: MediaConfig,

    /// Feed fetching and preview
    #[serde(default)]
    pub feed: FeedConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL (e.g. `https://xyz.supabase.co`)
    #[serde(default)]
    pub url: String,

    /// Public API key
    #[serde(default)]
    pub api_key: String,

    /// Session access token; the API key is used when unset
    #[serde(default)]
    pub access_token: Option<String>,

    /// Storage bucket for uploaded images
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Image preparation and upload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Bound for the long edge of uploaded images, in pixels
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// JPEG quality factor (0.0 - 1.0)
    #[serde(default = "default_quality")]
    pub quality: f32,

    /// Cache lifetime sent with uploads, in seconds
    #[serde(default = "default_cache_control")]
    pub cache_control: String,

    /// Overwrite objects with the same name instead of failing
    #[serde(default = "default_upsert")]
    pub upsert: bool,

    /// Directory for intermediate files (system temp dir when unset)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

/// Feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Maximum number of posts per refresh (0 = everything)
    #[serde(default)]
    pub page_size: usize,

    /// Side length of the background preview rendition, in pixels
    #[serde(default = "default_preview_size")]
    pub preview_size: u32,

    /// Quality of the background preview rendition (1 - 100)
    #[serde(default = "default_preview_quality")]
    pub preview_quality: u8,
}

fn default_bucket() -> String {
    "user_content".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

fn default_quality() -> f32 {
    DEFAULT_QUALITY
}

fn default_cache_control() -> String {
    "3600".to_string()
}

fn default_upsert() -> bool {
    true
}

fn default_preview_size() -> u32 {
    500
}

fn default_preview_quality() -> u8 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            access_token: None,
            bucket: default_bucket(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            quality: default_quality(),
            cache_control: default_cache_control(),
            upsert: default_upsert(),
            scratch_dir: None,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 0,
            preview_size: default_preview_size(),
            preview_quality: default_preview_quality(),
        }
    }
}

impl FeedConfig {
    /// Page size as a request limit
    pub const fn limit(&self) -> Option<usize> {
        if self.page_size == 0 {
            None
        } else {
            Some(self.page_size)
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        paths::config_path()
    }

    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Whether a backend has been configured
    pub fn has_backend(&self) -> bool {
        !self.backend.url.trim().is_empty() && !self.backend.api_key.trim().is_empty()
    }

    /// The configured author profile
    pub fn author(&self) -> Result<ProfileId> {
        self.author_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ProfileId::new)
            .context("No author_id configured; set it in the config file")
    }
}
