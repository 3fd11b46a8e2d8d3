//! Common paths for Comuna data storage
//!
//! Comuna keeps its files under ~/.config/comuna/ on all platforms:
//! - config.toml - User configuration
//! - media/ - Scratch space for transformed images awaiting upload

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the Comuna data directory (~/.config/comuna/)
///
/// This is consistent across all platforms for simplicity.
pub fn comuna_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let comuna_dir = home.join(".config").join("comuna");
    fs::create_dir_all(&comuna_dir).context("Failed to create comuna directory")?;
    Ok(comuna_dir)
}

/// Get the config file path (~/.config/comuna/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(comuna_dir()?.join("config.toml"))
}

/// Get the scratch directory for transformed media (~/.config/comuna/media/)
pub fn media_scratch_dir() -> Result<PathBuf> {
    let dir = comuna_dir()?.join("media");
    fs::create_dir_all(&dir).context("Failed to create media scratch directory")?;
    Ok(dir)
}
