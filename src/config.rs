//! # Configuration Module
//!
//! This module handles configuration management and data directory setup for
//! moodtune. It provides platform-appropriate data storage locations, ensures
//! necessary directories exist, and loads optional user settings.
//!
//! ## Data Storage
//!
//! moodtune stores its database in the platform-standard data directory:
//! - Linux: `~/.local/share/moodtune/`
//! - macOS: `~/Library/Application Support/moodtune/`
//! - Windows: `%APPDATA%\moodtune\`
//!
//! ## Settings File
//!
//! An optional `config.json` in the same directory overrides defaults:
//!
//! ```json
//! {
//!   "db_path": "/home/me/moods.db",
//!   "sampling": { "samples": 5, "interval_ms": 200, "sample_timeout_ms": 1500 },
//!   "recommendation_limit": 3
//! }
//! ```
//!
//! Every key is optional. Command-line flags win over file values.

use crate::sampler::SamplingConfig;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "moodtune";
const DB_FILE: &str = "moodtune.db";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-appropriate data directory for moodtune,
/// creating it if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The moodtune subdirectory cannot be created due to permissions
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        )
    })?;

    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir).with_context(|| {
        format!(
            "Failed to create moodtune data directory at {}. Please check file permissions.",
            app_dir.display()
        )
    })?;

    Ok(app_dir)
}

/// Returns the platform-appropriate database file path.
///
/// # Platform Behavior
///
/// - **Linux**: `~/.local/share/moodtune/moodtune.db`
/// - **macOS**: `~/Library/Application Support/moodtune/moodtune.db`
/// - **Windows**: `%APPDATA%\moodtune\moodtune.db`
///
/// # Examples
///
/// ```no_run
/// use moodtune::config::get_db_path;
///
/// let db_path = get_db_path()?;
/// println!("Database location: {}", db_path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(DB_FILE))
}

/// Path of the optional settings file.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(CONFIG_FILE))
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Path to the database file
    pub db_path: PathBuf,
    /// How captures sample the detector
    pub sampling: SamplingConfig,
    /// Cap on songs returned per recommendation, `None` for all
    pub recommendation_limit: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            db_path: get_db_path().unwrap_or_else(|_| PathBuf::from(DB_FILE)),
            sampling: SamplingConfig::default(),
            recommendation_limit: None,
        }
    }
}

impl RuntimeConfig {
    /// Defaults merged with the settings file, if present.
    pub fn load() -> Result<Self> {
        let path = get_config_path()?;
        if path.exists() {
            Self::from_file(&path)
        } else {
            debug!("No settings file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Read settings from an explicit file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        debug!("Loaded settings from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Create configuration with explicit database path
    #[must_use]
    pub fn with_db_path(mut self, db_path: PathBuf) -> Self {
        self.db_path = db_path;
        self
    }

    /// Make sure the database's parent directory exists.
    pub fn prepare_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(())
    }
}
