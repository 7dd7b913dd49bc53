//! Configuration persistence for the cxgui applications
//!
//! A single flat record holds the tool paths, the last input file, and the
//! preferred window geometry. It is stored as JSON in the platform data
//! directory:
//!
//! - **Linux**: `~/.local/share/org.cxgui/config.json`
//! - **macOS**: `~/Library/Application Support/org.cxgui/config.json`
//! - **Windows**: `%APPDATA%\org.cxgui\config.json`
//!
//! Loading never fails the caller: a missing or unparseable file yields the
//! defaults, and a file written by an older version merges missing keys from
//! the defaults (every field carries `#[serde(default)]`). Saving is best
//! effort; a failed write is logged and otherwise dropped, since losing the
//! configuration is non-fatal to a running session.

use crate::error::{CxError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "org.cxgui";

/// Configuration filename
pub const CONFIG_FILE: &str = "config.json";

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir()
        .ok_or_else(|| CxError::Config("Could not determine app data directory".to_string()))?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .map_err(|e| CxError::Config(format!("Failed to create app data directory: {}", e)))?;
    }

    Ok(dir)
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_mpv_path() -> String {
    "mpv".to_string()
}

fn default_decode_path() -> String {
    "decode".to_string()
}

fn default_export_path() -> String {
    "tbc-video-export".to_string()
}

fn default_window_width() -> u32 {
    900
}

fn default_window_height() -> u32 {
    600
}

/// Persistent application configuration
///
/// Flat key-value record shared by all three applications. Unknown on-disk
/// keys are ignored on load; missing recognized keys are filled from the
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path or PATH-resolvable name of the FFmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Path or PATH-resolvable name of the mpv binary (capture preview)
    #[serde(default = "default_mpv_path")]
    pub mpv_path: String,

    /// Path to the decode executable
    #[serde(default = "default_decode_path")]
    pub decode_path: String,

    /// Path to the tbc-video-export executable
    #[serde(default = "default_export_path")]
    pub export_path: String,

    /// Last input file picked in the workflow app
    #[serde(default)]
    pub last_input_file: String,

    /// Preferred window width in logical pixels
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Preferred window height in logical pixels
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            mpv_path: default_mpv_path(),
            decode_path: default_decode_path(),
            export_path: default_export_path(),
            last_input_file: String::new(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CxError::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| CxError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from the default location, returning defaults on
    /// any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CxError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| CxError::Config(format!("Failed to write config: {}", e)))
    }

    /// Best-effort save to the default location
    ///
    /// A failure is logged and swallowed; configuration loss does not affect
    /// the running session.
    pub fn save(&self) {
        let result = ensure_app_data_dir().and_then(|dir| self.save_to(&dir.join(CONFIG_FILE)));
        if let Err(e) = result {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}
