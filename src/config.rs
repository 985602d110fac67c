//! Configuration file support for boxcrop.
//!
//! This module provides serialization and deserialization of application settings,
//! allowing users to keep their preferences between sessions. Annotation state
//! itself is never persisted.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ARCHIVE_NAME, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_JPEG_QUALITY,
    MIN_BOX_SIZE, ZOOM_FACTOR,
};
use crate::export::ExportOptions;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }

    /// Convert to the log crate's Level.
    pub fn to_level(&self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,
}

fn default_app_name() -> String {
    "boxcrop".to_string()
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Zoom in multiplies the scale by this; zoom out divides by it
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: f32,

    /// Boxes smaller than this on either side are discarded
    #[serde(default = "default_min_box_size")]
    pub min_box_size: f32,

    /// JPEG quality of exported crops (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// File name of the exported archive
    #[serde(default = "default_archive_name")]
    pub archive_name: String,

    /// Canvas width for headless sessions
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,

    /// Canvas height for headless sessions
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
}

fn default_zoom_factor() -> f32 {
    ZOOM_FACTOR
}

fn default_min_box_size() -> f32 {
    MIN_BOX_SIZE
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_archive_name() -> String {
    DEFAULT_ARCHIVE_NAME.to_string()
}

fn default_canvas_width() -> u32 {
    DEFAULT_CANVAS_WIDTH
}

fn default_canvas_height() -> u32 {
    DEFAULT_CANVAS_HEIGHT
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            zoom_factor: default_zoom_factor(),
            min_box_size: default_min_box_size(),
            jpeg_quality: default_jpeg_quality(),
            archive_name: default_archive_name(),
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
        }
    }
}

impl UserPreferences {
    /// Replace out-of-range values with usable ones.
    ///
    /// A zoom factor must be finite and greater than 1, the minimum box size
    /// finite and non-negative, quality within 1-100, the archive name
    /// non-empty and both canvas sides non-zero.
    pub fn sanitized(mut self) -> Self {
        if !(self.zoom_factor.is_finite() && self.zoom_factor > 1.0) {
            log::warn!(
                "Invalid zoom factor {}, using {}",
                self.zoom_factor,
                ZOOM_FACTOR
            );
            self.zoom_factor = ZOOM_FACTOR;
        }
        if !(self.min_box_size.is_finite() && self.min_box_size >= 0.0) {
            log::warn!(
                "Invalid minimum box size {}, using {}",
                self.min_box_size,
                MIN_BOX_SIZE
            );
            self.min_box_size = MIN_BOX_SIZE;
        }
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        if self.archive_name.trim().is_empty() {
            self.archive_name = default_archive_name();
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            self.canvas_width = DEFAULT_CANVAS_WIDTH;
            self.canvas_height = DEFAULT_CANVAS_HEIGHT;
        }
        self
    }

    /// Export settings derived from these preferences.
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            jpeg_quality: self.jpeg_quality,
            archive_name: self.archive_name.clone(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: UserPreferences::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.preferences = config.preferences.sanitized();
        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "boxcrop-config.json"
    }

    /// Get the default config file path for auto-load/save.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("boxcrop").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("boxcrop")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from `path`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_roundtrips_through_json() {
        let config = AppConfig::new();
        let json = config.to_json().unwrap();
        assert_eq!(AppConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = AppConfig::from_json(r#"{"version": 1}"#).unwrap();
        assert_eq!(config.app_name, "boxcrop");
        assert_eq!(config.preferences, UserPreferences::default());

        let config =
            AppConfig::from_json(r#"{"version": 1, "preferences": {"jpeg_quality": 70}}"#).unwrap();
        assert_eq!(config.preferences.jpeg_quality, 70);
        assert_eq!(config.preferences.zoom_factor, ZOOM_FACTOR);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = AppConfig::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::VersionTooNew {
                file_version: 99,
                supported_version: CONFIG_VERSION
            }
        ));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            AppConfig::from_json("{not json"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_sanitized_replaces_bad_values() {
        let prefs = UserPreferences {
            zoom_factor: -3.0,
            min_box_size: f32::NAN,
            jpeg_quality: 0,
            archive_name: "  ".to_string(),
            canvas_width: 0,
            ..UserPreferences::default()
        }
        .sanitized();

        assert_eq!(prefs.zoom_factor, ZOOM_FACTOR);
        assert_eq!(prefs.min_box_size, MIN_BOX_SIZE);
        assert_eq!(prefs.jpeg_quality, 1);
        assert_eq!(prefs.archive_name, DEFAULT_ARCHIVE_NAME);
        assert_eq!(
            (prefs.canvas_width, prefs.canvas_height),
            (DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
        );
    }

    #[test]
    fn test_log_level_names() {
        let level: LogLevel = serde_json::from_str(r#""debug""#).unwrap();
        assert_eq!(level, LogLevel::Debug);
        assert_eq!(level.to_level_filter(), log::LevelFilter::Debug);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("boxcrop-config-test-{}", std::process::id()));
        let path = dir.join("nested").join(AppConfig::default_filename());

        let mut config = AppConfig::new();
        config.preferences.archive_name = "crops.zip".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
