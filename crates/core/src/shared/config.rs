use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    APP_DIR_NAME, CAPTURE_PREFIX, DEFAULT_MODEL_BASE, DETECTION_INTERVAL_MS,
    PREFERRED_CAMERA_LABEL, VIDEO_HEIGHT, VIDEO_WIDTH,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Runtime settings. Missing fields in the JSON file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory or http(s) URL holding the model weight manifests.
    pub model_base: String,
    /// Root folder of the image-sequence camera, one sub-directory per device.
    pub camera_root: PathBuf,
    pub preferred_camera_label: String,
    pub video_width: u32,
    pub video_height: u32,
    pub detection_interval_ms: u64,
    pub capture_prefix: String,
    pub export_dir: PathBuf,
    /// Base URL of the optional remote emotion logging server.
    pub log_endpoint: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_base: DEFAULT_MODEL_BASE.to_string(),
            camera_root: PathBuf::from("./cameras"),
            preferred_camera_label: PREFERRED_CAMERA_LABEL.to_string(),
            video_width: VIDEO_WIDTH,
            video_height: VIDEO_HEIGHT,
            detection_interval_ms: DETECTION_INTERVAL_MS,
            capture_prefix: CAPTURE_PREFIX.to_string(),
            export_dir: PathBuf::from("."),
            log_endpoint: None,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Loads the user settings file, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                log::warn!("Ignoring settings file: {e}");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.video_width == 0 || self.video_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "video resolution must be non-zero, got {}x{}",
                self.video_width, self.video_height
            )));
        }
        if self.detection_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "detection interval must be at least 1 ms".into(),
            ));
        }
        if self.capture_prefix.is_empty() {
            return Err(ConfigError::Invalid("capture prefix must not be empty".into()));
        }
        Ok(())
    }

    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.detection_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_constants() {
        let config = AppConfig::default();
        assert_eq!(config.video_width, 640);
        assert_eq!(config.video_height, 480);
        assert_eq!(config.detection_interval(), Duration::from_millis(300));
        assert_eq!(config.preferred_camera_label, "iphone");
        assert!(config.log_endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(
            &path,
            r#"{"detection_interval_ms": 150, "log_endpoint": "http://localhost:5000"}"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.detection_interval_ms, 150);
        assert_eq!(config.log_endpoint.as_deref(), Some("http://localhost:5000"));
        assert_eq!(config.video_width, 640);
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("settings.json");
        let config = AppConfig {
            preferred_camera_label: "logitech".into(),
            ..AppConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let result = AppConfig::load_from(&tmp.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_interval_and_resolution() {
        let zero_interval = AppConfig {
            detection_interval_ms: 0,
            ..AppConfig::default()
        };
        assert!(zero_interval.validate().is_err());

        let zero_width = AppConfig {
            video_width: 0,
            ..AppConfig::default()
        };
        assert!(zero_width.validate().is_err());
    }

    #[test]
    fn test_config_path_uses_app_dir() {
        if let Some(path) = AppConfig::config_path() {
            assert!(path.to_string_lossy().contains("MoodLens"));
        }
    }
}
