//! Configuration management for CrabCapture
//!
//! Provides loading, saving and validation of the capture-session settings:
//! preset, device preference order, orientation and frame-delivery tuning.

use crate::errors::CameraError;
use crate::types::{DeviceSelector, SessionPreset, VideoOrientation, DEFAULT_DEVICE_PREFERENCE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `CRABCAPTURE__SESSION__PRESET=high`
pub const ENV_PREFIX: &str = "CRABCAPTURE";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CrabCaptureConfig {
    pub session: SessionConfig,
    pub delivery: DeliveryConfig,
}

/// Capture-session setup configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Preferred preset; falls back to the device default when unsupported
    pub preset: SessionPreset,
    /// Orientation forced on the input/output connection, `None` keeps the driver's
    pub orientation: Option<VideoOrientation>,
    /// Devices tried in order, first available wins
    pub device_preference: Vec<DeviceSelector>,
}

/// Frame-delivery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Frames buffered for the consumer before the oldest is dropped
    pub buffer_capacity: usize,
    /// How often the delivery worker re-checks for shutdown while idle
    pub poll_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preset: SessionPreset::Photo,
            orientation: Some(VideoOrientation::Portrait),
            device_preference: DEFAULT_DEVICE_PREFERENCE.to_vec(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 4,
            poll_interval_ms: 50,
        }
    }
}

impl CrabCaptureConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CameraError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: CrabCaptureConfig = toml::from_str(&contents)
            .map_err(|e| CameraError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load from an optional file, then apply `CRABCAPTURE__*` environment overrides
    pub fn load_layered<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();
        let config: CrabCaptureConfig = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|layered| layered.try_deserialize())
            .map_err(|e| CameraError::ConfigError(format!("Failed to load layered config: {}", e)))?;

        config.validate().map_err(CameraError::ConfigError)?;
        log::debug!("Layered configuration resolved from {:?} and environment", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CameraError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CameraError::ConfigError(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabcapture.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.session.device_preference.is_empty() {
            return Err("Device preference list must not be empty".to_string());
        }
        let mut seen = HashSet::new();
        for selector in &self.session.device_preference {
            if !seen.insert(selector) {
                return Err(format!("Duplicate device preference entry: {}", selector));
            }
        }

        if self.delivery.buffer_capacity == 0 || self.delivery.buffer_capacity > 1024 {
            return Err("Delivery buffer capacity must be between 1 and 1024".to_string());
        }
        if self.delivery.poll_interval_ms == 0 || self.delivery.poll_interval_ms > 10_000 {
            return Err("Delivery poll interval must be between 1 and 10000 ms".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DevicePosition, DeviceType};

    #[test]
    fn test_default_config() {
        let config = CrabCaptureConfig::default();
        assert_eq!(config.session.preset, SessionPreset::Photo);
        assert_eq!(config.session.orientation, Some(VideoOrientation::Portrait));
        assert_eq!(config.session.device_preference.len(), 4);
        assert_eq!(config.delivery.buffer_capacity, 4);
    }

    #[test]
    fn test_config_validation() {
        let config = CrabCaptureConfig::default();
        assert!(config.validate().is_ok());

        let mut empty = config.clone();
        empty.session.device_preference.clear();
        assert!(empty.validate().is_err());

        let mut duplicate = config.clone();
        duplicate
            .session
            .device_preference
            .push(DEFAULT_DEVICE_PREFERENCE[0]);
        assert!(duplicate.validate().unwrap_err().contains("Duplicate"));

        let mut no_buffer = config;
        no_buffer.delivery.buffer_capacity = 0;
        assert!(no_buffer.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("nested").join("crabcapture.toml");

        let mut config = CrabCaptureConfig::default();
        config.session.preset = SessionPreset::Hd1280x720;
        config.session.orientation = Some(VideoOrientation::LandscapeLeft);
        assert!(config.save_to_file(&config_path).is_ok());

        let loaded = CrabCaptureConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_toml_format() {
        let config = CrabCaptureConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[session]"));
        assert!(toml_string.contains("[delivery]"));
        assert!(toml_string.contains("preset = \"photo\""));
        assert!(toml_string.contains("built_in_dual_wide_camera"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("partial.toml");
        fs::write(
            &config_path,
            r#"
[session]
preset = "low"
device_preference = [{ device_type = "built_in_wide_angle_camera", position = "front" }]
"#,
        )
        .unwrap();

        let loaded = CrabCaptureConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.session.preset, SessionPreset::Low);
        assert_eq!(
            loaded.session.device_preference,
            vec![DeviceSelector::new(
                DeviceType::BuiltInWideAngleCamera,
                DevicePosition::Front
            )]
        );
        assert_eq!(loaded.delivery, DeliveryConfig::default());
    }

    #[test]
    fn test_layered_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("layered.toml");
        fs::write(&config_path, "[delivery]\nbuffer_capacity = 16\n").unwrap();

        let loaded = CrabCaptureConfig::load_layered(&config_path).unwrap();
        assert_eq!(loaded.delivery.buffer_capacity, 16);
        assert_eq!(loaded.session, SessionConfig::default());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = CrabCaptureConfig::load_from_file("nonexistent_file.toml");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), CrabCaptureConfig::default());
    }
}
