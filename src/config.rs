//! Configuration management for camtex
//!
//! Catalog probing, session defaults and worker settings, loaded from and
//! saved to TOML.

use crate::errors::CameraError;
use crate::identifier::DEFAULT_CAMERA_ID;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest brute-force probe range accepted by `validate`
pub const MAX_PROBE_ID: u32 = 1024;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CamTexConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Camera discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Probe numeric ids the platform does not list
    pub probe_hidden: bool,
    /// Highest numeric id probed, inclusive
    pub probe_max_id: u32,
    /// Report the physical sensors behind logical cameras
    pub include_physical: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            probe_hidden: true,
            probe_max_id: 60,
            include_physical: true,
        }
    }
}

/// Session defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Camera opened when a request is empty
    pub default_camera_id: String,
    /// Preview buffer size [width, height]
    pub default_resolution: [u32; 2],
    /// Request the widest zoom ratio on standard sessions
    pub apply_zoom_fallback: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_camera_id: DEFAULT_CAMERA_ID.to_string(),
            default_resolution: [1280, 720],
            apply_zoom_fallback: true,
        }
    }
}

/// Worker thread configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: "CameraBackground".to_string(),
        }
    }
}

impl CamTexConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CameraError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: CamTexConfig = toml::from_str(&contents)
            .map_err(|e| CameraError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
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
        PathBuf::from("camtex.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), CameraError> {
        if self.catalog.probe_max_id > MAX_PROBE_ID {
            return Err(CameraError::ConfigError(format!(
                "probe_max_id must be at most {}",
                MAX_PROBE_ID
            )));
        }

        if self.session.default_camera_id.is_empty() {
            return Err(CameraError::ConfigError(
                "default_camera_id must not be empty".to_string(),
            ));
        }
        if self.session.default_resolution[0] == 0 || self.session.default_resolution[1] == 0 {
            return Err(CameraError::ConfigError(
                "Invalid default resolution".to_string(),
            ));
        }

        if self.worker.thread_name.trim().is_empty() {
            return Err(CameraError::ConfigError(
                "worker thread_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
