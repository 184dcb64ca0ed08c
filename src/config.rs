// SPDX-License-Identifier: GPL-3.0-only

//! Persistent scanner configuration
//!
//! Stored as JSON at `<config dir>/barcode-scan/config.json`. Missing fields
//! fall back to their defaults, so older files keep loading.

use crate::app::frame_processor::Symbology;
use crate::backends::camera::{CameraBackendType, CaptureOptions, Facing};
use crate::constants::{capture, v4l2, virtual_camera};
use crate::errors::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "barcode-scan";
/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Image replay settings for the virtual camera backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualCameraConfig {
    /// Image files or directories replayed as frames
    pub images: Vec<PathBuf>,
    /// Replay framerate (frames per second)
    pub framerate: u32,
    /// Facing reported for the virtual camera
    pub facing: Facing,
}

impl Default for VirtualCameraConfig {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            framerate: virtual_camera::DEFAULT_FRAMERATE,
            facing: Facing::External,
        }
    }
}

/// A V4L2 device with known placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V4l2DeviceConfig {
    /// Device node, e.g. `/dev/video0`
    pub path: String,
    #[serde(default)]
    pub facing: Facing,
    /// Display name (defaults to the path)
    #[serde(default)]
    pub name: Option<String>,
}

/// V4L2 backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct V4l2Config {
    /// Known devices; empty means every video node, with unknown facing
    pub devices: Vec<V4l2DeviceConfig>,
    /// Requested capture width
    pub width: u32,
    /// Requested capture height
    pub height: u32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            width: v4l2::DEFAULT_WIDTH,
            height: v4l2::DEFAULT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera backend to use
    pub backend: CameraBackendType,
    /// Preferred camera facing
    pub facing: Facing,
    /// Symbologies the decoder looks for
    pub symbologies: Vec<Symbology>,
    /// Virtual camera settings
    pub virtual_camera: VirtualCameraConfig,
    /// V4L2 settings
    pub v4l2: V4l2Config,
    /// Consecutive capture failures before the camera is declared lost
    pub max_consecutive_failures: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            facing: Facing::default(),
            symbologies: Symbology::DEFAULT.to_vec(),
            virtual_camera: VirtualCameraConfig::default(),
            v4l2: V4l2Config::default(),
            max_consecutive_failures: capture::MAX_CONSECUTIVE_FAILURES,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> ScanResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific file
    pub fn load_from(path: &Path) -> ScanResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)?;
        info!(path = %path.display(), backend = %config.backend, "Loaded config");
        Ok(config)
    }

    /// Write to the default location
    pub fn save(&self) -> ScanResult<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| ScanError::Config("no config directory available".into()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write to a specific file as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> ScanResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ScanError::Config(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| ScanError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Capture thread tuning derived from this config
    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            max_consecutive_failures: self.max_consecutive_failures.max(1),
            ..CaptureOptions::default()
        }
    }
}
