// SPDX-License-Identifier: MIT OR Apache-2.0
//! Driver settings and animation configuration files.
//!
//! This module manages:
//! - Persistent playback defaults ([`DriverSettings`])
//! - RON animation files ([`AnimationConfig`])

use crate::curve::ProgressCurve;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current animation file format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON for this format
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Value could not be written as RON
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// File was written by a newer format
    #[error("Animation file version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Newest supported version
        supported: u32,
    },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Persistent playback defaults of a driver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Seconds for one traversal of the curve
    pub duration: f32,
    /// Repeat until stopped explicitly
    pub looping: bool,
    /// Travel from 1 to 0
    pub reversed: bool,
    /// Play when the host starts the object
    pub animate_on_start: bool,
    /// Play when the host enables the object
    pub animate_on_enable: bool,
    /// Snap progress back to the t=0 value when stopped
    pub revert_on_stop: bool,
    /// Deactivate the owner when stopped
    pub deactivate_on_stop: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            duration: 1.0,
            looping: false,
            reversed: false,
            animate_on_start: true,
            animate_on_enable: true,
            revert_on_stop: true,
            deactivate_on_stop: true,
        }
    }
}

/// A named progress curve with its playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Display name
    pub name: String,
    /// Curve sampled by the driver
    #[serde(default)]
    pub progress_curve: ProgressCurve,
    /// Playback defaults
    #[serde(default)]
    pub settings: DriverSettings,
}

fn default_version() -> u32 {
    CONFIG_FORMAT_VERSION
}

impl AnimationConfig {
    /// Create a config with the identity curve and default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            name: name.into(),
            progress_curve: ProgressCurve::default(),
            settings: DriverSettings::default(),
        }
    }

    /// Parse from a RON string
    ///
    /// Curve rule violations are logged, not rejected.
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: AnimationConfig = ron::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Reject newer format versions and log curve rule violations
    ///
    /// Used when the config is embedded in a larger file.
    pub fn check(&self) -> Result<()> {
        if self.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }

        if let Err(e) = self.progress_curve.validate() {
            tracing::warn!("Animation '{}': {e}", self.name);
        }
        Ok(())
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        tracing::debug!("Loaded animation '{}' from {:?}", config.name, path);
        Ok(config)
    }

    /// Write as pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Save to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self::new("Untitled Animation")
    }
}
