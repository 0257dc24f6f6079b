// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict validation.
//!
//! Every field has a default, so an empty document is a valid configuration.
//! Any invalid field results in a HardValidationError.

use std::path::Path;

use serde::Deserialize;

use crate::error::{FrameShareError, FrameShareResult, HardValidationError};
use crate::types::{RegionName, DEFAULT_REGION_NAME};

/// Widest frame accepted by default (8K UHD).
const DEFAULT_MAX_WIDTH: u32 = 7680;
/// Tallest frame accepted by default (8K UHD).
const DEFAULT_MAX_HEIGHT: u32 = 4320;
/// Hard ceiling for either side.
const MAX_DIMENSION: u32 = 16384;

/// Raw grabber configuration (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGrabberConfig {
    #[serde(default = "default_region_name")]
    region_name: String,
    #[serde(default = "default_max_width")]
    max_width: u32,
    #[serde(default = "default_max_height")]
    max_height: u32,
    #[serde(default = "default_flush_on_close")]
    flush_on_close: bool,
    #[serde(default)]
    unlink_on_close: bool,
}

fn default_region_name() -> String {
    DEFAULT_REGION_NAME.to_string()
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}

fn default_flush_on_close() -> bool {
    true
}

impl Default for RawGrabberConfig {
    fn default() -> Self {
        Self {
            region_name: default_region_name(),
            max_width: default_max_width(),
            max_height: default_max_height(),
            flush_on_close: default_flush_on_close(),
            unlink_on_close: false,
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    grabber: RawGrabberConfig,
}

/// Validated grabber configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabberConfig {
    pub region_name: RegionName,
    pub max_width: u32,
    pub max_height: u32,
    pub flush_on_close: bool,
    pub unlink_on_close: bool,
}

impl Default for GrabberConfig {
    fn default() -> Self {
        Self {
            region_name: RegionName::default(),
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            flush_on_close: true,
            unlink_on_close: false,
        }
    }
}

/// Complete validated configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub grabber: GrabberConfig,
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> FrameShareResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(FrameShareError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| FrameShareError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> FrameShareResult<Config> {
        if content.trim().is_empty() {
            return Self::validate(RawConfig::default());
        }

        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| FrameShareError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> FrameShareResult<Config> {
        let grabber = Self::validate_grabber(raw.grabber)?;
        Ok(Config { grabber })
    }

    fn validate_grabber(raw: RawGrabberConfig) -> FrameShareResult<GrabberConfig> {
        let region_name = RegionName::new(raw.region_name)?;

        for (field, value) in [("max_width", raw.max_width), ("max_height", raw.max_height)] {
            if value == 0 || value > MAX_DIMENSION {
                return Err(HardValidationError::InvalidFieldValue {
                    field,
                    value: value.to_string(),
                    reason: format!("Must be between 1 and {}", MAX_DIMENSION),
                }
                .into());
            }
        }

        Ok(GrabberConfig {
            region_name,
            max_width: raw.max_width,
            max_height: raw.max_height,
            flush_on_close: raw.flush_on_close,
            unlink_on_close: raw.unlink_on_close,
        })
    }
}
