// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod clean;
pub mod inspect;
pub mod run;
pub mod validate;

use std::path::Path;

use shmframe_core::{Config, ConfigLoader, FrameShareResult, RegionName};

/// Configuration file looked up when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "shmframe.yaml";

/// Load the explicit config, or the default file if present, or defaults.
pub fn load_config(path: Option<&str>) -> FrameShareResult<Config> {
    match path {
        Some(path) => ConfigLoader::load_file(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            ConfigLoader::load_file(DEFAULT_CONFIG_PATH)
        }
        None => Ok(Config::default()),
    }
}

/// Region name from the command line, falling back to the configuration.
pub fn resolve_region_name(
    config_path: Option<&str>,
    name: Option<String>,
) -> FrameShareResult<RegionName> {
    match name {
        Some(name) => Ok(RegionName::new(name)?),
        None => Ok(load_config(config_path)?.grabber.region_name),
    }
}
