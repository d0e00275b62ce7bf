//! Shared command utilities
//!
//! This module contains:
//! - `load_config` - Resolve the detector configuration for a command

use std::path::Path;

use anyhow::{bail, Context, Result};
use recur_core::DetectionConfig;

/// Load config from an explicit path, or the default override location
///
/// An explicit path must exist; only the default location falls back to
/// the built-in defaults when absent.
pub fn load_config(config_path: Option<&Path>) -> Result<DetectionConfig> {
    match config_path {
        Some(path) if !path.exists() => bail!("Config file not found: {}", path.display()),
        Some(path) => DetectionConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => DetectionConfig::load().context("Failed to load config"),
    }
}
