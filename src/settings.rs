//! `unitdiff.toml` settings file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use unitdiff_core::GraphOrder;

use crate::output::OutputFormat;

/// File name looked up in the working directory when `--config` is absent.
pub const SETTINGS_FILE: &str = "unitdiff.toml";

/// Settings read from file. Every field is optional; command-line flags win.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub format: Option<OutputFormat>,
    pub absolute_paths: Option<bool>,
    pub include_added: Option<bool>,
    pub include_removed: Option<bool>,
    pub include_modified: Option<bool>,
    pub include_referencing: Option<bool>,
    pub include_units: Vec<String>,
    pub exclude_units: Vec<String>,
    pub ignore_changed_files: Vec<PathBuf>,
    pub traversal_sdk_version: Option<String>,
    pub solution: Option<PathBuf>,
    pub order: Option<GraphOrder>,
}

/// Loads `<dir>/unitdiff.toml`, or default settings when the file is absent.
pub fn load_settings(dir: &Path) -> anyhow::Result<Settings> {
    let path = dir.join(SETTINGS_FILE);
    if !path.is_file() {
        tracing::debug!("No {} in {}", SETTINGS_FILE, dir.display());
        return Ok(Settings::default());
    }
    load_settings_file(&path)
}

/// Loads a settings file that must exist.
pub fn load_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings = load_settings_from_str(&content)
        .with_context(|| format!("invalid settings file {}", path.display()))?;
    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

pub fn load_settings_from_str(content: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str(content)?)
}
