//! Settings file for entity-changelog
//!
//! Persists the capture toggles as JSON so a host application can keep them
//! next to its own configuration. Type registrations are code-only and are
//! added on top of the options produced here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::options::{self, ConfigBuilder, ConfigOption};
use super::paths::ChangeLogPaths;
use crate::error::ChangeLogError;

/// Capture settings loaded from `changelog.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Record field diffs on update
    #[serde(default)]
    pub compute_diff: bool,

    /// Skip updates that change nothing
    #[serde(default)]
    pub lazy_update: bool,

    /// Fields ignored by lazy update
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lazy_update_fields: Vec<String>,

    /// Override for the JSONL change-log location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from disk, or use defaults if the file doesn't exist
    pub fn load_or_create(paths: &ChangeLogPaths) -> Result<Self, ChangeLogError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| ChangeLogError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| ChangeLogError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ChangeLogPaths) -> Result<(), ChangeLogError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ChangeLogError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| ChangeLogError::Io(format!("Failed to write settings file: {}", e)))
    }

    /// Path of the JSONL change log, honoring `log_file`
    pub fn log_path(&self, paths: &ChangeLogPaths) -> PathBuf {
        match &self.log_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => paths.base_dir().join(path),
            None => paths.change_log_file(),
        }
    }

    /// Apply these settings to a builder, keeping its type registrations
    pub fn apply(&self, builder: ConfigBuilder) -> ConfigBuilder {
        self.options()
            .into_iter()
            .fold(builder, |builder, option| builder.apply(option))
    }

    /// Options equivalent to these settings
    pub fn options(&self) -> Vec<ConfigOption> {
        let mut opts = Vec::new();
        if self.compute_diff {
            opts.push(options::compute_diff());
        }
        if self.lazy_update {
            opts.push(options::lazy_update(self.lazy_update_fields.clone()));
        }
        opts
    }
}
