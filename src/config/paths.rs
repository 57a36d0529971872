//! Path management for entity-changelog
//!
//! ## Path Resolution Order
//!
//! 1. `CHANGELOG_DATA_DIR` environment variable (if set)
//! 2. The platform config directory for `entity-changelog`
//!    (`~/.config/entity-changelog` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::ChangeLogError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "CHANGELOG_DATA_DIR";

/// Manages the paths used by file-backed change-log stores
#[derive(Debug, Clone)]
pub struct ChangeLogPaths {
    base_dir: PathBuf,
}

impl ChangeLogPaths {
    /// Resolve the base directory from the environment or the platform default
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, ChangeLogError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            ProjectDirs::from("", "", "entity-changelog")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    ChangeLogError::Config("Could not determine home directory".into())
                })?
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("changelog.json")
    }

    /// Get the path to the default JSONL change log
    pub fn change_log_file(&self) -> PathBuf {
        self.base_dir.join("changes.jsonl")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), ChangeLogError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| ChangeLogError::Io(format!("Failed to create base directory: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ChangeLogPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.settings_file(), temp_dir.path().join("changelog.json"));
        assert_eq!(
            paths.change_log_file(),
            temp_dir.path().join("changes.jsonl")
        );
    }

    #[test]
    fn test_env_var_override() {
        let temp_dir = TempDir::new().unwrap();
        let custom_path = temp_dir.path().to_str().unwrap();

        env::set_var(DATA_DIR_ENV, custom_path);
        let paths = ChangeLogPaths::new().unwrap();
        env::remove_var(DATA_DIR_ENV);

        assert_eq!(paths.base_dir(), temp_dir.path());
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ChangeLogPaths::with_base_dir(temp_dir.path().join("nested").join("dir"));

        paths.ensure_directories().unwrap();
        assert!(paths.base_dir().exists());
    }
}
