//! Configuration module for entity-changelog
//!
//! This module provides:
//! - The immutable capture configuration and its composable options
//! - Path resolution for the default change-log location
//! - A settings file that maps onto the options

pub mod options;
pub mod paths;
pub mod settings;

pub use options::{Config, ConfigBuilder, ConfigOption};
pub use paths::ChangeLogPaths;
pub use settings::Settings;
