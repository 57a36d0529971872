//! entity-changelog - change tracking for mutable domain entities
//!
//! Whenever a tracked entity is created, updated or deleted, this crate
//! builds an immutable change log holding a snapshot of the entity, its
//! metadata and, for updates, an optional field-level diff. Stored JSON can
//! be decoded back into typed values through a type registry.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `models`: Trackable-entity contract, change log record, update diff
//! - `registry`: Tag-to-type registry used to decode stored JSON
//! - `config`: Capture options, settings file and paths
//! - `capture`: Capture coordinator and diff engine
//! - `storage`: Change-log sinks and sources (memory, JSONL file)
//! - `plugin`: Hooks called by a persistence layer around each mutation
//! - `error`: Custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use entity_changelog::config::Config;
//! use entity_changelog::plugin::ChangeLogPlugin;
//! use entity_changelog::storage::MemoryStore;
//!
//! let config = Config::builder()
//!     .compute_diff()
//!     .lazy_update(["updated_at"])
//!     .register_object_type::<User>("User")
//!     .build();
//! let plugin = ChangeLogPlugin::new(Arc::new(config), MemoryStore::new());
//!
//! plugin.after_create(&user)?;
//! let history = plugin.records(&user.id, true)?;
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod models;
pub mod plugin;
pub mod registry;
pub mod storage;

pub use capture::{ChangeCapture, Mutation};
pub use config::{Config, ConfigBuilder, ConfigOption};
pub use error::{ChangeLogError, ChangeLogResult};
pub use models::{
    Action, ChangeLog, ChangeLogId, Model, Trackable, TrackableExt, TrackingState, UpdateDiff,
};
pub use plugin::{ChangeLogPlugin, PriorSnapshot};
pub use registry::{DecodeStatus, Decoded, TypeRegistry};
pub use storage::{ChangeLogSink, ChangeLogSource, JsonlStore, MemoryStore};
