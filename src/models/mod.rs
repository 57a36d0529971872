//! Core data models for entity-changelog
//!
//! This module contains the trackable-entity contract, the change log record
//! and the update diff it carries.

pub mod change_log;
pub mod ids;
pub mod naming;
pub mod trackable;
pub mod update_diff;

pub use change_log::{Action, ChangeLog};
pub use ids::ChangeLogId;
pub use trackable::{Model, Trackable, TrackableExt, TrackingState};
pub use update_diff::{FieldChange, UpdateDiff};
