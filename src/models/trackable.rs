//! Trackable-entity contract
//!
//! An entity takes part in change tracking by embedding a [`TrackingState`]
//! and implementing [`Trackable`]. The state has no public fields and its
//! enabled check is only reachable through [`TrackableExt`], so a type that
//! merely exposes look-alike methods is never picked up.
//!
//! ```rust,ignore
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     id: String,
//!     name: String,
//!     #[serde(skip)]
//!     tracking: TrackingState,
//! }
//!
//! impl Trackable for User {
//!     fn tracking(&self) -> &TrackingState { &self.tracking }
//!     fn tracking_mut(&mut self) -> &mut TrackingState { &mut self.tracking }
//! }
//!
//! impl Model for User {
//!     fn primary_key(&self) -> String { self.id.clone() }
//!     fn as_trackable(&self) -> Option<&dyn Trackable> { Some(self) }
//! }
//! ```

use serde::Serialize;
use serde_json::Value;

use super::naming::short_type_name;

/// Per-instance tracking state embedded in every trackable entity
///
/// Not serialized with the entity; mark the field `#[serde(skip)]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingState {
    disabled: bool,
    secondary_index: String,
}

impl TrackingState {
    /// Create an enabled tracking state with no secondary index
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an enabled tracking state carrying a secondary correlation key
    pub fn with_secondary_index(value: impl Into<String>) -> Self {
        Self {
            disabled: false,
            secondary_index: value.into(),
        }
    }

    /// Check whether changes are currently recorded
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// Enable or disable change logging for this instance
    pub fn enable(&mut self, enabled: bool) {
        self.disabled = !enabled;
    }

    /// Get the secondary index value (empty when unset)
    pub fn secondary_index(&self) -> &str {
        &self.secondary_index
    }

    /// Set the secondary index value
    pub fn set_secondary_index(&mut self, value: impl Into<String>) {
        self.secondary_index = value.into();
    }
}

/// Capability set of an entity whose mutations are logged
pub trait Trackable {
    /// The embedded tracking state
    fn tracking(&self) -> &TrackingState;

    fn tracking_mut(&mut self) -> &mut TrackingState;

    /// Side information stored next to each snapshot (actor, request context)
    fn meta(&self) -> serde_json::Result<Value> {
        Ok(Value::Null)
    }

    /// Secondary correlation key, stored as `object_id2`
    fn secondary_index_value(&self) -> String {
        self.tracking().secondary_index().to_string()
    }

    /// Free-form author of the change, stored as `created_by`
    fn created_by(&self) -> String {
        String::new()
    }
}

/// Enable flag accessors, implemented for every [`Trackable`]
pub trait TrackableExt {
    fn is_tracked(&self) -> bool;
    fn set_tracked(&mut self, enabled: bool);
}

impl<T: Trackable + ?Sized> TrackableExt for T {
    fn is_tracked(&self) -> bool {
        self.tracking().is_enabled()
    }

    fn set_tracked(&mut self, enabled: bool) {
        self.tracking_mut().enable(enabled);
    }
}

/// A persisted entity as seen by the mutation hooks
pub trait Model: Serialize {
    /// Primary identifier, stored as `object_id`
    fn primary_key(&self) -> String;

    /// Type tag stored as `object_type` and used as the registry key on read
    fn object_type(&self) -> String {
        short_type_name::<Self>()
    }

    /// Opt-in to change tracking. Entities that do not return `Some` are never logged.
    fn as_trackable(&self) -> Option<&dyn Trackable> {
        None
    }
}
