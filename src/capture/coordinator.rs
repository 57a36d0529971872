//! Capture coordinator
//!
//! Decides, for one mutation of one entity, whether a change log is written
//! and builds it. Nothing here touches storage: the caller inserts the
//! returned record (see [`crate::plugin::ChangeLogPlugin`]).

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::diff::{changed_fields, diff_snapshots};
use crate::config::Config;
use crate::error::{ChangeLogError, ChangeLogResult};
use crate::models::{Action, ChangeLog, Model, TrackableExt};

/// The mutation being captured
#[derive(Debug, Clone, Copy)]
pub enum Mutation<'a> {
    Create,
    /// `prior` is the snapshot taken before the update, if one was taken
    Update { prior: Option<&'a Value> },
    Delete,
}

impl Mutation<'_> {
    /// Action recorded for this mutation
    pub fn action(&self) -> Action {
        match self {
            Mutation::Create => Action::Create,
            Mutation::Update { .. } => Action::Update,
            Mutation::Delete => Action::Delete,
        }
    }
}

/// Builds change logs according to a shared [`Config`]
#[derive(Debug, Clone)]
pub struct ChangeCapture {
    config: Arc<Config>,
}

impl ChangeCapture {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Get the capture configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether updates need the prior snapshot (lazy update or diffs)
    pub fn needs_prior(&self) -> bool {
        self.config.lazy_update() || self.config.compute_diff()
    }

    /// Whether mutations of `entity` are logged at all
    pub fn is_eligible<M: Model + ?Sized>(entity: &M) -> bool {
        entity.as_trackable().is_some_and(|t| t.is_tracked())
    }

    /// Serialize an entity the same way its `raw_object` is written
    pub fn snapshot<M: Model + ?Sized>(entity: &M) -> ChangeLogResult<Value> {
        serde_json::to_value(entity).map_err(|e| {
            ChangeLogError::Serialization(format!(
                "Failed to serialize {}: {}",
                entity.object_type(),
                e
            ))
        })
    }

    /// Build the change log for a mutation
    ///
    /// Returns `Ok(None)` when the entity is not tracked, is disabled, or a
    /// lazy update found nothing worth logging.
    pub fn capture<M: Model + ?Sized>(
        &self,
        mutation: Mutation<'_>,
        entity: &M,
    ) -> ChangeLogResult<Option<ChangeLog>> {
        let object_type = entity.object_type();

        let Some(trackable) = entity.as_trackable() else {
            debug!(object_type = %object_type, "entity is not trackable, skipping change log");
            return Ok(None);
        };

        if !trackable.is_tracked() {
            debug!(object_type = %object_type, "change logging disabled for instance");
            return Ok(None);
        }

        let current = Self::snapshot(entity)?;
        let prior = match mutation {
            Mutation::Update { prior: None } if self.needs_prior() => {
                warn!(
                    object_type = %object_type,
                    "update captured without a prior snapshot, skipping lazy check and diff"
                );
                None
            }
            Mutation::Update { prior } => prior,
            _ => None,
        };

        if let Some(prior) = prior {
            if self.config.lazy_update() {
                let changed =
                    changed_fields(prior, &current, |field| self.config.is_lazy_ignored(field))?;
                if changed.is_empty() {
                    debug!(object_type = %object_type, "no tracked field changed, update suppressed");
                    return Ok(None);
                }
            }
        }

        let raw_meta = trackable
            .meta()
            .map(|meta| meta.to_string())
            .map_err(|e| {
                ChangeLogError::Serialization(format!(
                    "Failed to serialize meta of {}: {}",
                    object_type, e
                ))
            })?;

        let raw_diff = match prior {
            Some(prior) if self.config.compute_diff() => {
                let diff = diff_snapshots(prior, &current)?;
                serde_json::to_string(&diff).map_err(|e| {
                    ChangeLogError::Serialization(format!("Failed to serialize diff: {}", e))
                })?
            }
            _ => String::new(),
        };

        let record = ChangeLog::new(
            mutation.action(),
            entity.primary_key(),
            trackable.secondary_index_value(),
            object_type,
            current.to_string(),
            raw_meta,
            raw_diff,
            trackable.created_by(),
        );

        debug!(
            id = %record.id(),
            action = %record.action(),
            object_type = %record.object_type(),
            object_id = %record.object_id(),
            "change log captured"
        );

        Ok(Some(record))
    }
}
