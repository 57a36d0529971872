//! Persistence hook adapter
//!
//! `ChangeLogPlugin` is what a persistence layer calls around each mutation.
//! The `before_*` hooks run before the write, the `after_*` hooks run after
//! it and insert the finished change log into the configured store.
//! Write-path errors are returned to the caller, which decides whether the
//! surrounding mutation should be rolled back.
//!
//! ```rust,ignore
//! let plugin = ChangeLogPlugin::new(Arc::new(config), MemoryStore::new());
//!
//! let prior = plugin.before_update(&user)?;
//! user.name = "Bob".into();
//! repository.save(&user)?;
//! plugin.after_update(prior, &user)?;
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::capture::{ChangeCapture, Mutation};
use crate::config::Config;
use crate::error::ChangeLogResult;
use crate::models::{ChangeLog, Model};
use crate::registry::DecodeStatus;
use crate::storage::{ChangeLogSink, ChangeLogSource};

/// Snapshot of an entity taken by [`ChangeLogPlugin::before_update`]
#[derive(Debug, Clone, Default)]
pub struct PriorSnapshot {
    value: Option<Value>,
}

impl PriorSnapshot {
    /// Get the snapshot, if one was taken
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// Hooks change capture into a persistence layer
#[derive(Debug)]
pub struct ChangeLogPlugin<S> {
    capture: ChangeCapture,
    store: S,
}

impl<S> ChangeLogPlugin<S> {
    pub fn new(config: Arc<Config>, store: S) -> Self {
        Self {
            capture: ChangeCapture::new(config),
            store,
        }
    }

    /// Get the capture configuration
    pub fn config(&self) -> &Config {
        self.capture.config()
    }

    /// Get the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ChangeLogSink> ChangeLogPlugin<S> {
    /// Whether the upcoming create will be logged
    pub fn before_create<M: Model + ?Sized>(&self, entity: &M) -> bool {
        ChangeCapture::is_eligible(entity)
    }

    /// Log a create and insert it into the store
    pub fn after_create<M: Model + ?Sized>(&self, entity: &M) -> ChangeLogResult<Option<ChangeLog>> {
        self.record(Mutation::Create, entity)
    }

    /// Take the prior snapshot needed for lazy update and diffs
    ///
    /// Nothing is serialized when the entity is not tracked or neither
    /// option needs the prior state.
    pub fn before_update<M: Model + ?Sized>(&self, entity: &M) -> ChangeLogResult<PriorSnapshot> {
        if !ChangeCapture::is_eligible(entity) || !self.capture.needs_prior() {
            return Ok(PriorSnapshot::default());
        }

        Ok(PriorSnapshot {
            value: Some(ChangeCapture::snapshot(entity)?),
        })
    }

    /// Log an update against the snapshot from [`ChangeLogPlugin::before_update`]
    pub fn after_update<M: Model + ?Sized>(
        &self,
        prior: PriorSnapshot,
        entity: &M,
    ) -> ChangeLogResult<Option<ChangeLog>> {
        self.record(
            Mutation::Update {
                prior: prior.value.as_ref(),
            },
            entity,
        )
    }

    /// Whether the upcoming delete will be logged
    pub fn before_delete<M: Model + ?Sized>(&self, entity: &M) -> bool {
        ChangeCapture::is_eligible(entity)
    }

    /// Log a delete; `entity` is the last known state of the deleted row
    pub fn after_delete<M: Model + ?Sized>(&self, entity: &M) -> ChangeLogResult<Option<ChangeLog>> {
        self.record(Mutation::Delete, entity)
    }

    fn record<M: Model + ?Sized>(
        &self,
        mutation: Mutation<'_>,
        entity: &M,
    ) -> ChangeLogResult<Option<ChangeLog>> {
        let Some(record) = self.capture.capture(mutation, entity)? else {
            return Ok(None);
        };

        self.store.insert(&record)?;
        Ok(Some(record))
    }
}

impl<S: ChangeLogSource> ChangeLogPlugin<S> {
    /// All change logs of an object, oldest first
    ///
    /// With `prepare`, object and meta are decoded through the registered
    /// types; decode problems are logged and leave the fields unset.
    pub fn records(&self, object_id: &str, prepare: bool) -> ChangeLogResult<Vec<ChangeLog>> {
        let mut records = self.store.by_object_id(object_id)?;
        if prepare {
            for record in &mut records {
                self.prepare(record);
            }
        }
        Ok(records)
    }

    /// The most recent change log of an object
    pub fn last_record(&self, object_id: &str, prepare: bool) -> ChangeLogResult<Option<ChangeLog>> {
        let mut record = self.store.last_for_object(object_id)?;
        if prepare {
            if let Some(record) = record.as_mut() {
                self.prepare(record);
            }
        }
        Ok(record)
    }

    /// Decode object and meta of a record in place
    pub fn prepare(&self, record: &mut ChangeLog) {
        let config = self.capture.config();

        match record.decode_object(config.object_types()) {
            Ok(DecodeStatus::NotRegistered) => debug!(
                object_type = %record.object_type(),
                "object type not registered, keeping raw object"
            ),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to decode change log object"),
        }

        match record.decode_meta(config.meta_types()) {
            Ok(DecodeStatus::NotRegistered) => debug!(
                object_type = %record.object_type(),
                "meta type not registered, keeping raw meta"
            ),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to decode change log meta"),
        }
    }
}
