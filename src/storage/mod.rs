//! Change-log stores
//!
//! The persistence layer only has to accept finished records
//! ([`ChangeLogSink`]) and hand them back for reading ([`ChangeLogSource`]).
//! Two stores ship with the crate:
//!
//! - `MemoryStore`: records kept in memory with indexes on `object_id`,
//!   `object_id2` and `created_by`.
//! - `JsonlStore`: append-only line-delimited JSON file.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use crate::error::ChangeLogResult;
use crate::models::ChangeLog;

/// Accepts change logs for storage
pub trait ChangeLogSink {
    fn insert(&self, record: &ChangeLog) -> ChangeLogResult<()>;

    /// Insert several records; stores may override to write them together
    fn insert_batch(&self, records: &[ChangeLog]) -> ChangeLogResult<()> {
        for record in records {
            self.insert(record)?;
        }
        Ok(())
    }
}

/// Reads stored change logs back, oldest first
pub trait ChangeLogSource {
    fn all(&self) -> ChangeLogResult<Vec<ChangeLog>>;

    fn by_object_id(&self, object_id: &str) -> ChangeLogResult<Vec<ChangeLog>> {
        Ok(matching(self.all()?, |r| r.object_id() == object_id))
    }

    /// Records sharing a secondary index value; an empty value matches nothing
    fn by_object_id2(&self, object_id2: &str) -> ChangeLogResult<Vec<ChangeLog>> {
        if object_id2.is_empty() {
            return Ok(Vec::new());
        }
        Ok(matching(self.all()?, |r| r.object_id2() == object_id2))
    }

    /// Records written by an author; an empty author matches nothing
    fn by_created_by(&self, created_by: &str) -> ChangeLogResult<Vec<ChangeLog>> {
        if created_by.is_empty() {
            return Ok(Vec::new());
        }
        Ok(matching(self.all()?, |r| r.created_by() == created_by))
    }

    /// Most recent record for an object
    fn last_for_object(&self, object_id: &str) -> ChangeLogResult<Option<ChangeLog>> {
        Ok(self.by_object_id(object_id)?.pop())
    }
}

impl<S: ChangeLogSink + ?Sized> ChangeLogSink for Arc<S> {
    fn insert(&self, record: &ChangeLog) -> ChangeLogResult<()> {
        (**self).insert(record)
    }

    fn insert_batch(&self, records: &[ChangeLog]) -> ChangeLogResult<()> {
        (**self).insert_batch(records)
    }
}

impl<S: ChangeLogSource + ?Sized> ChangeLogSource for Arc<S> {
    fn all(&self) -> ChangeLogResult<Vec<ChangeLog>> {
        (**self).all()
    }

    fn by_object_id(&self, object_id: &str) -> ChangeLogResult<Vec<ChangeLog>> {
        (**self).by_object_id(object_id)
    }

    fn by_object_id2(&self, object_id2: &str) -> ChangeLogResult<Vec<ChangeLog>> {
        (**self).by_object_id2(object_id2)
    }

    fn by_created_by(&self, created_by: &str) -> ChangeLogResult<Vec<ChangeLog>> {
        (**self).by_created_by(created_by)
    }

    fn last_for_object(&self, object_id: &str) -> ChangeLogResult<Option<ChangeLog>> {
        (**self).last_for_object(object_id)
    }
}

fn matching<F>(records: Vec<ChangeLog>, predicate: F) -> Vec<ChangeLog>
where
    F: Fn(&ChangeLog) -> bool,
{
    records.into_iter().filter(|r| predicate(r)).collect()
}
