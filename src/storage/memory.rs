//! In-memory change-log store
//!
//! Keeps records in insertion order with secondary indexes on the columns a
//! database schema would index: `object_id`, `object_id2` and `created_by`.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{ChangeLogSink, ChangeLogSource};
use crate::error::{ChangeLogError, ChangeLogResult};
use crate::models::ChangeLog;

#[derive(Debug, Default)]
struct MemoryData {
    records: Vec<ChangeLog>,
    by_object_id: HashMap<String, Vec<usize>>,
    by_object_id2: HashMap<String, Vec<usize>>,
    by_created_by: HashMap<String, Vec<usize>>,
}

impl MemoryData {
    fn push(&mut self, record: ChangeLog) {
        let position = self.records.len();

        self.by_object_id
            .entry(record.object_id().to_string())
            .or_default()
            .push(position);
        if !record.object_id2().is_empty() {
            self.by_object_id2
                .entry(record.object_id2().to_string())
                .or_default()
                .push(position);
        }
        if !record.created_by().is_empty() {
            self.by_created_by
                .entry(record.created_by().to_string())
                .or_default()
                .push(position);
        }

        self.records.push(record);
    }

    fn collect(&self, positions: Option<&Vec<usize>>) -> Vec<ChangeLog> {
        positions
            .map(|p| p.iter().map(|&i| self.records[i].clone()).collect())
            .unwrap_or_default()
    }
}

/// Change-log store kept in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ChangeLogResult<RwLockReadGuard<'_, MemoryData>> {
        self.data
            .read()
            .map_err(|e| ChangeLogError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> ChangeLogResult<RwLockWriteGuard<'_, MemoryData>> {
        self.data
            .write()
            .map_err(|e| ChangeLogError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Number of stored records
    pub fn len(&self) -> ChangeLogResult<usize> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> ChangeLogResult<bool> {
        Ok(self.read()?.records.is_empty())
    }
}

impl ChangeLogSink for MemoryStore {
    fn insert(&self, record: &ChangeLog) -> ChangeLogResult<()> {
        self.write()?.push(record.clone());
        Ok(())
    }

    fn insert_batch(&self, records: &[ChangeLog]) -> ChangeLogResult<()> {
        let mut data = self.write()?;
        for record in records {
            data.push(record.clone());
        }
        Ok(())
    }
}

impl ChangeLogSource for MemoryStore {
    fn all(&self) -> ChangeLogResult<Vec<ChangeLog>> {
        Ok(self.read()?.records.clone())
    }

    fn by_object_id(&self, object_id: &str) -> ChangeLogResult<Vec<ChangeLog>> {
        let data = self.read()?;
        Ok(data.collect(data.by_object_id.get(object_id)))
    }

    fn by_object_id2(&self, object_id2: &str) -> ChangeLogResult<Vec<ChangeLog>> {
        let data = self.read()?;
        Ok(data.collect(data.by_object_id2.get(object_id2)))
    }

    fn by_created_by(&self, created_by: &str) -> ChangeLogResult<Vec<ChangeLog>> {
        let data = self.read()?;
        Ok(data.collect(data.by_created_by.get(created_by)))
    }

    fn last_for_object(&self, object_id: &str) -> ChangeLogResult<Option<ChangeLog>> {
        let data = self.read()?;
        Ok(data
            .by_object_id
            .get(object_id)
            .and_then(|p| p.last())
            .map(|&i| data.records[i].clone()))
    }
}
