//! Append-only JSONL change-log store
//!
//! Each change log is written as a single JSON line and flushed immediately.
//! Records are never rewritten; reading returns them in write order.
//! Appends through one store (and its clones) are serialized, and each line
//! goes to the file in a single write.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::{ChangeLogSink, ChangeLogSource};
use crate::error::{ChangeLogError, ChangeLogResult};
use crate::models::ChangeLog;

/// Change-log store backed by a line-delimited JSON file
#[derive(Debug, Clone)]
pub struct JsonlStore {
    log_path: PathBuf,
    append_lock: Arc<Mutex<()>>,
}

impl JsonlStore {
    /// Create a store writing to `log_path`; the file is created on first insert
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    fn lock_append(&self) -> ChangeLogResult<MutexGuard<'_, ()>> {
        self.append_lock
            .lock()
            .map_err(|e| ChangeLogError::Storage(format!("Failed to acquire append lock: {}", e)))
    }

    fn open_for_append(&self) -> ChangeLogResult<File> {
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChangeLogError::Io(format!("Failed to create change log directory: {}", e))
            })?;
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| ChangeLogError::Io(format!("Failed to open change log: {}", e)))
    }

    fn encode_line(record: &ChangeLog, buf: &mut String) -> ChangeLogResult<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| ChangeLogError::Json(format!("Failed to serialize change log: {}", e)))?;

        buf.push_str(&json);
        buf.push('\n');
        Ok(())
    }

    fn append(&self, lines: &str) -> ChangeLogResult<()> {
        let _guard = self.lock_append()?;
        let mut file = self.open_for_append()?;

        file.write_all(lines.as_bytes())
            .map_err(|e| ChangeLogError::Io(format!("Failed to write change log: {}", e)))?;

        file.flush()
            .map_err(|e| ChangeLogError::Io(format!("Failed to flush change log: {}", e)))
    }

    /// Read the most recent `count` records
    pub fn read_recent(&self, count: usize) -> ChangeLogResult<Vec<ChangeLog>> {
        let mut all = self.all()?;
        let start = all.len().saturating_sub(count);
        Ok(all.split_off(start))
    }

    /// Number of records in the file
    pub fn entry_count(&self) -> ChangeLogResult<usize> {
        if !self.log_path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.log_path)
            .map_err(|e| ChangeLogError::Io(format!("Failed to open change log: {}", e)))?;

        let count = BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter(|l| !l.trim().is_empty())
            .count();

        Ok(count)
    }

    /// Check whether the log file has been created
    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    /// Get the path of the log file
    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

impl ChangeLogSink for JsonlStore {
    fn insert(&self, record: &ChangeLog) -> ChangeLogResult<()> {
        let mut line = String::new();
        Self::encode_line(record, &mut line)?;
        self.append(&line)?;

        debug!(id = %record.id(), path = %self.log_path.display(), "change log appended");
        Ok(())
    }

    /// Writes all records in one append; nothing is written if one fails to encode
    fn insert_batch(&self, records: &[ChangeLog]) -> ChangeLogResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut lines = String::new();
        for record in records {
            Self::encode_line(record, &mut lines)?;
        }
        self.append(&lines)?;

        debug!(count = records.len(), path = %self.log_path.display(), "change logs appended");
        Ok(())
    }
}

impl ChangeLogSource for JsonlStore {
    fn all(&self) -> ChangeLogResult<Vec<ChangeLog>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| ChangeLogError::Io(format!("Failed to open change log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                ChangeLogError::Io(format!(
                    "Failed to read change log line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let record: ChangeLog = serde_json::from_str(&line).map_err(|e| {
                ChangeLogError::Storage(format!(
                    "Failed to parse change log at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            records.push(record);
        }

        Ok(records)
    }
}
