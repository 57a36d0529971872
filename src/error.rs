//! Custom error types for entity-changelog
//!
//! This module defines the error hierarchy for the change-capture engine using
//! thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::models::ChangeLogId;

/// The main error type for change-log operations
#[derive(Error, Debug)]
pub enum ChangeLogError {
    /// Entity snapshot or metadata could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Diff between two snapshots could not be computed
    #[error("Diff error: {0}")]
    Diff(String),

    /// Stored JSON could not be decoded into its registered shape
    #[error("Failed to decode change log {id}: {message}")]
    Decode {
        id: ChangeLogId,
        raw: String,
        message: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors outside the capture path
    #[error("JSON error: {0}")]
    Json(String),

    /// Change-log store errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ChangeLogError {
    /// Check if this is a decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }

    /// Raw JSON text that failed to decode, if any
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Decode { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ChangeLogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ChangeLogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for change-log operations
pub type ChangeLogResult<T> = Result<T, ChangeLogError>;
