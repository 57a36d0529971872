//! Change log record
//!
//! A `ChangeLog` is written once per tracked mutation and never modified
//! afterwards. The persisted columns are private and only readable through
//! accessors; the decoded `object` and `meta` values are filled in on read.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ids::ChangeLogId;
use super::update_diff::UpdateDiff;
use crate::error::{ChangeLogError, ChangeLogResult};
use crate::registry::{DecodeStatus, Decoded, TypeRegistry};

/// Action recorded by a change log
///
/// Only `create`, `update` and `delete` are written; anything else read back
/// from storage is kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Delete,
    Other(String),
}

impl Action {
    /// Lowercase wire name of the action
    pub fn as_str(&self) -> &str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Other(other) => other,
        }
    }
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        match s {
            "create" => Action::Create,
            "update" => Action::Update,
            "delete" => Action::Delete,
            other => Action::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Action::from(s.as_str()))
    }
}

/// A single change log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLog {
    id: ChangeLogId,

    created_at: DateTime<Utc>,

    action: Action,

    /// Primary key of the tracked object
    #[serde(default)]
    object_id: String,

    /// Secondary correlation key of the tracked object
    #[serde(default)]
    object_id2: String,

    /// Short type name of the tracked object; not namespaced
    #[serde(default)]
    object_type: String,

    #[serde(default)]
    raw_object: String,

    #[serde(default)]
    raw_meta: String,

    #[serde(default)]
    raw_diff: String,

    /// Free-form author field, opaque to this crate
    #[serde(default)]
    created_by: String,

    #[serde(skip)]
    object: Option<Decoded>,

    #[serde(skip)]
    meta: Option<Decoded>,
}

impl ChangeLog {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        action: Action,
        object_id: String,
        object_id2: String,
        object_type: String,
        raw_object: String,
        raw_meta: String,
        raw_diff: String,
        created_by: String,
    ) -> Self {
        Self {
            id: ChangeLogId::new(),
            created_at: Utc::now(),
            action,
            object_id,
            object_id2,
            object_type,
            raw_object,
            raw_meta,
            raw_diff,
            created_by,
            object: None,
            meta: None,
        }
    }

    /// Get the record ID
    pub fn id(&self) -> ChangeLogId {
        self.id
    }

    /// Get the capture timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the mutation kind
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Get the primary key of the changed entity
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// Get the secondary index value (empty when unset)
    pub fn object_id2(&self) -> &str {
        &self.object_id2
    }

    /// Get the type tag used for decoding
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Get the JSON snapshot of the entity
    pub fn raw_object(&self) -> &str {
        &self.raw_object
    }

    /// Get the JSON metadata
    pub fn raw_meta(&self) -> &str {
        &self.raw_meta
    }

    /// Get the JSON diff (empty when none was computed)
    pub fn raw_diff(&self) -> &str {
        &self.raw_diff
    }

    /// Get the author of the change (empty when unknown)
    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    /// Decoded object, if [`ChangeLog::decode_object`] succeeded
    pub fn object(&self) -> Option<&Decoded> {
        self.object.as_ref()
    }

    /// Decoded meta, if [`ChangeLog::decode_meta`] succeeded
    pub fn meta(&self) -> Option<&Decoded> {
        self.meta.as_ref()
    }

    /// Borrow the decoded object as `T`
    pub fn object_as<T: 'static>(&self) -> Option<&T> {
        self.object.as_ref().and_then(|d| d.downcast_ref::<T>())
    }

    /// Borrow the decoded meta as `T`
    pub fn meta_as<T: 'static>(&self) -> Option<&T> {
        self.meta.as_ref().and_then(|d| d.downcast_ref::<T>())
    }

    /// Parse the stored diff
    ///
    /// Returns `None` when no diff was recorded. To decode into your own
    /// structure, use [`ChangeLog::raw_diff`] directly.
    pub fn diff(&self) -> ChangeLogResult<Option<UpdateDiff>> {
        if is_blank(&self.raw_diff) {
            return Ok(None);
        }

        serde_json::from_str(&self.raw_diff)
            .map(Some)
            .map_err(|e| self.decode_error(&self.raw_diff, e))
    }

    /// Decode `raw_object` with the shape registered for `object_type`
    pub fn decode_object(&mut self, registry: &TypeRegistry) -> ChangeLogResult<DecodeStatus> {
        let (status, decoded) = self.decode_raw(registry, &self.raw_object)?;
        if decoded.is_some() {
            self.object = decoded;
        }
        Ok(status)
    }

    /// Decode `raw_meta` with the meta shape registered for `object_type`
    pub fn decode_meta(&mut self, registry: &TypeRegistry) -> ChangeLogResult<DecodeStatus> {
        let (status, decoded) = self.decode_raw(registry, &self.raw_meta)?;
        if decoded.is_some() {
            self.meta = decoded;
        }
        Ok(status)
    }

    fn decode_raw(
        &self,
        registry: &TypeRegistry,
        raw: &str,
    ) -> ChangeLogResult<(DecodeStatus, Option<Decoded>)> {
        if is_blank(raw) {
            return Ok((DecodeStatus::Empty, None));
        }

        match registry.decode(&self.object_type, raw) {
            None => Ok((DecodeStatus::NotRegistered, None)),
            Some(Ok(decoded)) => Ok((DecodeStatus::Decoded, Some(decoded))),
            Some(Err(e)) => Err(self.decode_error(raw, e)),
        }
    }

    fn decode_error(&self, raw: &str, err: serde_json::Error) -> ChangeLogError {
        ChangeLogError::Decode {
            id: self.id,
            raw: raw.to_string(),
            message: err.to_string(),
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action,
            self.object_type,
            self.object_id
        );

        if !self.created_by.is_empty() {
            output.push_str(&format!(" by {}", self.created_by));
        }

        if let Ok(Some(diff)) = self.diff() {
            if !diff.is_empty() {
                output.push_str(&format!("\n  Changes: {}", diff.summary()));
            }
        }

        output
    }
}

fn is_blank(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw == "null"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Client {
        id: String,
        name: String,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct ClientMeta {
        actor: String,
    }

    fn client_log(raw_object: &str, raw_meta: &str, raw_diff: &str) -> ChangeLog {
        ChangeLog::new(
            Action::Update,
            "42".into(),
            String::new(),
            "Client".into(),
            raw_object.into(),
            raw_meta.into(),
            raw_diff.into(),
            "admin".into(),
        )
    }

    #[test]
    fn test_action_display_and_parse() {
        assert_eq!(Action::Create.to_string(), "CREATE");
        assert_eq!(Action::from("delete"), Action::Delete);
        assert_eq!(Action::from("restore"), Action::Other("restore".into()));
        assert_eq!(Action::Other("restore".into()).as_str(), "restore");
    }

    #[test]
    fn test_unknown_action_survives_read() {
        let stored = json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "created_at": "2024-01-01T00:00:00Z",
            "action": "archive",
            "object_id": "42",
            "object_type": "Client"
        });

        let log: ChangeLog = serde_json::from_value(stored).unwrap();
        assert_eq!(log.action(), &Action::Other("archive".into()));
        assert_eq!(log.raw_meta(), "");
        assert_eq!(log.raw_diff(), "");
    }

    #[test]
    fn test_serialization_skips_decoded_fields() {
        let mut registry = TypeRegistry::new();
        registry.register::<Client>("Client");

        let mut log = client_log(r#"{"id":"42","name":"Alice"}"#, "null", "");
        log.decode_object(&registry).unwrap();

        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["action"], "update");
        assert_eq!(value["object_id"], "42");
        assert_eq!(value["created_by"], "admin");
        assert!(value.get("object").is_none());
        assert!(value.get("meta").is_none());
    }

    #[test]
    fn test_decode_object_and_meta() {
        let mut objects = TypeRegistry::new();
        objects.register::<Client>("Client");
        let mut metas = TypeRegistry::new();
        metas.register::<ClientMeta>("Client");

        let mut log = client_log(
            r#"{"id":"42","name":"Alice"}"#,
            r#"{"actor":"root"}"#,
            "",
        );

        assert_eq!(log.decode_object(&objects).unwrap(), DecodeStatus::Decoded);
        assert_eq!(log.decode_meta(&metas).unwrap(), DecodeStatus::Decoded);
        assert_eq!(log.object_as::<Client>().unwrap().name, "Alice");
        assert_eq!(log.meta_as::<ClientMeta>().unwrap().actor, "root");
    }

    #[test]
    fn test_decode_unregistered_is_not_an_error() {
        let mut log = client_log(r#"{"id":"42","name":"Alice"}"#, "null", "");

        let status = log.decode_object(&TypeRegistry::new()).unwrap();
        assert_eq!(status, DecodeStatus::NotRegistered);
        assert!(log.object().is_none());
        assert_eq!(log.raw_object(), r#"{"id":"42","name":"Alice"}"#);
    }

    #[test]
    fn test_decode_empty_meta() {
        let mut metas = TypeRegistry::new();
        metas.register::<ClientMeta>("Client");

        let mut log = client_log(r#"{"id":"42","name":"Alice"}"#, "null", "");
        assert_eq!(log.decode_meta(&metas).unwrap(), DecodeStatus::Empty);
        assert!(log.meta().is_none());
    }

    #[test]
    fn test_decode_failure_keeps_raw() {
        let mut objects = TypeRegistry::new();
        objects.register::<Client>("Client");

        let mut log = client_log(r#"{"id":42}"#, "null", "");
        let err = log.decode_object(&objects).unwrap_err();

        assert!(err.is_decode());
        assert_eq!(err.raw(), Some(r#"{"id":42}"#));
        assert!(log.object().is_none());
        assert_eq!(log.raw_object(), r#"{"id":42}"#);
    }

    #[test]
    fn test_diff_accessor() {
        let log = client_log(
            r#"{"id":"42","name":"Bob"}"#,
            "null",
            r#"{"name":{"old":"Alice","new":"Bob"}}"#,
        );

        let diff = log.diff().unwrap().unwrap();
        let change = diff.get("name").unwrap();
        assert_eq!(change.old, json!("Alice"));
        assert_eq!(change.new, json!("Bob"));

        let no_diff = client_log("{}", "null", "");
        assert!(no_diff.diff().unwrap().is_none());

        let broken = client_log("{}", "null", "{not json");
        assert!(broken.diff().unwrap_err().is_decode());
    }

    #[test]
    fn test_human_readable_format() {
        let log = client_log(
            r#"{"id":"42","name":"Bob"}"#,
            "null",
            r#"{"name":{"old":"Alice","new":"Bob"}}"#,
        );

        let formatted = log.format_human_readable();
        assert!(formatted.contains("UPDATE Client 42"));
        assert!(formatted.contains("by admin"));
        assert!(formatted.contains(r#"name: "Alice" -> "Bob""#));
    }
}
