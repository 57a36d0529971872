//! Field-level update diff
//!
//! Serialized as an ordered JSON object keyed by field name:
//! `{"name": {"old": "Alice", "new": "Bob"}}`.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Old and new value of one changed field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

#[derive(Serialize)]
struct PairRef<'a> {
    old: &'a Value,
    new: &'a Value,
}

#[derive(Deserialize)]
struct Pair {
    #[serde(default)]
    old: Value,
    #[serde(default)]
    new: Value,
}

/// Fields whose serialized values differ between two snapshots, in field order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateDiff {
    changes: Vec<FieldChange>,
}

impl UpdateDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, field: impl Into<String>, old: Value, new: Value) {
        self.changes.push(FieldChange {
            field: field.into(),
            old,
            new,
        });
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Iterate over changes in field order
    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    /// Look up the change recorded for a field
    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }

    /// Names of the changed fields, in order
    pub fn fields(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.field.as_str()).collect()
    }

    /// One-line summary such as `name: "Alice" -> "Bob", age: 30 -> 31`
    pub fn summary(&self) -> String {
        self.changes
            .iter()
            .map(|c| format!("{}: {} -> {}", c.field, c.old, c.new))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl IntoIterator for UpdateDiff {
    type Item = FieldChange;
    type IntoIter = std::vec::IntoIter<FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl Serialize for UpdateDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.changes.len()))?;
        for change in &self.changes {
            map.serialize_entry(
                &change.field,
                &PairRef {
                    old: &change.old,
                    new: &change.new,
                },
            )?;
        }
        map.end()
    }
}

struct UpdateDiffVisitor;

impl<'de> Visitor<'de> for UpdateDiffVisitor {
    type Value = UpdateDiff;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of field name to {old, new}")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<UpdateDiff, A::Error> {
        let mut diff = UpdateDiff::new();
        while let Some((field, pair)) = access.next_entry::<String, Pair>()? {
            diff.push(field, pair.old, pair.new);
        }
        Ok(diff)
    }
}

impl<'de> Deserialize<'de> for UpdateDiff {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(UpdateDiffVisitor)
    }
}
