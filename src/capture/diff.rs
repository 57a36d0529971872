//! Diff engine
//!
//! Compares two snapshots of the same entity field by field. Values are
//! compared in their canonical JSON form, so a `null` field and a missing
//! field are equal and never show up in a diff. Fields come out in
//! serialization order, which for derived `Serialize` impls is declaration
//! order, so the same inputs always produce the same `raw_diff` text.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ChangeLogError, ChangeLogResult};
use crate::models::UpdateDiff;

/// Compute the diff between two values of the same shape
pub fn compute_diff<T: Serialize + ?Sized>(before: &T, after: &T) -> ChangeLogResult<UpdateDiff> {
    let before = to_snapshot(before)?;
    let after = to_snapshot(after)?;
    diff_snapshots(&before, &after)
}

/// Compute the diff between two already serialized snapshots
pub fn diff_snapshots(before: &Value, after: &Value) -> ChangeLogResult<UpdateDiff> {
    let mut diff = UpdateDiff::new();
    for (field, old, new) in changed_entries(before, after)? {
        diff.push(field, old.clone(), new.clone());
    }
    Ok(diff)
}

/// Names of the fields that changed, skipping those `ignored` accepts
pub fn changed_fields<F>(before: &Value, after: &Value, ignored: F) -> ChangeLogResult<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    Ok(changed_entries(before, after)?
        .into_iter()
        .map(|(field, _, _)| field)
        .filter(|field| !ignored(field))
        .map(str::to_string)
        .collect())
}

fn to_snapshot<T: Serialize + ?Sized>(value: &T) -> ChangeLogResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ChangeLogError::Diff(format!("Failed to serialize snapshot: {}", e)))
}

fn as_fields(value: &Value) -> ChangeLogResult<&Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        ChangeLogError::Diff(format!(
            "Snapshot is not an object with fields: {}",
            kind_of(value)
        ))
    })
}

static NULL: Value = Value::Null;

fn changed_entries<'a>(
    before: &'a Value,
    after: &'a Value,
) -> ChangeLogResult<Vec<(&'a str, &'a Value, &'a Value)>> {
    let before_fields = as_fields(before)?;
    let after_fields = as_fields(after)?;

    let mut changes = Vec::new();
    for field in merged_field_order(before_fields, after_fields) {
        let old = before_fields.get(field).unwrap_or(&NULL);
        let new = after_fields.get(field).unwrap_or(&NULL);
        if old != new {
            changes.push((field, old, new));
        }
    }

    Ok(changes)
}

/// Field names of both snapshots in declaration order
///
/// Starts from the new snapshot's order and slots each field that only the
/// prior snapshot has right after its predecessor there. A field skipped
/// during serialization on one side therefore keeps its declared position.
fn merged_field_order<'a>(
    before: &'a Map<String, Value>,
    after: &'a Map<String, Value>,
) -> Vec<&'a str> {
    let mut order: Vec<&'a str> = after.keys().map(String::as_str).collect();
    let mut insert_at = 0;

    for field in before.keys() {
        match order.iter().position(|f| *f == field.as_str()) {
            Some(pos) => insert_at = pos + 1,
            None => {
                order.insert(insert_at, field.as_str());
                insert_at += 1;
            }
        }
    }

    order
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
