//! Shallow JSON merge of update patches.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::error::{RecordError, RecordResult};
use crate::record::{Record, StoredRecord};

/// Fields owned by the store. Patches cannot touch them.
const RESERVED_FIELDS: [&str; 4] = ["kind", "id", "createdAt", "updatedAt"];

/// Merge `patch` over the payload of `current`, producing the next revision.
///
/// Top-level keys of the patch replace the payload's keys. Identity and
/// creation time are kept, and `updatedAt` is moved strictly forward even
/// if the clock has not.
pub fn apply_patch<R: Record>(
    current: &StoredRecord<R>,
    patch: &Value,
    now: DateTime<Utc>,
) -> RecordResult<StoredRecord<R>> {
    let Value::Object(changes) = patch else {
        return Err(RecordError::InvalidPatch(format!(
            "expected a JSON object, got {}",
            json_type(patch)
        )));
    };

    let mut payload = serde_json::to_value(&current.payload)
        .map_err(|e| RecordError::Serialization(e.to_string()))?;
    let Value::Object(fields) = &mut payload else {
        return Err(RecordError::Serialization(format!(
            "{} payload does not serialize to an object",
            R::KIND
        )));
    };
    for (key, value) in changes {
        if RESERVED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        fields.insert(key.clone(), value.clone());
    }

    let payload: R =
        serde_json::from_value(payload).map_err(|e| RecordError::InvalidPatch(e.to_string()))?;
    let floor = current.updated_at + Duration::milliseconds(1);

    Ok(StoredRecord {
        kind: current.kind.clone(),
        id: current.id,
        payload,
        created_at: current.created_at,
        updated_at: now.max(floor),
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
