//! The record abstraction and its stored forms.

use chrono::{DateTime, Utc};
use hdx_types::{ContentHash, NamingKey, RecordId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::matcher::FieldValue;

/// A record type that can be kept in an [`EntityRecordStore`](crate::EntityRecordStore).
///
/// The payload is the domain data only; ids and timestamps are managed by
/// the store and live in [`StoredRecord`].
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Tag written into every stored document and index entry of this type.
    const KIND: &'static str;

    /// Title shown in listings.
    fn title(&self) -> &str;

    /// Status shown in listings, if the type has one.
    fn status(&self) -> Option<String> {
        None
    }

    /// Values matched by free-text search queries.
    fn search_text(&self) -> Vec<&str>;

    /// Value of a filterable field, by its JSON name.
    ///
    /// Returns `None` for fields that cannot be filtered on.
    fn filter_field(&self, field: &str) -> Option<FieldValue<'_>>;

    /// Built-in dataset served when the primary backend is unavailable.
    fn fixtures() -> Vec<Self> {
        Vec::new()
    }
}

/// The document uploaded to the content store for one revision of a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord<R> {
    pub kind: String,
    pub id: RecordId,
    #[serde(flatten)]
    pub payload: R,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<R: Record> StoredRecord<R> {
    /// First revision of a new record.
    pub fn new(id: RecordId, payload: R, now: DateTime<Utc>) -> Self {
        Self {
            kind: R::KIND.to_string(),
            id,
            payload,
            created_at: now,
            updated_at: now,
        }
    }

    /// Decode a fetched document and check it is the record the caller
    /// expected. Any mismatch is reported as a reason string.
    pub fn decode(data: &[u8], expected: &RecordId) -> Result<Self, String> {
        let record: Self = serde_json::from_slice(data).map_err(|e| e.to_string())?;
        if record.kind != R::KIND {
            return Err(format!(
                "expected kind {:?}, document has {:?}",
                R::KIND,
                record.kind
            ));
        }
        if record.id != *expected {
            return Err(format!("document carries id {}", record.id));
        }
        Ok(record)
    }
}

/// A record together with where its latest revision is published.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity<R> {
    #[serde(flatten)]
    pub record: StoredRecord<R>,
    pub name_pointer: NamingKey,
    pub content_hash: ContentHash,
}

impl<R> Entity<R> {
    pub fn id(&self) -> RecordId {
        self.record.id
    }

    pub fn payload(&self) -> &R {
        &self.record.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.record.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.record.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{Project, ProjectStatus};

    fn project() -> Project {
        Project {
            title: "DeFi Yield Optimizer".into(),
            description: "Auto-compounding vaults".into(),
            status: ProjectStatus::Draft,
            ..Project::default()
        }
    }

    #[test]
    fn stored_record_flattens_payload() {
        let stored = StoredRecord::new(RecordId::new(), project(), Utc::now());
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["kind"], "project");
        assert_eq!(json["title"], "DeFi Yield Optimizer");
        assert!(json.get("payload").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn decode_checks_kind_and_id() {
        let id = RecordId::new();
        let stored = StoredRecord::new(id, project(), Utc::now());
        let bytes = serde_json::to_vec(&stored).unwrap();

        assert_eq!(StoredRecord::<Project>::decode(&bytes, &id).unwrap(), stored);

        let err = StoredRecord::<Project>::decode(&bytes, &RecordId::new()).unwrap_err();
        assert!(err.contains("carries id"));

        let mut json = serde_json::to_value(&stored).unwrap();
        json["kind"] = "hackathon".into();
        let err = StoredRecord::<Project>::decode(&serde_json::to_vec(&json).unwrap(), &id)
            .unwrap_err();
        assert!(err.contains("expected kind"));
    }

    #[test]
    fn decode_rejects_non_records() {
        let err = StoredRecord::<Project>::decode(b"[1, 2, 3]", &RecordId::new()).unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn entity_carries_location() {
        let stored = StoredRecord::new(RecordId::new(), project(), Utc::now());
        let entity = Entity {
            record: stored.clone(),
            name_pointer: NamingKey::new("hdx-project-x", "k51x"),
            content_hash: ContentHash::digest(b"x"),
        };
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["id"], serde_json::to_value(stored.id).unwrap());
        assert_eq!(json["namePointer"]["name"], "hdx-project-x");
        assert_eq!(entity.payload().title, "DeFi Yield Optimizer");
    }
}
