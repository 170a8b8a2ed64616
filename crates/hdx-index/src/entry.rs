//! Master index entry type.

use chrono::{DateTime, Utc};
use hdx_types::{ContentHash, NamingKey, RecordId};
use serde::{Deserialize, Serialize};

/// Listing summary of one record in the master index.
///
/// The entry is enough to render a listing and to locate the record's
/// content; it is not the record itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterIndexEntry {
    pub id: RecordId,
    /// Record type the entry belongs to (e.g. `"project"`).
    pub kind: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Naming key under which the record's latest content is published.
    pub name_pointer: NamingKey,
    /// Hash of the record's latest content as of the last index write.
    pub content_hash: ContentHash,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MasterIndexEntry {
    /// Point the entry at a new revision of its record.
    pub fn repoint(
        &mut self,
        content_hash: ContentHash,
        title: impl Into<String>,
        status: Option<String>,
        updated_at: DateTime<Utc>,
    ) {
        self.content_hash = content_hash;
        self.title = title.into();
        self.status = status;
        self.updated_at = updated_at;
    }
}
