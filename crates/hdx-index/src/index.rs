//! The master index document.
//!
//! [`MasterIndex`] is a plain value: an ordered list of entries plus
//! metadata. Fetching and publishing it is the job of the
//! [`MasterIndexManager`](crate::MasterIndexManager).

use chrono::{DateTime, Utc};
use hdx_types::RecordId;
use serde::{Deserialize, Serialize};

use crate::entry::MasterIndexEntry;
use crate::error::{IndexError, IndexResult};

/// Version of a freshly bootstrapped index.
pub const INITIAL_VERSION: u64 = 1;

/// Bookkeeping carried alongside the entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMetadata {
    pub last_updated: DateTime<Utc>,
    /// Incremented by every published revision; used as the CAS token.
    pub version: u64,
    /// Always equal to `entries.len()` in a published document.
    pub total_count: usize,
}

/// The single document enumerating every known record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterIndex {
    pub entries: Vec<MasterIndexEntry>,
    pub metadata: IndexMetadata,
}

impl MasterIndex {
    /// An empty index at [`INITIAL_VERSION`].
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            metadata: IndexMetadata {
                last_updated: Utc::now(),
                version: INITIAL_VERSION,
                total_count: 0,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.metadata.version
    }

    pub fn get(&self, id: &RecordId) -> Option<&MasterIndexEntry> {
        self.entries.iter().find(|e| e.id == *id)
    }

    pub fn get_mut(&mut self, id: &RecordId) -> Option<&mut MasterIndexEntry> {
        self.entries.iter_mut().find(|e| e.id == *id)
    }

    /// Entries belonging to records of `kind`, in index order.
    pub fn entries_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a MasterIndexEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Append an entry. Fails if an entry with the same id already exists.
    pub fn insert(&mut self, entry: MasterIndexEntry) -> IndexResult<()> {
        if self.get(&entry.id).is_some() {
            return Err(IndexError::DuplicateEntry(entry.id));
        }
        self.entries.push(entry);
        self.metadata.total_count = self.entries.len();
        Ok(())
    }

    /// Remove the entry with `id`, returning it if it was present.
    pub fn remove(&mut self, id: &RecordId) -> Option<MasterIndexEntry> {
        let pos = self.entries.iter().position(|e| e.id == *id)?;
        let removed = self.entries.remove(pos);
        self.metadata.total_count = self.entries.len();
        Some(removed)
    }

    /// Stamp metadata for a new published revision.
    pub(crate) fn advance(&mut self, from_version: u64) {
        self.metadata.version = from_version + 1;
        self.metadata.last_updated = Utc::now();
        self.metadata.total_count = self.entries.len();
    }

    /// Check the document invariants: `totalCount == len(entries)` and at
    /// most one entry per id.
    pub fn validate(&self) -> IndexResult<()> {
        if self.metadata.total_count != self.entries.len() {
            return Err(IndexError::Malformed {
                reason: format!(
                    "totalCount is {} but there are {} entries",
                    self.metadata.total_count,
                    self.entries.len()
                ),
            });
        }
        let mut seen = std::collections::HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.id) {
                return Err(IndexError::Malformed {
                    reason: format!("duplicate entry for id {}", entry.id),
                });
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> IndexResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| IndexError::Serialization(e.to_string()))
    }

    /// Decode and shape-check a fetched document.
    pub fn from_slice(data: &[u8]) -> IndexResult<Self> {
        let value: serde_json::Value =
            serde_json::from_slice(data).map_err(|e| IndexError::Malformed {
                reason: format!("not JSON: {e}"),
            })?;
        if !value.get("entries").is_some_and(serde_json::Value::is_array) {
            return Err(IndexError::Malformed {
                reason: "missing `entries` array".into(),
            });
        }
        let index: Self = serde_json::from_value(value).map_err(|e| IndexError::Malformed {
            reason: e.to_string(),
        })?;
        index.validate()?;
        Ok(index)
    }
}

impl Default for MasterIndex {
    fn default() -> Self {
        Self::empty()
    }
}
