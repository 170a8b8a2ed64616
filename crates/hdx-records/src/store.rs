//! Generic CRUD, listing and search over one record type.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use hdx_index::{MasterIndexEntry, MasterIndexManager};
use hdx_names::KeyManager;
use hdx_store::ContentStore;
use hdx_types::{ContentHash, NamingKey, RecordId};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{RecordError, RecordResult};
use crate::matcher::{matches, Filters};
use crate::patch::apply_patch;
use crate::record::{Entity, Record, StoredRecord};

/// An index entry whose record could not be fetched during a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedEntry {
    pub id: RecordId,
    pub reason: String,
}

/// Result of [`EntityRecordStore::list_report`].
#[derive(Clone, Debug)]
pub struct ListReport<R> {
    pub entities: Vec<Entity<R>>,
    pub skipped: Vec<SkippedEntry>,
}

impl<R> ListReport<R> {
    /// `true` if every listed entry was fetched.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// CRUD and search over records of type `R`.
///
/// Each record revision is uploaded as a new immutable document and its
/// dedicated naming key is repointed at it. Index mutations go through the
/// manager's single-writer session, and updates read the record inside that
/// session so concurrent updates of one record apply in turn.
pub struct EntityRecordStore<R> {
    content: Arc<dyn ContentStore>,
    keys: KeyManager,
    index: Arc<MasterIndexManager>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for EntityRecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            content: self.content.clone(),
            keys: self.keys.clone(),
            index: self.index.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> EntityRecordStore<R> {
    pub fn new(
        content: Arc<dyn ContentStore>,
        keys: KeyManager,
        index: Arc<MasterIndexManager>,
    ) -> Self {
        Self {
            content,
            keys,
            index,
            _record: PhantomData,
        }
    }

    pub fn kind(&self) -> &'static str {
        R::KIND
    }

    /// Store a new record and return its id.
    pub async fn create(&self, payload: R) -> RecordResult<RecordId> {
        let stored = StoredRecord::new(RecordId::new(), payload, Utc::now());
        let hash = self.upload(&stored).await?;
        let key = self.keys.generate_key(R::KIND).await?;
        self.keys.publish(&key, &hash).await?;

        let entry = MasterIndexEntry {
            id: stored.id,
            kind: R::KIND.to_string(),
            title: stored.payload.title().to_string(),
            status: stored.payload.status(),
            name_pointer: key,
            content_hash: hash,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        };
        let mut writer = self.index.writer().await?;
        writer.index_mut().insert(entry)?;
        let revision = writer.commit().await?;

        info!(kind = R::KIND, id = %stored.id, index_version = revision.version, "created record");
        Ok(stored.id)
    }

    /// Fetch a record by id. `None` if the index has no such record of this kind.
    pub async fn get_by_id(&self, id: &RecordId) -> RecordResult<Option<Entity<R>>> {
        let index = self.index.get_index().await?;
        match index.get(id).filter(|e| e.kind == R::KIND) {
            Some(entry) => self.fetch(entry).await.map(Some),
            None => Ok(None),
        }
    }

    /// Merge `patch` into a record. Returns `false` if there is no such record.
    ///
    /// `id` and `createdAt` in the patch are ignored; `updatedAt` always
    /// advances.
    pub async fn update(&self, id: &RecordId, patch: &Value) -> RecordResult<bool> {
        let mut writer = self.index.writer().await?;
        let Some(entry) = writer
            .index()
            .get(id)
            .filter(|e| e.kind == R::KIND)
            .cloned()
        else {
            return Ok(false);
        };

        let current = self.fetch(&entry).await?;
        let next = apply_patch(&current.record, patch, Utc::now())?;
        let hash = self.upload(&next).await?;
        self.keys.publish(&entry.name_pointer, &hash).await?;

        if let Some(slot) = writer.index_mut().get_mut(id) {
            slot.repoint(
                hash,
                next.payload.title(),
                next.payload.status(),
                next.updated_at,
            );
        }
        let revision = writer.commit().await?;

        info!(kind = R::KIND, id = %id, index_version = revision.version, "updated record");
        Ok(true)
    }

    /// Remove a record from the index. Returns `false` if there is no such
    /// record.
    ///
    /// The record's naming key and content are left in place; see
    /// [`EntityRecordStore::orphaned_keys`].
    pub async fn delete(&self, id: &RecordId) -> RecordResult<bool> {
        let mut writer = self.index.writer().await?;
        if !writer.index().get(id).is_some_and(|e| e.kind == R::KIND) {
            return Ok(false);
        }
        let removed = writer.index_mut().remove(id);
        let revision = writer.commit().await?;

        info!(
            kind = R::KIND,
            id = %id,
            key = ?removed.map(|e| e.name_pointer.name),
            index_version = revision.version,
            "deleted record"
        );
        Ok(true)
    }

    /// Every record of this kind that could be fetched, in index order.
    pub async fn list(&self) -> RecordResult<Vec<Entity<R>>> {
        Ok(self.list_report().await?.entities)
    }

    /// Like [`EntityRecordStore::list`], also reporting entries that were
    /// skipped because their content could not be fetched or validated.
    pub async fn list_report(&self) -> RecordResult<ListReport<R>> {
        let index = self.index.get_index().await?;
        let mut report = ListReport {
            entities: Vec::new(),
            skipped: Vec::new(),
        };
        for entry in index.entries_of_kind(R::KIND) {
            match self.fetch(entry).await {
                Ok(entity) => report.entities.push(entity),
                Err(e) => {
                    warn!(kind = R::KIND, id = %entry.id, error = %e, "skipping unreadable record");
                    report.skipped.push(SkippedEntry {
                        id: entry.id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Records matching a free-text `query` and every filter.
    pub async fn search(&self, query: &str, filters: &Filters) -> RecordResult<Vec<Entity<R>>> {
        let mut entities = self.list().await?;
        entities.retain(|e| matches(e.payload(), query, filters));
        debug!(kind = R::KIND, query, hits = entities.len(), "search");
        Ok(entities)
    }

    /// Naming keys minted for this kind that no index entry points at.
    pub async fn orphaned_keys(&self) -> RecordResult<Vec<NamingKey>> {
        let index = self.index.get_index().await?;
        let referenced: HashSet<&str> = index
            .entries_of_kind(R::KIND)
            .map(|e| e.name_pointer.name.as_str())
            .collect();
        let keys = self.keys.list_keys().await?;
        Ok(keys
            .into_iter()
            .filter(|k| self.keys.is_record_key(k, R::KIND) && !referenced.contains(k.name.as_str()))
            .collect())
    }

    async fn upload(&self, record: &StoredRecord<R>) -> RecordResult<ContentHash> {
        let data =
            serde_json::to_vec(record).map_err(|e| RecordError::Serialization(e.to_string()))?;
        Ok(self.content.put(Bytes::from(data)).await?)
    }

    async fn fetch(&self, entry: &MasterIndexEntry) -> RecordResult<Entity<R>> {
        let hash = self.keys.resolve(&entry.name_pointer).await?;
        let data = self.content.get(&hash).await?;
        let record = StoredRecord::decode(&data, &entry.id).map_err(|reason| {
            RecordError::Validation {
                id: entry.id,
                reason,
            }
        })?;
        Ok(Entity {
            record,
            name_pointer: entry.name_pointer.clone(),
            content_hash: hash,
        })
    }
}

impl<R> std::fmt::Debug for EntityRecordStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRecordStore")
            .field("index", &self.index)
            .finish()
    }
}
