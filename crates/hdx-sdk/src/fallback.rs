//! In-process substitute for the decentralized backend.
//!
//! A [`FallbackStore`] serves a fixed fixture dataset overlaid by an
//! append-only log of the writes made against it during this session.
//! Nothing in it is ever written back to the primary backend.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use hdx_records::patch::apply_patch;
use hdx_records::{matches, Entity, Filters, Record, RecordResult, StoredRecord};
use hdx_types::{ContentHash, NamingKey, RecordId};
use serde_json::Value;
use tracing::debug;

/// Id given to the synthetic naming keys of fallback entities.
const LOCAL_KEY_ID: &str = "local";

/// One write made against the fallback store.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionWrite<R> {
    /// A new record or a new revision of an existing one.
    Put(StoredRecord<R>),
    Delete { id: RecordId, at: DateTime<Utc> },
}

/// Fixtures plus a session-scoped write log for one record type.
#[derive(Debug)]
pub struct FallbackStore<R> {
    fixtures: Vec<StoredRecord<R>>,
    log: RwLock<Vec<SessionWrite<R>>>,
}

impl<R: Record> FallbackStore<R> {
    /// A store seeded with the record type's built-in fixtures.
    pub fn new() -> Self {
        Self::with_fixtures(R::fixtures())
    }

    pub fn with_fixtures(payloads: Vec<R>) -> Self {
        let now = Utc::now();
        Self {
            fixtures: payloads
                .into_iter()
                .map(|p| StoredRecord::new(RecordId::new(), p, now))
                .collect(),
            log: RwLock::new(Vec::new()),
        }
    }

    /// A store with no fixtures.
    pub fn empty() -> Self {
        Self::with_fixtures(Vec::new())
    }

    /// The session's writes, oldest first.
    pub fn session_log(&self) -> Vec<SessionWrite<R>> {
        self.log.read().expect("lock poisoned").clone()
    }

    fn view(&self, log: &[SessionWrite<R>]) -> Vec<StoredRecord<R>> {
        let mut records = self.fixtures.clone();
        for write in log {
            match write {
                SessionWrite::Put(record) => {
                    match records.iter_mut().find(|r| r.id == record.id) {
                        Some(slot) => *slot = record.clone(),
                        None => records.push(record.clone()),
                    }
                }
                SessionWrite::Delete { id, .. } => records.retain(|r| r.id != *id),
            }
        }
        records
    }

    fn current(&self) -> Vec<StoredRecord<R>> {
        let log = self.log.read().expect("lock poisoned");
        self.view(&log)
    }

    pub fn create(&self, payload: R) -> RecordId {
        let record = StoredRecord::new(RecordId::new(), payload, Utc::now());
        let id = record.id;
        self.log
            .write()
            .expect("lock poisoned")
            .push(SessionWrite::Put(record));
        debug!(kind = R::KIND, %id, "fallback create");
        id
    }

    pub fn get_by_id(&self, id: &RecordId) -> Option<Entity<R>> {
        self.current()
            .into_iter()
            .find(|r| r.id == *id)
            .map(to_entity)
    }

    pub fn update(&self, id: &RecordId, patch: &Value) -> RecordResult<bool> {
        let mut log = self.log.write().expect("lock poisoned");
        let Some(current) = self.view(&log).into_iter().find(|r| r.id == *id) else {
            return Ok(false);
        };
        let next = apply_patch(&current, patch, Utc::now())?;
        log.push(SessionWrite::Put(next));
        debug!(kind = R::KIND, %id, "fallback update");
        Ok(true)
    }

    pub fn delete(&self, id: &RecordId) -> bool {
        let mut log = self.log.write().expect("lock poisoned");
        if !self.view(&log).iter().any(|r| r.id == *id) {
            return false;
        }
        log.push(SessionWrite::Delete {
            id: *id,
            at: Utc::now(),
        });
        debug!(kind = R::KIND, %id, "fallback delete");
        true
    }

    pub fn list(&self) -> Vec<Entity<R>> {
        self.current().into_iter().map(to_entity).collect()
    }

    pub fn search(&self, query: &str, filters: &Filters) -> Vec<Entity<R>> {
        self.current()
            .into_iter()
            .filter(|r| matches(&r.payload, query, filters))
            .map(to_entity)
            .collect()
    }
}

impl<R: Record> Default for FallbackStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fallback entities are not published anywhere; they get a synthetic
/// `local-{kind}-{id}` key and the digest of their document.
fn to_entity<R: Record>(record: StoredRecord<R>) -> Entity<R> {
    let content_hash = ContentHash::digest(&serde_json::to_vec(&record).unwrap_or_default());
    let name_pointer = NamingKey::new(format!("local-{}-{}", R::KIND, record.id), LOCAL_KEY_ID);
    Entity {
        record,
        name_pointer,
        content_hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdx_records::{Project, ProjectStatus, RecordError};
    use serde_json::json;

    fn project(title: &str) -> Project {
        Project {
            title: title.into(),
            ..Project::default()
        }
    }

    #[test]
    fn serves_fixtures() {
        let store = FallbackStore::<Project>::new();
        let titles: Vec<String> = store
            .list()
            .into_iter()
            .map(|e| e.record.payload.title)
            .collect();
        assert_eq!(
            titles,
            vec![
                "DeFi Yield Optimizer",
                "Decentralized Identity Verification",
                "AI-Powered NFT Marketplace"
            ]
        );
    }

    #[test]
    fn session_writes_overlay_fixtures() {
        let store = FallbackStore::<Project>::new();
        let fixture_id = store.list()[0].id();

        let id = store.create(project("Session Project"));
        assert!(store.update(&fixture_id, &json!({"status": "Draft"})).unwrap());
        assert!(store.delete(&store.list()[1].id()));

        let listed = store.list();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].payload().status, ProjectStatus::Draft);
        assert_eq!(listed.last().unwrap().id(), id);
        assert_eq!(store.session_log().len(), 3);
    }

    #[test]
    fn log_is_append_only() {
        let store = FallbackStore::<Project>::empty();
        let id = store.create(project("a"));
        store.update(&id, &json!({"title": "b"})).unwrap();
        store.delete(&id);

        let log = store.session_log();
        assert_eq!(log.len(), 3);
        assert!(matches!(&log[0], SessionWrite::Put(r) if r.payload.title == "a"));
        assert!(matches!(&log[1], SessionWrite::Put(r) if r.payload.title == "b"));
        assert!(matches!(&log[2], SessionWrite::Delete { id: deleted, .. } if *deleted == id));
        assert!(store.get_by_id(&id).is_none());
    }

    #[test]
    fn missing_records() {
        let store = FallbackStore::<Project>::empty();
        let id = RecordId::new();
        assert!(store.get_by_id(&id).is_none());
        assert!(!store.update(&id, &json!({})).unwrap());
        assert!(!store.delete(&id));
        assert!(store.session_log().is_empty());
    }

    #[test]
    fn update_keeps_identity() {
        let store = FallbackStore::<Project>::empty();
        let id = store.create(project("a"));
        let before = store.get_by_id(&id).unwrap();
        store.update(&id, &json!({"title": "b"})).unwrap();
        let after = store.get_by_id(&id).unwrap();
        assert_eq!(after.created_at(), before.created_at());
        assert!(after.updated_at() > before.updated_at());
    }

    #[test]
    fn invalid_patch_is_not_logged() {
        let store = FallbackStore::<Project>::empty();
        let id = store.create(project("a"));
        let err = store.update(&id, &json!(null)).unwrap_err();
        assert!(matches!(err, RecordError::InvalidPatch(_)));
        assert_eq!(store.session_log().len(), 1);
    }

    #[test]
    fn search_over_fixtures() {
        let store = FallbackStore::<Project>::new();
        let hits = store.search("identity", &Filters::new());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload().title, "Decentralized Identity Verification");
    }

    #[test]
    fn synthetic_location() {
        let store = FallbackStore::<Project>::empty();
        let id = store.create(project("a"));
        let entity = store.get_by_id(&id).unwrap();
        assert_eq!(entity.name_pointer.id, LOCAL_KEY_ID);
        assert!(entity.name_pointer.name.starts_with("local-project-"));
    }
}
