//! Lifecycle of the master index document.
//!
//! The [`MasterIndexManager`] owns the well-known master key. It bootstraps
//! the index on first use, fetches and shape-checks it, and publishes new
//! revisions. All writes are serialized through a single-writer lock and
//! guarded by a version check so a writer holding an old copy cannot
//! silently overwrite a newer one.

use std::sync::{Arc, RwLock};

use bytes::Bytes;
use hdx_names::{KeyManager, NameError};
use hdx_store::{ContentStore, StoreError};
use hdx_types::{ContentHash, NamingKey};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::{IndexError, IndexResult};
use crate::index::MasterIndex;

/// Name of the well-known key the master index is published under.
pub const DEFAULT_MASTER_KEY_NAME: &str = "hdx-master-index";

/// How `initialize` looks for an existing master index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MasterDiscovery {
    /// Only the key with the well-known name counts.
    #[default]
    WellKnown,
    /// If the well-known key is missing, adopt the one other key whose
    /// content parses as a master index. Several candidates is an error.
    AdoptSingleCandidate,
}

/// Settings for a [`MasterIndexManager`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexOptions {
    pub master_key_name: String,
    pub discovery: MasterDiscovery,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            master_key_name: DEFAULT_MASTER_KEY_NAME.to_string(),
            discovery: MasterDiscovery::default(),
        }
    }
}

/// Which path `initialize` took.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "key", rename_all = "kebab-case")]
pub enum InitOutcome {
    /// The well-known key already led to a valid index.
    Existing(NamingKey),
    /// A legacy key was adopted as the master index.
    Adopted(NamingKey),
    /// A fresh empty index was published.
    Created(NamingKey),
}

impl InitOutcome {
    pub fn key(&self) -> &NamingKey {
        match self {
            Self::Existing(key) | Self::Adopted(key) | Self::Created(key) => key,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// A published revision of the master index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexRevision {
    pub version: u64,
    pub hash: ContentHash,
}

/// Owns the master index document and its naming key.
pub struct MasterIndexManager {
    content: Arc<dyn ContentStore>,
    keys: KeyManager,
    options: IndexOptions,
    master: RwLock<Option<NamingKey>>,
    bootstrap: Mutex<()>,
    writer: Mutex<()>,
}

impl MasterIndexManager {
    pub fn new(content: Arc<dyn ContentStore>, keys: KeyManager, options: IndexOptions) -> Self {
        Self {
            content,
            keys,
            options,
            master: RwLock::new(None),
            bootstrap: Mutex::new(()),
            writer: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    fn cached_master(&self) -> Option<NamingKey> {
        self.master.read().expect("master lock poisoned").clone()
    }

    /// Find or create the master index. Safe to call any number of times.
    pub async fn initialize(&self) -> IndexResult<InitOutcome> {
        let _guard = self.bootstrap.lock().await;
        if let Some(key) = self.cached_master() {
            return Ok(InitOutcome::Existing(key));
        }

        let outcome = self.discover_or_create().await?;
        *self.master.write().expect("master lock poisoned") = Some(outcome.key().clone());
        info!(key = %outcome.key().name, id = %outcome.key().id, ?outcome, "master index ready");
        Ok(outcome)
    }

    async fn discover_or_create(&self) -> IndexResult<InitOutcome> {
        let keys = self.keys.list_keys().await?;

        let well_known = keys
            .iter()
            .find(|k| k.name == self.options.master_key_name)
            .cloned();
        if let Some(key) = well_known {
            return match self.keys.resolve(&key).await {
                Ok(hash) => {
                    self.load(&key, &hash).await?;
                    Ok(InitOutcome::Existing(key))
                }
                // Minted by a bootstrap that never got to publish.
                Err(NameError::Unresolved { .. }) => {
                    warn!(key = %key.name, "master key has no content, publishing empty index");
                    self.upload_and_publish(&key, &MasterIndex::empty()).await?;
                    Ok(InitOutcome::Created(key))
                }
                Err(e) => Err(e.into()),
            };
        }

        if self.options.discovery == MasterDiscovery::AdoptSingleCandidate {
            let mut candidates = self.legacy_candidates(&keys).await;
            if candidates.len() > 1 {
                return Err(IndexError::AmbiguousMaster {
                    candidates: candidates.into_iter().map(|k| k.name).collect(),
                });
            }
            if let Some(key) = candidates.pop() {
                info!(key = %key.name, "adopting legacy master index");
                return Ok(InitOutcome::Adopted(key));
            }
        }

        let key = self.keys.generate_named(&self.options.master_key_name).await?;
        self.upload_and_publish(&key, &MasterIndex::empty()).await?;
        Ok(InitOutcome::Created(key))
    }

    /// Keys outside our own naming scheme whose content is a valid index.
    async fn legacy_candidates(&self, keys: &[NamingKey]) -> Vec<NamingKey> {
        let own_prefix = format!("{}-", self.keys.prefix());
        let mut candidates = Vec::new();
        for key in keys.iter().filter(|k| !k.name.starts_with(&own_prefix)) {
            let hash = match self.keys.resolve(key).await {
                Ok(hash) => hash,
                Err(e) => {
                    debug!(key = %key.name, error = %e, "skipping unresolvable key");
                    continue;
                }
            };
            match self.load(key, &hash).await {
                Ok(_) => candidates.push(key.clone()),
                Err(e) => debug!(key = %key.name, error = %e, "key is not a master index"),
            }
        }
        candidates
    }

    /// The master key, bootstrapping the index if this manager has not yet.
    pub async fn master_key(&self) -> IndexResult<NamingKey> {
        if let Some(key) = self.cached_master() {
            return Ok(key);
        }
        Ok(self.initialize().await?.key().clone())
    }

    /// Public gateway address of the master index, if a gateway is configured.
    pub async fn gateway_url(&self) -> IndexResult<Option<String>> {
        let key = self.master_key().await?;
        Ok(self.keys.gateway_url(&key))
    }

    /// Fetch the current master index.
    ///
    /// A pointer that leads nowhere is [`IndexError::MasterUnresolvable`]; a
    /// document that fails shape validation is [`IndexError::Malformed`].
    /// Neither is papered over with an empty index.
    pub async fn get_index(&self) -> IndexResult<MasterIndex> {
        let key = self.master_key().await?;
        self.fetch_index(&key).await
    }

    async fn fetch_index(&self, key: &NamingKey) -> IndexResult<MasterIndex> {
        let hash = match self.keys.resolve(key).await {
            Ok(hash) => hash,
            Err(NameError::Unresolved { name }) => {
                return Err(IndexError::MasterUnresolvable { name })
            }
            Err(e) => return Err(e.into()),
        };
        self.load(key, &hash).await
    }

    async fn load(&self, key: &NamingKey, hash: &ContentHash) -> IndexResult<MasterIndex> {
        let data = match self.content.get(hash).await {
            Ok(data) => data,
            Err(StoreError::NotFound(_)) => {
                return Err(IndexError::MasterUnresolvable {
                    name: key.name.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        MasterIndex::from_slice(&data)
    }

    /// Publish `index` as the next revision.
    ///
    /// `index.metadata.version` must equal the published version, i.e. the
    /// caller must have started from the latest document. Otherwise the call
    /// fails with [`IndexError::StaleIndex`] and nothing is written.
    pub async fn replace_index(&self, index: MasterIndex) -> IndexResult<IndexRevision> {
        let _guard = self.writer.lock().await;
        self.replace_locked(index).await
    }

    /// Open an exclusive read-modify-write session on the index.
    ///
    /// The session holds the single-writer lock until it is committed or
    /// dropped. Dropping without committing discards the changes.
    pub async fn writer(&self) -> IndexResult<IndexWriter<'_>> {
        let guard = self.writer.lock().await;
        let index = self.get_index().await?;
        Ok(IndexWriter {
            manager: self,
            index,
            _guard: guard,
        })
    }

    async fn replace_locked(&self, mut index: MasterIndex) -> IndexResult<IndexRevision> {
        let key = self.master_key().await?;
        let current = self.fetch_index(&key).await?;
        if index.version() != current.version() {
            warn!(
                expected = index.version(),
                actual = current.version(),
                "rejecting stale master index write"
            );
            return Err(IndexError::StaleIndex {
                expected: index.version(),
                actual: current.version(),
            });
        }

        index.advance(current.version());
        index.validate()?;
        self.upload_and_publish(&key, &index).await
    }

    async fn upload_and_publish(&self, key: &NamingKey, index: &MasterIndex) -> IndexResult<IndexRevision> {
        let hash = self.content.put(Bytes::from(index.to_bytes()?)).await?;
        self.keys.publish(key, &hash).await?;
        debug!(
            version = index.version(),
            entries = index.len(),
            hash = %hash.short(),
            "published master index"
        );
        Ok(IndexRevision {
            version: index.version(),
            hash,
        })
    }
}

impl std::fmt::Debug for MasterIndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterIndexManager")
            .field("options", &self.options)
            .field("master", &self.cached_master())
            .finish()
    }
}

/// Exclusive read-modify-write session on the master index.
///
/// Obtained from [`MasterIndexManager::writer`]. Other writers in this
/// process wait until the session is committed or dropped.
pub struct IndexWriter<'a> {
    manager: &'a MasterIndexManager,
    index: MasterIndex,
    _guard: MutexGuard<'a, ()>,
}

impl IndexWriter<'_> {
    pub fn index(&self) -> &MasterIndex {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut MasterIndex {
        &mut self.index
    }

    /// Publish the modified index and release the lock.
    pub async fn commit(self) -> IndexResult<IndexRevision> {
        self.manager.replace_locked(self.index).await
    }
}
