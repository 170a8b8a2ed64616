//! In-memory naming service for testing and ephemeral use.
//!
//! [`InMemoryNamingService`] keeps keys and their published hashes in maps
//! protected by `RwLock`s. Key ids are derived from the key name so that a
//! given name always maps to the same id within one service.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use hdx_store::Faults;
use hdx_types::{ContentHash, NamingKey};
use tracing::debug;

use crate::error::{NameError, NameResult};
use crate::names::validate_key_name;
use crate::traits::NamingService;

/// An in-memory implementation of [`NamingService`].
///
/// Data is lost when the service is dropped. The attached [`Faults`] let a
/// test make the service slow or unreachable.
#[derive(Debug, Default)]
pub struct InMemoryNamingService {
    keys: RwLock<BTreeMap<String, NamingKey>>,
    published: RwLock<HashMap<String, ContentHash>>,
    faults: Faults,
    publishes: AtomicU64,
}

impl InMemoryNamingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failure switches for this service.
    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    /// Number of successful `publish` calls so far.
    pub fn publish_count(&self) -> u64 {
        self.publishes.load(Ordering::SeqCst)
    }

    fn derive_id(name: &str) -> String {
        let digest = ContentHash::digest(name.as_bytes());
        format!("k51{}", &digest.as_str()[..40])
    }

    async fn enter(&self) -> NameResult<()> {
        self.faults.delay().await;
        if self.faults.is_offline() {
            return Err(NameError::Unavailable);
        }
        Ok(())
    }

    fn known_key(&self, key: &NamingKey) -> NameResult<()> {
        let keys = self.keys.read().expect("lock poisoned");
        if keys.contains_key(&key.name) {
            Ok(())
        } else {
            Err(NameError::UnknownKey {
                name: key.name.clone(),
            })
        }
    }
}

#[async_trait]
impl NamingService for InMemoryNamingService {
    async fn generate(&self, name: &str) -> NameResult<NamingKey> {
        self.enter().await?;
        validate_key_name(name)?;

        let mut keys = self.keys.write().expect("lock poisoned");
        if keys.contains_key(name) {
            return Err(NameError::KeyExists {
                name: name.to_string(),
            });
        }
        let key = NamingKey::new(name, Self::derive_id(name));
        keys.insert(name.to_string(), key.clone());
        debug!(key = %key.name, "generated key");
        Ok(key)
    }

    async fn publish(&self, key: &NamingKey, hash: &ContentHash) -> NameResult<()> {
        self.enter().await?;
        self.known_key(key)?;
        self.published
            .write()
            .expect("lock poisoned")
            .insert(key.name.clone(), hash.clone());
        self.publishes.fetch_add(1, Ordering::SeqCst);
        debug!(key = %key.name, hash = %hash.short(), "published");
        Ok(())
    }

    async fn resolve(&self, key: &NamingKey) -> NameResult<ContentHash> {
        self.enter().await?;
        if self.faults.is_failing(&key.name) {
            return Err(NameError::Network(format!(
                "simulated failure resolving {}",
                key.name
            )));
        }
        self.known_key(key)?;
        self.published
            .read()
            .expect("lock poisoned")
            .get(&key.name)
            .cloned()
            .ok_or_else(|| NameError::Unresolved {
                name: key.name.clone(),
            })
    }

    async fn list(&self) -> NameResult<Vec<NamingKey>> {
        self.enter().await?;
        Ok(self
            .keys
            .read()
            .expect("lock poisoned")
            .values()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(data: &[u8]) -> ContentHash {
        ContentHash::digest(data)
    }

    #[tokio::test]
    async fn generate_publish_resolve() {
        let service = InMemoryNamingService::new();
        let key = service.generate("hdx-project-1").await.unwrap();
        assert_eq!(key.name, "hdx-project-1");
        assert!(key.id.starts_with("k51"));

        service.publish(&key, &hash(b"v1")).await.unwrap();
        assert_eq!(service.resolve(&key).await.unwrap(), hash(b"v1"));
    }

    #[tokio::test]
    async fn republish_repoints_the_name() {
        let service = InMemoryNamingService::new();
        let key = service.generate("k").await.unwrap();
        service.publish(&key, &hash(b"v1")).await.unwrap();
        service.publish(&key, &hash(b"v2")).await.unwrap();
        assert_eq!(service.resolve(&key).await.unwrap(), hash(b"v2"));
        assert_eq!(service.publish_count(), 2);
    }

    #[tokio::test]
    async fn resolve_unpublished_key_is_unresolved() {
        let service = InMemoryNamingService::new();
        let key = service.generate("empty").await.unwrap();
        let err = service.resolve(&key).await.unwrap_err();
        assert!(matches!(err, NameError::Unresolved { .. }));
    }

    #[tokio::test]
    async fn publish_to_unknown_key_fails() {
        let service = InMemoryNamingService::new();
        let stranger = NamingKey::new("stranger", "k51none");
        let err = service.publish(&stranger, &hash(b"x")).await.unwrap_err();
        assert!(matches!(err, NameError::UnknownKey { .. }));
    }

    #[tokio::test]
    async fn duplicate_generate_is_rejected() {
        let service = InMemoryNamingService::new();
        service.generate("dup").await.unwrap();
        let err = service.generate("dup").await.unwrap_err();
        assert!(matches!(err, NameError::KeyExists { .. }));
    }

    #[tokio::test]
    async fn invalid_name_is_rejected() {
        let service = InMemoryNamingService::new();
        let err = service.generate("has space").await.unwrap_err();
        assert!(matches!(err, NameError::InvalidName { .. }));
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let service = InMemoryNamingService::new();
        service.generate("b").await.unwrap();
        service.generate("a").await.unwrap();
        service.generate("c").await.unwrap();
        let names: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn offline_service_is_unavailable() {
        let service = InMemoryNamingService::new();
        service.faults().set_offline(true);
        let err = service.list().await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn failing_key_fails_resolution_only() {
        let service = InMemoryNamingService::new();
        let key = service.generate("flaky").await.unwrap();
        service.publish(&key, &hash(b"x")).await.unwrap();
        service.faults().fail_key("flaky");
        assert!(matches!(
            service.resolve(&key).await,
            Err(NameError::Network(_))
        ));
        service.faults().clear();
        assert!(service.resolve(&key).await.is_ok());
    }
}
