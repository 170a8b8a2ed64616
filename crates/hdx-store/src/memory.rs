use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use hdx_types::ContentHash;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::faults::Faults;
use crate::traits::ContentStore;

/// In-memory, HashMap-based content store.
///
/// Intended for tests, demos and embedding. Blobs are keyed by their BLAKE3
/// digest and held behind a `RwLock`. The attached [`Faults`] make the store
/// behave like an unreachable or slow remote when a test needs one.
pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<ContentHash, Bytes>>,
    faults: Faults,
    puts: AtomicU64,
    gets: AtomicU64,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            faults: Faults::new(),
            puts: AtomicU64::new(0),
            gets: AtomicU64::new(0),
        }
    }

    /// Failure switches for this store.
    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Number of `put` calls served so far (including idempotent repeats).
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of `get` calls served so far.
    pub fn get_count(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    /// Return a sorted list of all stored hashes.
    pub fn all_hashes(&self) -> Vec<ContentHash> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut hashes: Vec<ContentHash> = map.keys().cloned().collect();
        hashes.sort();
        hashes
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, data: Bytes) -> StoreResult<ContentHash> {
        self.faults.delay().await;
        if self.faults.is_offline() {
            return Err(StoreError::Unavailable);
        }
        let hash = ContentHash::digest(&data);
        self.puts.fetch_add(1, Ordering::SeqCst);
        let mut map = self.blobs.write().expect("lock poisoned");
        // Same hash always means same content, so repeats are no-ops.
        map.entry(hash.clone()).or_insert(data);
        debug!(hash = %hash.short(), "stored blob");
        Ok(hash)
    }

    async fn get(&self, hash: &ContentHash) -> StoreResult<Bytes> {
        self.faults.delay().await;
        if self.faults.is_offline() {
            return Err(StoreError::Unavailable);
        }
        if self.faults.is_failing(hash.as_str()) {
            return Err(StoreError::Network(format!("simulated failure fetching {hash}")));
        }
        self.gets.fetch_add(1, Ordering::SeqCst);
        let map = self.blobs.read().expect("lock poisoned");
        map.get(hash)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hash.clone()))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("blob_count", &self.len())
            .field("offline", &self.faults.is_offline())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn put_and_get() {
        let store = InMemoryContentStore::new();
        let hash = store.put(Bytes::from_static(b"hello world")).await.unwrap();
        let data = store.get(&hash).await.unwrap();
        assert_eq!(&data[..], b"hello world");
    }

    #[tokio::test]
    async fn same_content_produces_same_hash() {
        let store = InMemoryContentStore::new();
        let h1 = store.put(Bytes::from_static(b"identical")).await.unwrap();
        let h2 = store.put(Bytes::from_static(b"identical")).await.unwrap();
        assert_eq!(h1, h2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.put_count(), 2);
    }

    #[tokio::test]
    async fn different_content_produces_different_hashes() {
        let store = InMemoryContentStore::new();
        let h1 = store.put(Bytes::from_static(b"aaa")).await.unwrap();
        let h2 = store.put(Bytes::from_static(b"bbb")).await.unwrap();
        assert_ne!(h1, h2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = InMemoryContentStore::new();
        let missing = ContentHash::digest(b"never stored");
        let err = store.get(&missing).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(h) if h == missing));
    }

    #[tokio::test]
    async fn offline_store_rejects_everything() {
        let store = InMemoryContentStore::new();
        let hash = store.put(Bytes::from_static(b"before")).await.unwrap();

        store.faults().set_offline(true);
        assert!(matches!(
            store.put(Bytes::from_static(b"after")).await,
            Err(StoreError::Unavailable)
        ));
        assert!(matches!(store.get(&hash).await, Err(StoreError::Unavailable)));

        store.faults().set_offline(false);
        assert!(store.get(&hash).await.is_ok());
    }

    #[tokio::test]
    async fn failing_hash_only_affects_that_hash() {
        let store = InMemoryContentStore::new();
        let bad = store.put(Bytes::from_static(b"bad")).await.unwrap();
        let good = store.put(Bytes::from_static(b"good")).await.unwrap();
        store.faults().fail_key(bad.as_str());

        let err = store.get(&bad).await.unwrap_err();
        assert!(err.is_transient());
        assert!(store.get(&good).await.is_ok());
    }

    #[tokio::test]
    async fn latency_delays_calls() {
        let store = InMemoryContentStore::new();
        store.faults().set_latency(Duration::from_millis(40));
        let started = tokio::time::Instant::now();
        store.put(Bytes::from_static(b"slow")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn concurrent_puts_are_safe() {
        let store = Arc::new(InMemoryContentStore::new());
        let mut handles = Vec::new();
        for i in 0..8u8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.put(Bytes::from(vec![i; 16])).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.len(), 8);
        let hashes = store.all_hashes();
        for w in hashes.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryContentStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryContentStore"));
        assert!(debug.contains("blob_count"));
    }
}
