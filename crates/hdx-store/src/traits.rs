use async_trait::async_trait;
use bytes::Bytes;
use hdx_types::ContentHash;

use crate::error::StoreResult;

/// Content-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - Content is immutable once written: the same bytes always produce the
///   same hash, and the bytes behind a hash never change.
/// - Writes are idempotent.
/// - The store never interprets content.
/// - Every call is an independent round-trip; implementations do not cache
///   or retry.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `data` and return its content hash.
    async fn put(&self, data: Bytes) -> StoreResult<ContentHash>;

    /// Fetch the content behind `hash`.
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if the
    /// backend has no such content.
    async fn get(&self, hash: &ContentHash) -> StoreResult<Bytes>;
}
