//! The [`NamingService`] capability.
//!
//! Any backend (in-memory, Kubo RPC, a hosted pinning API) implements this
//! trait to provide mutable pointers over immutable content.

use async_trait::async_trait;
use hdx_types::{ContentHash, NamingKey};

use crate::error::NameResult;

/// Mutable naming service.
///
/// Implementations must be thread-safe (`Send + Sync`). Every call is an
/// independent round-trip: no caching, no retries. Publishing is a plain
/// overwrite; the service offers no compare-and-swap.
#[async_trait]
pub trait NamingService: Send + Sync {
    /// Mint a new key labelled `name` and return its `{name, id}` pair.
    async fn generate(&self, name: &str) -> NameResult<NamingKey>;

    /// Point `key` at `hash`, replacing whatever it pointed at before.
    async fn publish(&self, key: &NamingKey, hash: &ContentHash) -> NameResult<()>;

    /// Return the hash `key` currently points at.
    ///
    /// Fails with [`NameError::Unresolved`](crate::NameError::Unresolved) if
    /// nothing has been published under the key.
    async fn resolve(&self, key: &NamingKey) -> NameResult<ContentHash>;

    /// List every key in the account.
    async fn list(&self) -> NameResult<Vec<NamingKey>>;
}
