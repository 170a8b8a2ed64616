//! Key lifecycle management.
//!
//! [`KeyManager`] wraps a [`NamingService`] and is the only way the rest of
//! Hackdex touches naming keys. The four capability calls pass straight
//! through; the manager adds naming conventions for minted keys, lookup by
//! name, and public gateway addresses.

use std::sync::Arc;

use hdx_types::{ContentHash, NamingKey};
use tracing::debug;

use crate::error::NameResult;
use crate::names::validate_key_name;
use crate::traits::NamingService;

/// Default prefix for keys minted by Hackdex.
pub const DEFAULT_KEY_PREFIX: &str = "hdx";

/// Creates, finds, publishes and resolves naming keys.
#[derive(Clone)]
pub struct KeyManager {
    naming: Arc<dyn NamingService>,
    prefix: String,
    gateway_url: Option<String>,
}

impl KeyManager {
    pub fn new(naming: Arc<dyn NamingService>) -> Self {
        Self {
            naming,
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            gateway_url: None,
        }
    }

    /// Label minted keys `"{prefix}-{kind}-{uuid}"`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Public gateway used by [`KeyManager::gateway_url`].
    pub fn with_gateway(mut self, gateway_url: impl Into<String>) -> Self {
        self.gateway_url = Some(gateway_url.into());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Mint a fresh key for a record of `kind`.
    pub async fn generate_key(&self, kind: &str) -> NameResult<NamingKey> {
        let name = format!("{}-{kind}-{}", self.prefix, uuid::Uuid::now_v7());
        self.generate_named(&name).await
    }

    /// Mint a key with an exact, caller-chosen name.
    pub async fn generate_named(&self, name: &str) -> NameResult<NamingKey> {
        validate_key_name(name)?;
        let key = self.naming.generate(name).await?;
        debug!(key = %key.name, id = %key.id, "minted naming key");
        Ok(key)
    }

    pub async fn list_keys(&self) -> NameResult<Vec<NamingKey>> {
        self.naming.list().await
    }

    /// Find a key by exact name.
    pub async fn find_key(&self, name: &str) -> NameResult<Option<NamingKey>> {
        let keys = self.naming.list().await?;
        Ok(keys.into_iter().find(|k| k.name == name))
    }

    pub async fn resolve(&self, key: &NamingKey) -> NameResult<ContentHash> {
        self.naming.resolve(key).await
    }

    pub async fn publish(&self, key: &NamingKey, hash: &ContentHash) -> NameResult<()> {
        self.naming.publish(key, hash).await
    }

    /// Returns `true` if `key` was minted by [`KeyManager::generate_key`]
    /// for records of `kind`.
    pub fn is_record_key(&self, key: &NamingKey, kind: &str) -> bool {
        key.name.starts_with(&format!("{}-{kind}-", self.prefix))
    }

    /// Public `…/ipns/{id}` address of `key`, if a gateway is configured.
    pub fn gateway_url(&self, key: &NamingKey) -> Option<String> {
        self.gateway_url
            .as_ref()
            .map(|base| format!("{}{}", base.trim_end_matches('/'), key.to_path()))
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("prefix", &self.prefix)
            .field("gateway_url", &self.gateway_url)
            .finish()
    }
}
