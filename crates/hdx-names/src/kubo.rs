//! [`NamingService`] over a Kubo RPC endpoint (`key/*` and `name/*`).

use async_trait::async_trait;
use hdx_store::{KuboClient, KuboError};
use hdx_types::{ContentHash, NamingKey};
use serde::Deserialize;
use tracing::debug;

use crate::error::{NameError, NameResult};
use crate::names::validate_key_name;
use crate::traits::NamingService;

/// Lifetime of a published record before the node stops vouching for it.
const RECORD_LIFETIME: &str = "8760h";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyEntry {
    name: String,
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyListResponse {
    #[serde(default)]
    keys: Vec<KeyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResolveResponse {
    path: String,
}

/// Naming service backed by a Kubo node's keystore.
#[derive(Clone, Debug)]
pub struct KuboNamingService {
    client: KuboClient,
}

impl KuboNamingService {
    pub fn new(client: KuboClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NamingService for KuboNamingService {
    async fn generate(&self, name: &str) -> NameResult<NamingKey> {
        validate_key_name(name)?;
        let entry: KeyEntry = self
            .client
            .call_json("key/gen", &[("arg", name), ("type", "ed25519")])
            .await
            .map_err(|err| match err {
                KuboError::Rpc { ref message, .. } if message.contains("already exists") => {
                    NameError::KeyExists {
                        name: name.to_string(),
                    }
                }
                other => other.into(),
            })?;
        debug!(key = %entry.name, "generated key");
        Ok(NamingKey::new(entry.name, entry.id))
    }

    async fn publish(&self, key: &NamingKey, hash: &ContentHash) -> NameResult<()> {
        let path = hash.to_path();
        self.client
            .call_json::<serde_json::Value>(
                "name/publish",
                &[
                    ("arg", path.as_str()),
                    ("key", key.name.as_str()),
                    ("lifetime", RECORD_LIFETIME),
                    ("allow-offline", "true"),
                ],
            )
            .await?;
        debug!(key = %key.name, hash = %hash.short(), "published");
        Ok(())
    }

    async fn resolve(&self, key: &NamingKey) -> NameResult<ContentHash> {
        let path = key.to_path();
        let response: ResolveResponse = self
            .client
            .call_json("name/resolve", &[("arg", path.as_str()), ("nocache", "true")])
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    NameError::Unresolved {
                        name: key.name.clone(),
                    }
                } else {
                    err.into()
                }
            })?;
        Ok(ContentHash::parse(&response.path)?)
    }

    async fn list(&self) -> NameResult<Vec<NamingKey>> {
        let response: KeyListResponse = self.client.call_json("key/list", &[]).await?;
        Ok(response
            .keys
            .into_iter()
            .map(|k| NamingKey::new(k.name, k.id))
            .collect())
    }
}
