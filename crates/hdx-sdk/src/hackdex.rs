use std::sync::Arc;
use std::time::Duration;

use hdx_index::{InitOutcome, MasterIndexManager};
use hdx_names::{KeyManager, KuboNamingService, NamingService};
use hdx_records::{EntityRecordStore, Hackathon, Project, Record, RecordError, UserProfile};
use hdx_store::{ContentStore, KuboClient, KuboContentStore};
use tracing::{info, warn};

use crate::attempt::{Attempt, AttemptPolicy, SettleReport};
use crate::config::StorageConfig;
use crate::error::SdkResult;
use crate::fallback::FallbackStore;
use crate::resilient::ResilientStore;
use crate::served::{FallbackReason, Served};

/// The Hackdex storage service.
///
/// Owns every dependency explicitly: content and naming clients, the master
/// index manager, and one fallback store per record type. Build it with
/// [`Hackdex::from_config`], [`Hackdex::with_backends`] or
/// [`Hackdex::offline`]; tear it down with [`Hackdex::shutdown`].
pub struct Hackdex {
    index: Option<Arc<MasterIndexManager>>,
    policy: Arc<AttemptPolicy>,
    hackathons: ResilientStore<Hackathon>,
    projects: ResilientStore<Project>,
    profiles: ResilientStore<UserProfile>,
}

impl Hackdex {
    /// Connect to the configured Kubo endpoint, or run permanently on the
    /// fallback store if the configuration cannot reach one.
    pub fn from_config(config: &StorageConfig) -> Self {
        match config.validate() {
            Ok(endpoint) => {
                let mut client = KuboClient::with_timeout(&endpoint.api_url, config.request_timeout());
                if let Some(token) = &endpoint.api_token {
                    client = client.with_token(token);
                }
                info!(api_url = %endpoint.api_url, "using primary storage backend");
                Self::with_backends(
                    Arc::new(KuboContentStore::new(client.clone())),
                    Arc::new(KuboNamingService::new(client)),
                    config,
                )
            }
            Err(error) => {
                warn!(%error, "storage backend not configured, serving from fallback only");
                Self::offline(config)
            }
        }
    }

    /// Build the service over the given backends.
    pub fn with_backends(
        content: Arc<dyn ContentStore>,
        naming: Arc<dyn NamingService>,
        config: &StorageConfig,
    ) -> Self {
        let mut keys = KeyManager::new(naming).with_prefix(&config.key_prefix);
        if let Some(gateway) = &config.gateway_url {
            keys = keys.with_gateway(gateway);
        }
        let index = Arc::new(MasterIndexManager::new(
            content.clone(),
            keys.clone(),
            config.index_options(),
        ));
        let policy = Arc::new(AttemptPolicy::new(config.primary_timeout(), config.fallback));

        fn store<R: Record>(
            content: &Arc<dyn ContentStore>,
            keys: &KeyManager,
            index: &Arc<MasterIndexManager>,
            policy: &Arc<AttemptPolicy>,
        ) -> ResilientStore<R> {
            ResilientStore::new(
                Some(EntityRecordStore::new(content.clone(), keys.clone(), index.clone())),
                Arc::new(FallbackStore::new()),
                policy.clone(),
            )
        }

        Self {
            hackathons: store(&content, &keys, &index, &policy),
            projects: store(&content, &keys, &index, &policy),
            profiles: store(&content, &keys, &index, &policy),
            index: Some(index),
            policy,
        }
    }

    /// A service with no primary backend. Every call is served from the
    /// fixtures and this session's writes.
    pub fn offline(config: &StorageConfig) -> Self {
        let policy = Arc::new(AttemptPolicy::new(config.primary_timeout(), config.fallback));
        Self {
            index: None,
            hackathons: ResilientStore::new(None, Arc::new(FallbackStore::new()), policy.clone()),
            projects: ResilientStore::new(None, Arc::new(FallbackStore::new()), policy.clone()),
            profiles: ResilientStore::new(None, Arc::new(FallbackStore::new()), policy.clone()),
            policy,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.index.is_none()
    }

    /// Find or create the master index.
    ///
    /// The value is `None` when the primary backend could not be reached.
    pub async fn initialize(&self) -> SdkResult<Served<Option<InitOutcome>>> {
        let Some(index) = self.index.clone() else {
            return Ok(Served::fallback(None, FallbackReason::Unconfigured));
        };
        let call = async move { Ok::<_, RecordError>(index.initialize().await?) };
        Ok(match self.policy.attempt("initialize", "index", call).await? {
            Attempt::Primary(outcome) => Served::primary(Some(outcome)),
            Attempt::Degraded(reason) => Served::fallback(None, reason),
        })
    }

    /// Public gateway address of the master index, if one is configured.
    pub async fn gateway_url(&self) -> SdkResult<Option<String>> {
        match &self.index {
            Some(index) => Ok(index.gateway_url().await?),
            None => Ok(None),
        }
    }

    pub fn hackathons(&self) -> &ResilientStore<Hackathon> {
        &self.hackathons
    }

    pub fn projects(&self) -> &ResilientStore<Project> {
        &self.projects
    }

    pub fn profiles(&self) -> &ResilientStore<UserProfile> {
        &self.profiles
    }

    /// Primary attempts abandoned after a timeout that have not been settled.
    pub fn pending_attempts(&self) -> usize {
        self.policy.pending()
    }

    /// Wait up to `grace` for abandoned primary attempts.
    pub async fn settle(&self, grace: Duration) -> SettleReport {
        self.policy.settle(grace).await
    }

    /// Wait up to `grace` for abandoned primary attempts and abort the rest.
    pub async fn shutdown(self, grace: Duration) -> SettleReport {
        let report = self.policy.shutdown(grace).await;
        info!(
            settled = report.settled,
            succeeded = report.succeeded,
            aborted = report.outstanding,
            "hackdex shut down"
        );
        report
    }
}

impl std::fmt::Debug for Hackdex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hackdex")
            .field("index", &self.index)
            .field("timeout", &self.policy.timeout())
            .field("pending_attempts", &self.policy.pending())
            .finish()
    }
}
