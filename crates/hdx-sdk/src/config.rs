//! Storage configuration.
//!
//! Loaded from a TOML file and then overridden by `HACKDEX_*` environment
//! variables. A configuration without an API endpoint is valid: it selects
//! the permanent fallback mode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hdx_index::{IndexOptions, MasterDiscovery, DEFAULT_MASTER_KEY_NAME};
use hdx_names::manager::DEFAULT_KEY_PREFIX;
use hdx_records::RecordError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_API_URL: &str = "HACKDEX_API_URL";
pub const ENV_API_TOKEN: &str = "HACKDEX_API_TOKEN";
pub const ENV_GATEWAY_URL: &str = "HACKDEX_GATEWAY_URL";
pub const ENV_TIMEOUT_SECS: &str = "HACKDEX_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(String),

    #[error("no API endpoint configured")]
    MissingEndpoint,

    #[error("invalid API endpoint {0:?}: expected an http(s) URL")]
    InvalidEndpoint(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// When a failed primary call is answered from the fallback store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackTrigger {
    /// Only network, timeout and unavailability errors. Validation,
    /// malformed-index and stale-index errors reach the caller.
    #[default]
    Transient,
    /// Every primary error.
    AnyError,
}

impl FallbackTrigger {
    pub fn should_fall_back(&self, error: &RecordError) -> bool {
        match self {
            Self::Transient => error.is_transient(),
            Self::AnyError => true,
        }
    }
}

/// Configuration for a [`Hackdex`](crate::Hackdex) service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the Kubo-compatible RPC endpoint.
    pub api_url: Option<String>,
    /// Bearer token sent to the RPC endpoint.
    pub api_token: Option<String>,
    /// Public gateway used to render `…/ipns/{id}` addresses.
    pub gateway_url: Option<String>,
    pub key_prefix: String,
    pub master_key_name: String,
    /// Adopt a single pre-existing index key if the well-known one is missing.
    pub legacy_discovery: bool,
    /// How long an operation waits for the primary backend before falling back.
    pub primary_timeout_secs: u64,
    /// Per-request timeout of the HTTP client.
    pub request_timeout_secs: u64,
    pub fallback: FallbackTrigger,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_token: None,
            gateway_url: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            master_key_name: DEFAULT_MASTER_KEY_NAME.to_string(),
            legacy_discovery: false,
            primary_timeout_secs: 30,
            request_timeout_secs: 60,
            fallback: FallbackTrigger::default(),
        }
    }
}

/// The part of a validated configuration needed to reach the primary backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimaryEndpoint {
    pub api_url: String,
    pub api_token: Option<String>,
}

impl StorageConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read `path`, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `HACKDEX_*` overrides looked up through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(token) = lookup(ENV_API_TOKEN) {
            self.api_token = Some(token);
        }
        if let Some(url) = lookup(ENV_GATEWAY_URL) {
            self.gateway_url = Some(url);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.primary_timeout_secs =
                secs.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        field: ENV_TIMEOUT_SECS,
                        reason: e.to_string(),
                    })?;
        }
        Ok(())
    }

    pub fn primary_timeout(&self) -> Duration {
        Duration::from_secs(self.primary_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            master_key_name: self.master_key_name.clone(),
            discovery: if self.legacy_discovery {
                MasterDiscovery::AdoptSingleCandidate
            } else {
                MasterDiscovery::WellKnown
            },
        }
    }

    /// Check the configuration can drive the primary backend.
    pub fn validate(&self) -> Result<PrimaryEndpoint, ConfigError> {
        if self.primary_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "primary_timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        if self.key_prefix.is_empty() || self.master_key_name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "key_prefix",
                reason: "key prefix and master key name must not be empty".into(),
            });
        }
        let api_url = match self.api_url.as_deref().map(str::trim) {
            None | Some("") => return Err(ConfigError::MissingEndpoint),
            Some(url) => url,
        };
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(api_url.to_string()));
        }
        Ok(PrimaryEndpoint {
            api_url: api_url.to_string(),
            api_token: self.api_token.clone().filter(|t| !t.is_empty()),
        })
    }
}
