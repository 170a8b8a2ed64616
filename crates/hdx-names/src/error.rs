//! Error types for naming operations.

use hdx_store::KuboError;
use hdx_types::TypeError;
use thiserror::Error;

/// Errors that can occur during naming operations.
#[derive(Debug, Error)]
pub enum NameError {
    /// The key exists but nothing resolvable is published under it.
    #[error("name not resolvable: {name}")]
    Unresolved { name: String },

    /// No key with this name exists in the account.
    #[error("unknown key: {name}")]
    UnknownKey { name: String },

    /// A key with this name already exists.
    #[error("key already exists: {name}")]
    KeyExists { name: String },

    /// The key name is invalid.
    #[error("invalid key name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("naming service unavailable")]
    Unavailable,

    #[error("invalid response from naming service: {0}")]
    InvalidResponse(String),

    #[error("invalid value: {0}")]
    Type(#[from] TypeError),
}

impl NameError {
    /// Returns `true` for failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::Unavailable
        )
    }
}

impl From<KuboError> for NameError {
    fn from(err: KuboError) -> Self {
        match err {
            KuboError::Http(e) if e.is_timeout() => Self::Timeout(e.to_string()),
            KuboError::Http(e) => Self::Network(e.to_string()),
            KuboError::Rpc { status, message } if status >= 500 => {
                Self::Network(format!("rpc error ({status}): {message}"))
            }
            KuboError::Rpc { status, message } => {
                Self::InvalidResponse(format!("rpc error ({status}): {message}"))
            }
            KuboError::Decode(message) => Self::InvalidResponse(message),
        }
    }
}

/// Convenience type alias for naming operations.
pub type NameResult<T> = std::result::Result<T, NameError>;
