use hdx_types::{ContentHash, TypeError};

use crate::kubo::KuboError;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested content was not found.
    #[error("content not found: {0}")]
    NotFound(ContentHash),

    /// The backend could not be reached or the transfer failed.
    #[error("network error: {0}")]
    Network(String),

    /// The backend did not answer within its request timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The backend is switched off or otherwise refusing requests.
    #[error("content store unavailable")]
    Unavailable,

    /// The backend answered with something that is not a valid response.
    #[error("invalid response from content store: {0}")]
    InvalidResponse(String),

    #[error("invalid hash: {0}")]
    Type(#[from] TypeError),
}

impl StoreError {
    /// Returns `true` for failures that may succeed on a later attempt
    /// (network trouble, timeouts, an unavailable backend).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::Unavailable
        )
    }
}

impl From<KuboError> for StoreError {
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

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StoreError::Network("reset".into()).is_transient());
        assert!(StoreError::Timeout("30s".into()).is_transient());
        assert!(StoreError::Unavailable.is_transient());
        assert!(!StoreError::NotFound(ContentHash::digest(b"x")).is_transient());
        assert!(!StoreError::InvalidResponse("junk".into()).is_transient());
    }

    #[test]
    fn rpc_server_errors_are_network_errors() {
        let err: StoreError = KuboError::Rpc {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(err, StoreError::Network(_)));

        let err: StoreError = KuboError::Rpc {
            status: 400,
            message: "bad arg".into(),
        }
        .into();
        assert!(matches!(err, StoreError::InvalidResponse(_)));
    }
}
