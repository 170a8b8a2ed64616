use hdx_index::IndexError;
use hdx_names::NameError;
use hdx_store::StoreError;
use hdx_types::RecordId;
use thiserror::Error;

/// Errors that can occur during record operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A fetched document is not a valid record of the expected kind.
    #[error("invalid record {id}: {reason}")]
    Validation { id: RecordId, reason: String },

    /// An update patch could not be applied.
    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("naming error: {0}")]
    Name(#[from] NameError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RecordError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Index(e) => e.is_transient(),
            Self::Store(e) => e.is_transient(),
            Self::Name(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type RecordResult<T> = Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_through_index() {
        let err = RecordError::from(IndexError::Store(StoreError::Unavailable));
        assert!(err.is_transient());
        assert!(!RecordError::InvalidPatch("x".into()).is_transient());
        assert!(!RecordError::Validation {
            id: RecordId::new(),
            reason: "kind".into()
        }
        .is_transient());
    }
}
