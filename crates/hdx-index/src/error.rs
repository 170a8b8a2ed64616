//! Error types for the index crate.

use hdx_names::NameError;
use hdx_store::StoreError;
use hdx_types::RecordId;

/// Errors that can occur during master index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The master key exists but does not lead to stored content.
    #[error("master index pointer {name} does not resolve to content")]
    MasterUnresolvable { name: String },

    /// The master index was fetched but failed shape validation.
    #[error("master index is malformed: {reason}")]
    Malformed { reason: String },

    /// `replace_index` was handed a document older than the published one.
    #[error("stale master index: writer saw version {expected}, published version is {actual}")]
    StaleIndex { expected: u64, actual: u64 },

    /// Legacy discovery found more than one key that looks like a master index.
    #[error("ambiguous master index: {} candidate keys ({})", .candidates.len(), .candidates.join(", "))]
    AmbiguousMaster { candidates: Vec<String> },

    /// An entry with this id is already in the index.
    #[error("duplicate index entry: {0}")]
    DuplicateEntry(RecordId),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("naming error: {0}")]
    Name(#[from] NameError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl IndexError {
    /// Returns `true` for failures of the underlying services that may
    /// succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            Self::Name(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
