use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid content hash {value:?}: {reason}")]
    InvalidHash { value: String, reason: String },

    #[error("invalid record id {value:?}: {reason}")]
    InvalidRecordId { value: String, reason: String },
}
