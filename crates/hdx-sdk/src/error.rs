use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("record error: {0}")]
    Record(#[from] hdx_records::RecordError),

    #[error("index error: {0}")]
    Index(#[from] hdx_index::IndexError),

    /// The spawned primary attempt panicked or was cancelled.
    #[error("primary attempt for {op} did not complete: {reason}")]
    AttemptFailed { op: &'static str, reason: String },
}

pub type SdkResult<T> = Result<T, SdkError>;
