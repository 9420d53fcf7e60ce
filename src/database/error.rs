use std::path::PathBuf;
use thiserror::Error;

/// Store-related errors
///
/// Reads never surface these (they degrade to an empty document); writes do.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Coin already exists: {0}")]
    DuplicateCoin(String),

    #[error("Refusing to overwrite unreadable data file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}
