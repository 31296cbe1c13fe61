//! Error types
//!
//! Only setup and storage can fail; everything inside a running match
//! degrades to a defined default instead.

/// Rejected match setup. No match state is touched when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("a match needs at least 2 valid fighters, got {found}")]
    NotEnoughFighters { found: usize },
}

/// Failures reading or writing the key/value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable")]
    Unavailable,

    #[error("storage write failed: {0}")]
    Write(String),

    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}
