//! Error surface of the entity store.
//!
//! Persistence failures are the only error class in the engine that can
//! leave an operation's effect uncertain (the in-memory mutation may have
//! landed while the flush did not), so they are kept distinct from the
//! logical validation/conflict errors defined elsewhere.
use thiserror::Error;

/// Failure at the storage boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure while loading or saving an aggregate.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An aggregate snapshot failed to serialize or parse.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// An export document carried a version tag this build cannot read.
    #[error("unsupported snapshot version: {0}")]
    UnsupportedSnapshotVersion(String),
}

impl StoreError {
    /// Convenience constructor for backend-specific failures.
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }
}
