//! Error types for permission resolution and propagation.

use thiserror::Error;

/// The main error type for permission-gate operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The cache store could not be reached or timed out.
    ///
    /// The resolver never surfaces this to its caller; it is logged and the
    /// lookup degrades to the durable store.
    #[error("Cache store unavailable: {0}")]
    CacheUnavailable(String),

    /// The durable rule store could not be reached or timed out.
    #[error("Rule store unavailable: {0}")]
    StoreUnavailable(String),

    /// A rule was malformed (empty code, blank route template, ...).
    #[error("Invalid permission rule: {0}")]
    InvalidRule(String),

    /// The propagation queue is full; the change was not enqueued.
    #[error("Propagation queue is full")]
    QueueFull,

    /// The propagation worker has shut down.
    #[error("Propagation queue is closed")]
    QueueClosed,

    /// Looking up a principal's grants or role membership failed.
    #[error("Principal lookup failed for '{0}': {1}")]
    PrincipalLookup(String, String),

    /// Pushing an updated permission set into a session token failed.
    #[error("Session update failed for token '{0}': {1}")]
    SessionUpdate(String, String),

    /// Serialization error.
    #[cfg(feature = "persistence")]
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for permission-gate operations.
pub type Result<T> = std::result::Result<T, Error>;
