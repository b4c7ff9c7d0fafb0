use thiserror::Error;

/// Errors surfaced by the external stores the engine reads from and writes to.
///
/// Every variant is recoverable: callers keep their last-known-good state and
/// retry on the next poll.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The store could not be reached or rejected the query.
    #[error("store query failed: {0}")]
    Query(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A write targeted a record that no longer exists.
    #[error("record not found")]
    NotFound,

    /// The store answered with data the engine cannot use.
    #[error("invalid data from store: {0}")]
    Invalid(String),
}

impl SourceError {
    pub fn query<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query(Box::new(err))
    }
}

/// Errors from the local key-value store backing client-side state.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("failed to access state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}
