use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Upstream rate limited after {attempts} attempt(s)")]
    UpstreamRateLimited { attempts: u32 },

    #[error("Upstream conflict: {0}")]
    UpstreamConflict(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Partition depth {depth} exceeded with {count} results still above the cap")]
    PartitionDepthExceeded { depth: u32, count: u32 },

    #[error("Store failure: {0}")]
    Store(String),

    #[error("Embedding failure: {0}")]
    Embedding(String),

    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn store(err: impl std::fmt::Display) -> Self { Self::Store(err.to_string()) }

    pub fn upstream(err: impl std::fmt::Display) -> Self { Self::Upstream(err.to_string()) }

    /// True for failures a caller may retry with backoff.
    pub fn is_rate_limited(&self) -> bool { matches!(self, Self::UpstreamRateLimited { .. }) }
}

pub type Result<T> = std::result::Result<T, Error>;
