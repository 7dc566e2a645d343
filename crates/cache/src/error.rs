use thiserror::Error;

/// Failure of a memoized lookup.
#[derive(Debug, Clone, Error)]
pub enum CacheError<E> {
    /// The compute function returned an error. Never cached.
    #[error("{0}")]
    Computation(E),

    /// The computation task panicked or was aborted before producing a value.
    #[error("computation aborted: {0}")]
    Aborted(String),

    #[error("freshness window must be a whole number of seconds, at least one")]
    InvalidWindow,
}

impl<E> CacheError<E> {
    /// The compute function's own error, if that is what failed.
    pub fn computation(&self) -> Option<&E> {
        match self {
            CacheError::Computation(e) => Some(e),
            _ => None,
        }
    }
}

/// Rejected cache policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("freshness window must be at least one second (got {0:?})")]
    ZeroWindow(std::time::Duration),

    #[error("freshness window must be a whole number of seconds (got {0:?})")]
    FractionalWindow(std::time::Duration),

    #[error("max_entries must be greater than zero")]
    ZeroCapacity,
}
