//! Error types for the resource pool

use thiserror::Error;

/// Boxed error coming from a producer or a resource.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("invalid pool capacity: initial capacity {initial} exceeds maximum capacity {maximum}")]
    InvalidCapacity { initial: usize, maximum: usize },

    #[error("pool initialization error")]
    Initialization(#[source] BoxError),

    #[error("pool has no backing storage")]
    Uninitialized,

    #[error("pool has been closed")]
    Closed,

    /// The producer failed on a free-list miss. Reported as-is.
    #[error(transparent)]
    Produce(BoxError),

    #[error("Operation was cancelled")]
    Cancelled,
}

impl PoolError {
    /// Whether this error means the pool can no longer hand out resources
    pub fn is_closed(&self) -> bool {
        matches!(self, PoolError::Closed)
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
