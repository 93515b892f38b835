//! Pool configuration options

use crate::errors::{PoolError, PoolResult};

/// Capacity settings for a [`Pool`](crate::Pool)
///
/// # Examples
///
/// ```
/// use holdpool::PoolConfiguration;
///
/// let config = PoolConfiguration::new()
///     .with_initial_capacity(10)
///     .with_max_capacity(20);
///
/// assert_eq!(config.initial_capacity, 10);
/// assert_eq!(config.max_capacity, 20);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfiguration {
    /// Number of resources produced eagerly when the pool is built
    pub initial_capacity: usize,

    /// Maximum number of idle resources kept for reuse
    pub max_capacity: usize,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            max_capacity: 16,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of resources produced up front
    pub fn with_initial_capacity(mut self, count: usize) -> Self {
        self.initial_capacity = count;
        self
    }

    /// Set the free-list capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use holdpool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::new().with_max_capacity(50);
    ///
    /// assert_eq!(config.max_capacity, 50);
    /// ```
    pub fn with_max_capacity(mut self, count: usize) -> Self {
        self.max_capacity = count;
        self
    }

    /// Check that the initial capacity fits in the free-list
    pub fn validate(&self) -> PoolResult<()> {
        if self.initial_capacity > self.max_capacity {
            return Err(PoolError::InvalidCapacity {
                initial: self.initial_capacity,
                maximum: self.max_capacity,
            });
        }
        Ok(())
    }
}
