use crate::error::RingError;
use crate::ring::BoundedRing;

/// Capacity used when none is given.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Construction options for a [`BoundedRing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    /// Maximum number of values buffered at once. Fixed for the ring's lifetime.
    pub capacity: usize,
}

impl RingConfig {
    pub const fn with_capacity(capacity: usize) -> Self {
        RingConfig { capacity }
    }

    /// Fails fast on a capacity that could never accept a write.
    pub fn validate(&self) -> Result<(), RingError> {
        if self.capacity == 0 {
            return Err(RingError::InvalidCapacity {
                requested: self.capacity,
            });
        }
        Ok(())
    }

    pub fn build<T>(&self) -> Result<BoundedRing<T>, RingError> {
        BoundedRing::with_config(self)
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        RingConfig::with_capacity(DEFAULT_CAPACITY)
    }
}
