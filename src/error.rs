use std::fmt;

use thiserror::Error;

/// Errors reported by ring construction, or by callers converting a
/// rejected enqueue with `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// A ring must hold at least one value.
    #[error("invalid ring capacity {requested}, must be at least 1")]
    InvalidCapacity { requested: usize },
    /// Every slot was claimed when the value was offered.
    #[error("ring queue is full")]
    Full,
}

/// A value rejected by [`BoundedRing::enqueue`](crate::BoundedRing::enqueue)
/// because the ring was full. The caller gets the value back.
#[derive(Clone, Copy, PartialEq, Eq, Error)]
#[error("ring queue is full")]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Full(..)")
    }
}

impl<T> From<Full<T>> for RingError {
    fn from(_: Full<T>) -> Self {
        RingError::Full
    }
}
