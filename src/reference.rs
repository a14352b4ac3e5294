//! Sequential model of the ring queue contract, used as a test oracle.

use std::collections::VecDeque;

use crate::config::RingConfig;
use crate::error::{Full, RingError};

pub struct ReferenceQueue<T> {
    capacity: usize,
    data: VecDeque<T>,
}

impl<T> ReferenceQueue<T> {
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        RingConfig::with_capacity(capacity).validate()?;
        Ok(ReferenceQueue {
            capacity,
            data: VecDeque::with_capacity(capacity),
        })
    }

    pub fn enqueue(&mut self, x: T) -> Result<(), Full<T>> {
        if self.data.len() == self.capacity {
            Err(Full(x))
        } else {
            self.data.push_back(x);
            Ok(())
        }
    }

    pub fn dequeue(&mut self) -> Option<T> {
        self.data.pop_front()
    }

    pub fn peek(&self) -> Option<&T> {
        self.data.front()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_fifo() {
        let mut q = ReferenceQueue::new(2).unwrap();
        assert!(q.is_empty());
        assert_eq!(q.enqueue(1), Ok(()));
        assert_eq!(q.enqueue(2), Ok(()));
        assert!(q.is_full());
        assert_eq!(q.enqueue(3).map_err(Full::into_inner), Err(3));
        assert_eq!(q.peek(), Some(&1));
        assert_eq!(q.dequeue(), Some(1));
        assert_eq!(q.dequeue(), Some(2));
        assert_eq!(q.dequeue(), None);
        assert_eq!(q.capacity(), 2);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(ReferenceQueue::<u8>::new(0).is_err());
    }
}
