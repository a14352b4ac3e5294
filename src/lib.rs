//! A fixed-capacity, lock-free circular queue for handing values between any
//! number of producer and consumer threads.
//!
//! ```
//! let (tx, rx) = ringqueue::bounded::<u32>(4).unwrap();
//!
//! tx.enqueue(1).unwrap();
//! tx.enqueue(2).unwrap();
//!
//! assert_eq!(rx.peek(), Some(1));
//! assert_eq!(rx.dequeue(), Some(1));
//! assert_eq!(rx.dequeue(), Some(2));
//! assert_eq!(rx.dequeue(), None);
//! ```

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod reference;
pub mod ring;

pub use config::{RingConfig, DEFAULT_CAPACITY};
pub use error::{Full, RingError};
pub use ring::{BoundedRing, Drain};

pub struct RingConsumer<T> {
    inner: Arc<BoundedRing<T>>,
}

impl<T: Send> RingConsumer<T> {
    pub fn dequeue(&self) -> Option<T> {
        self.inner.dequeue()
    }

    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.inner.peek()
    }

    pub fn drain(&self) -> Drain<'_, T> {
        self.inner.drain()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> Clone for RingConsumer<T> {
    fn clone(&self) -> Self {
        RingConsumer {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[doc(hidden)]
impl<T> From<Arc<BoundedRing<T>>> for RingConsumer<T> {
    fn from(inner: Arc<BoundedRing<T>>) -> Self {
        RingConsumer { inner }
    }
}

pub struct RingProducer<T> {
    inner: Arc<BoundedRing<T>>,
}

impl<T: Send> RingProducer<T> {
    pub fn enqueue(&self, x: T) -> Result<(), Full<T>> {
        self.inner.enqueue(x)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl<T> Clone for RingProducer<T> {
    fn clone(&self) -> Self {
        RingProducer {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[doc(hidden)]
impl<T> From<Arc<BoundedRing<T>>> for RingProducer<T> {
    fn from(inner: Arc<BoundedRing<T>>) -> Self {
        RingProducer { inner }
    }
}

/// Creates a ring of `capacity` slots and returns a producer and a consumer
/// handle to it. Clone either handle to add more threads on that side.
pub fn bounded<T: Send>(capacity: usize) -> Result<(RingProducer<T>, RingConsumer<T>), RingError> {
    let ring = Arc::new(BoundedRing::new(capacity)?);

    Ok((Arc::clone(&ring).into(), ring.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn zero_capacity_handles_fail() {
        assert_eq!(
            bounded::<u8>(0).err(),
            Some(RingError::InvalidCapacity { requested: 0 })
        );
    }

    #[test]
    fn handles_share_one_ring() {
        let (tx, rx) = bounded(3).unwrap();
        let tx2 = tx.clone();
        let rx2 = rx.clone();

        tx.enqueue("a").unwrap();
        tx2.enqueue("b").unwrap();
        assert_eq!(rx.len(), 2);
        assert_eq!(tx.capacity(), 3);
        assert_eq!(rx2.dequeue(), Some("a"));
        assert_eq!(rx.dequeue(), Some("b"));
        assert!(rx2.is_empty());
    }

    #[test]
    fn producers_and_consumers_on_threads() {
        const PER_PRODUCER: u64 = 1_000;

        let (tx, rx) = bounded::<u64>(16).unwrap();

        let producers: Vec<_> = (0..3)
            .map(|p| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        let mut item = p * PER_PRODUCER + i;
                        while let Err(Full(back)) = tx.enqueue(item) {
                            item = back;
                            thread::yield_now();
                        }
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..2)
            .map(|_| {
                let rx = rx.clone();
                thread::spawn(move || {
                    let mut sum = 0u64;
                    let mut count = 0u64;
                    while count < PER_PRODUCER * 3 / 2 {
                        match rx.dequeue() {
                            Some(item) => {
                                sum += item;
                                count += 1;
                            }
                            None => thread::yield_now(),
                        }
                    }
                    sum
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        let total: u64 = consumers.into_iter().map(|c| c.join().unwrap()).sum();

        let n = PER_PRODUCER * 3;
        assert_eq!(total, n * (n - 1) / 2);
        assert!(rx.is_empty());
        assert!(!tx.is_full());
    }
}
