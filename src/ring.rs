//! Bounded multi-producer multi-consumer ring queue.
//!
//! # Protocol
//! - Producers first claim a unit of capacity (`claimed`), then reserve a slot
//!   index by CAS on `write_cursor`.
//! - Consumers first claim a published item (`occupied`), then reserve a slot
//!   index by CAS on `read_cursor`.
//! - Every slot carries its own state marker
//!   (`EMPTY -> WRITING -> READY -> READING -> EMPTY`). A consumer never reads a
//!   slot its producer has not marked `READY`, and a producer never overwrites
//!   a slot its consumer has not handed back as `EMPTY`.
//!
//! Full and empty are reported immediately. The only spinning happens on a
//! lost cursor CAS or while a slot is owned by another in-flight operation.

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::{self, MaybeUninit};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crossbeam_utils::{Backoff, CachePadded};
use tracing::{debug, trace};

use crate::config::{RingConfig, DEFAULT_CAPACITY};
use crate::error::{Full, RingError};

const EMPTY: u8 = 0;
const WRITING: u8 = 1;
const READY: u8 = 2;
const READING: u8 = 3;

struct Slot<T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Slot {
            state: AtomicU8::new(EMPTY),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Moves the slot from `from` to `to`, spinning while another operation
    /// still owns it.
    #[inline]
    fn acquire(&self, from: u8, to: u8) {
        let backoff = Backoff::new();
        while self
            .state
            .compare_exchange_weak(from, to, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            backoff.snooze();
        }
    }
}

/// Hands a peeked slot back to consumers, even if `T::clone` panics.
struct PeekGuard<'a> {
    state: &'a AtomicU8,
}

impl Drop for PeekGuard<'_> {
    fn drop(&mut self) {
        self.state.store(READY, Ordering::Release);
    }
}

/// A fixed-capacity lock-free circular queue.
///
/// Any number of threads may call [`enqueue`](Self::enqueue),
/// [`dequeue`](Self::dequeue) and [`peek`](Self::peek) concurrently through a
/// shared reference. None of them blocks: a full ring hands the value back, an
/// empty ring returns `None`.
///
/// # Cache Layout
/// - `write_cursor` and `claimed` are touched by producers
/// - `read_cursor` and `occupied` are touched by consumers
/// - each sits on its own cache line
/// - `capacity` and `slots` are read-only after construction
pub struct BoundedRing<T> {
    /// Index of the next write reservation, in `[0, capacity)`
    write_cursor: CachePadded<AtomicUsize>,
    /// Index of the next read reservation, in `[0, capacity)`
    read_cursor: CachePadded<AtomicUsize>,
    /// Slots published by producers and not yet claimed by a consumer
    occupied: CachePadded<AtomicUsize>,
    /// Slots held from producer claim until consumer release
    claimed: CachePadded<AtomicUsize>,
    capacity: usize,
    slots: Box<[Slot<T>]>,
}

unsafe impl<T: Send> Sync for BoundedRing<T> {}

impl<T> BoundedRing<T> {
    /// Creates a ring holding at most `capacity` values.
    ///
    /// Returns [`RingError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        Self::with_config(&RingConfig::with_capacity(capacity))
    }

    pub fn with_config(config: &RingConfig) -> Result<Self, RingError> {
        config.validate()?;
        Ok(Self::allocate(config.capacity))
    }

    fn allocate(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        let slots = (0..capacity).map(|_| Slot::new()).collect();

        debug!(
            capacity,
            slot_size = mem::size_of::<Slot<T>>(),
            "ring queue allocated"
        );

        BoundedRing {
            write_cursor: CachePadded::new(AtomicUsize::new(0)),
            read_cursor: CachePadded::new(AtomicUsize::new(0)),
            occupied: CachePadded::new(AtomicUsize::new(0)),
            claimed: CachePadded::new(AtomicUsize::new(0)),
            capacity,
            slots,
        }
    }

    /// Pushes `value` onto the ring.
    ///
    /// Returns [`Full`] carrying the value back if every slot is claimed at
    /// the moment of the call.
    ///
    /// # Memory Ordering
    /// - `claimed` CAS: AcqRel (pairs with the consumer's release)
    /// - slot marker `EMPTY -> WRITING`: Acquire (sees the consumer's move-out)
    /// - slot marker `READY` store: Release (publishes the value)
    /// - `occupied` increment: Release (makes the item claimable)
    #[inline]
    pub fn enqueue(&self, value: T) -> Result<(), Full<T>> {
        if !self.try_claim() {
            trace!(capacity = self.capacity, "enqueue rejected, ring full");
            return Err(Full(value));
        }

        let index = self.reserve(&self.write_cursor);
        let slot = &self.slots[index];

        // A consumer from the previous lap may still be moving out.
        slot.acquire(EMPTY, WRITING);
        // SAFETY: the WRITING marker gives this thread exclusive access.
        unsafe { (*slot.value.get()).write(value) };
        slot.state.store(READY, Ordering::Release);

        self.occupied.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Pops the oldest value, or `None` if nothing is published.
    ///
    /// # Memory Ordering
    /// - `occupied` CAS: AcqRel (pairs with the producer's increment)
    /// - slot marker `READY -> READING`: Acquire (sees the producer's write)
    /// - slot marker `EMPTY` store: Release (frees the slot for producers)
    /// - `claimed` decrement: Release
    #[inline]
    pub fn dequeue(&self) -> Option<T> {
        let claimed = self
            .occupied
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if claimed.is_err() {
            trace!("dequeue rejected, ring empty");
            return None;
        }

        let index = self.reserve(&self.read_cursor);
        let slot = &self.slots[index];

        // The producer that reserved this index may not have published yet.
        slot.acquire(READY, READING);
        // SAFETY: the READING marker gives this thread exclusive access and
        // READY guarantees the value is initialized.
        let value = unsafe { (*slot.value.get()).assume_init_read() };
        slot.state.store(EMPTY, Ordering::Release);

        self.claimed.fetch_sub(1, Ordering::Release);
        Some(value)
    }

    /// Returns a clone of the value at the read cursor without consuming it.
    ///
    /// This is an advisory snapshot. A concurrent `dequeue` may take the
    /// value right after, and a slot that is being written or read at the
    /// moment of the call yields `None`.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        if self.is_empty() {
            return None;
        }

        let index = self.read_cursor.load(Ordering::Acquire);
        let slot = &self.slots[index];
        if slot
            .state
            .compare_exchange(READY, READING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return None;
        }

        let _guard = PeekGuard { state: &slot.state };
        // SAFETY: READING keeps consumers and producers away, READY
        // guaranteed the value is initialized.
        Some(unsafe { (*slot.value.get()).assume_init_ref().clone() })
    }

    /// Number of published, unconsumed values at the time of the call.
    #[inline]
    pub fn len(&self) -> usize {
        self.occupied.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every slot is claimed, so an `enqueue` right now would fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.claimed.load(Ordering::Acquire) == self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterator that dequeues until the ring reads empty.
    ///
    /// Other consumers may keep taking values while the iterator is alive;
    /// each value is yielded to exactly one of them.
    pub fn drain(&self) -> Drain<'_, T> {
        Drain { ring: self }
    }

    #[inline]
    fn try_claim(&self) -> bool {
        let capacity = self.capacity;
        self.claimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < capacity).then(|| n + 1)
            })
            .is_ok()
    }

    /// Advances `cursor` by one slot and returns the index it held before.
    #[inline]
    fn reserve(&self, cursor: &AtomicUsize) -> usize {
        let backoff = Backoff::new();
        let mut current = cursor.load(Ordering::Acquire);
        loop {
            let next = if current + 1 == self.capacity {
                0
            } else {
                current + 1
            };
            match cursor.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return current,
                Err(actual) => {
                    current = actual;
                    backoff.spin();
                }
            }
        }
    }
}

impl<T> Default for BoundedRing<T> {
    fn default() -> Self {
        Self::allocate(DEFAULT_CAPACITY)
    }
}

impl<T> Drop for BoundedRing<T> {
    fn drop(&mut self) {
        for slot in self.slots.iter_mut() {
            if *slot.state.get_mut() == READY {
                // SAFETY: READY slots hold an initialized value nobody else
                // can reach once we have `&mut self`.
                unsafe { slot.value.get_mut().assume_init_drop() };
            }
        }
    }
}

impl<T> fmt::Debug for BoundedRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedRing")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("write_cursor", &self.write_cursor.load(Ordering::Relaxed))
            .field("read_cursor", &self.read_cursor.load(Ordering::Relaxed))
            .finish()
    }
}

/// Draining iterator returned by [`BoundedRing::drain`].
pub struct Drain<'a, T> {
    ring: &'a BoundedRing<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.ring.dequeue()
    }
}
