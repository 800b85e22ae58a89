//! Backing array of the FIFO.
//!
//! Written only by the producer, read only by the consumer. There is no lock:
//! the FULL / EMPTY protocol guarantees a slot is never reachable from both
//! sides at once, and the relays order each slot access against the pointer
//! publication that hands the slot to the other side.

use std::cell::UnsafeCell;

pub struct Storage<T> {
    slots: Box<[UnsafeCell<T>]>,
}

// SAFETY: slots are accessed from two threads, but each slot is owned by
// exactly one side at a time (see `write` / `read`). Ownership transfer
// happens through the relay's Release/Acquire pair.
unsafe impl<T: Send> Sync for Storage<T> {}

impl<T: Copy + Default> Storage<T> {
    /// Allocates `capacity` slots, each holding `T::default()`.
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(T::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Stores `word` at `address`.
    ///
    /// # Safety
    /// The caller must be the producer, `address` must be the address bits of
    /// its write pointer, and the producer must have seen the queue as not
    /// full. The consumer then cannot be reading this slot.
    #[inline(always)]
    pub unsafe fn write(&self, address: usize, word: T) {
        debug_assert!(address < self.slots.len());
        // SAFETY: in bounds (address < 2^k == len) and exclusively owned by
        // the producer per the contract above.
        unsafe { self.slots.get_unchecked(address).get().write(word) }
    }

    /// Returns the word last written at `address`.
    ///
    /// # Safety
    /// The caller must be the consumer, `address` must be the address bits of
    /// its read pointer, and the consumer must have seen the queue as not
    /// empty. The producer then cannot be writing this slot.
    #[inline(always)]
    pub unsafe fn read(&self, address: usize) -> T {
        debug_assert!(address < self.slots.len());
        // SAFETY: in bounds and exclusively owned by the consumer per the
        // contract above.
        unsafe { self.slots.get_unchecked(address).get().read() }
    }
}
