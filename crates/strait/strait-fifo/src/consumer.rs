//! Consumer side: read pointer, EMPTY, and admission of pops.
//!
//! Mirror image of the producer. The snapshot of the write pointer can only
//! lag, so the queue may look emptier than it is but never holds a word the
//! producer has not finished storing.

use crate::config::FifoConfig;
use crate::error::Rejected;
use crate::pointer::{Pointer, PointerSpace};
use crate::relay::{RelayReceiver, RelaySender};
use crate::stats::SideStats;
use crate::storage::Storage;
use crate::word::Word;
use std::fmt;
use std::sync::Arc;

/// The consumer half of an [`AsyncFifo`](crate::AsyncFifo).
pub struct Consumer<T: Word> {
    pub(crate) storage: Arc<Storage<T>>,
    space: PointerSpace,
    read_ptr: Pointer,
    empty: bool,
    almost_empty: bool,
    almost_empty_level: u64,
    /// Publishes `read_ptr` to the producer.
    pub(crate) tx: RelaySender,
    /// Synchronized view of the producer's `write_ptr`.
    pub(crate) rx: RelayReceiver,
    stats: SideStats,
}

impl<T: Word> Consumer<T> {
    pub(crate) fn new(
        storage: Arc<Storage<T>>,
        cfg: &FifoConfig,
        tx: RelaySender,
        rx: RelayReceiver,
    ) -> Self {
        Self {
            storage,
            space: cfg.pointer_space(),
            read_ptr: Pointer::ZERO,
            empty: true,
            almost_empty: true,
            almost_empty_level: cfg.almost_empty_level(),
            tx,
            rx,
            stats: SideStats::default(),
        }
    }

    /// Attempts to dequeue the oldest word.
    ///
    /// Each call is one consumer step: the write-pointer relay advances and
    /// EMPTY is recomputed before admission is decided.
    ///
    /// # Returns
    /// - `Ok(word)` with the word at the read pointer, which then advances
    /// - `Err(Rejected::Empty)` if the consumer sees nothing buffered;
    ///   storage and the read pointer are left untouched
    #[inline]
    pub fn try_pop(&mut self) -> Result<T, Rejected> {
        let snapshot = self.rx.step();
        self.refresh(snapshot);

        if self.empty {
            self.stats.rejected += 1;
            return Err(Rejected::Empty);
        }

        let addr = self.space.address(self.read_ptr);
        // SAFETY: we are the only consumer, `addr` comes from our own read
        // pointer, and the snapshot shows the producer published past it, so
        // the word is fully stored and the producer will not touch the slot
        // until we publish a read pointer beyond it.
        let word = unsafe { self.storage.read(addr) };

        let next = self.space.next(self.read_ptr);
        self.read_ptr = next;
        self.tx.publish(next);
        self.refresh(snapshot);
        self.stats.accepted += 1;
        Ok(word)
    }

    /// One consumer step without a pop.
    pub fn tick(&mut self) {
        let snapshot = self.rx.step();
        self.refresh(snapshot);
    }

    fn refresh(&mut self, write_snapshot: Pointer) {
        let empty = self.space.is_empty(self.read_ptr, write_snapshot);
        if empty != self.empty {
            tracing::trace!(
                empty,
                read_ptr = self.read_ptr.raw(),
                write_snapshot = write_snapshot.raw(),
                "consumer empty flag changed"
            );
            self.empty = empty;
        }
        self.almost_empty =
            self.space.distance(write_snapshot, self.read_ptr) <= self.almost_empty_level;
    }

    /// EMPTY as of the last recompute.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// At most `almost_empty` words buffered as of the last recompute.
    #[inline(always)]
    pub fn is_almost_empty(&self) -> bool {
        self.almost_empty
    }

    /// Lower bound on the words currently buffered, from the consumer's view.
    pub fn occupancy(&self) -> u64 {
        self.space.distance(self.rx.observe(), self.read_ptr)
    }

    pub fn pointer(&self) -> Pointer {
        self.read_ptr
    }

    pub fn capacity(&self) -> u64 {
        self.space.capacity()
    }

    pub fn stats(&self) -> SideStats {
        self.stats
    }

    /// Back to the zero pointer: publishes it to the producer and clears the
    /// synchronizer stages holding the producer's write pointer. Stats are kept.
    ///
    /// # Safety
    /// Same contract as [`Producer::reset`](crate::Producer::reset): the
    /// producer half must reset too, and both resets must happen-before any
    /// later operation on either half.
    pub unsafe fn reset(&mut self) {
        self.read_ptr = Pointer::ZERO;
        self.tx.publish(Pointer::ZERO);
        self.rx.reset();
        self.empty = true;
        self.almost_empty = true;
    }
}

impl<T: Word> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("read_ptr", &self.read_ptr)
            .field("write_snapshot", &self.rx.observe())
            .field("empty", &self.empty)
            .field("almost_empty", &self.almost_empty)
            .field("stats", &self.stats)
            .finish()
    }
}
