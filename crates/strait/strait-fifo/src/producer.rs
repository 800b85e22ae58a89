//! Producer side: write pointer, FULL, and admission of pushes.
//!
//! The producer compares its own write pointer with a synchronized, possibly
//! stale snapshot of the consumer's read pointer. A stale read pointer can
//! only make the queue look fuller than it is, so a push admitted against the
//! snapshot never overwrites a word the consumer has yet to read.

use crate::config::FifoConfig;
use crate::error::Rejected;
use crate::pointer::{Pointer, PointerSpace};
use crate::relay::{RelayReceiver, RelaySender};
use crate::stats::SideStats;
use crate::storage::Storage;
use crate::word::Word;
use std::fmt;
use std::sync::Arc;

/// The producer half of an [`AsyncFifo`](crate::AsyncFifo).
///
/// `Send` but not `Clone`: there is exactly one producer per queue.
pub struct Producer<T: Word> {
    pub(crate) storage: Arc<Storage<T>>,
    cfg: FifoConfig,
    space: PointerSpace,
    word_bits: u32,
    write_ptr: Pointer,
    full: bool,
    almost_full: bool,
    almost_full_level: u64,
    /// Publishes `write_ptr` to the consumer.
    pub(crate) tx: RelaySender,
    /// Synchronized view of the consumer's `read_ptr`.
    pub(crate) rx: RelayReceiver,
    stats: SideStats,
}

impl<T: Word> Producer<T> {
    pub(crate) fn new(
        storage: Arc<Storage<T>>,
        cfg: &FifoConfig,
        tx: RelaySender,
        rx: RelayReceiver,
    ) -> Self {
        let almost_full_level = cfg.almost_full_level();
        Self {
            storage,
            cfg: *cfg,
            space: cfg.pointer_space(),
            word_bits: cfg.word_bits,
            write_ptr: Pointer::ZERO,
            full: false,
            almost_full: almost_full_level == 0,
            almost_full_level,
            tx,
            rx,
            stats: SideStats::default(),
        }
    }

    /// Attempts to enqueue `word`, truncated to the queue's word width.
    ///
    /// Each call is one producer step: the read-pointer relay advances and
    /// FULL is recomputed before admission is decided.
    ///
    /// # Returns
    /// - `Ok(())` if the word was stored and the new write pointer published
    /// - `Err(Rejected::Full)` if the producer sees `capacity` words buffered;
    ///   storage and the write pointer are left untouched
    #[inline]
    pub fn try_push(&mut self, word: T) -> Result<(), Rejected> {
        let snapshot = self.rx.step();
        self.refresh(snapshot);

        if self.full {
            self.stats.rejected += 1;
            return Err(Rejected::Full);
        }

        let addr = self.space.address(self.write_ptr);
        // SAFETY: we are the only producer, `addr` comes from our own write
        // pointer, and the queue is not full against a read pointer no newer
        // than the consumer's, so the consumer is done with this slot.
        unsafe { self.storage.write(addr, word.truncate(self.word_bits)) };

        let next = self.space.next(self.write_ptr);
        self.write_ptr = next;
        self.tx.publish(next);
        self.refresh(snapshot);
        self.stats.accepted += 1;
        Ok(())
    }

    /// One producer step without a push: advances the relay and recomputes
    /// the flags. Lets a caller waiting on FULL see it clear.
    pub fn tick(&mut self) {
        let snapshot = self.rx.step();
        self.refresh(snapshot);
    }

    fn refresh(&mut self, read_snapshot: Pointer) {
        let full = self.space.is_full(self.write_ptr, read_snapshot);
        if full != self.full {
            tracing::trace!(
                full,
                write_ptr = self.write_ptr.raw(),
                read_snapshot = read_snapshot.raw(),
                "producer full flag changed"
            );
            self.full = full;
        }
        self.almost_full =
            self.space.distance(self.write_ptr, read_snapshot) >= self.almost_full_level;
    }

    /// FULL as of the last recompute.
    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// At least `almost_full` words buffered as of the last recompute.
    #[inline(always)]
    pub fn is_almost_full(&self) -> bool {
        self.almost_full
    }

    /// Upper bound on the words currently buffered, from the producer's view.
    pub fn occupancy(&self) -> u64 {
        self.space.distance(self.write_ptr, self.rx.observe())
    }

    /// The current write pointer.
    pub fn pointer(&self) -> Pointer {
        self.write_ptr
    }

    pub fn capacity(&self) -> u64 {
        self.space.capacity()
    }

    /// The configuration the queue was built with.
    pub fn config(&self) -> &FifoConfig {
        &self.cfg
    }

    pub fn stats(&self) -> SideStats {
        self.stats
    }

    /// Back to the zero pointer: publishes it to the consumer and clears the
    /// synchronizer stages holding the consumer's read pointer. Stats are kept.
    ///
    /// Lets a split producer restart in its own context. An unsplit queue
    /// uses [`AsyncFifo::reset`](crate::AsyncFifo::reset) instead.
    ///
    /// # Safety
    /// Reset is only sound when both sides do it together. The matching
    /// [`Consumer::reset`](crate::Consumer::reset) must run on the other half
    /// of this queue, and both resets must happen-before any later
    /// `try_push`, `try_pop` or `tick` on either half (for example, both
    /// contexts wait on a barrier after resetting). Otherwise the producer
    /// can admit a push against a stale read pointer and overwrite a slot
    /// the consumer is reading.
    pub unsafe fn reset(&mut self) {
        self.write_ptr = Pointer::ZERO;
        self.tx.publish(Pointer::ZERO);
        self.rx.reset();
        self.full = false;
        self.almost_full = self.almost_full_level == 0;
    }
}

impl<T: Word> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("write_ptr", &self.write_ptr)
            .field("read_snapshot", &self.rx.observe())
            .field("full", &self.full)
            .field("almost_full", &self.almost_full)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::relay;

    /// A producer wired to relays whose far ends the test drives by hand.
    fn producer(cfg: FifoConfig) -> (Producer<u32>, RelaySender, RelayReceiver) {
        let storage = Arc::new(Storage::new(cfg.capacity() as usize));
        let (wtx, wrx) = relay(cfg.sync_stages);
        let (rtx, rrx) = relay(cfg.sync_stages);
        (Producer::new(storage, &cfg, wtx, rrx), rtx, wrx)
    }

    #[test]
    fn fills_to_capacity_then_rejects() {
        let (mut p, _read_tx, _write_rx) = producer(FifoConfig::new(2, 32));
        for i in 0..4 {
            assert!(!p.is_full());
            assert_eq!(p.try_push(i), Ok(()));
        }
        assert!(p.is_full());
        let before = p.pointer();
        assert_eq!(p.try_push(99), Err(Rejected::Full));
        assert_eq!(p.pointer(), before);
        assert_eq!(p.stats(), SideStats { accepted: 4, rejected: 1 });
    }

    #[test]
    fn full_clears_after_read_pointer_propagates() {
        let cfg = FifoConfig::new(1, 32);
        let space = cfg.pointer_space();
        let (mut p, read_tx, _write_rx) = producer(cfg);
        p.try_push(1).unwrap();
        p.try_push(2).unwrap();
        assert!(p.is_full());

        // consumer took one word
        read_tx.publish(space.pointer(1));
        p.tick();
        assert!(p.is_full(), "first stage only");
        p.tick();
        assert!(!p.is_full());
        assert_eq!(p.occupancy(), 1);
        assert_eq!(p.try_push(3), Ok(()));
        assert!(p.is_full());
    }

    #[test]
    fn publishes_every_accepted_push() {
        let (mut p, _read_tx, mut write_rx) = producer(FifoConfig::new(3, 32));
        p.try_push(7).unwrap();
        p.try_push(8).unwrap();
        write_rx.step();
        assert_eq!(write_rx.step().raw(), 2);
    }

    #[test]
    fn almost_full_tracks_watermark() {
        let (mut p, _read_tx, _write_rx) = producer(FifoConfig::new(3, 32).with_almost_full(3));
        p.try_push(0).unwrap();
        p.try_push(0).unwrap();
        assert!(!p.is_almost_full());
        p.try_push(0).unwrap();
        assert!(p.is_almost_full());
        assert!(!p.is_full());
    }

    #[test]
    fn words_are_truncated_to_width() {
        let cfg = FifoConfig::new(1, 4);
        let (mut p, _read_tx, _write_rx) = producer(cfg);
        p.try_push(0xAB).unwrap();
        assert_eq!(unsafe { p.storage.read(0) }, 0xB);
    }

    #[test]
    fn reset_returns_to_zero() {
        let (mut p, _read_tx, mut write_rx) = producer(FifoConfig::new(1, 32));
        p.try_push(1).unwrap();
        p.try_push(2).unwrap();
        unsafe { p.reset() };
        assert!(!p.is_full());
        assert_eq!(p.pointer(), Pointer::ZERO);
        write_rx.step();
        assert_eq!(write_rx.step(), Pointer::ZERO);
    }
}
