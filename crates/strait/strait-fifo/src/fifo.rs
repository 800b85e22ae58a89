//! The queue facade: storage, two pointer units and two relays in one value.
//!
//! # Design
//! - **Unsplit**: an [`AsyncFifo`] drives both sides from one context. Handy
//!   for cooperative scheduling and for tests that step each side explicitly.
//! - **Split**: [`AsyncFifo::split`] hands the [`Producer`] and [`Consumer`]
//!   to two independent contexts (threads, tasks). Neither ever blocks the
//!   other.
//!
//! # Reset
//! Reset must hit both sides together. Only the unsplit facade can reset,
//! so split halves are first brought back with [`AsyncFifo::reunite`].

use crate::config::FifoConfig;
use crate::consumer::Consumer;
use crate::error::{FifoError, Rejected};
use crate::producer::Producer;
use crate::relay::relay;
use crate::storage::Storage;
use crate::word::Word;
use std::sync::Arc;

/// A dual-context FIFO of `2^k` words of `W` bits.
///
/// # Example
/// ```
/// use strait_fifo::{AsyncFifo, FifoConfig, Rejected};
///
/// let mut fifo = AsyncFifo::<u32>::new(FifoConfig::new(2, 32)).unwrap();
/// fifo.try_push(10).unwrap();
/// fifo.try_push(11).unwrap();
///
/// // the write pointer needs two consumer steps to cross the relay
/// fifo.settle();
/// assert_eq!(fifo.try_pop(), Ok(10));
/// assert_eq!(fifo.try_pop(), Ok(11));
/// assert_eq!(fifo.try_pop(), Err(Rejected::Empty));
/// ```
#[derive(Debug)]
pub struct AsyncFifo<T: Word> {
    producer: Producer<T>,
    consumer: Consumer<T>,
    cfg: FifoConfig,
}

impl<T: Word> AsyncFifo<T> {
    /// Builds an empty queue.
    ///
    /// # Errors
    /// [`FifoError::InvalidConfig`] if `cfg` does not validate against `T`
    /// (see [`FifoConfig::validate`]).
    pub fn new(cfg: FifoConfig) -> Result<Self, FifoError> {
        cfg.validate::<T>()?;
        let slots = cfg
            .slot_count()
            .ok_or(FifoError::InvalidConfig("capacity not addressable on this target"))?;

        let storage = Arc::new(Storage::new(slots));
        let (write_tx, write_rx) = relay(cfg.sync_stages);
        let (read_tx, read_rx) = relay(cfg.sync_stages);

        let producer = Producer::new(Arc::clone(&storage), &cfg, write_tx, read_rx);
        let consumer = Consumer::new(storage, &cfg, read_tx, write_rx);

        tracing::debug!(
            capacity = cfg.capacity(),
            word_bits = cfg.word_bits,
            sync_stages = cfg.sync_stages,
            "fifo created"
        );

        Ok(Self {
            producer,
            consumer,
            cfg,
        })
    }

    /// Separates the two sides so they can run in different contexts.
    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        tracing::debug!(capacity = self.cfg.capacity(), "fifo split");
        (self.producer, self.consumer)
    }

    /// Puts the two halves of one queue back together.
    ///
    /// # Errors
    /// [`FifoError::Mismatched`] if they come from different queues.
    pub fn reunite(producer: Producer<T>, consumer: Consumer<T>) -> Result<Self, FifoError> {
        let same_storage = Arc::ptr_eq(&producer.storage, &consumer.storage);
        let same_relays =
            consumer.rx.is_fed_by(&producer.tx) && producer.rx.is_fed_by(&consumer.tx);
        if !(same_storage && same_relays) {
            return Err(FifoError::Mismatched);
        }

        let cfg = *producer.config();
        tracing::debug!(capacity = cfg.capacity(), "fifo reunited");
        Ok(Self {
            producer,
            consumer,
            cfg,
        })
    }

    /// Producer surface: see [`Producer::try_push`].
    #[inline]
    pub fn try_push(&mut self, word: T) -> Result<(), Rejected> {
        self.producer.try_push(word)
    }

    /// Consumer surface: see [`Consumer::try_pop`].
    #[inline]
    pub fn try_pop(&mut self) -> Result<T, Rejected> {
        self.consumer.try_pop()
    }

    /// One idle step on each side.
    pub fn tick(&mut self) {
        self.producer.tick();
        self.consumer.tick();
    }

    /// Steps both sides until each relay has carried the other side's latest
    /// pointer all the way through. Afterwards the flags are exact.
    pub fn settle(&mut self) {
        for _ in 0..self.cfg.sync_stages {
            self.tick();
        }
    }

    /// Empties the queue: both pointers, both relays and all flags go back to
    /// their construction state. Storage contents are left as they are and
    /// are unreachable until overwritten.
    pub fn reset(&mut self) {
        // SAFETY: both halves are borrowed mutably here, so both reset before
        // either can run again.
        unsafe {
            self.producer.reset();
            self.consumer.reset();
        }
        tracing::debug!(capacity = self.cfg.capacity(), "fifo reset");
    }

    /// FULL as last recomputed by the producer.
    pub fn is_full(&self) -> bool {
        self.producer.is_full()
    }

    /// EMPTY as last recomputed by the consumer.
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    pub fn capacity(&self) -> u64 {
        self.cfg.capacity()
    }

    pub fn config(&self) -> &FifoConfig {
        &self.cfg
    }

    pub fn producer(&self) -> &Producer<T> {
        &self.producer
    }

    pub fn consumer(&self) -> &Consumer<T> {
        &self.consumer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let err = AsyncFifo::<u32>::new(FifoConfig::new(0, 32)).unwrap_err();
        assert!(matches!(err, FifoError::InvalidConfig(_)));
    }

    #[test]
    fn reset_empties_a_full_queue() {
        let mut fifo = AsyncFifo::<u8>::new(FifoConfig::new(1, 8)).unwrap();
        fifo.try_push(1).unwrap();
        fifo.try_push(2).unwrap();
        assert!(fifo.is_full());
        fifo.settle();
        assert!(!fifo.is_empty());

        fifo.reset();
        assert!(fifo.is_empty());
        assert!(!fifo.is_full());
        fifo.settle();
        assert!(fifo.is_empty());
        assert_eq!(fifo.try_pop(), Err(Rejected::Empty));

        fifo.try_push(3).unwrap();
        fifo.settle();
        assert_eq!(fifo.try_pop(), Ok(3));
    }

    #[test]
    fn split_halves_reunite() {
        let fifo = AsyncFifo::<u16>::new(FifoConfig::new(2, 16).with_sync_stages(3)).unwrap();
        let (mut tx, rx) = fifo.split();
        tx.try_push(5).unwrap();

        let mut fifo = AsyncFifo::reunite(tx, rx).unwrap();
        assert_eq!(fifo.config().sync_stages, 3);
        fifo.settle();
        assert_eq!(fifo.try_pop(), Ok(5));
    }

    #[test]
    fn halves_of_different_queues_do_not_reunite() {
        let (tx_a, _rx_a) = AsyncFifo::<u16>::new(FifoConfig::new(2, 16)).unwrap().split();
        let (_tx_b, rx_b) = AsyncFifo::<u16>::new(FifoConfig::new(2, 16)).unwrap().split();
        let err = AsyncFifo::reunite(tx_a, rx_b).unwrap_err();
        assert_eq!(err, FifoError::Mismatched);
    }

    #[test]
    fn halves_are_send() {
        fn assert_send<S: Send>() {}
        assert_send::<Producer<u64>>();
        assert_send::<Consumer<u64>>();
    }
}
