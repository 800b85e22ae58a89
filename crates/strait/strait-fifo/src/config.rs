//! FIFO geometry and construction-time parameters.
//!
//! Everything here is fixed for the life of a queue:
//! - capacity `C = 2^addr_bits` slots
//! - word width `word_bits` (W)
//! - synchronizer depth: how many observer steps a published pointer spends
//!   in a relay before the other side can see it
//! - optional almost-full / almost-empty watermarks

use crate::error::FifoError;
use crate::pointer::PointerSpace;
use crate::word::Word;

/// Largest supported `k`. Keeps storage addressable and pointers well
/// inside a `u64`.
pub const MAX_ADDR_BITS: u32 = 32;

/// Relay stage count of a classic double-latch synchronizer.
pub const DEFAULT_SYNC_STAGES: usize = 2;

/// Deepest synchronizer a relay can be built with.
pub const MAX_SYNC_STAGES: usize = 4;

/// Construction parameters for an [`AsyncFifo`](crate::AsyncFifo).
///
/// # Example
/// ```
/// use strait_fifo::FifoConfig;
/// let cfg = FifoConfig::new(3, 16).with_almost_full(6);
/// assert_eq!(cfg.capacity(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoConfig {
    /// `k`: number of address bits. Capacity is `2^k`.
    pub addr_bits: u32,
    /// `W`: width of the data words in bits.
    pub word_bits: u32,
    /// Holding stages in each pointer relay.
    pub sync_stages: usize,
    /// Producer raises `almost_full` once it sees at least this many words buffered.
    pub almost_full: Option<u64>,
    /// Consumer raises `almost_empty` once it sees at most this many words buffered.
    pub almost_empty: Option<u64>,
}

impl FifoConfig {
    /// A queue of `2^addr_bits` words of `word_bits` bits with a two-stage
    /// synchronizer and no watermarks. Validation happens at construction.
    pub fn new(addr_bits: u32, word_bits: u32) -> Self {
        Self {
            addr_bits,
            word_bits,
            sync_stages: DEFAULT_SYNC_STAGES,
            almost_full: None,
            almost_empty: None,
        }
    }

    pub fn with_sync_stages(mut self, stages: usize) -> Self {
        self.sync_stages = stages;
        self
    }

    pub fn with_almost_full(mut self, level: u64) -> Self {
        self.almost_full = Some(level);
        self
    }

    pub fn with_almost_empty(mut self, level: u64) -> Self {
        self.almost_empty = Some(level);
        self
    }

    /// Number of slots, `2^addr_bits`. Only meaningful once validated.
    #[inline(always)]
    pub fn capacity(&self) -> u64 {
        1u64 << self.addr_bits.min(MAX_ADDR_BITS)
    }

    /// Checks the configuration against the carrier word type `T`.
    ///
    /// # Errors
    /// [`FifoError::InvalidConfig`] when:
    /// - `addr_bits` is 0 (capacity must be a power of two of at least 2)
    /// - `addr_bits` exceeds [`MAX_ADDR_BITS`]
    /// - `2^addr_bits` slots do not fit in a `usize`
    /// - `word_bits` is 0 or wider than `T`
    /// - `sync_stages` is outside `1..=MAX_SYNC_STAGES`
    /// - a watermark lies beyond the capacity
    pub fn validate<T: Word>(&self) -> Result<(), FifoError> {
        if self.addr_bits < 1 {
            return Err(FifoError::InvalidConfig("capacity must be 2^k with k >= 1"));
        }
        if self.addr_bits > MAX_ADDR_BITS {
            return Err(FifoError::InvalidConfig("address width exceeds 32 bits"));
        }
        if self.slot_count().is_none() {
            return Err(FifoError::InvalidConfig("capacity not addressable on this target"));
        }
        if self.word_bits == 0 {
            return Err(FifoError::InvalidConfig("word width must be at least 1 bit"));
        }
        if self.word_bits > T::BITS {
            return Err(FifoError::InvalidConfig("word width exceeds the carrier type"));
        }
        if self.sync_stages == 0 || self.sync_stages > MAX_SYNC_STAGES {
            return Err(FifoError::InvalidConfig("sync stages must be in 1..=4"));
        }
        if self.almost_full.is_some_and(|l| l > self.capacity()) {
            return Err(FifoError::InvalidConfig("almost-full level exceeds capacity"));
        }
        if self.almost_empty.is_some_and(|l| l > self.capacity()) {
            return Err(FifoError::InvalidConfig("almost-empty level exceeds capacity"));
        }
        Ok(())
    }

    /// Capacity as a slot count, or `None` if `usize` cannot hold it.
    pub fn slot_count(&self) -> Option<usize> {
        usize::try_from(self.capacity()).ok()
    }

    /// Pointer arithmetic for this geometry. Only meaningful once validated.
    #[inline(always)]
    pub fn pointer_space(&self) -> PointerSpace {
        PointerSpace::new(self.addr_bits.min(MAX_ADDR_BITS))
    }

    /// Almost-full threshold with the default of "full".
    pub(crate) fn almost_full_level(&self) -> u64 {
        self.almost_full.unwrap_or(self.capacity())
    }

    /// Almost-empty threshold with the default of "empty".
    pub(crate) fn almost_empty_level(&self) -> u64 {
        self.almost_empty.unwrap_or(0)
    }
}
