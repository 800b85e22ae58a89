//! Sequence-locked word cell for one writer and one sampler.
//!
//! The writer bumps the sequence counter to odd, stores the payload, then
//! bumps it to even. A sampler that sees the same even sequence before and
//! after copying the payload holds a value the writer actually stored.
//!
//! # Protocol
//!
//! **Writer:**
//! 1. Store `seq + 1` (odd, write in progress)
//! 2. Store payload
//! 3. Store `seq + 2` (even, stable)
//!
//! **Sampler:**
//! 1. Load seq; if odd, the sample is contended
//! 2. Copy payload
//! 3. Load seq again; if changed, the sample is contended
//!
//! Unlike a blocking seqlock reader, [`SeqlockCell::try_read`] never spins
//! waiting for the writer. It gives up after a bounded number of attempts
//! and lets the caller keep its previous value.

use std::sync::atomic::{AtomicU64, Ordering, fence};

/// Attempts `try_read` makes before reporting contention.
pub const SAMPLE_RETRIES: usize = 4;

/// A 64-bit payload guarded by a sequence counter.
///
/// # Sequence Number Semantics
///
/// - **Even**: payload is stable
/// - **Odd**: write in progress
///
/// The payload is an atomic so that a racing copy is never a data race; the
/// sequence counter is what makes the copy meaningful.
#[derive(Debug, Default)]
pub struct SeqlockCell {
    seq: AtomicU64,
    data: AtomicU64,
}

impl SeqlockCell {
    pub fn new(value: u64) -> Self {
        Self {
            seq: AtomicU64::new(0),
            data: AtomicU64::new(value),
        }
    }

    /// Stores `value`. Single writer only.
    ///
    /// Everything the writer did before this call (in particular the storage
    /// write a pointer publication covers) happens-before any sampler that
    /// reads the new value.
    #[inline(always)]
    pub fn write(&self, value: u64) {
        let s0 = self.seq.load(Ordering::Relaxed);
        self.seq.store(s0.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        self.data.store(value, Ordering::Relaxed);
        self.seq.store(s0.wrapping_add(2), Ordering::Release);
    }

    /// Takes one consistent sample, or `None` if every attempt overlapped a
    /// write.
    #[inline(always)]
    pub fn try_read(&self) -> Option<u64> {
        for _ in 0..SAMPLE_RETRIES {
            let s1 = self.seq.load(Ordering::Acquire);
            if s1 & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }

            let v = self.data.load(Ordering::Relaxed);

            fence(Ordering::Acquire);
            let s2 = self.seq.load(Ordering::Relaxed);
            if s1 == s2 {
                return Some(v);
            }

            std::hint::spin_loop();
        }
        None
    }
}
