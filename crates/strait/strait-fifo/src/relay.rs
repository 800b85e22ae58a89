//! One-directional pointer relay between the two sides of a FIFO.
//!
//! The owning side publishes its pointer through a [`RelaySender`]; the
//! opposite side observes it through a [`RelayReceiver`]. In between sits a
//! staged synchronizer owned by the receiver:
//!
//! ```text
//!  owner context          │            observer context
//!                         │
//!  publish(p) ──► [ seqlock cell: gray(p) ] ──► stage[0] ──► stage[1] ──► observe()
//!                         │                 step()     step()
//! ```
//!
//! Every receiver [`step`](RelayReceiver::step) shifts the stages by one and
//! samples the cell into `stage[0]`. A value is observable only after it has
//! travelled through every stage, i.e. after `depth` observer steps, and each
//! stage only ever holds a complete value some publish produced.
//!
//! # Guarantees
//! - Observed values were published (never torn, never fabricated).
//! - Values are observed in publication order, possibly skipping some.
//! - Lag is bounded by the stage count, plus any samples lost to a write in
//!   progress, which requires the owner to be publishing at that moment.
//! - Reset puts the cell and every stage back to the zero pointer.

use crate::config::MAX_SYNC_STAGES;
use crate::pointer::{GrayCode, Pointer};
use crate::seqlock::SeqlockCell;
use crossbeam_utils::CachePadded;
use std::sync::Arc;

/// Creates a relay whose receiver has `depth` holding stages.
///
/// `depth` must be in `1..=MAX_SYNC_STAGES` (checked by `FifoConfig::validate`).
pub fn relay(depth: usize) -> (RelaySender, RelayReceiver) {
    let cell = Arc::new(CachePadded::new(SeqlockCell::new(
        Pointer::ZERO.to_gray().raw(),
    )));
    let tx = RelaySender {
        cell: Arc::clone(&cell),
    };
    let rx = RelayReceiver {
        cell,
        stages: [Pointer::ZERO; MAX_SYNC_STAGES],
        depth: depth.clamp(1, MAX_SYNC_STAGES),
    };
    (tx, rx)
}

/// Owner end of a relay.
pub struct RelaySender {
    cell: Arc<CachePadded<SeqlockCell>>,
}

impl RelaySender {
    /// Makes `p` available to the receiver. Anything the owner wrote before
    /// this call is visible to the observer once it observes `p`.
    #[inline(always)]
    pub fn publish(&self, p: Pointer) {
        self.cell.write(p.to_gray().raw());
    }
}

/// Observer end of a relay: the synchronizer stages.
pub struct RelayReceiver {
    cell: Arc<CachePadded<SeqlockCell>>,
    stages: [Pointer; MAX_SYNC_STAGES],
    depth: usize,
}

impl RelayReceiver {
    /// Advances the synchronizer by one observer step and returns the new
    /// snapshot.
    #[inline(always)]
    pub fn step(&mut self) -> Pointer {
        let last = self.depth - 1;
        self.stages.copy_within(0..last, 1);
        if let Some(raw) = self.cell.try_read() {
            self.stages[0] = GrayCode::from_raw(raw).to_pointer();
        }
        self.stages[last]
    }

    /// The current snapshot: the last stage, without stepping.
    #[inline(always)]
    pub fn observe(&self) -> Pointer {
        self.stages[self.depth - 1]
    }

    /// Clears every stage to the zero pointer.
    pub fn reset(&mut self) {
        self.stages = [Pointer::ZERO; MAX_SYNC_STAGES];
    }

    /// True if `tx` feeds this receiver.
    pub fn is_fed_by(&self, tx: &RelaySender) -> bool {
        Arc::ptr_eq(&self.cell, &tx.cell)
    }
}
