//! Dual-context asynchronous FIFO.
//!
//! Moves fixed-width words from a producer context to a consumer context that
//! run at unrelated rates, through a `2^k` slot circular buffer, with no lock
//! shared between the two sides.
//!
//! # Design
//! - **Pointers** carry one extra wrap bit so that FULL (same address, wrap
//!   bits differ) and EMPTY (pointers equal) are told apart.
//! - **Relays** carry each side's pointer to the other, Gray-coded, through a
//!   sequence-locked cell and a staged synchronizer. Snapshots may be stale
//!   by a bounded number of observer steps but are never torn.
//! - **Flags** are computed by each side from its own pointer and the stale
//!   snapshot of the other. Staleness only ever makes the queue look fuller
//!   to the producer and emptier to the consumer.
//!
//! # Thread Safety
//! - [`Producer`] and [`Consumer`] are `Send`; every operation takes
//!   `&mut self`, so each side is driven by one context at a time.
//! - `try_push` / `try_pop` never block and do bounded work.

mod config;
mod consumer;
mod error;
mod fifo;
mod pointer;
mod producer;
mod relay;
mod seqlock;
mod stats;
mod storage;
mod word;

pub use config::{DEFAULT_SYNC_STAGES, FifoConfig, MAX_ADDR_BITS, MAX_SYNC_STAGES};
pub use consumer::Consumer;
pub use error::{FifoError, Rejected};
pub use fifo::AsyncFifo;
pub use pointer::{GrayCode, Pointer, PointerSpace};
pub use producer::Producer;
pub use relay::{RelayReceiver, RelaySender, relay};
pub use stats::SideStats;
pub use word::Word;
