//! Error types for construction and backpressure.

/// Errors raised while building or recombining a FIFO.
///
/// Neither variant can occur once a queue is running: a queue that was
/// built successfully never fails mid-life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FifoError {
    /// The configuration cannot describe a power-of-two FIFO.
    #[error("invalid fifo configuration: {0}")]
    InvalidConfig(&'static str),

    /// `reunite` was handed a producer and a consumer from different queues.
    #[error("producer and consumer belong to different fifos")]
    Mismatched,
}

/// Backpressure outcome of a `try_push` / `try_pop`.
///
/// Rejection is expected and recoverable: the caller retries later or
/// applies its own backoff. A rejected call never touches storage and never
/// moves the side's own pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Rejected {
    /// The producer's view of the queue holds `capacity` words.
    #[error("fifo is full")]
    Full,

    /// The consumer's view of the queue holds no words.
    #[error("fifo is empty")]
    Empty,
}
