/// Outcome counters for one side of a FIFO.
///
/// Counted since construction; `reset` does not clear them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideStats {
    /// Calls that moved a word.
    pub accepted: u64,
    /// Calls turned away by FULL (producer) or EMPTY (consumer).
    pub rejected: u64,
}
