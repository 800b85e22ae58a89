//! Per-stage latency samples for the FIFO hot paths.
//!
//! Without the `record` feature `PerfRecorder` is a unit struct and every
//! call compiles away. With it, each stage owns a pre-sized sample buffer
//! filled from `CLOCK_MONOTONIC`. A recorder is owned by one thread; the
//! producer and consumer sides each keep their own.

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerfStage {
    /// Accepted `try_push`, relay step included.
    TryPush = 0,
    /// Accepted `try_pop`, relay step included.
    TryPop = 1,
    /// `try_push` that came back `Full`.
    PushRejected = 2,
    /// `try_pop` that came back `Empty`.
    PopRejected = 3,
    /// From a push until the same word is popped.
    Transit = 4,
}

pub const NUM_STAGES: usize = 5;
pub const MAX_SAMPLES: usize = 131_072; // per stage

#[cfg(feature = "record")]
mod inner {
    use super::*;

    #[inline(always)]
    pub fn now_ns() -> u64 {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // CLOCK_MONOTONIC cannot fail with a valid pointer
        unsafe {
            libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
        }
        ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
    }

    pub struct PerfRecorder {
        samples: [Vec<u64>; NUM_STAGES],
        started: [u64; NUM_STAGES],
    }

    impl PerfRecorder {
        pub fn new() -> Self {
            Self {
                samples: std::array::from_fn(|_| Vec::with_capacity(MAX_SAMPLES)),
                started: [0; NUM_STAGES],
            }
        }

        #[inline(always)]
        pub fn begin(&mut self, stage: PerfStage) {
            self.started[stage as usize] = now_ns();
        }

        #[inline(always)]
        pub fn end(&mut self, stage: PerfStage) {
            let elapsed = now_ns().saturating_sub(self.started[stage as usize]);
            self.record(stage, elapsed);
        }

        /// Files an externally timed sample. Samples past `MAX_SAMPLES` are dropped.
        #[inline(always)]
        pub fn record(&mut self, stage: PerfStage, duration_ns: u64) {
            let buf = &mut self.samples[stage as usize];
            if buf.len() < MAX_SAMPLES {
                buf.push(duration_ns);
            }
        }

        pub fn samples(&self, stage: PerfStage) -> &[u64] {
            &self.samples[stage as usize]
        }

        pub fn count(&self, stage: PerfStage) -> usize {
            self.samples[stage as usize].len()
        }

        pub fn reset(&mut self) {
            for buf in self.samples.iter_mut() {
                buf.clear();
            }
        }
    }

    impl Default for PerfRecorder {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(not(feature = "record"))]
mod inner {
    use super::*;

    #[inline(always)]
    pub fn now_ns() -> u64 {
        0
    }

    #[derive(Default)]
    pub struct PerfRecorder;

    impl PerfRecorder {
        #[inline(always)]
        pub fn new() -> Self {
            Self
        }
        #[inline(always)]
        pub fn begin(&mut self, _stage: PerfStage) {}
        #[inline(always)]
        pub fn end(&mut self, _stage: PerfStage) {}
        #[inline(always)]
        pub fn record(&mut self, _stage: PerfStage, _duration_ns: u64) {}
        #[inline(always)]
        pub fn samples(&self, _stage: PerfStage) -> &[u64] {
            &[]
        }
        #[inline(always)]
        pub fn count(&self, _stage: PerfStage) -> usize {
            0
        }
        #[inline(always)]
        pub fn reset(&mut self) {}
    }
}

pub use inner::{PerfRecorder, now_ns};

#[cfg(all(test, feature = "record"))]
mod tests {
    use super::*;

    #[test]
    fn stages_are_kept_apart() {
        let mut rec = PerfRecorder::new();
        rec.record(PerfStage::TryPush, 10);
        rec.record(PerfStage::TryPush, 20);
        rec.record(PerfStage::PopRejected, 5);
        assert_eq!(rec.samples(PerfStage::TryPush), &[10, 20]);
        assert_eq!(rec.count(PerfStage::PopRejected), 1);
        assert_eq!(rec.count(PerfStage::Transit), 0);

        rec.reset();
        assert_eq!(rec.count(PerfStage::TryPush), 0);
    }

    #[test]
    fn begin_end_pairs_measure_forward() {
        let mut rec = PerfRecorder::new();
        rec.begin(PerfStage::Transit);
        std::thread::sleep(std::time::Duration::from_millis(1));
        rec.end(PerfStage::Transit);
        assert!(rec.samples(PerfStage::Transit)[0] >= 1_000_000);
    }

    #[test]
    fn buffer_is_bounded() {
        let mut rec = PerfRecorder::new();
        for i in 0..(MAX_SAMPLES as u64 + 10) {
            rec.record(PerfStage::TryPop, i);
        }
        assert_eq!(rec.count(PerfStage::TryPop), MAX_SAMPLES);
    }
}
