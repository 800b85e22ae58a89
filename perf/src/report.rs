use crate::{BenchResult, compute_stats};
use strait_perf_recorder::{NUM_STAGES, PerfRecorder, PerfStage};

pub const STAGE_NAMES: [&str; NUM_STAGES] = [
    "TryPush",
    "TryPop",
    "PushRejected",
    "PopRejected",
    "Transit",
];

pub const ALL_STAGES: [PerfStage; NUM_STAGES] = [
    PerfStage::TryPush,
    PerfStage::TryPop,
    PerfStage::PushRejected,
    PerfStage::PopRejected,
    PerfStage::Transit,
];

/// Stages a producer thread records.
pub const PRODUCER_STAGES: [PerfStage; 2] = [PerfStage::TryPush, PerfStage::PushRejected];

/// Stages a consumer thread records.
pub const CONSUMER_STAGES: [PerfStage; 2] = [PerfStage::TryPop, PerfStage::PopRejected];

/// Turns every non-empty stage of `recorder` into a `BenchResult`, prefixed
/// with `side` so producer and consumer rows stay apart in the JSON.
pub fn stage_results(side: &str, recorder: &PerfRecorder) -> Vec<BenchResult> {
    ALL_STAGES
        .iter()
        .filter_map(|&stage| {
            let mut samples = recorder.samples(stage).to_vec();
            if samples.is_empty() {
                return None;
            }
            Some(BenchResult {
                name: format!("{side}/{}", STAGE_NAMES[stage as usize]),
                unit: "ns".to_string(),
                stats: compute_stats(&mut samples),
            })
        })
        .collect()
}

/// Prints one row per stage plus the share of calls each stage accounts for.
pub fn print_stage_table(title: &str, recorder: &PerfRecorder, stages: &[PerfStage]) {
    println!("\n  {title}:\n");
    println!(
        "  {:<16} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10}  {:>6}",
        "Stage", "p50", "p90", "p99", "p99.9", "max", "count", "% calls"
    );
    println!("  {}", "\u{2500}".repeat(86));

    let calls: usize = stages.iter().map(|&s| recorder.count(s)).sum();

    for &stage in stages {
        let samples = recorder.samples(stage);
        if samples.is_empty() {
            continue;
        }
        let mut v = samples.to_vec();
        let stats = compute_stats(&mut v);
        let share = if calls > 0 {
            format!("{:.1}%", stats.count as f64 / calls as f64 * 100.0)
        } else {
            "-".to_string()
        };
        println!(
            "  {:<16} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10}  {:>6}",
            STAGE_NAMES[stage as usize],
            stats.p50,
            stats.p90,
            stats.p99,
            stats.p999,
            stats.max,
            stats.count,
            share
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_line_up_with_stage_discriminants() {
        for (i, &stage) in ALL_STAGES.iter().enumerate() {
            assert_eq!(stage as usize, i);
        }
        assert_eq!(STAGE_NAMES[PerfStage::Transit as usize], "Transit");
    }

    #[test]
    fn empty_stages_are_skipped() {
        let mut rec = PerfRecorder::new();
        rec.record(PerfStage::TryPop, 40);
        rec.record(PerfStage::TryPop, 60);
        let results = stage_results("consumer", &rec);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "consumer/TryPop");
        assert_eq!(results[0].stats.count, 2);
    }
}
