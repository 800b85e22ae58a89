use crossbeam_utils::Backoff;
use std::hint::black_box;
use std::thread;
use std::time::Instant;

use strait_fifo::{AsyncFifo, FifoConfig, MAX_SYNC_STAGES, Rejected};
use strait_perf::report::{CONSUMER_STAGES, PRODUCER_STAGES, print_stage_table, stage_results};
use strait_perf::*;
use strait_perf_recorder::{PerfRecorder, PerfStage};

const TRANSFER_WORDS: u64 = 2_000_000;
const TRANSIT_ROUNDS: usize = 50_000;

/// Outcome of the two-thread section.
#[derive(Default)]
struct TransferDiag {
    words: u64,
    elapsed_ns: u64,
    push_rejected: u64,
    pop_rejected: u64,
}

fn main() {
    let rusage_start = capture_rusage();
    let mut results: Vec<BenchResult> = Vec::new();

    print_banner();
    section_single_context(&mut results);
    section_transit(&mut results);
    let diag = section_transfer(&mut results);

    let rusage_end = capture_rusage();
    section_resources(&rusage_start, &rusage_end);

    save_results(&results, &diag, &rusage_start, &rusage_end);
}

fn print_banner() {
    let bar = "\u{2550}".repeat(90);
    println!("\n{bar}");
    println!("  STRAIT PERFORMANCE REPORT");
    println!("  single-context latency + transit + cross-thread transfer");
    println!("{bar}\n");

    let ncpu = thread::available_parallelism().map(|n| n.get()).unwrap_or(0);
    let os = run_cmd("uname", &["-srm"]).unwrap_or_else(|| "unknown".into());
    let date = run_cmd("date", &["+%Y-%m-%d %H:%M:%S"]).unwrap_or_default();
    println!("  Cores:   {ncpu}");
    println!("  OS:      {}", os.trim());
    println!("  Date:    {}", date.trim());
}

fn fifo(addr_bits: u32, stages: usize) -> AsyncFifo<u64> {
    match AsyncFifo::new(FifoConfig::new(addr_bits, 64).with_sync_stages(stages)) {
        Ok(f) => f,
        Err(e) => panic!("bad benchmark config k={addr_bits} stages={stages}: {e}"),
    }
}

fn section_single_context(results: &mut Vec<BenchResult>) {
    section_header("SINGLE-CONTEXT OPERATIONS (ns/op, batched)");
    print_table_header();

    for addr_bits in [4u32, 10] {
        let mut q = fifo(addr_bits, 2);
        for i in 0..q.capacity() / 2 {
            let _ = q.try_push(i);
        }
        q.settle();
        let r = measure_batched(
            &format!("push_pop (cap {})", q.capacity()),
            1_000,
            1_000,
            10,
            || {
                let _ = q.try_push(black_box(1));
                let _ = black_box(q.try_pop());
            },
        );
        print_result_row(&r);
        results.push(r);
    }

    let mut full = fifo(4, 2);
    while full.try_push(0).is_ok() {}
    let r = measure_batched("try_push (full)", 1_000, 1_000, 10, || {
        let _ = black_box(full.try_push(black_box(1)));
    });
    print_result_row(&r);
    results.push(r);

    let mut empty = fifo(4, 2);
    let r = measure_batched("try_pop (empty)", 1_000, 1_000, 10, || {
        let _ = black_box(empty.try_pop());
    });
    print_result_row(&r);
    results.push(r);

    let r = measure_batched("tick", 1_000, 1_000, 10, || empty.tick());
    print_result_row(&r);
    results.push(r);

    let mut deep = fifo(4, MAX_SYNC_STAGES);
    let r = measure_batched("settle (4 stages)", 1_000, 100, 10, || deep.settle());
    print_result_row(&r);
    results.push(r);
}

/// Time from a push until the same word comes out, stepping only the
/// consumer, for every synchronizer depth.
fn section_transit(results: &mut Vec<BenchResult>) {
    section_header("TRANSIT BY SYNCHRONIZER DEPTH (ns)");
    print_table_header();

    for stages in 1..=MAX_SYNC_STAGES {
        let mut q = fifo(4, stages);
        let mut rec = PerfRecorder::new();
        for i in 0..TRANSIT_ROUNDS as u64 {
            let t0 = mono_now_ns();
            if q.try_push(i).is_err() {
                q.settle();
                continue;
            }
            loop {
                match q.try_pop() {
                    Ok(v) => {
                        debug_assert_eq!(v, i);
                        break;
                    }
                    Err(Rejected::Empty) => continue,
                    Err(other) => panic!("unexpected rejection {other:?}"),
                }
            }
            rec.record(PerfStage::Transit, mono_now_ns().saturating_sub(t0));
        }
        for mut r in stage_results(&format!("depth_{stages}"), &rec) {
            r.name = format!("transit (depth {stages})");
            print_result_row(&r);
            results.push(r);
        }
    }
}

fn section_transfer(results: &mut Vec<BenchResult>) -> TransferDiag {
    section_header("CROSS-THREAD TRANSFER");

    let (mut producer, mut consumer) = fifo(6, 2).split();
    let start = mono_now_ns();

    let writer = thread::spawn(move || {
        let mut rec = PerfRecorder::new();
        let backoff = Backoff::new();
        for i in 0..TRANSFER_WORDS {
            loop {
                let t0 = mono_now_ns();
                let outcome = producer.try_push(i);
                let dt = mono_now_ns().saturating_sub(t0);
                match outcome {
                    Ok(()) => {
                        rec.record(PerfStage::TryPush, dt);
                        backoff.reset();
                        break;
                    }
                    Err(_) => {
                        rec.record(PerfStage::PushRejected, dt);
                        backoff.snooze();
                    }
                }
            }
        }
        (rec, producer.stats())
    });

    let reader = thread::spawn(move || {
        let mut rec = PerfRecorder::new();
        let backoff = Backoff::new();
        let mut expected = 0u64;
        while expected < TRANSFER_WORDS {
            let t0 = mono_now_ns();
            let outcome = consumer.try_pop();
            let dt = mono_now_ns().saturating_sub(t0);
            match outcome {
                Ok(v) => {
                    rec.record(PerfStage::TryPop, dt);
                    backoff.reset();
                    assert_eq!(v, expected, "transfer corrupted");
                    expected += 1;
                }
                Err(_) => {
                    rec.record(PerfStage::PopRejected, dt);
                    backoff.snooze();
                }
            }
        }
        (rec, consumer.stats())
    });

    let (push_rec, push_stats) = match writer.join() {
        Ok(r) => r,
        Err(_) => panic!("producer thread panicked"),
    };
    let (pop_rec, pop_stats) = match reader.join() {
        Ok(r) => r,
        Err(_) => panic!("consumer thread panicked"),
    };
    let elapsed_ns = mono_now_ns().saturating_sub(start);

    println!(
        "  {} words in {:.2}s ({:.1} M/s) | push rejects {} | pop rejects {}",
        format_count(TRANSFER_WORDS),
        elapsed_ns as f64 / 1e9,
        TRANSFER_WORDS as f64 / (elapsed_ns as f64 / 1e9) / 1e6,
        format_count(push_stats.rejected),
        format_count(pop_stats.rejected),
    );
    println!(
        "  mean cost per word: {}",
        format_ns(elapsed_ns as f64 / TRANSFER_WORDS as f64)
    );
    print_stage_table("Producer", &push_rec, &PRODUCER_STAGES);
    print_stage_table("Consumer", &pop_rec, &CONSUMER_STAGES);

    results.extend(stage_results("producer", &push_rec));
    results.extend(stage_results("consumer", &pop_rec));

    TransferDiag {
        words: TRANSFER_WORDS,
        elapsed_ns,
        push_rejected: push_stats.rejected,
        pop_rejected: pop_stats.rejected,
    }
}

fn section_resources(start: &ResourceSnapshot, end: &ResourceSnapshot) {
    section_header("RESOURCE USAGE");
    println!(
        "  Peak RSS:                    {:.1} MB",
        end.max_rss_bytes as f64 / (1024.0 * 1024.0)
    );
    println!(
        "  Voluntary ctx switches:      {}",
        end.vol_ctx_switches.saturating_sub(start.vol_ctx_switches)
    );
    println!(
        "  Involuntary ctx switches:    {}",
        end.invol_ctx_switches.saturating_sub(start.invol_ctx_switches)
    );
    println!(
        "  User CPU time:               {:.3}s",
        end.user_time_us.saturating_sub(start.user_time_us) as f64 / 1e6
    );
    println!(
        "  System CPU time:             {:.3}s",
        end.sys_time_us.saturating_sub(start.sys_time_us) as f64 / 1e6
    );
}

fn save_results(
    results: &[BenchResult],
    diag: &TransferDiag,
    rusage_start: &ResourceSnapshot,
    rusage_end: &ResourceSnapshot,
) {
    let timestamp = run_cmd("date", &["+%Y%m%d_%H%M%S"])
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".into());

    let results_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/results");
    let _ = std::fs::create_dir_all(results_dir);
    let json_path = format!("{results_dir}/perf_report.json");

    let output = serde_json::json!({
        "timestamp": timestamp,
        "benchmarks": results,
        "transfer": {
            "words": diag.words,
            "elapsed_ns": diag.elapsed_ns,
            "push_rejected": diag.push_rejected,
            "pop_rejected": diag.pop_rejected,
        },
        "resources": {
            "start": rusage_start,
            "end": rusage_end,
        },
    });

    let bar = "\u{2550}".repeat(90);
    let written = serde_json::to_string_pretty(&output)
        .map_err(std::io::Error::other)
        .and_then(|body| std::fs::write(&json_path, body));
    match written {
        Ok(()) => {
            println!("\n{bar}");
            println!("  Results saved to: {json_path}");
            println!("{bar}\n");
        }
        Err(e) => eprintln!("\n  [failed to save results: {e}]\n"),
    }
}

fn run_cmd(cmd: &str, args: &[&str]) -> Option<String> {
    std::process::Command::new(cmd)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
}
