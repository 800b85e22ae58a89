use anyhow::{Context, Result, bail};
use crossbeam_utils::Backoff;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use strait_config::SoakConfig;
use strait_fifo::{AsyncFifo, FifoConfig, MAX_SYNC_STAGES, SideStats};
use strait_perf_recorder::{PerfRecorder, PerfStage, now_ns};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// A side that makes no progress for this long is reported as stuck.
const STALL_LIMIT: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "soak.toml".to_string());
    let cfg = SoakConfig::load(&path).with_context(|| format!("loading {path}"))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))
        .context("invalid log_level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut fifo_cfg = FifoConfig::new(cfg.fifo.addr_bits, cfg.fifo.word_bits)
        .with_sync_stages(cfg.fifo.sync_stages);
    if let Some(level) = cfg.fifo.almost_full {
        fifo_cfg = fifo_cfg.with_almost_full(level);
    }
    if let Some(level) = cfg.fifo.almost_empty {
        fifo_cfg = fifo_cfg.with_almost_empty(level);
    }
    let fifo = AsyncFifo::<u64>::new(fifo_cfg).context("invalid [fifo] settings")?;

    info!(
        capacity = fifo.capacity(),
        word_bits = fifo_cfg.word_bits,
        sync_stages = fifo_cfg.sync_stages,
        items = cfg.run.items,
        "soak starting"
    );

    let run = cfg.run.clone();
    let mask = word_mask(fifo_cfg.word_bits);
    let abort = Arc::new(AtomicBool::new(false));
    let (mut producer, mut consumer) = fifo.split();
    let start = Instant::now();

    let writer = {
        let abort = Arc::clone(&abort);
        let run = run.clone();
        thread::spawn(move || -> Result<(PerfRecorder, SideStats)> {
            let mut rec = PerfRecorder::new();
            let backoff = Backoff::new();
            let pause = Duration::from_micros(run.pause_us);
            let mut last_progress = Instant::now();
            for i in 0..run.items {
                loop {
                    let t0 = now_ns();
                    match producer.try_push(i) {
                        Ok(()) => {
                            rec.record(PerfStage::TryPush, now_ns().saturating_sub(t0));
                            backoff.reset();
                            break;
                        }
                        Err(_) => {
                            rec.record(PerfStage::PushRejected, now_ns().saturating_sub(t0));
                            if abort.load(Ordering::Relaxed) {
                                bail!("producer stopped at word {i}: consumer gave up");
                            }
                            if last_progress.elapsed() > STALL_LIMIT {
                                abort.store(true, Ordering::Relaxed);
                                bail!("producer stalled at word {i}");
                            }
                            backoff.snooze();
                        }
                    }
                }
                last_progress = Instant::now();
                if run.producer_pause_every > 0 && (i + 1) % run.producer_pause_every == 0 {
                    thread::sleep(pause);
                }
            }
            Ok((rec, producer.stats()))
        })
    };

    let reader = {
        let abort = Arc::clone(&abort);
        thread::spawn(move || -> Result<(PerfRecorder, SideStats)> {
            let mut rec = PerfRecorder::new();
            let backoff = Backoff::new();
            let pause = Duration::from_micros(run.pause_us);
            let mut last_progress = Instant::now();
            let mut next = 0u64;
            while next < run.items {
                let t0 = now_ns();
                match consumer.try_pop() {
                    Ok(word) => {
                        rec.record(PerfStage::TryPop, now_ns().saturating_sub(t0));
                        backoff.reset();
                        let expected = next & mask;
                        if word != expected {
                            abort.store(true, Ordering::Relaxed);
                            bail!("word {next}: expected {expected:#x}, popped {word:#x}");
                        }
                        next += 1;
                        last_progress = Instant::now();
                        if run.report_every > 0 && next % run.report_every == 0 {
                            info!(
                                popped = next,
                                occupancy = consumer.occupancy(),
                                almost_empty = consumer.is_almost_empty(),
                                "progress"
                            );
                        }
                        if run.consumer_pause_every > 0 && next % run.consumer_pause_every == 0 {
                            thread::sleep(pause);
                        }
                    }
                    Err(_) => {
                        rec.record(PerfStage::PopRejected, now_ns().saturating_sub(t0));
                        if abort.load(Ordering::Relaxed) {
                            bail!("consumer stopped at word {next}: producer gave up");
                        }
                        if last_progress.elapsed() > STALL_LIMIT {
                            abort.store(true, Ordering::Relaxed);
                            bail!("consumer stalled at word {next}");
                        }
                        backoff.snooze();
                    }
                }
            }

            // a few more steps must not surface anything past the last word
            for _ in 0..MAX_SYNC_STAGES * 2 {
                if let Ok(word) = consumer.try_pop() {
                    bail!("spurious word {word:#x} after the last item");
                }
            }
            if !consumer.is_empty() {
                warn!("queue did not settle to empty");
            }
            Ok((rec, consumer.stats()))
        })
    };

    let push = writer
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))?;
    let pop = reader
        .join()
        .map_err(|_| anyhow::anyhow!("consumer thread panicked"))?;
    let (push_rec, push_stats) = push?;
    let (pop_rec, pop_stats) = pop?;
    let elapsed = start.elapsed();

    info!(
        words = pop_stats.accepted,
        elapsed_ms = elapsed.as_millis() as u64,
        rate_mps = pop_stats.accepted as f64 / elapsed.as_secs_f64() / 1e6,
        push_rejected = push_stats.rejected,
        pop_rejected = pop_stats.rejected,
        "soak passed"
    );

    print_stages(&push_rec, &pop_rec);
    Ok(())
}

fn word_mask(word_bits: u32) -> u64 {
    if word_bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << word_bits) - 1
    }
}

#[cfg(feature = "perf")]
fn print_stages(push: &PerfRecorder, pop: &PerfRecorder) {
    use strait_perf::report::{CONSUMER_STAGES, PRODUCER_STAGES, print_stage_table};
    print_stage_table("Producer", push, &PRODUCER_STAGES);
    print_stage_table("Consumer", pop, &CONSUMER_STAGES);
}

#[cfg(not(feature = "perf"))]
fn print_stages(_push: &PerfRecorder, _pop: &PerfRecorder) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_covers_word_width() {
        assert_eq!(word_mask(1), 1);
        assert_eq!(word_mask(12), 0xFFF);
        assert_eq!(word_mask(64), u64::MAX);
    }
}
