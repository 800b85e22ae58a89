use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use strait_fifo::{AsyncFifo, FifoConfig};

/// Half-full queue whose contents are already visible to both sides, so a
/// push followed by a pop succeeds on every iteration.
fn primed(addr_bits: u32) -> AsyncFifo<u64> {
    let mut fifo = AsyncFifo::new(FifoConfig::new(addr_bits, 64)).expect("valid config");
    for i in 0..fifo.capacity() / 2 {
        fifo.try_push(i).expect("room for half a lap");
    }
    fifo.settle();
    fifo
}

fn bench_round_trip(c: &mut Criterion) {
    let mut fifo = primed(6);

    let mut group = c.benchmark_group("fifo");
    group.throughput(Throughput::Elements(1));

    group.bench_function("push_pop", |b| {
        b.iter(|| {
            let _ = fifo.try_push(black_box(42));
            black_box(fifo.try_pop())
        });
    });

    group.finish();
}

fn bench_rejections(c: &mut Criterion) {
    let mut full = AsyncFifo::<u64>::new(FifoConfig::new(4, 64)).expect("valid config");
    while full.try_push(0).is_ok() {}
    let mut empty = AsyncFifo::<u64>::new(FifoConfig::new(4, 64)).expect("valid config");

    let mut group = c.benchmark_group("fifo");
    group.throughput(Throughput::Elements(1));

    group.bench_function("try_push (full)", |b| {
        b.iter(|| black_box(full.try_push(black_box(1))));
    });
    group.bench_function("try_pop (empty)", |b| {
        b.iter(|| black_box(empty.try_pop()));
    });
    group.bench_function("tick", |b| {
        b.iter(|| empty.tick());
    });

    group.finish();
}

fn bench_split_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo");
    group.throughput(Throughput::Elements(1));

    // fill a lap on the producer, then drain it on the consumer
    group.bench_function("split_lap", |b| {
        let (mut producer, mut consumer) = AsyncFifo::<u64>::new(FifoConfig::new(8, 64))
            .expect("valid config")
            .split();
        b.iter_custom(|iters| {
            let start = std::time::Instant::now();
            let mut done = 0;
            while done < iters {
                match producer.try_push(done) {
                    Ok(()) => done += 1,
                    Err(_) => while consumer.try_pop().is_ok() {},
                }
            }
            while consumer.try_pop().is_ok() {}
            start.elapsed()
        });
    });

    group.finish();
}

fn bench_capacities(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo_capacity");
    group.throughput(Throughput::Elements(1));

    for addr_bits in [2u32, 6, 10, 14] {
        let mut fifo = primed(addr_bits);
        group.bench_function(format!("push_pop_cap_{}", 1u64 << addr_bits), |b| {
            b.iter(|| {
                let _ = fifo.try_push(black_box(7));
                black_box(fifo.try_pop())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_round_trip,
    bench_rejections,
    bench_split_drain,
    bench_capacities,
);
criterion_main!(benches);
