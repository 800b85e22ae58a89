//! Model check of random single-context interleavings against a `VecDeque`.

use proptest::prelude::*;
use std::collections::VecDeque;
use strait_fifo::{AsyncFifo, FifoConfig, Rejected};

/// Operations we can perform on the queue.
#[derive(Debug, Clone)]
enum Op {
    Push(u32),
    Pop,
    Tick,
    Settle,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u32>().prop_map(Op::Push),
        4 => Just(Op::Pop),
        1 => Just(Op::Tick),
        1 => Just(Op::Settle),
    ]
}

proptest! {
    /// Words come out exactly once, in push order; rejections move nothing;
    /// flags are conservative while stale and exact once settled.
    #[test]
    fn fifo_matches_model(
        addr_bits in 1u32..=4,
        stages in 1usize..=4,
        ops in proptest::collection::vec(op_strategy(), 0..400),
    ) {
        let cfg = FifoConfig::new(addr_bits, 32).with_sync_stages(stages);
        let capacity = cfg.capacity() as usize;
        let mut fifo = AsyncFifo::<u32>::new(cfg).unwrap();
        let mut model = VecDeque::new();

        for op in &ops {
            match op {
                Op::Push(v) => {
                    let before = fifo.producer().pointer();
                    match fifo.try_push(*v) {
                        Ok(()) => {
                            prop_assert!(model.len() < capacity, "accepted past capacity");
                            model.push_back(*v);
                        }
                        Err(Rejected::Full) => {
                            prop_assert_eq!(fifo.producer().pointer(), before);
                        }
                        Err(other) => prop_assert!(false, "unexpected {:?}", other),
                    }
                }
                Op::Pop => {
                    let before = fifo.consumer().pointer();
                    match fifo.try_pop() {
                        Ok(v) => {
                            let exp = model.pop_front();
                            prop_assert_eq!(Some(v), exp, "FIFO ordering violated");
                        }
                        Err(Rejected::Empty) => {
                            prop_assert_eq!(fifo.consumer().pointer(), before);
                        }
                        Err(other) => prop_assert!(false, "unexpected {:?}", other),
                    }
                }
                Op::Tick => fifo.tick(),
                Op::Settle => {
                    fifo.settle();
                    prop_assert_eq!(fifo.is_full(), model.len() == capacity);
                    prop_assert_eq!(fifo.is_empty(), model.is_empty());
                }
            }

            if !fifo.is_full() {
                prop_assert!(model.len() < capacity);
            }
            if !fifo.is_empty() {
                prop_assert!(!model.is_empty());
            }
            prop_assert!(fifo.producer().occupancy() >= model.len() as u64);
            prop_assert!(fifo.consumer().occupancy() <= model.len() as u64);
        }

        // drain whatever is left
        fifo.settle();
        while let Ok(v) = fifo.try_pop() {
            prop_assert_eq!(Some(v), model.pop_front());
        }
        prop_assert!(model.is_empty());
    }
}
