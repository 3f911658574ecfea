use super::*;
use crate::error::{Error, Result};
use crate::keyspace::{CounterKeyspace, KeyspaceGenerator};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::scope;

const KEY: &str = "seq";

/// Wraps [`CounterKeyspace`] to record every remote fetch size and to inject
/// a one-shot outage.
struct RecordingKeyspace {
    inner: CounterKeyspace<&'static str>,
    fetches: Mutex<Vec<usize>>,
    fail_next: AtomicBool,
}

impl RecordingKeyspace {
    fn new() -> Self {
        Self {
            inner: CounterKeyspace::new(KEY),
            fetches: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        }
    }

    fn fetches(&self) -> Vec<usize> {
        self.fetches.lock().clone()
    }

    fn inject_failure(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl KeyspaceGenerator for RecordingKeyspace {
    type Key = &'static str;
    type Value = u64;

    fn default_key(&self) -> &'static str {
        self.inner.default_key()
    }

    fn batch_generate_by_key(&self, key: &&'static str, count: usize) -> Result<Vec<u64>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::RemoteUnavailable {
                context: "injected outage".into(),
            });
        }
        self.fetches.lock().push(count);
        self.inner.batch_generate_by_key(key, count)
    }
}

fn generator(mode: StepMode, step_size: usize) -> CachedSequenceGenerator<RecordingKeyspace> {
    CachedSequenceGenerator::with_step(RecordingKeyspace::new(), mode, step_size)
}

#[test]
fn fixed_step_poll_arithmetic() {
    let generator = generator(StepMode::Fixed, 5);

    // First poll fetches step + 1: one returned, five buffered.
    assert_eq!(generator.next(&KEY).unwrap(), 1);
    assert_eq!(generator.buffered(&KEY), 5);

    // Batch poll of 10 with 5 buffered fetches step + (10 - 5) = 10,
    // returns all 10, buffers nothing.
    assert_eq!(
        generator.next_batch(&KEY, 10).unwrap(),
        (2..=11).collect::<Vec<_>>()
    );
    assert_eq!(generator.buffered(&KEY), 0);
    assert_eq!(generator.keyspace().fetches(), vec![6, 10]);
}

#[test]
fn unfixed_step_poll_arithmetic() {
    let generator = generator(StepMode::Unfixed, 3);

    // Batch poll of 5 on an empty buffer fetches 3 * ceil(5 / 3) = 6,
    // returns 5, buffers 1.
    assert_eq!(
        generator.next_batch(&KEY, 5).unwrap(),
        (1..=5).collect::<Vec<_>>()
    );
    assert_eq!(generator.buffered(&KEY), 1);

    // One buffered, four wanted: compensate 3, an exact step multiple.
    assert_eq!(
        generator.next_batch(&KEY, 4).unwrap(),
        (6..=9).collect::<Vec<_>>()
    );
    assert_eq!(generator.buffered(&KEY), 0);

    // An exact-step request on an empty buffer leaves nothing cached.
    assert_eq!(
        generator.next_batch(&KEY, 3).unwrap(),
        (10..=12).collect::<Vec<_>>()
    );
    assert_eq!(generator.buffered(&KEY), 0);
    assert_eq!(generator.keyspace().fetches(), vec![6, 3, 3]);
}

#[test]
fn unfixed_step_single_poll_fetches_one_step() {
    let generator = generator(StepMode::Unfixed, 4);

    assert_eq!(generator.next(&KEY).unwrap(), 1);
    assert_eq!(generator.buffered(&KEY), 3);
    assert_eq!(generator.keyspace().fetches(), vec![4]);
}

#[test]
fn partial_drain_compensation_preserves_order() {
    let generator = generator(StepMode::Fixed, 2);

    // Fetch 3, return 1, buffer [2, 3].
    assert_eq!(generator.next(&KEY).unwrap(), 1);
    assert_eq!(generator.buffered(&KEY), 2);

    // Two buffered, seven wanted: compensate 5, fetch step + 5 = 7. The
    // result starts with the drained values, then the fetched head.
    assert_eq!(
        generator.next_batch(&KEY, 7).unwrap(),
        vec![2, 3, 4, 5, 6, 7, 8]
    );
    assert_eq!(generator.buffered(&KEY), 2); // [9, 10]
    assert_eq!(generator.keyspace().fetches(), vec![3, 7]);
}

#[test]
fn failed_refill_leaves_buffer_untouched() {
    let generator = generator(StepMode::Fixed, 3);

    assert_eq!(generator.next(&KEY).unwrap(), 1);
    assert_eq!(generator.buffered(&KEY), 3); // [2, 3, 4]

    generator.keyspace().inject_failure();
    let err = generator.next_batch(&KEY, 5).unwrap_err();
    assert_eq!(
        err,
        Error::RemoteUnavailable {
            context: "injected outage".into()
        }
    );

    // The buffered values survived the failed fetch.
    assert_eq!(generator.buffered(&KEY), 3);

    // A retry observes the same occupancy and drains normally.
    assert_eq!(
        generator.next_batch(&KEY, 5).unwrap(),
        vec![2, 3, 4, 5, 6]
    );
    assert_eq!(generator.buffered(&KEY), 3); // [7, 8, 9]
    assert_eq!(generator.keyspace().fetches(), vec![4, 5]);
}

#[test]
fn zero_count_is_rejected_before_any_side_effect() {
    let generator = generator(StepMode::Fixed, 5);

    assert_eq!(
        generator.next_batch(&KEY, 0).unwrap_err(),
        Error::InvalidCount { count: 0 }
    );

    // No remote contact, no buffer created.
    assert!(generator.keyspace().fetches().is_empty());
    assert_eq!(generator.buffered(&KEY), 0);
}

#[test]
#[should_panic(expected = "cache step size must be greater than zero")]
fn zero_step_size_is_rejected() {
    let _ = generator(StepMode::Fixed, 0);
}

#[test]
fn default_key_operations_use_the_default_keyspace() {
    let generator = generator(StepMode::Fixed, 4);

    assert_eq!(generator.next_default().unwrap(), 1);
    assert_eq!(generator.next_batch_default(2).unwrap(), vec![2, 3]);
    assert_eq!(generator.buffered(&KEY), 2);
}

#[test]
fn mixed_operations_reconcile_with_remote_fetches() {
    let generator = generator(StepMode::Fixed, 4);

    let mut issued = Vec::new();
    issued.push(generator.next(&KEY).unwrap());
    issued.extend(generator.next_batch(&KEY, 2).unwrap());
    issued.extend(generator.next_batch(&KEY, 6).unwrap());
    issued.push(generator.next(&KEY).unwrap());

    // Everything issued so far is the contiguous range from 1, in order.
    assert_eq!(issued, (1..=10).collect::<Vec<_>>());

    // Issued plus still-buffered reconciles exactly with what was fetched.
    let fetched: usize = generator.keyspace().fetches().iter().sum();
    assert_eq!(issued.len() + generator.buffered(&KEY), fetched);
}

#[test]
fn concurrent_callers_receive_unique_contiguous_values() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 64;

    let generator = generator(StepMode::Fixed, 16);
    let mut per_thread: Vec<Vec<u64>> = Vec::new();

    scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let generator = &generator;
                s.spawn(move || {
                    let mut received = Vec::new();
                    for round in 0..ROUNDS {
                        if round % 2 == 0 {
                            received.push(generator.next(&KEY).unwrap());
                        } else {
                            received.extend(generator.next_batch(&KEY, 3).unwrap());
                        }
                    }
                    received
                })
            })
            .collect();

        for handle in handles {
            per_thread.push(handle.join().unwrap());
        }
    });

    // Each caller sees its own values in strictly increasing order.
    for received in &per_thread {
        assert!(received.windows(2).all(|pair| pair[0] < pair[1]));
    }

    // Across all callers the values are pairwise distinct...
    let all: Vec<u64> = per_thread.into_iter().flatten().collect();
    let unique: HashSet<u64> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len());

    // ...and form the contiguous range starting at 1.
    let mut sorted = all;
    sorted.sort_unstable();
    assert_eq!(sorted, (1..=sorted.len() as u64).collect::<Vec<_>>());

    // Issued plus buffered reconciles exactly with the remote fetches.
    let fetched: usize = generator.keyspace().fetches().iter().sum();
    assert_eq!(sorted.len() + generator.buffered(&KEY), fetched);
}

#[test]
fn concurrent_first_access_creates_one_buffer() {
    const THREADS: usize = 8;

    let generator = generator(StepMode::Fixed, 64);
    let barrier = Barrier::new(THREADS);
    let mut values = Vec::new();

    scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let generator = &generator;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    generator.next(&KEY).unwrap()
                })
            })
            .collect();

        for handle in handles {
            values.push(handle.join().unwrap());
        }
    });

    // One refill served every first-access racer: a single remote fetch of
    // step + 1, with the unconsumed remainder still buffered.
    assert_eq!(generator.keyspace().fetches(), vec![65]);
    assert_eq!(generator.buffered(&KEY), 65 - THREADS);

    let unique: HashSet<u64> = values.iter().copied().collect();
    assert_eq!(unique.len(), THREADS);
    assert!(values.iter().all(|value| (1..=THREADS as u64).contains(value)));
}

#[test]
fn keys_do_not_share_buffers_or_sequences() {
    let generator = generator(StepMode::Fixed, 3);

    assert_eq!(generator.next(&"left").unwrap(), 1);
    assert_eq!(generator.next(&"right").unwrap(), 1);

    assert_eq!(generator.buffered(&"left"), 3);
    assert_eq!(generator.buffered(&"right"), 3);

    // A failure on one key never disturbs another key's buffer.
    generator.keyspace().inject_failure();
    generator.next_batch(&"left", 10).unwrap_err();
    assert_eq!(generator.buffered(&"left"), 3);
    assert_eq!(generator.next(&"right").unwrap(), 2);
}
