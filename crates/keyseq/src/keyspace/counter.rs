use crate::error::Result;
use crate::keyspace::KeyspaceGenerator;
use core::hash::Hash;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// An in-process [`KeyspaceGenerator`] backed by one atomic counter per key.
///
/// Each key's counter starts at zero and hands out contiguous values
/// beginning at 1, mirroring the increment-by semantics of a remote atomic
/// counter. Useful as a deterministic stand-in for the remote source in
/// tests, and as a real generator when sequence state may die with the
/// process.
///
/// ## Features
/// - ✅ Thread-safe
/// - ❌ No persistence: counters reset on restart
///
/// ## Recommended When
/// - You need a deterministic counter for tests or benchmarks
/// - Sequence continuity across restarts does not matter
///
/// # Example
///
/// ```
/// use keyseq::{CounterKeyspace, KeyspaceGenerator};
///
/// let counter = CounterKeyspace::new("orders");
/// assert_eq!(counter.batch_generate_by_key(&"orders", 3).unwrap(), vec![1, 2, 3]);
/// assert_eq!(counter.generate_by_key(&"orders").unwrap(), 4);
/// assert_eq!(counter.current(&"orders"), 4);
/// ```
pub struct CounterKeyspace<K = String> {
    counters: DashMap<K, AtomicU64>,
    default_key: K,
}

impl<K> CounterKeyspace<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates a counter keyspace whose key-less operations serve
    /// `default_key`.
    pub fn new(default_key: K) -> Self {
        Self {
            counters: DashMap::new(),
            default_key,
        }
    }

    /// Returns the last value issued for `key`, or zero if the key has never
    /// been drawn from.
    pub fn current(&self, key: &K) -> u64 {
        self.counters
            .get(key)
            .map(|counter| counter.value().load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl<K> KeyspaceGenerator for CounterKeyspace<K>
where
    K: Eq + Hash + Clone,
{
    type Key = K;
    type Value = u64;

    fn default_key(&self) -> K {
        self.default_key.clone()
    }

    fn batch_generate_by_key(&self, key: &K, count: usize) -> Result<Vec<u64>> {
        let counter = self
            .counters
            .entry(key.clone())
            .or_insert_with(|| AtomicU64::new(0));
        let start = counter.value().fetch_add(count as u64, Ordering::Relaxed) + 1;
        Ok((start..start + count as u64).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_contiguous_per_key() {
        let counter = CounterKeyspace::new("a");

        assert_eq!(counter.batch_generate_by_key(&"a", 3).unwrap(), vec![1, 2, 3]);
        assert_eq!(counter.generate_by_key(&"a").unwrap(), 4);

        // A different key draws from its own counter.
        assert_eq!(counter.generate_by_key(&"b").unwrap(), 1);
        assert_eq!(counter.current(&"a"), 4);
        assert_eq!(counter.current(&"b"), 1);
        assert_eq!(counter.current(&"never-seen"), 0);
    }

    #[test]
    fn default_key_round_trip() {
        let counter = CounterKeyspace::new("orders");
        assert_eq!(counter.default_key(), "orders");
    }
}
