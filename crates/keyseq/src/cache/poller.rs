use crate::error::{Error, Result};
use crate::keyspace::KeyspaceGenerator;
use std::collections::VecDeque;

/// Controls how many values each remote refill requests.
///
/// Both modes share the same drain/compensate algorithm; they differ only in
/// the batch-count arithmetic, which trades cache-hit rate against
/// recovery-accounting precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepMode {
    /// Refills keep the buffer's steady-state size at the step size: a single
    /// poll fetches `step + 1` values, a batch poll short of `n` values
    /// fetches `step + n`.
    ///
    /// Maximizes cache-hit rate for steady demand. The number of values
    /// consumed from the remote counter is not a clean multiple of the step,
    /// so auditing how many batches were drawn after a crash is harder.
    Fixed,
    /// Refills always fetch an exact multiple of the step size: a single poll
    /// fetches `step` values, a batch poll short of `n` values fetches
    /// `step * ceil(n / step)`.
    ///
    /// Remote consumption is independent of caller demand, which keeps
    /// recovery accounting exact. Buffer occupancy can degrade to zero when
    /// callers routinely request at least `step` values per call.
    Unfixed,
}

/// The refill/drain algorithm behind [`CachedSequenceGenerator`].
///
/// Every method runs with the owning key's lock held; the buffer handed in is
/// that key's exclusively owned FIFO. After any refill, the buffer plus the
/// just-returned values reconcile exactly with what was fetched.
///
/// [`CachedSequenceGenerator`]: crate::CachedSequenceGenerator
pub(crate) struct Poller {
    mode: StepMode,
    step_size: usize,
}

impl Poller {
    pub(crate) fn new(mode: StepMode, step_size: usize) -> Self {
        assert!(step_size > 0, "cache step size must be greater than zero");
        Self { mode, step_size }
    }

    pub(crate) fn mode(&self) -> StepMode {
        self.mode
    }

    pub(crate) fn step_size(&self) -> usize {
        self.step_size
    }

    /// Values to fetch when a single poll misses.
    fn batch_count(&self) -> usize {
        match self.mode {
            StepMode::Fixed => self.step_size + 1,
            StepMode::Unfixed => self.step_size,
        }
    }

    /// Values to fetch when a batch poll is `count` values short.
    fn batch_count_for(&self, count: usize) -> usize {
        match self.mode {
            StepMode::Fixed => self.step_size + count,
            StepMode::Unfixed => self.step_size * count.div_ceil(self.step_size),
        }
    }

    /// Refills the buffer from the remote source and dequeues one value.
    pub(crate) fn cache_and_poll<G>(
        &self,
        keyspace: &G,
        buffer: &mut VecDeque<G::Value>,
        key: &G::Key,
    ) -> Result<G::Value>
    where
        G: KeyspaceGenerator,
    {
        let mut fetched = self.remote_batch(keyspace, key, self.batch_count())?;

        // batch_count() >= 1 and remote_batch verified the length, so the
        // head element exists.
        let polled = fetched.remove(0);
        buffer.extend(fetched);

        #[cfg(feature = "tracing")]
        tracing::debug!(cached = buffer.len(), "refilled buffer and polled one value");

        Ok(polled)
    }

    /// Refills the buffer and dequeues `count` values when the buffer holds
    /// only `remain` of them (`remain < count`; zero degenerates to a plain
    /// fetch-and-split).
    pub(crate) fn cache_and_batch_poll<G>(
        &self,
        keyspace: &G,
        buffer: &mut VecDeque<G::Value>,
        key: &G::Key,
        remain: usize,
        count: usize,
    ) -> Result<Vec<G::Value>>
    where
        G: KeyspaceGenerator,
    {
        debug_assert!(remain < count);
        debug_assert_eq!(remain, buffer.len());

        // Shortfall the remote source must cover beyond what is buffered.
        let compensate = count - remain;

        // Fetch before draining: a failed fetch must leave the buffered
        // values in place, so dequeuing is the last, non-failing step.
        let mut fetched = self.remote_batch(keyspace, key, self.batch_count_for(compensate))?;

        // batch_count_for(n) >= n in both modes, so the split is in range.
        let surplus = fetched.split_off(compensate);
        buffer.extend(surplus);

        let mut polled = Vec::with_capacity(count);
        polled.extend(buffer.drain(..remain));
        polled.extend(fetched);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            cached = buffer.len(),
            polled = polled.len(),
            compensate,
            "refilled buffer and batch polled"
        );

        Ok(polled)
    }

    /// Dequeues exactly `count` values from the buffer head, FIFO. The caller
    /// has already checked `buffer.len() >= count` under the key's lock.
    pub(crate) fn batch_poll<V>(&self, buffer: &mut VecDeque<V>, count: usize) -> Vec<V> {
        let polled: Vec<V> = buffer.drain(..count).collect();

        #[cfg(feature = "tracing")]
        tracing::trace!(cached = buffer.len(), polled = polled.len(), "batch polled from buffer");

        polled
    }

    /// One remote round trip for `count` values, verified to have returned
    /// exactly `count` of them.
    fn remote_batch<G>(&self, keyspace: &G, key: &G::Key, count: usize) -> Result<Vec<G::Value>>
    where
        G: KeyspaceGenerator,
    {
        let values = keyspace.batch_generate_by_key(key, count)?;
        if values.len() != count {
            return Err(Error::Remote {
                context: format!(
                    "remote batch returned {} values, expected {count}",
                    values.len()
                ),
            });
        }
        Ok(values)
    }
}
