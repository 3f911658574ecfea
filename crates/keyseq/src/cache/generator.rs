use crate::cache::{StepMode, poller::Poller};
use crate::error::{Error, Result};
use crate::keyspace::KeyspaceGenerator;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One key's exclusively owned FIFO of pre-fetched values. Created lazily on
/// first access, never replaced or evicted afterwards.
type Buffer<V> = Arc<Mutex<VecDeque<V>>>;

/// A caching sequence generator that turns a slow, remotely-backed monotonic
/// counter into a low-latency local source of unique, trend-increasing, and
/// contiguous values per keyspace.
///
/// Values are pulled from the wrapped [`KeyspaceGenerator`] in batches and
/// buffered per key, so most calls are served from memory without a remote
/// round trip. For a fixed key, the union of all values ever returned to
/// callers and the values still buffered is exactly the set fetched from the
/// remote counter: no duplicates, no gaps. Concurrent callers may interleave
/// which physical values they each receive, but values are handed out in
/// strictly increasing order.
///
/// A remote fetch runs while the key's lock is held, which serializes callers
/// of the *same* key for the duration of the round trip but never blocks
/// callers operating on other keys.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Per-key buffers and locking; keys never contend with each other
/// - ❌ No eviction: buffers live for the lifetime of the process
///
/// ## Recommended When
/// - Callers need many unique, ordered values with low latency
/// - The backing counter is remote and every round trip is expensive
///
/// # Example
///
/// ```
/// use keyseq::{CachedSequenceGenerator, CounterKeyspace};
///
/// let generator = CachedSequenceGenerator::new(CounterKeyspace::new("orders"));
///
/// assert_eq!(generator.next(&"orders").unwrap(), 1);
/// assert_eq!(generator.next_batch(&"orders", 3).unwrap(), vec![2, 3, 4]);
/// ```
pub struct CachedSequenceGenerator<G>
where
    G: KeyspaceGenerator,
{
    keyspace: G,
    cache: DashMap<G::Key, Buffer<G::Value>>,
    poller: Poller,
}

impl<G> CachedSequenceGenerator<G>
where
    G: KeyspaceGenerator,
{
    /// Step size used by [`Self::new`] and [`Self::with_mode`].
    pub const DEFAULT_STEP_SIZE: usize = 100;

    /// Creates a generator with [`StepMode::Fixed`] and the default step
    /// size.
    pub fn new(keyspace: G) -> Self {
        Self::with_mode(keyspace, StepMode::Fixed)
    }

    /// Creates a generator with the given step mode and the default step
    /// size.
    pub fn with_mode(keyspace: G, mode: StepMode) -> Self {
        Self::with_step(keyspace, mode, Self::DEFAULT_STEP_SIZE)
    }

    /// Creates a generator with the given step mode and step size.
    ///
    /// # Panics
    /// Panics if `step_size` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use keyseq::{CachedSequenceGenerator, CounterKeyspace, StepMode};
    ///
    /// let generator =
    ///     CachedSequenceGenerator::with_step(CounterKeyspace::new("k"), StepMode::Fixed, 5);
    ///
    /// // The first poll fetches step + 1 values: one returned, five buffered.
    /// assert_eq!(generator.next(&"k").unwrap(), 1);
    /// assert_eq!(generator.buffered(&"k"), 5);
    /// ```
    pub fn with_step(keyspace: G, mode: StepMode, step_size: usize) -> Self {
        Self {
            keyspace,
            cache: DashMap::new(),
            poller: Poller::new(mode, step_size),
        }
    }

    /// Returns the next value for `key`.
    ///
    /// Served from the key's local buffer when possible; on underflow, a
    /// single remote round trip refills the buffer and the first fetched
    /// value is returned.
    ///
    /// # Errors
    /// [`Error::RemoteUnavailable`] / [`Error::Remote`] when the refill
    /// fetch fails. The buffer is left exactly as it was before the failed
    /// fetch.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, key)))]
    pub fn next(&self, key: &G::Key) -> Result<G::Value> {
        let buffer = self.buffer_for(key);
        let mut queue = buffer.lock();

        // Contents may have changed between the lock-free lookup and the
        // lock acquisition; decide empty vs. hit only now, under the lock.
        match queue.pop_front() {
            Some(value) => Ok(value),
            None => self.poller.cache_and_poll(&self.keyspace, &mut queue, key),
        }
    }

    /// Returns the next `count` values for `key`, in increasing order.
    ///
    /// Values are dequeued FIFO from the key's buffer; when the buffer holds
    /// fewer than `count` values, one remote round trip covers the shortfall
    /// and any surplus is buffered for later calls.
    ///
    /// # Errors
    /// - [`Error::InvalidCount`] when `count` is zero; the call has no side
    ///   effects and takes no lock.
    /// - [`Error::RemoteUnavailable`] / [`Error::Remote`] when the refill
    ///   fetch fails; the buffer is left exactly as it was before the failed
    ///   fetch.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, key)))]
    pub fn next_batch(&self, key: &G::Key, count: usize) -> Result<Vec<G::Value>> {
        if count == 0 {
            return Err(Error::InvalidCount { count });
        }

        let buffer = self.buffer_for(key);
        let mut queue = buffer.lock();

        let remain = queue.len();
        if remain >= count {
            return Ok(self.poller.batch_poll(&mut queue, count));
        }
        self.poller
            .cache_and_batch_poll(&self.keyspace, &mut queue, key, remain, count)
    }

    /// [`Self::next`] against the keyspace's default key.
    pub fn next_default(&self) -> Result<G::Value> {
        self.next(&self.keyspace.default_key())
    }

    /// [`Self::next_batch`] against the keyspace's default key.
    pub fn next_batch_default(&self, count: usize) -> Result<Vec<G::Value>> {
        self.next_batch(&self.keyspace.default_key(), count)
    }

    /// Number of values currently buffered for `key` (zero for unseen keys).
    pub fn buffered(&self, key: &G::Key) -> usize {
        self.cache
            .get(key)
            .map(|slot| slot.value().lock().len())
            .unwrap_or(0)
    }

    /// The configured step mode.
    pub fn mode(&self) -> StepMode {
        self.poller.mode()
    }

    /// The configured step size.
    pub fn step_size(&self) -> usize {
        self.poller.step_size()
    }

    /// The wrapped keyspace generator.
    pub fn keyspace(&self) -> &G {
        &self.keyspace
    }

    /// Looks up the buffer for `key`, installing an empty one on first
    /// access.
    fn buffer_for(&self, key: &G::Key) -> Buffer<G::Value> {
        // Fast path: no write lock on the cache table once the key is known.
        if let Some(slot) = self.cache.get(key) {
            return Arc::clone(slot.value());
        }

        // Re-checked atomically by the entry API: concurrent first access
        // installs exactly one buffer per key.
        Arc::clone(self.cache.entry(key.clone()).or_default().value())
    }
}
