use crate::cache::CachedSequenceGenerator;
use crate::dimension::DimensionResolver;
use crate::error::Result;
use crate::keyspace::KeyspaceGenerator;
use core::fmt::Display;

/// Issues per-dimension serial numbers: unique, trend-increasing, and
/// contiguous within one dimension's lifetime.
///
/// Composes a [`DimensionResolver`] (which key is live right now, e.g.
/// today's date) with a [`CachedSequenceGenerator`] (low-latency values for
/// that key), rendering each value as a zero-padded decimal string of a
/// configured minimum width. The padded form keeps serials lexicographically
/// sortable until the sequence outgrows the width.
///
/// # Example
///
/// ```
/// use keyseq::{
///     CachedSequenceGenerator, CounterKeyspace, DateDimension, SerialNumberGenerator,
/// };
///
/// let sequences = CachedSequenceGenerator::new(CounterKeyspace::new(String::new()));
/// let serials = SerialNumberGenerator::new(DateDimension::new(), sequences);
///
/// let serial = serials.generate().unwrap();
/// assert_eq!(serial.len(), 16);
/// assert_eq!(serial, "0000000000000001");
/// ```
pub struct SerialNumberGenerator<G, D>
where
    G: KeyspaceGenerator,
    D: DimensionResolver<Key = G::Key>,
{
    dimensions: D,
    sequences: CachedSequenceGenerator<G>,
    min_width: usize,
}

impl<G, D> SerialNumberGenerator<G, D>
where
    G: KeyspaceGenerator,
    G::Value: Display,
    D: DimensionResolver<Key = G::Key>,
{
    /// Minimum serial width used by [`Self::new`].
    pub const DEFAULT_MIN_WIDTH: usize = 16;

    /// Creates a serial generator with the default minimum width.
    pub fn new(dimensions: D, sequences: CachedSequenceGenerator<G>) -> Self {
        Self::with_min_width(dimensions, sequences, Self::DEFAULT_MIN_WIDTH)
    }

    /// Creates a serial generator padding every serial to at least
    /// `min_width` characters. Values wider than `min_width` are rendered
    /// unpadded, never truncated.
    pub fn with_min_width(
        dimensions: D,
        sequences: CachedSequenceGenerator<G>,
        min_width: usize,
    ) -> Self {
        Self {
            dimensions,
            sequences,
            min_width,
        }
    }

    /// Issues the next serial for the currently live dimension.
    pub fn generate(&self) -> Result<String> {
        let key = self.dimensions.resolve();
        let value = self.sequences.next(&key)?;
        Ok(self.pad(&value))
    }

    /// Issues the next serial prefixed with its dimension key, e.g.
    /// `"20240501" + "00000042"` for order-number style output.
    pub fn generate_prefixed(&self) -> Result<String>
    where
        G::Key: Display,
    {
        let key = self.dimensions.resolve();
        let value = self.sequences.next(&key)?;
        Ok(format!("{key}{}", self.pad(&value)))
    }

    /// Issues `count` serials for the currently live dimension, in increasing
    /// order. Fails with [`Error::InvalidCount`] when `count` is zero.
    ///
    /// [`Error::InvalidCount`]: crate::Error::InvalidCount
    pub fn batch_generate(&self, count: usize) -> Result<Vec<String>> {
        let key = self.dimensions.resolve();
        let values = self.sequences.next_batch(&key, count)?;
        Ok(values.iter().map(|value| self.pad(value)).collect())
    }

    /// The configured minimum serial width.
    pub fn min_width(&self) -> usize {
        self.min_width
    }

    fn pad(&self, value: &G::Value) -> String {
        format!("{value:0>width$}", width = self.min_width)
    }
}
