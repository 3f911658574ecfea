use crate::error::{Error, Result};
use core::hash::Hash;

/// A source of strictly increasing raw values, partitioned by keyspace key.
///
/// Implementations typically wrap a remote atomic counter (a Redis `INCRBY`,
/// a database sequence, a counter service): repeated calls for the same key
/// return a strictly increasing, gap-free sequence (1, 2, 3, ...) unless the
/// caller skips values. Each call is one remote round trip.
///
/// Failures surface as [`Error::RemoteUnavailable`] or [`Error::Remote`] and
/// are propagated unchanged by everything built on top of this trait; no
/// caller substitutes values or retries on the implementation's behalf.
///
/// # Example
///
/// ```
/// use keyseq::{KeyspaceGenerator, Result};
///
/// struct Stub;
///
/// impl KeyspaceGenerator for Stub {
///     type Key = String;
///     type Value = u64;
///
///     fn default_key(&self) -> String {
///         "global".into()
///     }
///
///     fn batch_generate_by_key(&self, _key: &String, count: usize) -> Result<Vec<u64>> {
///         Ok((1..=count as u64).collect())
///     }
/// }
///
/// let stub = Stub;
/// assert_eq!(stub.generate_by_key(&"global".into()).unwrap(), 1);
/// assert_eq!(stub.batch_generate_by_key(&"global".into(), 3).unwrap(), vec![1, 2, 3]);
/// ```
pub trait KeyspaceGenerator {
    /// Partition identifier bounding the scope of sequence uniqueness (e.g. a
    /// date string).
    type Key: Eq + Hash + Clone;

    /// Value produced by the remote counter; totally ordered within one key.
    type Value;

    /// The keyspace served by the key-less convenience operations.
    fn default_key(&self) -> Self::Key;

    /// Returns the next value for `key` in one remote round trip.
    fn generate_by_key(&self, key: &Self::Key) -> Result<Self::Value> {
        let mut values = self.batch_generate_by_key(key, 1)?;
        match values.pop() {
            Some(value) => Ok(value),
            None => Err(Error::Remote {
                context: "remote batch returned no values".into(),
            }),
        }
    }

    /// Returns the next `count` values for `key` in a single remote round
    /// trip: strictly increasing, contiguous, and equivalent to `count`
    /// sequential [`Self::generate_by_key`] calls but cheaper.
    fn batch_generate_by_key(&self, key: &Self::Key, count: usize) -> Result<Vec<Self::Value>>;
}
