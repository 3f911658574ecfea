use crate::dimension::DimensionResolver;
use chrono::{Local, NaiveDateTime};

/// A [`DimensionResolver`] that partitions sequences by calendar date.
///
/// Resolves the current local time to a formatted date string, so every value
/// generated on the same day shares one keyspace and the sequence restarts
/// when the date rolls over.
///
/// # Example
///
/// ```
/// use keyseq::{DateDimension, DimensionResolver};
///
/// let dimension = DateDimension::new();
/// let key = dimension.resolve();
/// assert_eq!(key.len(), 8); // e.g. "20240501"
/// ```
#[derive(Clone, Debug)]
pub struct DateDimension {
    pattern: String,
}

impl DateDimension {
    /// Day-granularity pattern used by [`Self::new`].
    pub const DEFAULT_PATTERN: &'static str = "%Y%m%d";

    /// Creates a resolver producing `YYYYMMDD` keys.
    pub fn new() -> Self {
        Self::with_pattern(Self::DEFAULT_PATTERN)
    }

    /// Creates a resolver with a custom `chrono` format pattern, e.g.
    /// `"%Y%m"` for month-granularity partitions.
    pub fn with_pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    fn format(&self, datetime: NaiveDateTime) -> String {
        datetime.format(&self.pattern).to_string()
    }
}

impl Default for DateDimension {
    fn default() -> Self {
        Self::new()
    }
}

impl DimensionResolver for DateDimension {
    type Key = String;

    fn resolve(&self) -> String {
        self.format(Local::now().naive_local())
    }
}
