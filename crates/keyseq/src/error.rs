//! Error types for cached sequence generation.
//!
//! This module defines the central `Error` enum covering every failure the
//! crate can surface.
//!
//! ## Error Cases
//! - `InvalidCount`: A batch operation was requested with a zero count.
//! - `RemoteUnavailable`: The remote sequence source could not be reached.
//! - `Remote`: The remote sequence source failed while serving a fetch.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for cached sequence generation.
///
/// Remote failures are propagated to the caller unchanged: the crate never
/// retries internally and never substitutes values. A failure is always local
/// to the one keyspace being served; buffers for other keys are untouched.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A batch operation was requested with a count of zero.
    ///
    /// Rejected before any lock is taken or any buffer is created, so the
    /// failed call has no side effects.
    #[error("invalid batch count: {count} (must be greater than zero)")]
    InvalidCount { count: usize },

    /// The remote sequence source could not be reached.
    #[error("remote sequence source unavailable: {context}")]
    RemoteUnavailable { context: String },

    /// The remote sequence source failed while serving a fetch.
    #[error("remote sequence fetch failed: {context}")]
    Remote { context: String },
}
