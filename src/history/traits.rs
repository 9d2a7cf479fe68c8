//! Lookup contract for time-ordered value histories.
//!
//! A history store is where a consumer goes for "the value(s) at or around
//! time T". Every range or boundary lookup takes [`TimeIndexPolicy`] values
//! and must resolve them through [`crate::policy::resolve_boundary`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::{Boundary, DuplicatePolicy, TimeIndexPolicy};

/// Errors that can occur during history operations.
///
/// An empty lookup result is never one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// A sample was pushed with a timestamp earlier than the latest one.
    #[error("Sample out of order: {time} is before last sample at {last}")]
    OutOfOrder {
        /// Timestamp of the newest retained sample.
        last: DateTime<Utc>,
        /// Rejected timestamp.
        time: DateTime<Utc>,
    },

    /// A range query whose start lies after its end.
    #[error("Invalid range: start ({start}) is after end ({end})")]
    InvalidRange {
        /// Requested start.
        start: DateTime<Utc>,
        /// Requested end.
        end: DateTime<Utc>,
    },

    /// A lock guarding the store was poisoned.
    #[error("History backend error: poisoned lock: {0}")]
    Poisoned(&'static str),
}

/// One `(time, value)` entry of a history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample<V> {
    /// When the value was recorded.
    pub time: DateTime<Utc>,
    /// The recorded value.
    pub value: V,
}

impl<V> Sample<V> {
    /// Pairs a timestamp with a value.
    pub const fn new(time: DateTime<Utc>, value: V) -> Self {
        Self { time, value }
    }
}

/// Storage trait for a time-ordered history of values.
///
/// Samples are appended in non-decreasing time order. Samples sharing a
/// timestamp are kept in insertion order and form a duplicate group.
pub trait HistoryStore<V>: Send + Sync {
    /// Append a sample. Returns error if `time` precedes the latest sample.
    fn push(&self, time: DateTime<Utc>, value: V) -> Result<(), HistoryError>;

    /// Number of retained samples.
    fn len(&self) -> Result<usize, HistoryError>;

    /// Whether no samples are retained.
    fn is_empty(&self) -> Result<bool, HistoryError> {
        Ok(self.len()? == 0)
    }

    /// Timestamp of the oldest retained sample.
    fn first_time(&self) -> Result<Option<DateTime<Utc>>, HistoryError>;

    /// Timestamp of the newest sample.
    fn last_time(&self) -> Result<Option<DateTime<Utc>>, HistoryError>;

    /// The `ago`-th most recent sample; `0` is the latest.
    fn value_ago(&self, ago: usize) -> Result<Option<Sample<V>>, HistoryError>;

    /// The latest sample at or before `time` (AS OF lookup).
    ///
    /// When the latest timestamp carries duplicates, `duplicates` picks one.
    fn value_as_of(
        &self,
        time: DateTime<Utc>,
        duplicates: DuplicatePolicy,
    ) -> Result<Option<Sample<V>>, HistoryError>;

    /// The single sample one query boundary resolves to.
    ///
    /// `None` means the edge yields no sample under `policy`; this is a normal
    /// outcome. Under [`TimeIndexPolicy::Extrapolate`] the duplicate policy is
    /// forced to [`DuplicatePolicy::LastValue`].
    fn boundary_sample(
        &self,
        time: DateTime<Utc>,
        boundary: Boundary,
        policy: TimeIndexPolicy,
        duplicates: DuplicatePolicy,
    ) -> Result<Option<Sample<V>>, HistoryError>;

    /// All samples between `start` and `end`, edges resolved per policy.
    ///
    /// # Errors
    /// - `InvalidRange`: If `start > end`
    fn values_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        start_policy: TimeIndexPolicy,
        end_policy: TimeIndexPolicy,
    ) -> Result<Vec<Sample<V>>, HistoryError>;

    /// Timestamps of the samples [`Self::values_between`] would return.
    fn times_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        start_policy: TimeIndexPolicy,
        end_policy: TimeIndexPolicy,
    ) -> Result<Vec<DateTime<Utc>>, HistoryError> {
        Ok(self
            .values_between(start, end, start_policy, end_policy)?
            .into_iter()
            .map(|s| s.time)
            .collect())
    }
}
