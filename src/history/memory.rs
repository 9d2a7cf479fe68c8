//! In-memory history backend.
//!
//! Thread-safe, columnar (one vector of timestamps, one of values) so that
//! boundary resolution can run directly on the timestamp slice.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::{trace, warn};

use crate::config::HistoryConfig;
use crate::error::ValidationError;
use crate::policy::{group_start, resolve_boundary, Boundary, DuplicatePolicy, TimeIndexPolicy};

use super::traits::{HistoryError, HistoryStore, Sample};

fn lock_err(context: &'static str) -> HistoryError {
    HistoryError::Poisoned(context)
}

#[derive(Debug)]
struct HistoryState<V> {
    times: Vec<DateTime<Utc>>,
    values: Vec<V>,
}

impl<V: Clone> HistoryState<V> {
    fn sample(&self, index: usize) -> Sample<V> {
        Sample::new(self.times[index], self.values[index].clone())
    }

    fn evict_front(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.times.drain(..count);
        self.values.drain(..count);
    }

    /// Indices selected by a range query, in time order.
    fn range_indices(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        start_policy: TimeIndexPolicy,
        end_policy: TimeIndexPolicy,
    ) -> Vec<usize> {
        let start_res = resolve_boundary(&self.times, &start, Boundary::Start, start_policy);
        let end_res = resolve_boundary(&self.times, &end, Boundary::End, end_policy);

        let lo = start_res.range_bound(Boundary::Start);
        let hi = end_res.range_bound(Boundary::End);
        if lo >= hi {
            return Vec::new();
        }
        (lo..hi).collect()
    }
}

/// Reference [`HistoryStore`] backed by vectors behind a `RwLock`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tickflow::{Boundary, DuplicatePolicy, HistoryStore, InMemoryHistory, TimeIndexPolicy};
///
/// let history = InMemoryHistory::new();
/// let t = |s| Utc.timestamp_opt(s, 0).unwrap();
/// history.push(t(1), "A").unwrap();
/// history.push(t(5), "B").unwrap();
/// history.push(t(5), "C").unwrap();
///
/// let edge = history
///     .boundary_sample(t(5), Boundary::End, TimeIndexPolicy::Extrapolate, DuplicatePolicy::FirstValue)
///     .unwrap()
///     .unwrap();
/// assert_eq!(edge.value, "C");
/// ```
#[derive(Debug)]
pub struct InMemoryHistory<V> {
    config: HistoryConfig,
    state: RwLock<HistoryState<V>>,
}

impl<V> Default for InMemoryHistory<V> {
    fn default() -> Self {
        Self {
            config: HistoryConfig::default(),
            state: RwLock::new(HistoryState {
                times: Vec::new(),
                values: Vec::new(),
            }),
        }
    }
}

impl<V> InMemoryHistory<V> {
    /// Creates an unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history with retention limits.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidHistoryConfig` if the config fails
    /// [`HistoryConfig::validate`].
    pub fn with_config(config: HistoryConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let capacity = config.max_ticks.unwrap_or(0).min(4096);
        Ok(Self {
            config,
            state: RwLock::new(HistoryState {
                times: Vec::with_capacity(capacity),
                values: Vec::with_capacity(capacity),
            }),
        })
    }

    /// Retention limits this history was built with.
    pub const fn config(&self) -> &HistoryConfig {
        &self.config
    }
}

impl<V> InMemoryHistory<V>
where
    V: Clone,
{
    fn apply_retention(&self, state: &mut HistoryState<V>) {
        let mut evict = 0;

        if let Some(max_ticks) = self.config.max_ticks {
            evict = state.times.len().saturating_sub(max_ticks);
        }

        // A cutoff before the earliest representable instant evicts nothing.
        if let (Some(window), Some(&last)) = (self.config.window, state.times.last()) {
            if let Some(cutoff) = last.checked_sub_signed(window) {
                evict = evict.max(state.times.partition_point(|t| *t < cutoff));
            }
        }

        if evict > 0 {
            trace!(evicted = evict, retained = state.times.len() - evict, "evicted history samples");
            state.evict_front(evict);
        }
    }
}

impl<V> HistoryStore<V> for InMemoryHistory<V>
where
    V: Clone + Send + Sync,
{
    fn push(&self, time: DateTime<Utc>, value: V) -> Result<(), HistoryError> {
        let mut state = self.state.write().map_err(|_| lock_err("history.push"))?;

        if let Some(&last) = state.times.last() {
            if time < last {
                warn!(%time, %last, "rejected out-of-order history sample");
                return Err(HistoryError::OutOfOrder { last, time });
            }
        }

        state.times.push(time);
        state.values.push(value);
        self.apply_retention(&mut state);
        Ok(())
    }

    fn len(&self) -> Result<usize, HistoryError> {
        let state = self.state.read().map_err(|_| lock_err("history.len"))?;
        Ok(state.times.len())
    }

    fn first_time(&self) -> Result<Option<DateTime<Utc>>, HistoryError> {
        let state = self.state.read().map_err(|_| lock_err("history.first_time"))?;
        Ok(state.times.first().copied())
    }

    fn last_time(&self) -> Result<Option<DateTime<Utc>>, HistoryError> {
        let state = self.state.read().map_err(|_| lock_err("history.last_time"))?;
        Ok(state.times.last().copied())
    }

    fn value_ago(&self, ago: usize) -> Result<Option<Sample<V>>, HistoryError> {
        let state = self.state.read().map_err(|_| lock_err("history.value_ago"))?;
        let len = state.times.len();
        if ago >= len {
            return Ok(None);
        }
        Ok(Some(state.sample(len - 1 - ago)))
    }

    fn value_as_of(
        &self,
        time: DateTime<Utc>,
        duplicates: DuplicatePolicy,
    ) -> Result<Option<Sample<V>>, HistoryError> {
        let state = self.state.read().map_err(|_| lock_err("history.value_as_of"))?;

        let through = state.times.partition_point(|t| *t <= time);
        if through == 0 {
            return Ok(None);
        }
        let group = group_start(&state.times, through - 1)..through;
        Ok(duplicates.select(group).map(|i| state.sample(i)))
    }

    fn boundary_sample(
        &self,
        time: DateTime<Utc>,
        boundary: Boundary,
        policy: TimeIndexPolicy,
        duplicates: DuplicatePolicy,
    ) -> Result<Option<Sample<V>>, HistoryError> {
        let state = self.state.read().map_err(|_| lock_err("history.boundary_sample"))?;

        let resolution = resolve_boundary(&state.times, &time, boundary, policy);
        Ok(resolution
            .sample_index(policy, duplicates)
            .map(|i| state.sample(i)))
    }

    fn values_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        start_policy: TimeIndexPolicy,
        end_policy: TimeIndexPolicy,
    ) -> Result<Vec<Sample<V>>, HistoryError> {
        if start > end {
            return Err(HistoryError::InvalidRange { start, end });
        }
        let state = self.state.read().map_err(|_| lock_err("history.values_between"))?;

        Ok(state
            .range_indices(start, end, start_policy, end_policy)
            .into_iter()
            .map(|i| state.sample(i))
            .collect())
    }

    fn times_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        start_policy: TimeIndexPolicy,
        end_policy: TimeIndexPolicy,
    ) -> Result<Vec<DateTime<Utc>>, HistoryError> {
        if start > end {
            return Err(HistoryError::InvalidRange { start, end });
        }
        let state = self.state.read().map_err(|_| lock_err("history.times_between"))?;

        Ok(state
            .range_indices(start, end, start_policy, end_policy)
            .into_iter()
            .map(|i| state.times[i])
            .collect())
    }
}
