//! Membership events for dynamic baskets.
//!
//! A dynamic basket is a keyed collection whose key set changes while the
//! graph runs. Each evaluation cycle the runtime records every membership
//! change into a [`BasketEventLog`] and hands it, read-only, to the
//! downstream consumers of that cycle.
//!
//! The log is a lossless record: it is neither deduplicated nor reduced to a
//! final state. A key may be added, removed and added again within a single
//! cycle, and each of those changes stays visible.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single membership change.
///
/// Field order (`key`, `added`) is part of the mirrored layout, see
/// [`crate::mirror`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasketEvent<K> {
    /// The key whose membership changed.
    pub key: K,

    /// `true` if the key entered the basket, `false` if it left.
    pub added: bool,
}

impl<K> BasketEvent<K> {
    /// Creates an "added" event.
    pub const fn added(key: K) -> Self {
        Self { key, added: true }
    }

    /// Creates a "removed" event.
    pub const fn removed(key: K) -> Self {
        Self { key, added: false }
    }

    /// Returns true if this event removes its key.
    pub const fn is_removal(&self) -> bool {
        !self.added
    }
}

/// All membership changes for one dynamic basket during one cycle.
///
/// # Examples
///
/// ```
/// use tickflow::{BasketEvent, BasketEventLog};
///
/// let log: BasketEventLog<&str> = vec![
///     BasketEvent::added("k1"),
///     BasketEvent::removed("k1"),
///     BasketEvent::added("k1"),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(log.events().len(), 3);
/// assert_eq!(log.added_keys().collect::<Vec<_>>(), vec![&"k1", &"k1"]);
/// assert_eq!(log.removed_keys().collect::<Vec<_>>(), vec![&"k1"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketEventLog<K> {
    events: Vec<BasketEvent<K>>,
}

impl<K> Default for BasketEventLog<K> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<K> BasketEventLog<K> {
    /// Creates an empty log (no membership change this cycle).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already ordered sequence of events.
    #[must_use]
    pub fn from_events(events: Vec<BasketEvent<K>>) -> Self {
        Self { events }
    }

    /// The full event sequence, in the order it was observed.
    #[must_use]
    pub fn events(&self) -> &[BasketEvent<K>] {
        &self.events
    }

    /// Keys of every `added` event, in log order.
    ///
    /// This is a filter, not a final-state computation: a key added twice in
    /// the cycle appears twice. Callers that need final membership should use
    /// [`Self::net_changes`].
    pub fn added_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.events.iter().filter(|e| e.added).map(|e| &e.key)
    }

    /// Keys of every removal event, in log order.
    pub fn removed_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.events.iter().filter(|e| !e.added).map(|e| &e.key)
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing changed this cycle.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates over events in log order.
    pub fn iter(&self) -> std::slice::Iter<'_, BasketEvent<K>> {
        self.events.iter()
    }
}

impl<K: Eq + Hash> BasketEventLog<K> {
    /// Last-write-wins reduction of the log.
    ///
    /// Returns one event per distinct key, in order of first appearance,
    /// carrying that key's final `added` flag. A key that is added and then
    /// removed within the cycle is reported as removed.
    pub fn net_changes(&self) -> Vec<BasketEvent<&K>> {
        let mut slots: HashMap<&K, usize> = HashMap::with_capacity(self.events.len());
        let mut out: Vec<BasketEvent<&K>> = Vec::new();

        for event in &self.events {
            match slots.get(&event.key) {
                Some(&slot) => out[slot].added = event.added,
                None => {
                    slots.insert(&event.key, out.len());
                    out.push(BasketEvent {
                        key: &event.key,
                        added: event.added,
                    });
                }
            }
        }

        out
    }
}

impl<K> FromIterator<BasketEvent<K>> for BasketEventLog<K> {
    fn from_iter<I: IntoIterator<Item = BasketEvent<K>>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl<'a, K> IntoIterator for &'a BasketEventLog<K> {
    type Item = &'a BasketEvent<K>;
    type IntoIter = std::slice::Iter<'a, BasketEvent<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Producer-side handle used by the runtime to populate a cycle's log.
///
/// [`Self::finish`] consumes the recorder, so a log cannot be appended to
/// once it has been handed to consumers.
#[derive(Debug)]
pub struct BasketEventRecorder<K> {
    events: Vec<BasketEvent<K>>,
}

impl<K> Default for BasketEventRecorder<K> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<K> BasketEventRecorder<K> {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty recorder with room for `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// Records that `key` entered the basket.
    pub fn record_added(&mut self, key: K) -> &mut Self {
        self.events.push(BasketEvent::added(key));
        self
    }

    /// Records that `key` left the basket.
    pub fn record_removed(&mut self, key: K) -> &mut Self {
        self.events.push(BasketEvent::removed(key));
        self
    }

    /// Records an already-built event.
    pub fn record(&mut self, event: BasketEvent<K>) -> &mut Self {
        self.events.push(event);
        self
    }

    /// Events recorded so far.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Seals the cycle and returns the read-only log.
    #[must_use]
    pub fn finish(self) -> BasketEventLog<K> {
        let added = self.events.iter().filter(|e| e.added).count();
        debug!(
            events = self.events.len(),
            added,
            removed = self.events.len() - added,
            "sealed basket event log"
        );
        BasketEventLog {
            events: self.events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flapping_log() -> BasketEventLog<&'static str> {
        let mut recorder = BasketEventRecorder::new();
        recorder
            .record_added("k1")
            .record_removed("k1")
            .record_added("k1");
        recorder.finish()
    }

    #[test]
    fn test_flapping_key_keeps_every_event() {
        let log = flapping_log();

        assert_eq!(
            log.events(),
            &[
                BasketEvent::added("k1"),
                BasketEvent::removed("k1"),
                BasketEvent::added("k1"),
            ]
        );
        assert_eq!(log.added_keys().collect::<Vec<_>>(), vec![&"k1", &"k1"]);
        assert_eq!(log.removed_keys().collect::<Vec<_>>(), vec![&"k1"]);
    }

    #[test]
    fn test_empty_log() {
        let log: BasketEventLog<u32> = BasketEventLog::new();
        assert!(log.is_empty());
        assert!(log.events().is_empty());
        assert_eq!(log.added_keys().count(), 0);
        assert_eq!(log.removed_keys().count(), 0);
        assert!(log.net_changes().is_empty());
    }

    #[test]
    fn test_accessors_are_idempotent() {
        let log = flapping_log();
        let first: Vec<_> = log.added_keys().collect();
        let second: Vec<_> = log.added_keys().collect();
        assert_eq!(first, second);
        assert_eq!(log.events(), log.events());
        assert_eq!(
            log.removed_keys().collect::<Vec<_>>(),
            log.removed_keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_views_preserve_log_order_across_keys() {
        let log = BasketEventLog::from_events(vec![
            BasketEvent::added("b"),
            BasketEvent::removed("a"),
            BasketEvent::added("a"),
            BasketEvent::removed("c"),
        ]);

        assert_eq!(log.added_keys().collect::<Vec<_>>(), vec![&"b", &"a"]);
        assert_eq!(log.removed_keys().collect::<Vec<_>>(), vec![&"a", &"c"]);
    }

    #[test]
    fn test_net_changes_last_write_wins() {
        let log = BasketEventLog::from_events(vec![
            BasketEvent::added("x"),
            BasketEvent::added("y"),
            BasketEvent::removed("x"),
            BasketEvent::removed("y"),
            BasketEvent::added("y"),
        ]);

        let net = log.net_changes();
        assert_eq!(
            net,
            vec![BasketEvent::removed(&"x"), BasketEvent::added(&"y")]
        );
    }

    #[test]
    fn test_recorder_len_and_record() {
        let mut recorder = BasketEventRecorder::with_capacity(2);
        assert!(recorder.is_empty());
        recorder.record(BasketEvent::removed(7_u64));
        assert_eq!(recorder.len(), 1);

        let log = recorder.finish();
        assert_eq!(log.len(), 1);
        assert!(log.events()[0].is_removal());
    }

    #[test]
    fn test_into_iterator_by_reference() {
        let log = flapping_log();
        let flags: Vec<bool> = (&log).into_iter().map(|e| e.added).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(log.iter().count(), 3);
    }

    #[test]
    fn test_serialization_field_order() {
        let log = BasketEventLog::from_events(vec![BasketEvent::added("k1".to_string())]);
        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(json, r#"{"events":[{"key":"k1","added":true}]}"#);

        let back: BasketEventLog<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }
}
