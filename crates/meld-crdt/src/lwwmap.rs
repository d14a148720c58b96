//! Last-writer-wins map
//!
//! Per-key LWW entries stamped by the replica's vector clock service.
//! Deletions store a first-class tombstone entry (`value: None`) that is
//! retained through every merge; without it a deleted key would be
//! resurrected by merging an older peer snapshot.
//!
//! The clock service is injected at construction so a replica's map and
//! register share one causal timeline. No process-global clock exists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use meld_core::{mutate2, Causality, ReplicaId, TxCell, VectorClock, VectorClockState};

use crate::Crdt;

/// One map entry: a value or a tombstone, its causal stamp, and the
/// replica that wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwEntry<V> {
    pub value: Option<V>,
    pub clock: VectorClockState,
    pub writer: ReplicaId,
}

impl<V> LwwEntry<V> {
    /// True when this entry marks a deletion.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// Snapshot of a last-writer-wins map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwMapState<K: Ord, V> {
    owner: ReplicaId,
    entries: BTreeMap<K, LwwEntry<V>>,
}

impl<K: Ord + Clone, V: Clone> LwwMapState<K, V> {
    /// Create an empty map state owned by `owner`.
    pub fn new(owner: ReplicaId) -> Self {
        Self {
            owner,
            entries: BTreeMap::new(),
        }
    }

    /// The replica that owns this state.
    pub fn owner(&self) -> &ReplicaId {
        &self.owner
    }

    /// Raw entries, tombstones included.
    pub fn entries(&self) -> &BTreeMap<K, LwwEntry<V>> {
        &self.entries
    }

    /// Value for `key`, `None` when absent or tombstoned.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .get(key)
            .and_then(|entry| entry.value.clone())
    }

    /// True when `key` holds a live value.
    pub fn has(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_tombstone())
            .unwrap_or(false)
    }

    /// Keys with live values, in natural order.
    pub fn keys(&self) -> Vec<K> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_tombstone())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Live values, in key order.
    pub fn values(&self) -> Vec<V> {
        self.entries
            .values()
            .filter_map(|entry| entry.value.clone())
            .collect()
    }

    /// Number of live keys.
    pub fn size(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| !entry.is_tombstone())
            .count()
    }

    fn store(&mut self, key: K, value: Option<V>, stamp: VectorClockState) {
        self.entries.insert(
            key,
            LwwEntry {
                value,
                clock: stamp,
                writer: self.owner.clone(),
            },
        );
    }

    /// Merge one peer entry for `key` under the LWW-Register rule.
    fn merge_entry(&mut self, key: &K, other: &LwwEntry<V>) {
        match self.entries.get(key) {
            None => {
                self.entries.insert(key.clone(), other.clone());
            }
            Some(existing) => {
                let adopt = match existing.clock.compare(&other.clock) {
                    Causality::After | Causality::Equal => false,
                    Causality::Before => true,
                    Causality::Concurrent => other.writer > existing.writer,
                };
                if adopt {
                    self.entries.insert(key.clone(), other.clone());
                }
            }
        }
    }

    /// Merge a peer snapshot entry-wise over the union of keyspaces.
    pub fn merge(&mut self, other: &LwwMapState<K, V>) {
        for (key, entry) in &other.entries {
            self.merge_entry(key, entry);
        }
    }
}

/// Last-writer-wins map handle.
///
/// Cloning shares the state cell and the clock service.
#[derive(Debug, Clone)]
pub struct LwwMap<K: Ord + Clone, V: Clone> {
    clock: VectorClock,
    cell: TxCell<LwwMapState<K, V>>,
}

impl<K, V> LwwMap<K, V>
where
    K: Ord + Clone + std::fmt::Debug,
    V: Clone + std::fmt::Debug,
{
    /// Create an empty map with its own clock service.
    pub fn make(owner: ReplicaId) -> Self {
        let clock = VectorClock::make(owner.clone());
        Self::with_clock(owner, clock)
    }

    /// Create an empty map stamping against a shared clock service.
    pub fn with_clock(owner: ReplicaId, clock: VectorClock) -> Self {
        Self {
            clock,
            cell: TxCell::new(LwwMapState::new(owner)),
        }
    }

    /// Rehydrate from a persisted snapshot.
    ///
    /// The clock service is rebuilt by joining every entry stamp, so the
    /// first write after rehydration is causally after everything the
    /// persisted state had observed.
    pub fn from_state(state: LwwMapState<K, V>) -> Self {
        let clock = VectorClock::make(state.owner.clone());
        for entry in state.entries.values() {
            clock.merge(&entry.clock);
        }
        Self {
            clock,
            cell: TxCell::new(state),
        }
    }

    /// The clock service this map stamps against.
    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    /// Write a value under `key`.
    ///
    /// The clock bump and the entry store commit as one transaction.
    pub fn set(&self, key: K, value: V) {
        mutate2(self.clock.cell(), &self.cell, |clock, map| {
            clock.increment();
            map.store(key, Some(value), clock.clone());
        });
    }

    /// Delete `key`, leaving a tombstone entry.
    pub fn delete(&self, key: K) {
        mutate2(self.clock.cell(), &self.cell, |clock, map| {
            clock.increment();
            map.store(key, None, clock.clone());
        });
    }

    /// Value for `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.cell.read().get(key)
    }

    /// True when `key` holds a live value.
    pub fn has(&self, key: &K) -> bool {
        self.cell.read().has(key)
    }

    /// Keys with live values.
    pub fn keys(&self) -> Vec<K> {
        self.cell.read().keys()
    }

    /// Live values.
    pub fn values(&self) -> Vec<V> {
        self.cell.read().values()
    }

    /// Number of live keys.
    pub fn size(&self) -> usize {
        self.cell.read().size()
    }
}

impl<K, V> Crdt for LwwMap<K, V>
where
    K: Ord + Clone + std::fmt::Debug,
    V: Clone + std::fmt::Debug,
{
    type State = LwwMapState<K, V>;

    fn owner(&self) -> ReplicaId {
        self.cell.read().owner.clone()
    }

    fn query(&self) -> LwwMapState<K, V> {
        self.cell.read()
    }

    /// Fold a peer snapshot in; the service clock joins every peer stamp
    /// so subsequent local writes dominate all observed writes.
    fn merge(&self, other: &LwwMapState<K, V>) {
        mutate2(self.clock.cell(), &self.cell, |clock, map| {
            for entry in other.entries.values() {
                clock.merge(&entry.clock);
            }
            map.merge(other);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ReplicaId {
        ReplicaId::new(s)
    }

    #[test]
    fn test_set_get_delete() {
        let map = LwwMap::make(id("a"));
        map.set("k".to_string(), 1u32);
        assert_eq!(map.get(&"k".to_string()), Some(1));
        assert!(map.has(&"k".to_string()));

        map.delete("k".to_string());
        assert_eq!(map.get(&"k".to_string()), None);
        assert!(!map.has(&"k".to_string()));
        assert_eq!(map.size(), 0);
    }

    #[test]
    fn test_reads_skip_tombstones() {
        let map = LwwMap::make(id("a"));
        map.set("alive".to_string(), 1u32);
        map.set("dead".to_string(), 2u32);
        map.delete("dead".to_string());

        assert_eq!(map.keys(), vec!["alive".to_string()]);
        assert_eq!(map.values(), vec![1]);
        assert_eq!(map.size(), 1);
        // The tombstone itself is retained in the snapshot
        assert!(map.query().entries().contains_key("dead"));
    }

    #[test]
    fn test_causally_later_write_wins_per_key() {
        let a = LwwMap::make(id("a"));
        let b = LwwMap::make(id("b"));

        a.set("k".to_string(), "first".to_string());
        b.merge(&a.query());
        b.set("k".to_string(), "second".to_string());
        a.merge(&b.query());

        assert_eq!(a.get(&"k".to_string()), Some("second".to_string()));
        assert_eq!(b.get(&"k".to_string()), Some("second".to_string()));
    }

    #[test]
    fn test_concurrent_set_and_delete_tie_break_by_writer() {
        let a = LwwMap::make(id("a"));
        let b = LwwMap::make(id("b"));

        // Both observe the same base, then diverge concurrently
        a.set("k".to_string(), "base".to_string());
        b.merge(&a.query());

        a.set("k".to_string(), "v1".to_string());
        b.delete("k".to_string());

        a.merge(&b.query());
        b.merge(&a.query());

        // "b" > "a": the delete wins on both replicas
        assert!(!a.has(&"k".to_string()));
        assert!(!b.has(&"k".to_string()));
    }

    #[test]
    fn test_merge_adopts_unknown_keys_and_tombstones() {
        let a = LwwMap::make(id("a"));
        let b = LwwMap::make(id("b"));

        a.set("x".to_string(), 1u32);
        a.set("y".to_string(), 2u32);
        a.delete("y".to_string());

        b.merge(&a.query());
        assert_eq!(b.get(&"x".to_string()), Some(1));
        assert!(!b.has(&"y".to_string()));
        assert!(b.query().entries().contains_key("y"));
    }

    #[test]
    fn test_write_after_merge_dominates_observed_entries() {
        let a = LwwMap::make(id("a"));
        let b = LwwMap::make(id("b"));

        b.set("k".to_string(), "from-b".to_string());
        a.merge(&b.query());
        a.set("k".to_string(), "from-a".to_string());
        b.merge(&a.query());

        // a's write observed b's, so it wins causally despite "a" < "b"
        assert_eq!(a.get(&"k".to_string()), Some("from-a".to_string()));
        assert_eq!(b.get(&"k".to_string()), Some("from-a".to_string()));
    }

    #[test]
    fn test_get_on_missing_key() {
        let map: LwwMap<String, u32> = LwwMap::make(id("a"));
        assert_eq!(map.get(&"missing".to_string()), None);
        assert!(!map.has(&"missing".to_string()));
    }

    #[test]
    fn test_sequential_overwrites_keep_latest() {
        let map = LwwMap::make(id("a"));
        map.set("k".to_string(), 1u32);
        map.set("k".to_string(), 2u32);
        map.set("k".to_string(), 3u32);
        assert_eq!(map.get(&"k".to_string()), Some(3));
        assert_eq!(map.size(), 1);
    }

    #[test]
    fn test_shared_clock_across_map_instances() {
        let clock = VectorClock::make(id("a"));
        let map_one: LwwMap<String, u32> = LwwMap::with_clock(id("a"), clock.clone());
        let map_two: LwwMap<String, u32> = LwwMap::with_clock(id("a"), clock.clone());

        map_one.set("x".to_string(), 1);
        map_two.set("y".to_string(), 2);

        assert_eq!(clock.get(&id("a")), 2);
    }

    #[test]
    fn test_rehydrated_map_writes_after_observed_history() {
        let a = LwwMap::make(id("a"));
        let b = LwwMap::make(id("b"));
        b.set("k".to_string(), "old".to_string());
        a.merge(&b.query());

        let revived = LwwMap::from_state(a.query());
        revived.set("k".to_string(), "new".to_string());
        b.merge(&revived.query());

        assert_eq!(b.get(&"k".to_string()), Some("new".to_string()));
    }
}
