//! Multi-value register
//!
//! Instead of picking a winner among concurrent writes, the register
//! keeps all of them and hands the set back to the reader. A write
//! observes every entry currently held, so it causally dominates them and
//! they are pruned; only genuinely concurrent values coexist.

use serde::{Deserialize, Serialize};

use meld_core::{ReplicaId, TxCell, VectorClockState};

use crate::Crdt;

/// One stored value together with its causal stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvEntry<A> {
    pub value: A,
    pub clock: VectorClockState,
}

/// Snapshot of a multi-value register.
///
/// Invariant: no entry's clock is `Before` another's; dominated entries
/// are pruned on every write and merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvRegisterState<A> {
    owner: ReplicaId,
    entries: Vec<MvEntry<A>>,
}

impl<A: Clone + PartialEq> MvRegisterState<A> {
    /// Create an empty register state owned by `owner`.
    pub fn new(owner: ReplicaId) -> Self {
        Self {
            owner,
            entries: Vec::new(),
        }
    }

    /// The replica that owns this state.
    pub fn owner(&self) -> &ReplicaId {
        &self.owner
    }

    /// All concurrent values, in insertion order.
    pub fn get(&self) -> Vec<A> {
        self.entries.iter().map(|entry| entry.value.clone()).collect()
    }

    /// The live entries with their stamps.
    pub fn entries(&self) -> &[MvEntry<A>] {
        &self.entries
    }

    /// Write a value that causally dominates every entry observed here.
    pub fn set(&mut self, value: A) {
        let mut clock = VectorClockState::new(self.owner.clone());
        for entry in &self.entries {
            clock.merge(&entry.clock);
        }
        clock.increment();

        self.entries.push(MvEntry { value, clock });
        self.prune();
    }

    /// Merge a peer snapshot: union the entry sets (deduplicated by
    /// value-and-clock equality) and prune dominated entries.
    pub fn merge(&mut self, other: &MvRegisterState<A>) {
        for entry in &other.entries {
            if !self.entries.contains(entry) {
                self.entries.push(entry.clone());
            }
        }
        self.prune();
    }

    /// Drop every entry whose clock is `Before` some other entry's clock.
    fn prune(&mut self) {
        let keep: Vec<bool> = self
            .entries
            .iter()
            .map(|entry| {
                !self
                    .entries
                    .iter()
                    .any(|candidate| entry.clock.happened_before(&candidate.clock))
            })
            .collect();

        let mut index = 0;
        self.entries.retain(|_| {
            let kept = keep[index];
            index += 1;
            kept
        });
    }
}

/// Multi-value register handle.
#[derive(Debug, Clone)]
pub struct MvRegister<A: Clone> {
    cell: TxCell<MvRegisterState<A>>,
}

impl<A: Clone + PartialEq + std::fmt::Debug> MvRegister<A> {
    /// Create an empty register.
    pub fn make(owner: ReplicaId) -> Self {
        Self {
            cell: TxCell::new(MvRegisterState::new(owner)),
        }
    }

    /// Create a register holding `initial`.
    pub fn make_with(owner: ReplicaId, initial: A) -> Self {
        let register = Self::make(owner);
        register.set(initial);
        register
    }

    /// Rehydrate from a persisted snapshot.
    pub fn from_state(state: MvRegisterState<A>) -> Self {
        Self {
            cell: TxCell::new(state),
        }
    }

    /// Write a value.
    pub fn set(&self, value: A) {
        self.cell.mutate(|state| state.set(value));
    }

    /// All concurrent values; the application reconciles.
    pub fn get(&self) -> Vec<A> {
        self.cell.read().get()
    }
}

impl<A: Clone + PartialEq + std::fmt::Debug> Crdt for MvRegister<A> {
    type State = MvRegisterState<A>;

    fn owner(&self) -> ReplicaId {
        self.cell.read().owner.clone()
    }

    fn query(&self) -> MvRegisterState<A> {
        self.cell.read()
    }

    fn merge(&self, other: &MvRegisterState<A>) {
        self.cell.mutate(|state| state.merge(other));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ReplicaId {
        ReplicaId::new(s)
    }

    #[test]
    fn test_single_writer_sees_one_value() {
        let register = MvRegister::make(id("a"));
        register.set("x".to_string());
        register.set("y".to_string());

        assert_eq!(register.get(), vec!["y".to_string()]);
    }

    #[test]
    fn test_causal_write_prunes_dominated_entry() {
        let r1 = MvRegister::make(id("r1"));
        let r2 = MvRegister::make(id("r2"));

        r1.set("x".to_string());
        r2.merge(&r1.query());
        r2.set("y".to_string());
        r1.merge(&r2.query());

        assert_eq!(r1.get(), vec!["y".to_string()]);
        assert_eq!(r2.get(), vec!["y".to_string()]);
    }

    #[test]
    fn test_concurrent_writes_coexist() {
        let a = MvRegister::make(id("a"));
        let b = MvRegister::make(id("b"));

        a.set("x".to_string());
        b.set("y".to_string());

        a.merge(&b.query());
        b.merge(&a.query());

        let mut from_a = a.get();
        let mut from_b = b.get();
        from_a.sort();
        from_b.sort();
        assert_eq!(from_a, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(from_a, from_b);
    }

    #[test]
    fn test_write_after_merge_collapses_siblings() {
        let a = MvRegister::make(id("a"));
        let b = MvRegister::make(id("b"));

        a.set("x".to_string());
        b.set("y".to_string());
        a.merge(&b.query());
        b.merge(&a.query());

        // b writes having observed both siblings; the write dominates them
        b.set("z".to_string());
        a.merge(&b.query());

        assert_eq!(a.get(), vec!["z".to_string()]);
        assert_eq!(b.get(), vec!["z".to_string()]);
    }

    #[test]
    fn test_empty_register_reads_no_values() {
        let register: MvRegister<String> = MvRegister::make(id("a"));
        assert!(register.get().is_empty());
    }

    #[test]
    fn test_make_with_seeds_initial_value() {
        let register = MvRegister::make_with(id("a"), 42u32);
        assert_eq!(register.get(), vec![42]);
    }

    #[test]
    fn test_merge_deduplicates_identical_entries() {
        let a = MvRegister::make(id("a"));
        let b = MvRegister::make(id("b"));

        a.set("x".to_string());
        b.merge(&a.query());
        b.merge(&a.query());

        assert_eq!(b.get(), vec!["x".to_string()]);
        assert_eq!(b.query().entries().len(), 1);
    }
}
