//! Observed-remove set
//!
//! Every add mints a globally unique tag; removal drops exactly the tags
//! observed at the removing replica. A concurrent add elsewhere carries a
//! tag the remover never saw, so it survives the merge: adds win.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use meld_core::{ReplicaId, TxCell};

use crate::Crdt;

/// Globally unique add tag.
///
/// Serialized as the string `{replica}:{epoch_ms}:{sequence}`. The
/// replica segment separates replicas, the construction-time epoch
/// separates process lifetimes of the same replica, and the sequence
/// separates adds within one lifetime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    replica: ReplicaId,
    epoch_ms: u64,
    sequence: u64,
}

impl Tag {
    /// Assemble a tag from its segments.
    pub fn new(replica: ReplicaId, epoch_ms: u64, sequence: u64) -> Self {
        Self {
            replica,
            epoch_ms,
            sequence,
        }
    }

    /// The replica that minted this tag.
    pub fn replica(&self) -> &ReplicaId {
        &self.replica
    }

    /// Milliseconds since the Unix epoch at generator construction.
    pub fn epoch_ms(&self) -> u64 {
        self.epoch_ms
    }

    /// Position within the minting generator's lifetime.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.replica, self.epoch_ms, self.sequence)
    }
}

/// Error parsing a tag from its string form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed tag: {0:?}")]
pub struct ParseTagError(String);

impl FromStr for Tag {
    type Err = ParseTagError;

    // Replica identifiers may themselves contain ':', so the numeric
    // segments are taken from the right.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseTagError(input.to_string());

        let (rest, sequence) = input.rsplit_once(':').ok_or_else(malformed)?;
        let (replica, epoch_ms) = rest.rsplit_once(':').ok_or_else(malformed)?;
        if replica.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            replica: ReplicaId::new(replica),
            epoch_ms: epoch_ms.parse().map_err(|_| malformed())?,
            sequence: sequence.parse().map_err(|_| malformed())?,
        })
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Mints tags that cannot collide across replicas or across restarts.
#[derive(Debug)]
struct TagGenerator {
    owner: ReplicaId,
    epoch_ms: u64,
    sequence: AtomicU64,
}

impl TagGenerator {
    fn new(owner: ReplicaId) -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            owner,
            epoch_ms,
            sequence: AtomicU64::new(0),
        }
    }

    fn next(&self) -> Tag {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        Tag::new(self.owner.clone(), self.epoch_ms, sequence)
    }

    /// Push the sequence strictly above every own-tag sequence already in
    /// `tags`, so a rehydrated replica never reissues a tag even if the
    /// wall clock went backwards between runs.
    fn seed_above<'a>(&self, tags: impl Iterator<Item = &'a Tag>) {
        let mut floor = 0u64;
        for tag in tags {
            if tag.replica() == &self.owner {
                floor = floor.max(tag.sequence().saturating_add(1));
            }
        }
        self.sequence.fetch_max(floor, Ordering::Relaxed);
    }
}

/// Snapshot of an observed-remove set: element → set of live add tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrSetState<A: Ord> {
    owner: ReplicaId,
    elements: BTreeMap<A, BTreeSet<Tag>>,
}

impl<A: Ord + Clone> OrSetState<A> {
    /// Create an empty set state owned by `owner`.
    pub fn new(owner: ReplicaId) -> Self {
        Self {
            owner,
            elements: BTreeMap::new(),
        }
    }

    /// The replica that owns this state.
    pub fn owner(&self) -> &ReplicaId {
        &self.owner
    }

    /// Record an add under a fresh tag.
    pub fn add_tag(&mut self, element: A, tag: Tag) {
        self.elements.entry(element).or_default().insert(tag);
    }

    /// Drop every tag observed for `element` at this replica.
    ///
    /// Tags minted by concurrent adds elsewhere are not observed here and
    /// therefore survive the next merge.
    pub fn remove(&mut self, element: &A) {
        self.elements.remove(element);
    }

    /// Membership: at least one live tag.
    pub fn has(&self, element: &A) -> bool {
        self.elements
            .get(element)
            .map(|tags| !tags.is_empty())
            .unwrap_or(false)
    }

    /// Visible elements, in natural order.
    pub fn values(&self) -> Vec<A> {
        self.elements
            .iter()
            .filter(|(_, tags)| !tags.is_empty())
            .map(|(element, _)| element.clone())
            .collect()
    }

    /// Number of visible elements.
    pub fn size(&self) -> usize {
        self.elements.values().filter(|tags| !tags.is_empty()).count()
    }

    /// Merge a peer snapshot: union of element keys and of tag sets per
    /// element. A peer that still carries live tags for an element this
    /// replica removed resurrects it.
    pub fn merge(&mut self, other: &OrSetState<A>) {
        for (element, tags) in &other.elements {
            if tags.is_empty() {
                continue;
            }
            self.elements
                .entry(element.clone())
                .or_default()
                .extend(tags.iter().cloned());
        }
    }

    fn all_tags(&self) -> impl Iterator<Item = &Tag> {
        self.elements.values().flatten()
    }
}

/// Observed-remove set handle.
///
/// Cloning shares both the state cell and the tag generator.
///
/// # Example
///
/// ```
/// use meld_core::ReplicaId;
/// use meld_crdt::{Crdt, OrSet};
///
/// let p = OrSet::make(ReplicaId::new("p"));
/// let q = OrSet::make(ReplicaId::new("q"));
///
/// p.add("a".to_string());
/// q.merge(&p.query());
/// q.remove(&"a".to_string());   // removes only the tags q observed
/// p.add("a".to_string());       // concurrent add, unseen by q
///
/// q.merge(&p.query());
/// assert!(q.has(&"a".to_string()));  // the add wins
/// ```
#[derive(Debug, Clone)]
pub struct OrSet<A: Ord + Clone> {
    cell: TxCell<OrSetState<A>>,
    tags: Arc<TagGenerator>,
}

impl<A: Ord + Clone + std::fmt::Debug> OrSet<A> {
    /// Create an empty set.
    pub fn make(owner: ReplicaId) -> Self {
        Self {
            cell: TxCell::new(OrSetState::new(owner.clone())),
            tags: Arc::new(TagGenerator::new(owner)),
        }
    }

    /// Rehydrate from a persisted snapshot.
    ///
    /// The tag sequence is seeded above every own tag found in the
    /// snapshot, on top of the fresh construction epoch.
    pub fn from_state(state: OrSetState<A>) -> Self {
        let generator = TagGenerator::new(state.owner.clone());
        generator.seed_above(state.all_tags());
        Self {
            cell: TxCell::new(state),
            tags: Arc::new(generator),
        }
    }

    /// Add an element under a fresh tag; returns the tag.
    pub fn add(&self, element: A) -> Tag {
        let tag = self.tags.next();
        self.cell.mutate(|state| {
            state.add_tag(element, tag.clone());
        });
        tag
    }

    /// Remove the tags currently observed for `element`.
    pub fn remove(&self, element: &A) {
        self.cell.mutate(|state| state.remove(element));
    }

    /// Membership test.
    pub fn has(&self, element: &A) -> bool {
        self.cell.read().has(element)
    }

    /// Visible elements, in natural order.
    pub fn values(&self) -> Vec<A> {
        self.cell.read().values()
    }

    /// Number of visible elements.
    pub fn size(&self) -> usize {
        self.cell.read().size()
    }
}

impl<A: Ord + Clone + std::fmt::Debug> Crdt for OrSet<A> {
    type State = OrSetState<A>;

    fn owner(&self) -> ReplicaId {
        self.cell.read().owner.clone()
    }

    fn query(&self) -> OrSetState<A> {
        self.cell.read()
    }

    fn merge(&self, other: &OrSetState<A>) {
        self.cell.mutate(|state| state.merge(other));
    }
}
