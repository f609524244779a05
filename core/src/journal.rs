//! Optimistic mutation journal.
//!
//! Every optimistic change a store applies is recorded here with a
//! [`Restore`] describing how to put the entity back. When the network call
//! resolves, the store asks the journal what to do with the outcome:
//!
//! - the newest in-flight mutation of an entity that fails is rolled back;
//! - an older mutation that fails while a newer one is still in flight
//!   hands its rollback to that newer mutation, whose own baseline was an
//!   unconfirmed value;
//! - outcomes at or below the entity's settled watermark are stale and
//!   ignored, so a late response never overwrites a newer confirmed intent.
//!
//! A fetched snapshot is merged through [`Journal::reconcile`]: entities
//! with a mutation in flight keep their local state and take the fetched
//! state as their new rollback baseline.
//!
//! # Example
//!
//! ```
//! use checklist_core::journal::{Journal, Resolution, Restore};
//! use checklist_core::model::{Item, ItemId, ItemKind};
//!
//! let dishes = Item::new(ItemId::new("1"), "dishes", "false", ItemKind::Toggle);
//! let mut items = vec![dishes.clone()];
//! let mut journal = Journal::default();
//!
//! // Flip locally, remember how to undo it
//! let mutation = journal.record(dishes.id.clone(), Restore::upsert(dishes.clone()));
//! items[0].value = "true".to_string();
//!
//! // The server said no
//! if let Resolution::RollBack(undo) = journal.reject(&dishes.id, mutation) {
//!     undo.apply(&mut items);
//! }
//! assert_eq!(items[0].value, "false");
//! ```

use crate::model::Entry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sequence token identifying one optimistic mutation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MutationId(u64);

impl MutationId {
    /// Token with a raw sequence number; journals start at 1
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw sequence number
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MutationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Undo for one optimistic change: put the entity back as it was.
///
/// `snapshot: None` means the entity did not exist before the change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Restore<T: Entry> {
    key: T::Key,
    snapshot: Option<T>,
}

impl<T: Entry> Restore<T> {
    /// Undo that reinstates `previous`
    #[must_use]
    pub fn upsert(previous: T) -> Self {
        Self {
            key: previous.key().clone(),
            snapshot: Some(previous),
        }
    }

    /// Undo that removes the entity with `key`
    #[must_use]
    pub const fn remove(key: T::Key) -> Self {
        Self {
            key,
            snapshot: None,
        }
    }

    /// Entity this undo targets
    #[must_use]
    pub const fn key(&self) -> &T::Key {
        &self.key
    }

    /// Applies the undo to a collection.
    ///
    /// Replaces the entry with the same key, inserts it if it is gone, or
    /// removes it for a `remove` undo. The caller re-sorts afterwards.
    pub fn apply(self, entries: &mut Vec<T>) {
        let position = entries.iter().position(|entry| entry.key() == &self.key);
        match (position, self.snapshot) {
            (Some(index), Some(previous)) => entries[index] = previous,
            (None, Some(previous)) => entries.push(previous),
            (Some(index), None) => {
                entries.remove(index);
            },
            (None, None) => {},
        }
    }
}

/// What the store should do with a resolved mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution<U> {
    /// The server accepted the newest known intent; nothing to undo
    Confirmed,
    /// Apply this undo, then re-sort
    RollBack(U),
    /// A newer mutation is in flight and inherited the undo
    Superseded,
    /// Unknown or already-settled mutation; ignore the outcome
    Stale,
}

#[derive(Clone, Debug)]
struct Pending<U> {
    id: MutationId,
    undo: U,
}

#[derive(Clone, Debug)]
struct EntityLog<U> {
    pending: Vec<Pending<U>>,
    settled: Option<MutationId>,
}

impl<U> Default for EntityLog<U> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            settled: None,
        }
    }
}

/// Per-store record of in-flight optimistic mutations, keyed by entity
#[derive(Clone, Debug)]
pub struct Journal<K: Ord, U> {
    next: u64,
    entities: BTreeMap<K, EntityLog<U>>,
}

impl<K: Ord, U> Default for Journal<K, U> {
    fn default() -> Self {
        Self {
            next: 0,
            entities: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone + std::fmt::Debug, U> Journal<K, U> {
    /// Records an optimistic change to `key` and returns its token
    pub fn record(&mut self, key: K, undo: U) -> MutationId {
        self.next += 1;
        let id = MutationId(self.next);
        self.entities
            .entry(key)
            .or_default()
            .pending
            .push(Pending { id, undo });
        id
    }

    /// Resolves a mutation the server accepted
    pub fn confirm(&mut self, key: &K, id: MutationId) -> Resolution<U> {
        let Some(log) = self.entities.get_mut(key) else {
            return Resolution::Stale;
        };
        let Some(index) = log.pending.iter().position(|p| p.id == id) else {
            return Resolution::Stale;
        };
        log.pending.remove(index);

        let resolution = if log.settled.is_some_and(|settled| settled >= id) {
            Resolution::Stale
        } else {
            log.settled = Some(id);
            Resolution::Confirmed
        };
        self.prune(key);
        resolution
    }

    /// Resolves a mutation the server refused or never received
    pub fn reject(&mut self, key: &K, id: MutationId) -> Resolution<U> {
        let Some(log) = self.entities.get_mut(key) else {
            return Resolution::Stale;
        };
        let Some(index) = log.pending.iter().position(|p| p.id == id) else {
            return Resolution::Stale;
        };
        let failed = log.pending.remove(index);

        let resolution = if log.settled.is_some_and(|settled| settled >= id) {
            Resolution::Stale
        } else if let Some(newer) = log.pending.iter_mut().filter(|p| p.id > id).min_by_key(|p| p.id) {
            newer.undo = failed.undo;
            Resolution::Superseded
        } else {
            Resolution::RollBack(failed.undo)
        };
        self.prune(key);
        resolution
    }

    /// Number of unresolved mutations for `key`
    #[must_use]
    pub fn in_flight(&self, key: &K) -> usize {
        self.entities.get(key).map_or(0, |log| log.pending.len())
    }

    /// Returns `true` when no mutation is in flight
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.entities.values().all(|log| log.pending.is_empty())
    }

    /// Forgets every in-flight mutation; later outcomes resolve as stale
    pub fn clear(&mut self) {
        if !self.is_idle() {
            tracing::debug!(entities = self.entities.len(), "Discarding in-flight mutations");
        }
        self.entities.clear();
    }

    fn prune(&mut self, key: &K) {
        if self
            .entities
            .get(key)
            .is_some_and(|log| log.pending.is_empty())
        {
            self.entities.remove(key);
        }
    }
}

impl<T: Entry> Journal<T::Key, Restore<T>> {
    /// Merges a fetched snapshot into the local one.
    ///
    /// Entities with a mutation in flight keep their local (optimistic)
    /// state, absent included; everything else takes the fetched state. The
    /// rollback baseline of each in-flight entity moves to what the fetch
    /// returned, so a later failure lands on the server's value.
    pub fn reconcile(&mut self, local: &[T], fetched: Vec<T>) -> Vec<T> {
        for (key, log) in &mut self.entities {
            let Some(oldest) = log.pending.iter_mut().min_by_key(|p| p.id) else {
                continue;
            };
            oldest.undo = match fetched.iter().find(|entry| entry.key() == key) {
                Some(current) => Restore::upsert(current.clone()),
                None => Restore::remove(key.clone()),
            };
        }

        let mut merged: Vec<T> = fetched
            .into_iter()
            .filter(|entry| self.in_flight(entry.key()) == 0)
            .collect();
        merged.extend(
            local
                .iter()
                .filter(|entry| self.in_flight(entry.key()) > 0)
                .cloned(),
        );
        merged
    }
}
