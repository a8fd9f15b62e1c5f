//! Relation store: weighted associations between two id spaces.
//!
//! A [`RelationRecord`] binds a hearing id to a sight id. Every read through
//! [`RelationStore::get_by_hearing`] or [`RelationStore::get_by_sight`]
//! reinforces the records it returns, so frequently used bindings come to
//! dominate ambiguity resolution.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::arena::SlotArena;
use super::SymbolId;
use crate::error::{MnemoError, Result};

/// `(hearing_id, sight_id, weight)` triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationRecord {
    hearing_id: SymbolId,
    sight_id: SymbolId,
    weight: u64,
}

impl RelationRecord {
    pub fn new(hearing_id: SymbolId, sight_id: SymbolId) -> Self {
        Self {
            hearing_id,
            sight_id,
            weight: 0,
        }
    }

    /// Record with an explicit starting weight. Negative weights are rejected.
    pub fn with_weight(hearing_id: SymbolId, sight_id: SymbolId, weight: i64) -> Result<Self> {
        let weight = u64::try_from(weight).map_err(|_| {
            MnemoError::InvalidArgument(format!("weight must be non-negative, got {}", weight))
        })?;
        Ok(Self {
            hearing_id,
            sight_id,
            weight,
        })
    }

    pub fn hearing_id(&self) -> SymbolId {
        self.hearing_id
    }

    pub fn sight_id(&self) -> SymbolId {
        self.sight_id
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn has_ids(&self, hearing_id: SymbolId, sight_id: SymbolId) -> bool {
        self.hearing_id == hearing_id && self.sight_id == sight_id
    }

    /// Add a signed amount to the weight. Fails, leaving the weight as is, if
    /// the result would be negative.
    pub fn adjust(&mut self, amount: i64) -> Result<()> {
        let next = self.weight as i128 + amount as i128;
        if next < 0 {
            return Err(MnemoError::InvalidArgument(format!(
                "weight {} adjusted by {} would be negative",
                self.weight, amount
            )));
        }
        self.weight = u64::try_from(next).unwrap_or(u64::MAX);
        Ok(())
    }

    fn reinforce(&mut self) {
        self.weight = self.weight.saturating_add(1);
    }
}

/// Growable store of unique relation records.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationStore {
    records: SlotArena<RelationRecord>,
}

impl RelationStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: SlotArena::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// Bind `hearing_id` to `sight_id` at weight 0.
    ///
    /// Returns `false` without touching the store if the pair already exists.
    pub fn learn(&mut self, hearing_id: SymbolId, sight_id: SymbolId) -> bool {
        if self.position(hearing_id, sight_id).is_some() {
            return false;
        }
        let id = self.records.push(RelationRecord::new(hearing_id, sight_id));
        tracing::debug!(id, hearing_id, sight_id, "relation learned");
        true
    }

    /// All records with the given hearing id, each reinforced by the read.
    pub fn get_by_hearing(&mut self, hearing_id: SymbolId) -> Vec<RelationRecord> {
        self.read_matching(|r| r.hearing_id == hearing_id)
    }

    /// All records with the given sight id, each reinforced by the read.
    pub fn get_by_sight(&mut self, sight_id: SymbolId) -> Vec<RelationRecord> {
        self.read_matching(|r| r.sight_id == sight_id)
    }

    /// Look up a pair without reinforcing it.
    pub fn peek(&self, hearing_id: SymbolId, sight_id: SymbolId) -> Option<&RelationRecord> {
        self.position(hearing_id, sight_id)
            .and_then(|id| self.records.get(id))
    }

    /// Adjust the weight of an existing pair. Returns `false` if absent.
    pub fn reinforce(&mut self, hearing_id: SymbolId, sight_id: SymbolId, amount: i64) -> Result<bool> {
        match self.position(hearing_id, sight_id) {
            Some(id) => {
                if let Some(record) = self.records.get_mut(id) {
                    record.adjust(amount)?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Iterate records without reinforcing them.
    pub fn records(&self) -> impl Iterator<Item = &RelationRecord> {
        self.records.iter().map(|(_, r)| r)
    }

    /// Fails if any `(hearing_id, sight_id)` pair is stored twice.
    pub fn verify(&self) -> Result<()> {
        self.records.verify()?;
        let mut seen = HashSet::new();
        for record in self.records() {
            if !seen.insert((record.hearing_id, record.sight_id)) {
                return Err(MnemoError::InconsistentState(format!(
                    "duplicate relation ({}, {})",
                    record.hearing_id, record.sight_id
                )));
            }
        }
        Ok(())
    }

    fn position(&self, hearing_id: SymbolId, sight_id: SymbolId) -> Option<usize> {
        self.records
            .iter()
            .find(|(_, r)| r.has_ids(hearing_id, sight_id))
            .map(|(id, _)| id)
    }

    fn read_matching(&mut self, pred: impl Fn(&RelationRecord) -> bool) -> Vec<RelationRecord> {
        self.records
            .iter_mut()
            .filter(|(_, r)| pred(r))
            .map(|(_, r)| {
                r.reinforce();
                *r
            })
            .collect()
    }
}

impl Default for RelationStore {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_learn_is_rejected() {
        let mut store = RelationStore::new(4);
        assert!(store.learn(5, 2));
        assert!(!store.learn(5, 2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reads_reinforce() {
        let mut store = RelationStore::new(4);
        store.learn(5, 2);
        store.learn(5, 3);
        store.learn(6, 2);

        let first = store.get_by_hearing(5);
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|r| r.weight() == 1));

        let by_sight = store.get_by_sight(2);
        assert_eq!(by_sight.len(), 2);
        let r52 = by_sight.iter().find(|r| r.hearing_id() == 5).unwrap();
        assert_eq!(r52.weight(), 2);
        let r62 = by_sight.iter().find(|r| r.hearing_id() == 6).unwrap();
        assert_eq!(r62.weight(), 1);

        assert_eq!(store.peek(5, 3).unwrap().weight(), 1, "peek does not reinforce");
        assert_eq!(store.peek(5, 3).unwrap().weight(), 1);
    }

    #[test]
    fn test_weight_counts_reads_of_single_pair() {
        let mut store = RelationStore::new(2);
        store.learn(5, 2);
        assert!(!store.learn(5, 2));
        for n in 1..=4u64 {
            let rels = store.get_by_hearing(5);
            assert_eq!(rels.len(), 1);
            assert_eq!(rels[0].weight(), n);
        }
    }

    #[test]
    fn test_get_unknown_is_empty() {
        let mut store = RelationStore::new(2);
        store.learn(1, 1);
        assert!(store.get_by_hearing(9).is_empty());
        assert!(store.get_by_sight(9).is_empty());
    }

    #[test]
    fn test_capacity_doubles() {
        let mut store = RelationStore::new(1);
        for i in 0..5 {
            assert!(store.learn(i, i));
        }
        assert_eq!(store.len(), 5);
        assert_eq!(store.capacity(), 8);
    }

    #[test]
    fn test_negative_weight_rejected() {
        assert!(matches!(
            RelationRecord::with_weight(1, 2, -1),
            Err(MnemoError::InvalidArgument(_))
        ));
        let mut store = RelationStore::new(2);
        store.learn(1, 2);
        store.reinforce(1, 2, 3).unwrap();
        assert!(store.reinforce(1, 2, -4).is_err());
        assert_eq!(store.peek(1, 2).unwrap().weight(), 3);
        assert!(!store.reinforce(7, 7, 1).unwrap());
    }

    #[test]
    fn test_verify_detects_duplicates() {
        let mut store = RelationStore::new(4);
        store.learn(1, 2);
        store.learn(3, 4);
        assert!(store.verify().is_ok());

        let mut json = serde_json::to_value(&store).unwrap();
        json["records"]["slots"][1]["hearing_id"] = serde_json::json!(1);
        json["records"]["slots"][1]["sight_id"] = serde_json::json!(2);
        let broken: RelationStore = serde_json::from_value(json).unwrap();
        assert!(matches!(broken.verify(), Err(MnemoError::InconsistentState(_))));
    }
}
