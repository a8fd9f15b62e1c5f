//! Episodic memory: trigger sequences mapped to an outcome.
//!
//! An episode is a sequence group whose keys are the symbols that were
//! active (trigger ids) and whose tail is an opaque payload, by default a
//! [`SymbolId`] into state owned elsewhere.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::snapshot::Persistent;
use crate::error::{MnemoError, Result};
use crate::kernel::{Confirmation, SequenceAutomaton, SequenceGroup, SignalProtocol, SymbolId};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpisodicMemory<V = SymbolId> {
    episodes: SequenceAutomaton<SymbolId, V>,
}

impl<V> EpisodicMemory<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            episodes: SequenceAutomaton::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn automaton(&self) -> &SequenceAutomaton<SymbolId, V> {
        &self.episodes
    }

    pub fn episode(&self, id: usize) -> Option<&SequenceGroup<SymbolId, V>> {
        self.episodes.group(id)
    }

    pub fn outcome(&self, id: usize) -> Option<&V> {
        self.episodes.tail(id)
    }

    /// Store `triggers -> outcome` in one full cycle.
    ///
    /// Returns the new episode's index, or `None` if the exact trigger
    /// sequence was already known (the stored outcome is kept).
    pub fn record(&mut self, triggers: &[SymbolId], outcome: V) -> Result<Option<usize>> {
        let (&last, init) = triggers
            .split_last()
            .ok_or_else(|| MnemoError::InvalidArgument("an episode needs a trigger".into()))?;
        self.episodes.begin()?;
        for &t in init {
            self.episodes.step(t)?;
        }
        match self.episodes.confirm(last)? {
            Confirmation::Recognized(_) => Ok(None),
            Confirmation::Unrecognized => self.episodes.commit(outcome),
        }
    }

    /// Episodes containing any of `triggers`, each listed once, in storage
    /// order.
    pub fn retrieve_memories(&self, triggers: &[SymbolId]) -> Vec<usize> {
        self.episodes
            .groups()
            .filter(|(_, g)| triggers.iter().any(|t| g.contains(t)))
            .map(|(id, _)| id)
            .collect()
    }

    /// The episode whose trigger sequence is exactly `triggers`.
    ///
    /// On a miss the automaton is left awaiting COMMIT, so the caller may
    /// store the sequence by committing an outcome.
    pub fn retrieve_exact(&mut self, triggers: &[SymbolId]) -> Result<Option<usize>> {
        let (&last, init) = triggers
            .split_last()
            .ok_or_else(|| MnemoError::InvalidArgument("an empty sequence matches nothing".into()))?;
        self.episodes.begin()?;
        for &t in init {
            self.episodes.step(t)?;
        }
        Ok(self.episodes.confirm(last)?.recognized())
    }

    pub fn verify(&self) -> Result<()> {
        self.episodes.verify()
    }
}

impl<V> Default for EpisodicMemory<V> {
    fn default() -> Self {
        Self {
            episodes: SequenceAutomaton::default(),
        }
    }
}

impl<V> SignalProtocol for EpisodicMemory<V> {
    type Symbol = SymbolId;
    type Tail = V;

    fn begin(&mut self) -> Result<()> {
        self.episodes.begin()
    }

    fn step(&mut self, symbol: SymbolId) -> Result<()> {
        self.episodes.step(symbol)
    }

    fn confirm(&mut self, symbol: SymbolId) -> Result<Confirmation> {
        self.episodes.confirm(symbol)
    }

    fn commit(&mut self, outcome: V) -> Result<Option<usize>> {
        self.episodes.commit(outcome)
    }
}

impl<V: Serialize + DeserializeOwned> Persistent for EpisodicMemory<V> {
    const KIND: &'static str = "episodes";

    fn verify(&self) -> Result<()> {
        EpisodicMemory::verify(self)
    }
}
