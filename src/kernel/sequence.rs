//! Sequence automaton: records and recalls ordered lists of symbols.
//!
//! Each stored [`SequenceGroup`] is a list of key symbols followed by a tail
//! payload. Recall and registration share one pass of the
//! [BEGIN/STEP/CONFIRM/COMMIT](super::protocol) protocol: every STEP narrows
//! the set of groups still matching and, at the same time, appends the symbol
//! speculatively to a staged group. CONFIRM either finds the unique group
//! whose keys end with the confirmed symbol, or arms COMMIT, which stores the
//! staged group with its tail.
//!
//! # Example
//!
//! ```rust
//! use mnemo::kernel::{Confirmation, SequenceAutomaton};
//!
//! let mut words: SequenceAutomaton = SequenceAutomaton::new(4);
//!
//! words.begin().unwrap();
//! words.step(3).unwrap();
//! assert_eq!(words.confirm(8).unwrap(), Confirmation::Unrecognized);
//! let id = words.commit(42).unwrap().unwrap();
//!
//! words.begin().unwrap();
//! words.step(3).unwrap();
//! assert_eq!(words.confirm(8).unwrap(), Confirmation::Recognized(id));
//! assert_eq!(words.tail(id), Some(&42));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::arena::SlotArena;
use super::protocol::{Confirmation, Phase, SignalProtocol};
use super::SymbolId;
use crate::config::SequenceConfig;
use crate::error::{MnemoError, Result};

/// One stored sequence with its tail and a transient match cursor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceGroup<K, V> {
    symbols: Vec<K>,
    tail: Option<V>,
    cursor: usize,
}

impl<K: PartialEq, V> SequenceGroup<K, V> {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            tail: None,
            cursor: 0,
        }
    }

    pub fn symbols(&self) -> &[K] {
        &self.symbols
    }

    pub fn tail(&self) -> Option<&V> {
        self.tail.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &K) -> bool {
        self.symbols.contains(symbol)
    }

    fn rewind(&mut self) {
        self.cursor = 0;
    }

    fn append(&mut self, symbol: K) {
        self.symbols.push(symbol);
    }

    /// Compare `symbol` with the one under the cursor and advance.
    /// An exhausted group rewinds and reports a mismatch.
    fn advance(&mut self, symbol: &K) -> bool {
        match self.symbols.get(self.cursor) {
            Some(stored) => {
                let matched = stored == symbol;
                self.cursor += 1;
                matched
            }
            None => {
                self.cursor = 0;
                false
            }
        }
    }

    /// Like [`advance`](Self::advance), but only succeeds when the cursor
    /// lands on the tail.
    fn confirm(&mut self, symbol: &K) -> bool {
        self.advance(symbol) && self.cursor == self.symbols.len() && self.tail.is_some()
    }
}

impl<K: PartialEq, V> Default for SequenceGroup<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Growable collection of sequence groups driven by the four-phase protocol.
///
/// `K` is the key symbol type, `V` the tail payload stored by COMMIT.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequenceAutomaton<K = SymbolId, V = SymbolId> {
    groups: SlotArena<SequenceGroup<K, V>>,
    matching: Vec<usize>,
    phase: Phase,
    last_committed: Option<usize>,
}

impl<K, V> SequenceAutomaton<K, V>
where
    K: Clone + PartialEq + Debug,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            groups: SlotArena::with_capacity(capacity),
            matching: Vec::new(),
            phase: Phase::Idle,
            last_committed: None,
        }
    }

    pub fn from_config(config: &SequenceConfig) -> Self {
        Self::new(config.capacity)
    }

    // --- Accessors ---

    /// Number of committed groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.groups.capacity()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Groups still matching the sequence in flight.
    pub fn matching(&self) -> &[usize] {
        &self.matching
    }

    pub fn group(&self, id: usize) -> Option<&SequenceGroup<K, V>> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = (usize, &SequenceGroup<K, V>)> {
        self.groups.iter()
    }

    /// Symbols appended so far to the group being registered.
    pub fn staged(&self) -> Option<&SequenceGroup<K, V>> {
        self.groups.staged()
    }

    pub fn tail(&self, id: usize) -> Option<&V> {
        self.groups.get(id).and_then(|g| g.tail())
    }

    pub fn last_committed_id(&self) -> Option<usize> {
        self.last_committed
    }

    pub fn contains(&self, id: usize, symbol: &K) -> bool {
        self.groups.get(id).map_or(false, |g| g.contains(symbol))
    }

    // --- Protocol ---

    /// Start a cycle. Discards anything staged by an abandoned cycle.
    pub fn begin(&mut self) -> Result<()> {
        self.groups.stage(SequenceGroup::new());
        self.matching.clear();
        for (id, group) in self.groups.iter_mut() {
            group.rewind();
            self.matching.push(id);
        }
        self.phase = Phase::Stepping;
        Ok(())
    }

    pub fn step(&mut self, symbol: K) -> Result<()> {
        self.expect_stepping("STEP")?;
        let groups = &mut self.groups;
        self.matching
            .retain(|&id| groups.get_mut(id).map_or(false, |g| g.advance(&symbol)));
        if let Some(staged) = self.groups.staged_mut() {
            staged.append(symbol);
        }
        Ok(())
    }

    /// Fails with [`MnemoError::InconsistentState`] if more than one group
    /// matches; the cycle is aborted in that case.
    pub fn confirm(&mut self, symbol: K) -> Result<Confirmation> {
        self.expect_stepping("CONFIRM")?;
        let groups = &mut self.groups;
        self.matching
            .retain(|&id| groups.get_mut(id).map_or(false, |g| g.confirm(&symbol)));

        match self.matching.as_slice() {
            [] => {
                if let Some(staged) = self.groups.staged_mut() {
                    staged.append(symbol);
                }
                self.phase = Phase::AwaitingCommit;
                Ok(Confirmation::Unrecognized)
            }
            [id] => {
                let id = *id;
                self.groups.discard_staged();
                self.phase = Phase::Idle;
                Ok(Confirmation::Recognized(id))
            }
            ids => {
                let ids = ids.to_vec();
                self.groups.discard_staged();
                self.phase = Phase::Idle;
                tracing::warn!(?ids, ?symbol, "sequence confirmed by several groups");
                Err(MnemoError::InconsistentState(format!(
                    "groups {:?} all store the confirmed sequence",
                    ids
                )))
            }
        }
    }

    /// Store the staged sequence with `tail`. A no-op unless the last
    /// CONFIRM was unrecognized.
    pub fn commit(&mut self, tail: V) -> Result<Option<usize>> {
        if self.phase != Phase::AwaitingCommit {
            return Ok(None);
        }
        if let Some(staged) = self.groups.staged_mut() {
            staged.tail = Some(tail);
        }
        let id = self.groups.commit_staged();
        self.phase = Phase::Idle;
        self.matching.clear();
        if let Some(id) = id {
            self.last_committed = Some(id);
            tracing::debug!(id, capacity = self.groups.capacity(), "sequence committed");
        }
        Ok(id)
    }

    /// Check the invariants a restored automaton must satisfy.
    pub fn verify(&self) -> Result<()> {
        self.groups.verify()?;
        if let Some((id, _)) = self.groups.iter().find(|(_, g)| g.tail.is_none()) {
            return Err(MnemoError::InconsistentState(format!(
                "committed group {} has no tail",
                id
            )));
        }
        if let Some(id) = self.matching.iter().find(|&&id| id >= self.groups.len()) {
            return Err(MnemoError::InconsistentState(format!(
                "matching set refers to uncommitted group {}",
                id
            )));
        }
        if self.phase != Phase::Idle && self.groups.staged().is_none() {
            return Err(MnemoError::InconsistentState(
                "cycle in flight without a staged group".into(),
            ));
        }
        Ok(())
    }

    fn expect_stepping(&self, signal: &str) -> Result<()> {
        if self.phase != Phase::Stepping {
            return Err(MnemoError::Protocol(format!(
                "{} received in phase {:?}; BEGIN first",
                signal, self.phase
            )));
        }
        Ok(())
    }
}

impl<K, V> Default for SequenceAutomaton<K, V>
where
    K: Clone + PartialEq + Debug,
{
    fn default() -> Self {
        Self::new(SequenceConfig::default().capacity)
    }
}

impl<K, V> SignalProtocol for SequenceAutomaton<K, V>
where
    K: Clone + PartialEq + Debug,
{
    type Symbol = K;
    type Tail = V;

    fn begin(&mut self) -> Result<()> {
        SequenceAutomaton::begin(self)
    }

    fn step(&mut self, symbol: K) -> Result<()> {
        SequenceAutomaton::step(self, symbol)
    }

    fn confirm(&mut self, symbol: K) -> Result<Confirmation> {
        SequenceAutomaton::confirm(self, symbol)
    }

    fn commit(&mut self, tail: V) -> Result<Option<usize>> {
        SequenceAutomaton::commit(self, tail)
    }
}
