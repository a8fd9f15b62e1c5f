//! Slot arena: the index-addressed growable container behind every engine.
//!
//! Slots `0..ready` hold committed values. Slot `ready` may hold a *staged*
//! value (a working entry that is not yet visible through [`SlotArena::get`]).
//! When the next-free cursor reaches the end of the slot vector the arena
//! doubles in place. Values are never removed once committed.

use serde::{Deserialize, Serialize};

use crate::error::{MnemoError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    ready: usize,
}

impl<T> SlotArena<T> {
    /// Create an arena with `capacity` empty slots (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.resize_with(capacity.max(1), || None);
        Self { slots, ready: 0 }
    }

    /// Number of committed values.
    pub fn len(&self) -> usize {
        self.ready
    }

    pub fn is_empty(&self) -> bool {
        self.ready == 0
    }

    /// Total number of slots, used or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index the next committed value will receive.
    pub fn ready_index(&self) -> usize {
        self.ready
    }

    pub fn is_full(&self) -> bool {
        self.ready >= self.slots.len()
    }

    /// Append a value, doubling capacity first if every slot is taken.
    /// Returns the value's index.
    pub fn push(&mut self, value: T) -> usize {
        self.stage(value);
        self.ready += 1;
        self.ready - 1
    }

    /// Place a working value in the ready slot without committing it.
    /// Replaces any value staged earlier.
    pub fn stage(&mut self, value: T) -> usize {
        if self.is_full() {
            self.grow();
        }
        self.slots[self.ready] = Some(value);
        self.ready
    }

    pub fn staged(&self) -> Option<&T> {
        self.slots.get(self.ready).and_then(|s| s.as_ref())
    }

    pub fn staged_mut(&mut self) -> Option<&mut T> {
        self.slots.get_mut(self.ready).and_then(|s| s.as_mut())
    }

    /// Commit the staged value, advancing the cursor. `None` if nothing staged.
    pub fn commit_staged(&mut self) -> Option<usize> {
        if self.staged().is_none() {
            return None;
        }
        self.ready += 1;
        Some(self.ready - 1)
    }

    /// Drop the staged value, if any.
    pub fn discard_staged(&mut self) {
        if let Some(slot) = self.slots.get_mut(self.ready) {
            *slot = None;
        }
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        if id < self.ready {
            self.slots[id].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut T> {
        if id < self.ready {
            self.slots[id].as_mut()
        } else {
            None
        }
    }

    /// Committed values with their indexes.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots[..self.ready]
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots[..self.ready]
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|v| (i, v)))
    }

    /// Structural check used after restoring from a snapshot.
    pub fn verify(&self) -> Result<()> {
        if self.ready > self.slots.len() {
            return Err(MnemoError::InconsistentState(format!(
                "next-free cursor {} beyond capacity {}",
                self.ready,
                self.slots.len()
            )));
        }
        if let Some(hole) = self.slots[..self.ready].iter().position(|s| s.is_none()) {
            return Err(MnemoError::InconsistentState(format!(
                "committed slot {} is empty",
                hole
            )));
        }
        Ok(())
    }

    fn grow(&mut self) {
        let extra = self.slots.len().max(1);
        self.slots.resize_with(self.slots.len() + extra, || None);
        tracing::debug!(capacity = self.slots.len(), "slot arena doubled");
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::with_capacity(1)
    }
}
