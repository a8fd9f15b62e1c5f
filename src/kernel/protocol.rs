//! The four-phase signal protocol shared by every sequence-driven engine.
//!
//! A cycle is one BEGIN, zero or more STEP, one CONFIRM, then a COMMIT that
//! only takes effect when CONFIRM reported [`Confirmation::Unrecognized`].

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Result of a CONFIRM signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confirmation {
    /// Exactly one stored entry matches; carries its index.
    Recognized(usize),
    /// Nothing matches; COMMIT will store the sequence.
    Unrecognized,
}

impl Confirmation {
    pub fn recognized(&self) -> Option<usize> {
        match self {
            Confirmation::Recognized(id) => Some(*id),
            Confirmation::Unrecognized => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, Confirmation::Recognized(_))
    }
}

/// Where a protocol cycle currently stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No cycle in flight
    #[default]
    Idle,
    /// BEGIN received; STEP or CONFIRM expected
    Stepping,
    /// CONFIRM found nothing; COMMIT expected
    AwaitingCommit,
}

/// BEGIN / STEP / CONFIRM / COMMIT capability.
pub trait SignalProtocol {
    type Symbol;
    type Tail;

    fn begin(&mut self) -> Result<()>;

    fn step(&mut self, symbol: Self::Symbol) -> Result<()>;

    fn confirm(&mut self, symbol: Self::Symbol) -> Result<Confirmation>;

    /// Returns the index of the stored entry, or `None` when no commit was
    /// pending.
    fn commit(&mut self, tail: Self::Tail) -> Result<Option<usize>>;
}
