//! Ambiguity resolution among relations that fired together.
//!
//! A single left-to-right pass keeps a running maximum-weight candidate.
//! Whenever a candidate's weight equals the running maximum an unbiased coin
//! decides whether it replaces the running winner. For two-way ties this is
//! uniform; for three or more tied candidates later ones are favoured (the
//! last of `n` ties wins with probability 1/2). This policy is kept as is for
//! compatibility with stored behaviour.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::relation::RelationRecord;
use super::SymbolId;
use crate::error::{MnemoError, Result};

/// Picks the dominant relation among several candidates.
#[derive(Clone, Debug)]
pub struct AmbiguityResolver<R = ChaCha8Rng> {
    rng: R,
}

impl AmbiguityResolver<ChaCha8Rng> {
    /// Resolver with a deterministic coin.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> AmbiguityResolver<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Hearing id of the winning relation.
    pub fn resolve(&mut self, records: &[RelationRecord]) -> Result<SymbolId> {
        Ok(self.resolve_record(records)?.hearing_id())
    }

    /// The winning relation itself.
    pub fn resolve_record<'a>(&mut self, records: &'a [RelationRecord]) -> Result<&'a RelationRecord> {
        let mut winner = records.first().ok_or_else(|| {
            MnemoError::InvalidArgument("cannot resolve an empty set of relations".into())
        })?;
        for candidate in records {
            if candidate.weight() > winner.weight() {
                winner = candidate;
            }
            if candidate.weight() == winner.weight() && self.flip() {
                winner = candidate;
            }
        }
        Ok(winner)
    }

    fn flip(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }
}

impl Default for AmbiguityResolver<ChaCha8Rng> {
    fn default() -> Self {
        Self::new(0)
    }
}
