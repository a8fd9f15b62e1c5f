//! # Mnemo: Adaptive Pattern Memory
//!
//! Mnemo is an incremental, online-learning memory substrate. It learns
//! prototypes of fixed-length integer patterns, binds identifiers from
//! different modalities with reinforced weights, and records and recalls
//! symbol sequences, all one example at a time and without retraining.
//!
//! ## Quick Start
//!
//! ```rust
//! use mnemo::{ClassifierNetwork, Exemplar, Pattern, Recognition};
//!
//! let mut net = ClassifierNetwork::new(3, 8, 10.0)?;
//!
//! net.learn(Exemplar::new(Pattern::from_data(vec![0, 0, 0]), "dark"))?;
//! net.learn(Exemplar::new(Pattern::from_data(vec![30, 30, 30]), "bright"))?;
//!
//! assert_eq!(net.recognize(&Pattern::from_data(vec![1, 2, 0]))?, Recognition::Hit);
//! assert_eq!(net.hit_knowledge().unwrap().class_label(), "dark");
//! # Ok::<(), mnemo::MnemoError>(())
//! ```
//!
//! ## Core Concepts
//!
//! - **Cells**: a stored exemplar with a radius; fires when a pattern lies
//!   strictly inside it (Manhattan distance)
//! - **HIT / MISS / DIFF**: one class fired, nothing fired, several classes
//!   fired
//! - **Relations**: hearing id / sight id pairs whose weight grows on read
//! - **Signals**: BEGIN / STEP / CONFIRM / COMMIT drive sequence recall and
//!   registration in one pass
//!
//! ## Layers
//!
//! - [`kernel`]: the learning engines
//! - [`memory`]: blocks composed from them, plus persistence
//! - [`highlevel`]: [`Substrate`], one handle over everything

pub mod config;
pub mod error;
pub mod highlevel;
pub mod kernel;
pub mod memory;

// Re-exports for convenience
pub use config::MemoryConfig;
pub use error::{MnemoError, Result};
pub use highlevel::{Domain, Signal, Substrate};
pub use kernel::{
    AmbiguityResolver, ClassifierNetwork, Confirmation, Exemplar, Pattern, Recognition,
    RelationStore, SequenceAutomaton, SignalProtocol, SymbolId,
};
pub use memory::{BlobStore, FileStore, MemoryStore};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ReadingCommit, ReadingMatch};

    /// Letters spell a syllable, the syllable spells a word.
    #[test]
    fn test_end_to_end_reading() {
        let config = MemoryConfig {
            sight: config::ClassifierConfig::with_pattern_size(2),
            hearing: config::ClassifierConfig::with_pattern_size(2),
            ..MemoryConfig::default()
        };
        let p = |v: &[i32]| Pattern::from_data(v.to_vec());
        let mut mind = Substrate::open(MemoryStore::new(), config).unwrap();
        let (b, _) = mind.learn_pair(Exemplar::new(p(&[0, 0]), "b"), p(&[0, 0])).unwrap();
        let (a, _) = mind.learn_pair(Exemplar::new(p(&[50, 50]), "a"), p(&[50, 50])).unwrap();
        assert_eq!(mind.recognize_sight(&p(&[1, 0])).unwrap(), Some(b));
        assert_eq!(mind.recognize_sight(&p(&[49, 50])).unwrap(), Some(a));

        mind.read_begin().unwrap();
        mind.read_step(&p(&[1, 0])).unwrap();
        assert_eq!(mind.read_confirm(&p(&[49, 50])).unwrap(), Some(ReadingMatch::Unrecognized));
        let syllable = mind.read_commit(Exemplar::new(p(&[7, 7]), "ba"), p(&[0, 90])).unwrap();
        assert_eq!(syllable, Some(ReadingCommit::Syllable(0)));

        // "baba": the syllable's own glyph read twice.
        mind.read_begin().unwrap();
        mind.read_step(&p(&[0, 90])).unwrap();
        mind.read_confirm(&p(&[0, 91])).unwrap();
        let word = mind.read_commit(Exemplar::new(p(&[7, 7]), "baba"), p(&[90, 0])).unwrap();
        assert_eq!(word, Some(ReadingCommit::Word(0)));

        mind.read_begin().unwrap();
        mind.read_step(&p(&[1, 90])).unwrap();
        assert_eq!(mind.read_confirm(&p(&[0, 89])).unwrap(), Some(ReadingMatch::Word(0)));
        assert_eq!(mind.reading().word(0), Some(&p(&[90, 0])));
    }

    #[test]
    fn test_deterministic_resolution_across_instances() {
        let records = [
            kernel::RelationRecord::with_weight(1, 0, 2).unwrap(),
            kernel::RelationRecord::with_weight(2, 0, 2).unwrap(),
        ];
        let mut r1 = AmbiguityResolver::new(11);
        let mut r2 = AmbiguityResolver::new(11);
        let picks1: Vec<_> = (0..16).map(|_| r1.resolve(&records).unwrap()).collect();
        let picks2: Vec<_> = (0..16).map(|_| r2.resolve(&records).unwrap()).collect();
        assert_eq!(picks1, picks2);
    }
}
