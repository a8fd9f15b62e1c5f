//! Kernel layer: the three learning engines.
//!
//! - Adaptive nearest-center classification ([`ClassifierNetwork`])
//! - Weighted id/id relations ([`RelationStore`]) and their
//!   [`AmbiguityResolver`]
//! - Sequence registration and recall ([`SequenceAutomaton`]) through the
//!   [`SignalProtocol`]
//!
//! All engines store their entries in a [`SlotArena`] and refer to each other
//! only through plain integer ids ([`SymbolId`]).
//!
//! This layer has no dependencies on [`memory`](crate::memory) or
//! [`highlevel`](crate::highlevel).
//!
//! # Example
//!
//! ```rust
//! use mnemo::kernel::{ClassifierNetwork, Exemplar, Pattern, RelationStore};
//!
//! let mut sight = ClassifierNetwork::new(4, 8, 10.0).unwrap();
//! let mut hearing = ClassifierNetwork::new(4, 8, 10.0).unwrap();
//! let mut relations = RelationStore::new(8);
//!
//! hearing.learn(Exemplar::new(Pattern::from_data(vec![1, 2, 3, 4]), "a")).unwrap();
//! sight.learn(Exemplar::new(Pattern::from_data(vec![9, 9, 0, 0]), "0")).unwrap();
//! let h = hearing.last_learned_id().unwrap();
//! let s = sight.last_learned_id().unwrap();
//! assert!(relations.learn(h, s));
//! assert_eq!(relations.get_by_sight(s)[0].hearing_id(), h);
//! ```

pub mod arena;
pub mod classifier;
pub mod pattern;
pub mod protocol;
pub mod relation;
pub mod resolver;
pub mod sequence;

pub use arena::SlotArena;
pub use classifier::{ClassifierNetwork, Exemplar, Firing, PatternCell, RadiusBounds, Recognition, NO_SET};
pub use pattern::Pattern;
pub use protocol::{Confirmation, Phase, SignalProtocol};
pub use relation::{RelationRecord, RelationStore};
pub use resolver::AmbiguityResolver;
pub use sequence::{SequenceAutomaton, SequenceGroup};

/// Identifier handed out by one engine and referenced by another.
pub type SymbolId = usize;
