//! Memory layer: blocks built from kernel engines, plus persistence.
//!
//! This module provides:
//!
//! - [`SensoryBlock`]: paired sight and hearing classifiers; sight cells are
//!   labelled with the hearing id they were learned for.
//!
//! - [`EpisodicMemory`]: trigger sequences mapped to an outcome, with
//!   any-trigger and exact-sequence retrieval.
//!
//! - [`ReadingBlock`]: syllables spelled by letters and words spelled by
//!   syllables, linked through sight/syllable relations.
//!
//! - [`CountingNetwork`] and [`ArithmeticBlock`]: learned quantity order and
//!   digit-by-digit addition on top of it.
//!
//! - [`BlobStore`] with [`MemoryStore`] / [`FileStore`], and the
//!   [`Persistent`] snapshot envelope every engine is saved in.
//!
//! # Usage
//!
//! ```rust
//! use mnemo::config::ClassifierConfig;
//! use mnemo::kernel::{Exemplar, Pattern};
//! use mnemo::memory::{snapshot, MemoryStore, SensoryBlock};
//!
//! let cfg = ClassifierConfig::with_pattern_size(3);
//! let mut block = SensoryBlock::new(&cfg, &cfg).unwrap();
//! let (h, s) = block
//!     .learn_pair(Exemplar::new(Pattern::from_data(vec![1, 2, 3]), "one"), Pattern::from_data(vec![7, 7, 7]))
//!     .unwrap();
//! assert_eq!(block.hearing_of_sight(s), Some(h));
//!
//! let mut store = MemoryStore::new();
//! snapshot::save(&mut store, "sight", block.sight()).unwrap();
//! ```

pub mod episodic;
pub mod geometric;
pub mod reading;
pub mod sensory;
pub mod snapshot;
pub mod store;

pub use episodic::EpisodicMemory;
pub use geometric::{AdditionRing, ArithmeticBlock, ArithmeticSymbols, CountingNetwork};
pub use reading::{ReadingBlock, ReadingCommit, ReadingCue, ReadingMatch};
pub use sensory::SensoryBlock;
pub use snapshot::Persistent;
pub use store::{BlobStore, FileStore, MemoryStore};
