//! Two-level reading: letters spell syllables, syllables spell words.
//!
//! A [`ReadingBlock`] runs both levels off the same signal stream. Every
//! STEP and CONFIRM carries the sight id of what was read plus the hearing
//! id bound to it, if any:
//!
//! - the syllable level keys on hearing ids (letter sounds) and stores the
//!   syllable's hearing exemplar as its tail;
//! - the word level keys on syllable ids, found through the sight/syllable
//!   relations, and stores the word's sight pattern as its tail.
//!
//! A level drops out of the cycle as soon as a symbol it cannot use shows
//! up. A recognized syllable ends the cycle for both levels; an unrecognized
//! one arms the syllable level for COMMIT, otherwise the word level is armed.

use serde::{Deserialize, Serialize};

use super::snapshot::Persistent;
use crate::error::{MnemoError, Result};
use crate::kernel::{
    Confirmation, Exemplar, Pattern, Phase, RelationStore, SequenceAutomaton, SymbolId,
};

/// What one read symbol resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadingCue {
    /// Sight cell the symbol was recognized as
    pub sight: SymbolId,
    /// Hearing id bound to that cell
    pub hearing: Option<SymbolId>,
}

/// Outcome of a reading CONFIRM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadingMatch {
    Syllable(usize),
    Word(usize),
    /// Nothing matched; COMMIT stores the sequence at the armed level
    Unrecognized,
}

/// Entry stored by a reading COMMIT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadingCommit {
    Syllable(usize),
    Word(usize),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadingBlock {
    syllables: SequenceAutomaton<SymbolId, Exemplar>,
    words: SequenceAutomaton<SymbolId, Pattern>,
    /// hearing side holds syllable ids
    syllable_sights: RelationStore,
    #[serde(skip)]
    phase: Phase,
    #[serde(skip)]
    learning_syllables: bool,
    #[serde(skip)]
    learning_words: bool,
}

impl ReadingBlock {
    pub fn new(capacity: usize, relation_capacity: usize) -> Self {
        Self {
            syllables: SequenceAutomaton::new(capacity),
            words: SequenceAutomaton::new(capacity),
            syllable_sights: RelationStore::new(relation_capacity),
            phase: Phase::Idle,
            learning_syllables: false,
            learning_words: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn syllables(&self) -> &SequenceAutomaton<SymbolId, Exemplar> {
        &self.syllables
    }

    pub fn words(&self) -> &SequenceAutomaton<SymbolId, Pattern> {
        &self.words
    }

    pub fn syllable_sights(&self) -> &RelationStore {
        &self.syllable_sights
    }

    /// Hearing exemplar of a stored syllable.
    pub fn syllable(&self, id: usize) -> Option<&Exemplar> {
        self.syllables.tail(id)
    }

    /// Sight pattern of a stored word.
    pub fn word(&self, id: usize) -> Option<&Pattern> {
        self.words.tail(id)
    }

    /// Syllable shown by a sight cell. Does not reinforce the binding.
    pub fn syllable_of_sight(&self, sight: SymbolId) -> Option<usize> {
        self.syllable_sights
            .records()
            .find(|r| r.sight_id() == sight)
            .map(|r| r.hearing_id())
    }

    pub fn sight_of_syllable(&self, syllable: usize) -> Option<SymbolId> {
        self.syllable_sights
            .records()
            .find(|r| r.hearing_id() == syllable)
            .map(|r| r.sight_id())
    }

    /// Bind a stored syllable to the sight cell that shows it.
    pub fn bind_syllable(&mut self, syllable: usize, sight: SymbolId) -> Result<bool> {
        if self.syllables.group(syllable).is_none() {
            return Err(MnemoError::InvalidArgument(format!(
                "no syllable with id {}",
                syllable
            )));
        }
        Ok(self.syllable_sights.learn(syllable, sight))
    }

    // --- Protocol ---

    pub fn begin(&mut self) -> Result<()> {
        self.syllables.begin()?;
        self.words.begin()?;
        self.learning_syllables = true;
        self.learning_words = true;
        self.phase = Phase::Stepping;
        Ok(())
    }

    pub fn step(&mut self, cue: ReadingCue) -> Result<()> {
        self.expect_stepping("STEP")?;
        match cue.hearing {
            Some(letter) if self.learning_syllables => self.syllables.step(letter)?,
            _ => self.learning_syllables = false,
        }
        match self.syllable_of_sight(cue.sight) {
            Some(syllable) if self.learning_words => self.words.step(syllable)?,
            _ => self.learning_words = false,
        }
        Ok(())
    }

    pub fn confirm(&mut self, cue: ReadingCue) -> Result<ReadingMatch> {
        self.expect_stepping("CONFIRM")?;
        self.phase = Phase::Idle;

        if let (Some(letter), true) = (cue.hearing, self.learning_syllables) {
            self.learning_words = false;
            return match self.syllables.confirm(letter)? {
                Confirmation::Recognized(id) => {
                    self.learning_syllables = false;
                    Ok(ReadingMatch::Syllable(id))
                }
                Confirmation::Unrecognized => {
                    self.phase = Phase::AwaitingCommit;
                    Ok(ReadingMatch::Unrecognized)
                }
            };
        }
        self.learning_syllables = false;

        if let (Some(syllable), true) = (self.syllable_of_sight(cue.sight), self.learning_words) {
            return match self.words.confirm(syllable)? {
                Confirmation::Recognized(id) => {
                    self.learning_words = false;
                    Ok(ReadingMatch::Word(id))
                }
                Confirmation::Unrecognized => {
                    self.phase = Phase::AwaitingCommit;
                    Ok(ReadingMatch::Unrecognized)
                }
            };
        }
        self.learning_words = false;
        Ok(ReadingMatch::Unrecognized)
    }

    /// Store the armed sequence: a word keeps `sight`, a syllable keeps
    /// `hearing`. A no-op unless the last CONFIRM armed a level.
    pub fn commit(&mut self, hearing: Exemplar, sight: Pattern) -> Result<Option<ReadingCommit>> {
        if self.phase != Phase::AwaitingCommit {
            return Ok(None);
        }
        let committed = if self.learning_words {
            self.words.commit(sight)?.map(ReadingCommit::Word)
        } else {
            self.syllables.commit(hearing)?.map(ReadingCommit::Syllable)
        };
        self.phase = Phase::Idle;
        self.learning_syllables = false;
        self.learning_words = false;
        if let Some(entry) = committed {
            tracing::debug!(?entry, "reading entry committed");
        }
        Ok(committed)
    }

    pub fn verify(&self) -> Result<()> {
        self.syllables.verify()?;
        self.words.verify()?;
        self.syllable_sights.verify()?;
        if let Some(r) = self
            .syllable_sights
            .records()
            .find(|r| self.syllables.group(r.hearing_id()).is_none())
        {
            return Err(MnemoError::InconsistentState(format!(
                "sight {} bound to unknown syllable {}",
                r.sight_id(),
                r.hearing_id()
            )));
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

impl Default for ReadingBlock {
    fn default() -> Self {
        Self::new(100, 100)
    }
}

impl Persistent for ReadingBlock {
    const KIND: &'static str = "reading";

    fn verify(&self) -> Result<()> {
        ReadingBlock::verify(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: SymbolId = 0;
    const A: SymbolId = 1;

    fn letter(sight: SymbolId, hearing: SymbolId) -> ReadingCue {
        ReadingCue {
            sight,
            hearing: Some(hearing),
        }
    }

    fn glyph(sight: SymbolId) -> ReadingCue {
        ReadingCue {
            sight,
            hearing: None,
        }
    }

    fn sound(label: &str) -> Exemplar {
        Exemplar::new(Pattern::from_data(vec![7, 7]), label)
    }

    /// Knows the syllable "ma" (letters m, a), shown by sight cell 20.
    fn knows_ma() -> ReadingBlock {
        let mut block = ReadingBlock::default();
        block.begin().unwrap();
        block.step(letter(10, M)).unwrap();
        assert_eq!(block.confirm(letter(11, A)).unwrap(), ReadingMatch::Unrecognized);
        assert_eq!(
            block.commit(sound("ma"), Pattern::zeros(2)).unwrap(),
            Some(ReadingCommit::Syllable(0))
        );
        assert!(block.bind_syllable(0, 20).unwrap());
        block
    }

    #[test]
    fn test_syllable_is_learned_then_recalled() {
        let mut block = knows_ma();
        assert!(block.words().is_empty());
        assert_eq!(block.syllable(0).unwrap().class_label(), "ma");
        assert_eq!(block.syllable_of_sight(20), Some(0));
        assert_eq!(block.sight_of_syllable(0), Some(20));
        assert_eq!(block.syllable_sights().len(), 1);

        block.begin().unwrap();
        block.step(letter(10, M)).unwrap();
        assert_eq!(block.confirm(letter(11, A)).unwrap(), ReadingMatch::Syllable(0));
        assert_eq!(block.commit(sound("x"), Pattern::zeros(2)).unwrap(), None);
        assert_eq!(block.syllables().len(), 1);
    }

    #[test]
    fn test_word_is_spelled_by_syllables() {
        let mut block = knows_ma();
        let mama = Pattern::from_data(vec![3, 4]);

        block.begin().unwrap();
        block.step(glyph(20)).unwrap();
        assert_eq!(block.confirm(glyph(20)).unwrap(), ReadingMatch::Unrecognized);
        assert_eq!(
            block.commit(sound("ignored"), mama.clone()).unwrap(),
            Some(ReadingCommit::Word(0))
        );
        assert_eq!(block.words().group(0).unwrap().symbols(), &[0, 0]);

        block.begin().unwrap();
        block.step(glyph(20)).unwrap();
        assert_eq!(block.confirm(glyph(20)).unwrap(), ReadingMatch::Word(0));
        assert_eq!(block.word(0), Some(&mama));
        assert_eq!(block.syllables().len(), 1);
    }

    #[test]
    fn test_unbound_glyph_stops_both_levels() {
        let mut block = knows_ma();
        block.begin().unwrap();
        block.step(glyph(99)).unwrap();
        assert_eq!(block.confirm(glyph(20)).unwrap(), ReadingMatch::Unrecognized);
        assert_eq!(block.commit(sound("x"), Pattern::zeros(2)).unwrap(), None);
        assert!(block.words().is_empty());
    }

    #[test]
    fn test_protocol_errors() {
        let mut block = ReadingBlock::default();
        assert!(matches!(block.step(glyph(0)), Err(MnemoError::Protocol(_))));
        assert!(matches!(block.confirm(glyph(0)), Err(MnemoError::Protocol(_))));
        assert_eq!(block.commit(sound("x"), Pattern::zeros(2)).unwrap(), None);
        assert!(matches!(
            block.bind_syllable(3, 1),
            Err(MnemoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_round_trip_keeps_both_levels() {
        let block = knows_ma();
        let mut restored = ReadingBlock::from_blob(&block.to_blob().unwrap()).unwrap();
        assert_eq!(restored.syllable_of_sight(20), Some(0));
        restored.begin().unwrap();
        restored.step(letter(10, M)).unwrap();
        assert_eq!(restored.confirm(letter(11, A)).unwrap(), ReadingMatch::Syllable(0));
    }
}
