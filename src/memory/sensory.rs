//! Paired sight/hearing classifiers.
//!
//! Hearing exemplars carry the user's class label. A sight pattern is always
//! learned with the *hearing id* it was paired with as its class, so sight
//! cells can be traced back to the word they stand for.

use crate::config::ClassifierConfig;
use crate::error::{MnemoError, Result};
use crate::kernel::{ClassifierNetwork, Exemplar, Pattern, Recognition, SymbolId};

/// Two classifiers, one per modality.
#[derive(Clone, Debug)]
pub struct SensoryBlock {
    sight: ClassifierNetwork,
    hearing: ClassifierNetwork,
}

impl SensoryBlock {
    pub fn new(sight: &ClassifierConfig, hearing: &ClassifierConfig) -> Result<Self> {
        Ok(Self {
            sight: ClassifierNetwork::from_config(sight)?,
            hearing: ClassifierNetwork::from_config(hearing)?,
        })
    }

    /// Wrap networks restored elsewhere.
    pub fn from_networks(sight: ClassifierNetwork, hearing: ClassifierNetwork) -> Self {
        Self { sight, hearing }
    }

    pub fn sight(&self) -> &ClassifierNetwork {
        &self.sight
    }

    pub fn hearing(&self) -> &ClassifierNetwork {
        &self.hearing
    }

    pub fn sight_mut(&mut self) -> &mut ClassifierNetwork {
        &mut self.sight
    }

    pub fn hearing_mut(&mut self) -> &mut ClassifierNetwork {
        &mut self.hearing
    }

    /// Learn a hearing exemplar and the sight pattern paired with it.
    ///
    /// Returns `(hearing_id, sight_id)`, the cells that now stand for the
    /// pair (fresh or already present).
    pub fn learn_pair(&mut self, hearing: Exemplar, sight: Pattern) -> Result<(SymbolId, SymbolId)> {
        self.hearing.learn(hearing)?;
        let hearing_id = self
            .hearing
            .last_learned_id()
            .ok_or_else(|| MnemoError::InconsistentState("hearing learned no cell".into()))?;
        let sight_id = self.learn_sight(sight, hearing_id)?;
        tracing::debug!(hearing_id, sight_id, "pair learned");
        Ok((hearing_id, sight_id))
    }

    /// Learn a sight pattern as a view of `hearing_id`.
    pub fn learn_sight(&mut self, sight: Pattern, hearing_id: SymbolId) -> Result<SymbolId> {
        self.sight.learn(Exemplar::new(sight, hearing_id.to_string()))?;
        self.sight
            .last_learned_id()
            .ok_or_else(|| MnemoError::InconsistentState("sight learned no cell".into()))
    }

    pub fn recognize_sight(&mut self, pattern: &Pattern) -> Result<Recognition> {
        self.sight.recognize(pattern)
    }

    pub fn recognize_hearing(&mut self, pattern: &Pattern) -> Result<Recognition> {
        self.hearing.recognize(pattern)
    }

    pub fn hearing_knowledge(&self, id: SymbolId) -> Option<&Exemplar> {
        self.hearing.knowledge(id)
    }

    pub fn sight_knowledge(&self, id: SymbolId) -> Option<&Exemplar> {
        self.sight.knowledge(id)
    }

    /// Hearing id a sight cell was learned for.
    pub fn hearing_of_sight(&self, sight_id: SymbolId) -> Option<SymbolId> {
        self.sight
            .knowledge(sight_id)
            .and_then(|e| e.class_label().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(size: usize) -> ClassifierConfig {
        ClassifierConfig::with_pattern_size(size)
    }

    fn p(v: &[i32]) -> Pattern {
        Pattern::from_data(v.to_vec())
    }

    #[test]
    fn test_learn_pair_links_sight_to_hearing() {
        let mut block = SensoryBlock::new(&cfg(2), &cfg(3)).unwrap();
        let (h, s) = block
            .learn_pair(Exemplar::new(p(&[1, 2, 3]), "one"), p(&[5, 5]))
            .unwrap();
        assert_eq!((h, s), (0, 0));
        assert_eq!(block.sight_knowledge(s).unwrap().class_label(), "0");
        assert_eq!(block.hearing_of_sight(s), Some(h));
        assert_eq!(block.hearing_knowledge(h).unwrap().class_label(), "one");
    }

    #[test]
    fn test_relearning_pair_reuses_cells() {
        let mut block = SensoryBlock::new(&cfg(2), &cfg(3)).unwrap();
        let first = block
            .learn_pair(Exemplar::new(p(&[1, 2, 3]), "one"), p(&[5, 5]))
            .unwrap();
        let again = block
            .learn_pair(Exemplar::new(p(&[1, 2, 4]), "one"), p(&[5, 6]))
            .unwrap();
        assert_eq!(first, again);
        assert_eq!(block.sight().len(), 1);
        assert_eq!(block.hearing().len(), 1);
    }

    #[test]
    fn test_two_words() {
        let mut block = SensoryBlock::new(&cfg(2), &cfg(3)).unwrap();
        block
            .learn_pair(Exemplar::new(p(&[0, 0, 0]), "one"), p(&[0, 0]))
            .unwrap();
        let (h, s) = block
            .learn_pair(Exemplar::new(p(&[90, 90, 90]), "two"), p(&[90, 90]))
            .unwrap();
        assert_eq!((h, s), (1, 1));

        assert_eq!(block.recognize_sight(&p(&[89, 91])).unwrap(), Recognition::Hit);
        assert_eq!(block.sight().firing_ids(), vec![1]);
        assert_eq!(block.recognize_hearing(&p(&[300, 0, 0])).unwrap(), Recognition::Miss);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let mut block = SensoryBlock::new(&cfg(2), &cfg(3)).unwrap();
        assert!(matches!(
            block.learn_pair(Exemplar::new(p(&[1]), "x"), p(&[1, 1])),
            Err(MnemoError::PatternLength { .. })
        ));
    }
}
