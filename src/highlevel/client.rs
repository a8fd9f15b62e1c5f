//! Convenience wrapper that owns every engine, restores them from a
//! [`BlobStore`] and saves them back after each learning step.
//!
//! For full control, import from [`kernel`](crate::kernel) and
//! [`memory`](crate::memory) directly.

use crate::config::{ClassifierConfig, MemoryConfig};
use crate::error::{MnemoError, Result};
use crate::kernel::{
    AmbiguityResolver, ClassifierNetwork, Exemplar, Pattern, Recognition, RelationStore,
    SequenceAutomaton, SymbolId,
};
use crate::memory::snapshot;
use crate::memory::{
    ArithmeticBlock, BlobStore, CountingNetwork, EpisodicMemory, ReadingBlock, ReadingCommit,
    ReadingCue, ReadingMatch, SensoryBlock,
};

use super::router::{Domain, DomainRouter, Response, Signal};

/// Blob names under which each engine is stored.
pub mod names {
    pub const SIGHT: &str = "sight";
    pub const HEARING: &str = "hearing";
    pub const RELATIONS: &str = "relations";
    pub const READING: &str = "reading";
    pub const ADDITION: &str = "addition";
    pub const COUNTING: &str = "counting";
    pub const ARITHMETIC: &str = "arithmetic";
    pub const EPISODES: &str = "episodes";
}

/// Role a recognized symbol plays in arithmetic input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatorRole {
    Add,
    Equal,
    Zero,
}

/// Result of [`Substrate::recognize`].
#[derive(Clone, Debug, PartialEq)]
pub enum Perception {
    /// Hearing id shown by the sight pattern
    Sight(Option<SymbolId>),
    /// Stored hearing exemplar on a HIT
    Hearing(Option<Exemplar>),
    /// Both patterns or neither were given
    Ignored,
}

/// The whole pattern-memory substrate behind one handle.
///
/// # Example
///
/// ```rust
/// use mnemo::config::{ClassifierConfig, MemoryConfig};
/// use mnemo::highlevel::Substrate;
/// use mnemo::kernel::{Exemplar, Pattern};
/// use mnemo::memory::MemoryStore;
///
/// let config = MemoryConfig {
///     sight: ClassifierConfig::with_pattern_size(2),
///     hearing: ClassifierConfig::with_pattern_size(2),
///     ..MemoryConfig::default()
/// };
/// let mut mind = Substrate::open(MemoryStore::new(), config).unwrap();
///
/// let (h, _) = mind
///     .learn_pair(Exemplar::new(Pattern::from_data(vec![1, 1]), "one"), Pattern::from_data(vec![5, 5]))
///     .unwrap();
/// assert_eq!(mind.recognize_sight(&Pattern::from_data(vec![6, 5])).unwrap(), Some(h));
/// ```
pub struct Substrate<S: BlobStore> {
    store: S,
    config: MemoryConfig,
    sensory: SensoryBlock,
    relations: RelationStore,
    resolver: AmbiguityResolver,
    reading: ReadingBlock,
    router: DomainRouter,
}

impl<S: BlobStore> Substrate<S> {
    /// Restore every engine from `store`, starting fresh where a blob is
    /// missing or unreadable.
    pub fn open(store: S, config: MemoryConfig) -> Result<Self> {
        config.validate()?;
        let sight = restore_classifier(&store, names::SIGHT, &config.sight)?;
        let hearing = restore_classifier(&store, names::HEARING, &config.hearing)?;
        let relations = snapshot::load_or_else(&store, names::RELATIONS, || {
            RelationStore::new(config.relations.capacity)
        });
        let seq = &config.sequences;
        let reading = snapshot::load_or_else(&store, names::READING, || {
            ReadingBlock::new(seq.capacity, config.relations.capacity)
        });
        let router = DomainRouter::from_parts(
            snapshot::load_or_else(&store, names::ADDITION, || SequenceAutomaton::from_config(seq)),
            snapshot::load_or_else(&store, names::COUNTING, CountingNetwork::new),
            snapshot::load_or_else(&store, names::ARITHMETIC, ArithmeticBlock::default),
            snapshot::load_or_else(&store, names::EPISODES, || EpisodicMemory::new(seq.capacity)),
        );
        tracing::info!(
            sight = sight.len(),
            hearing = hearing.len(),
            relations = relations.len(),
            "substrate opened"
        );
        Ok(Self {
            resolver: AmbiguityResolver::new(config.seed),
            sensory: SensoryBlock::from_networks(sight, hearing),
            relations,
            reading,
            router,
            store,
            config,
        })
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sensory(&self) -> &SensoryBlock {
        &self.sensory
    }

    pub fn relations(&self) -> &RelationStore {
        &self.relations
    }

    pub fn reading(&self) -> &ReadingBlock {
        &self.reading
    }

    pub fn router(&self) -> &DomainRouter {
        &self.router
    }

    /// Consume the substrate, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }

    // =========================================================================
    // Sensory learning
    // =========================================================================

    /// Learn a hearing exemplar with the sight pattern that shows it, and
    /// bind the two.
    pub fn learn_pair(&mut self, hearing: Exemplar, sight: Pattern) -> Result<(SymbolId, SymbolId)> {
        let (h, s) = self.sensory.learn_pair(hearing, sight)?;
        self.relations.learn(h, s);
        self.save_sensory()?;
        Ok((h, s))
    }

    /// Hearing id shown by `pattern`, if any.
    ///
    /// On DIFF the competing relations are resolved, the pattern is learned
    /// as a new view of the winner and bound to it.
    pub fn recognize_sight(&mut self, pattern: &Pattern) -> Result<Option<SymbolId>> {
        match self.sensory.recognize_sight(pattern)? {
            Recognition::Miss => Ok(None),
            Recognition::Hit => {
                let Some(sight_id) = self.sensory.sight().firing_ids().first().copied() else {
                    return Ok(None);
                };
                let records = self.relations.get_by_sight(sight_id);
                if records.is_empty() {
                    return Ok(None);
                }
                snapshot::save(&mut self.store, names::RELATIONS, &self.relations)?;
                self.resolver.resolve(&records).map(Some)
            }
            Recognition::Diff => {
                let mut candidates = Vec::new();
                for id in self.sensory.sight().firing_ids() {
                    candidates.extend(self.relations.get_by_sight(id));
                }
                if candidates.is_empty() {
                    return Ok(None);
                }
                let hearing_id = self.resolver.resolve(&candidates)?;
                let sight_id = self.sensory.learn_sight(pattern.clone(), hearing_id)?;
                self.relations.learn(hearing_id, sight_id);
                tracing::debug!(hearing_id, sight_id, "ambiguous sight resolved");
                self.save_sensory()?;
                Ok(Some(hearing_id))
            }
        }
    }

    /// Stored hearing exemplar matching `pattern` on a HIT.
    pub fn recognize_hearing(&mut self, pattern: &Pattern) -> Result<Option<Exemplar>> {
        self.sensory.recognize_hearing(pattern)?;
        Ok(self.sensory.hearing().hit_knowledge().cloned())
    }

    /// Recognize whichever modality was sensed. An all-zero pattern counts
    /// as not sensed; input on both modalities or neither is ignored.
    pub fn recognize(&mut self, sight: &Pattern, hearing: &Pattern) -> Result<Perception> {
        match (sight.is_null(), hearing.is_null()) {
            (false, true) => self.recognize_sight(sight).map(Perception::Sight),
            (true, false) => self.recognize_hearing(hearing).map(Perception::Hearing),
            _ => Ok(Perception::Ignored),
        }
    }

    /// Give the symbol shown by `pattern` an arithmetic role.
    pub fn bind_operator(&mut self, role: OperatorRole, pattern: &Pattern) -> Result<SymbolId> {
        let symbol = self.recognize_sight(pattern)?.ok_or_else(|| {
            MnemoError::InvalidArgument(format!("no known symbol for the {:?} operator", role))
        })?;
        let arithmetic = self.router.arithmetic_mut();
        match role {
            OperatorRole::Add => arithmetic.set_add(symbol),
            OperatorRole::Equal => arithmetic.set_equal(symbol),
            OperatorRole::Zero => arithmetic.set_zero(symbol),
        }
        snapshot::save(&mut self.store, names::ARITHMETIC, self.router.arithmetic())?;
        Ok(symbol)
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Start reading a syllable or a word.
    pub fn read_begin(&mut self) -> Result<()> {
        self.reading.begin()
    }

    /// Read one symbol. Returns `false`, leaving the cycle untouched, when
    /// `pattern` is not recognized as exactly one sight class.
    pub fn read_step(&mut self, pattern: &Pattern) -> Result<bool> {
        match self.reading_cue(pattern)? {
            Some(cue) => self.reading.step(cue).map(|()| true),
            None => Ok(false),
        }
    }

    /// Read the last symbol. `None` when `pattern` is not recognized.
    pub fn read_confirm(&mut self, pattern: &Pattern) -> Result<Option<ReadingMatch>> {
        match self.reading_cue(pattern)? {
            Some(cue) => self.reading.confirm(cue).map(Some),
            None => Ok(None),
        }
    }

    /// Store what was read. A new word keeps `sight` as its image; a new
    /// syllable keeps `hearing` as its sound and is bound to the sight cell
    /// showing `sight`, which is learned if no single cell shows it yet.
    pub fn read_commit(&mut self, hearing: Exemplar, sight: Pattern) -> Result<Option<ReadingCommit>> {
        let committed = self.reading.commit(hearing, sight.clone())?;
        match committed {
            Some(ReadingCommit::Syllable(syllable)) => {
                let sight_id = match self.sensory.recognize_sight(&sight)? {
                    Recognition::Hit => self.sensory.sight().firing_ids().first().copied(),
                    _ => None,
                };
                let sight_id = match sight_id {
                    Some(id) => id,
                    None => self.learn_syllable_sight(syllable, sight)?,
                };
                self.reading.bind_syllable(syllable, sight_id)?;
                tracing::debug!(syllable, sight_id, "syllable bound to sight");
                self.save_sensory()?;
                snapshot::save(&mut self.store, names::READING, &self.reading)?;
            }
            Some(ReadingCommit::Word(_)) => {
                snapshot::save(&mut self.store, names::READING, &self.reading)?;
            }
            None => {}
        }
        Ok(committed)
    }

    fn learn_syllable_sight(&mut self, syllable: usize, sight: Pattern) -> Result<SymbolId> {
        let net = self.sensory.sight_mut();
        net.learn(Exemplar::new(sight, format!("syll_{}", syllable)))?;
        net.last_learned_id().ok_or_else(|| {
            MnemoError::InconsistentState("sight network learned no cell".into())
        })
    }

    /// Sight id and bound hearing id of a cleanly recognized symbol.
    fn reading_cue(&mut self, pattern: &Pattern) -> Result<Option<ReadingCue>> {
        if self.sensory.recognize_sight(pattern)? != Recognition::Hit {
            return Ok(None);
        }
        let Some(sight) = self.sensory.sight().firing_ids().first().copied() else {
            return Ok(None);
        };
        let hearing = self
            .relations
            .records()
            .find(|r| r.sight_id() == sight)
            .map(|r| r.hearing_id());
        Ok(Some(ReadingCue { sight, hearing }))
    }

    // =========================================================================
    // Sequences
    // =========================================================================

    /// Deliver `signal` to `domain`, saving the domain after a commit.
    pub fn signal(&mut self, domain: Domain, signal: Signal) -> Result<Response> {
        self.router.set_domain(domain);
        let response = self.router.dispatch(signal)?;
        if let Response::Committed(Some(_)) = response {
            self.save_domain(domain)?;
        }
        Ok(response)
    }

    /// Episodes in which any of `triggers` took part.
    pub fn retrieve_memories(&self, triggers: &[SymbolId]) -> Vec<usize> {
        self.router.episodes().retrieve_memories(triggers)
    }

    /// Store `triggers -> outcome` as an episode.
    pub fn record_episode(&mut self, triggers: &[SymbolId], outcome: SymbolId) -> Result<Option<usize>> {
        let id = self.router.episodes_mut().record(triggers, outcome)?;
        if id.is_some() {
            self.save_domain(Domain::Episodes)?;
        }
        Ok(id)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    pub fn save_all(&mut self) -> Result<()> {
        self.save_sensory()?;
        snapshot::save(&mut self.store, names::READING, &self.reading)?;
        for domain in [Domain::Addition, Domain::Counting, Domain::Episodes] {
            self.save_domain(domain)?;
        }
        snapshot::save(&mut self.store, names::ARITHMETIC, self.router.arithmetic())
    }

    fn save_sensory(&mut self) -> Result<()> {
        snapshot::save(&mut self.store, names::SIGHT, self.sensory.sight())?;
        snapshot::save(&mut self.store, names::HEARING, self.sensory.hearing())?;
        snapshot::save(&mut self.store, names::RELATIONS, &self.relations)
    }

    fn save_domain(&mut self, domain: Domain) -> Result<()> {
        let store = &mut self.store;
        match domain {
            Domain::Addition => snapshot::save(store, names::ADDITION, self.router.addition()),
            Domain::Counting => snapshot::save(store, names::COUNTING, self.router.counting()),
            Domain::Episodes => snapshot::save(store, names::EPISODES, self.router.episodes()),
        }
    }
}

/// Restored classifier, or a fresh one when the blob is absent, unreadable
/// or shaped for a different pattern size.
fn restore_classifier<S: BlobStore>(
    store: &S,
    name: &str,
    config: &ClassifierConfig,
) -> Result<ClassifierNetwork> {
    match snapshot::load::<ClassifierNetwork, S>(store, name) {
        Ok(Some(net)) if net.pattern_size() == config.pattern_size => return Ok(net),
        Ok(Some(net)) => tracing::warn!(
            name,
            stored = net.pattern_size(),
            configured = config.pattern_size,
            "discarding classifier with a different pattern size"
        ),
        Ok(None) => {}
        Err(e) => tracing::warn!(name, error = %e, "discarding unreadable snapshot"),
    }
    ClassifierNetwork::from_config(config)
}
