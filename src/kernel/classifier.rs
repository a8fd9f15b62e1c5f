//! Adaptive nearest-center classifier.
//!
//! Every learned exemplar is a [`PatternCell`]: a stored pattern with a
//! class/set tag and an adaptive radius. A pattern is recognized by the cells
//! whose Manhattan distance to it is strictly below their radius.
//!
//! Learning is online and local. Class boundaries are carved by contracting
//! the radius of cells that fire on a pattern of another class; a radius that
//! leaves `(min_radius, max_radius]` degrades the cell for good.
//!
//! # Example
//!
//! ```rust
//! use mnemo::config::ClassifierConfig;
//! use mnemo::kernel::{ClassifierNetwork, Exemplar, Pattern, Recognition};
//!
//! let cfg = ClassifierConfig {
//!     pattern_size: 1,
//!     capacity: 2,
//!     default_radius: 5.0,
//!     ..ClassifierConfig::default()
//! };
//! let mut net = ClassifierNetwork::from_config(&cfg).unwrap();
//!
//! net.learn(Exemplar::new(Pattern::from_data(vec![0]), "A")).unwrap();
//! assert_eq!(net.recognize(&Pattern::from_data(vec![1])).unwrap(), Recognition::Hit);
//! assert_eq!(net.recognize(&Pattern::from_data(vec![9])).unwrap(), Recognition::Miss);
//! ```

use serde::{Deserialize, Serialize};

use super::arena::SlotArena;
use super::pattern::Pattern;
use crate::config::ClassifierConfig;
use crate::error::{MnemoError, Result};

/// Set label given to exemplars learned without one.
pub const NO_SET: &str = "NoSet";

/// Outcome of a recognition pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recognition {
    /// All firing cells agree on `(class, set)`
    Hit,
    /// No cell fired
    Miss,
    /// Firing cells disagree
    Diff,
}

/// A pattern tagged with an opaque class label and set label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exemplar {
    pattern: Pattern,
    class_label: String,
    set_label: String,
}

impl Exemplar {
    pub fn new(pattern: Pattern, class_label: impl Into<String>) -> Self {
        Self::with_set(pattern, class_label, NO_SET)
    }

    pub fn with_set(
        pattern: Pattern,
        class_label: impl Into<String>,
        set_label: impl Into<String>,
    ) -> Self {
        Self {
            pattern,
            class_label: class_label.into(),
            set_label: set_label.into(),
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn class_label(&self) -> &str {
        &self.class_label
    }

    pub fn set_label(&self) -> &str {
        &self.set_label
    }
}

/// Live radius range `(min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadiusBounds {
    pub min: f64,
    pub max: f64,
}

impl RadiusBounds {
    pub fn contains(&self, radius: f64) -> bool {
        radius > self.min && radius <= self.max
    }
}

/// One stored exemplar acting as a class center.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternCell {
    exemplar: Exemplar,
    radius: f64,
    degraded: bool,
}

impl PatternCell {
    /// A cell whose starting radius is already outside `bounds` is born degraded.
    pub fn new(exemplar: Exemplar, radius: f64, bounds: RadiusBounds) -> Self {
        Self {
            exemplar,
            radius,
            degraded: !bounds.contains(radius),
        }
    }

    pub fn exemplar(&self) -> &Exemplar {
        &self.exemplar
    }

    pub fn class_label(&self) -> &str {
        self.exemplar.class_label()
    }

    pub fn set_label(&self) -> &str {
        self.exemplar.set_label()
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Distance to `pattern` if this cell fires on it.
    pub fn fires(&self, pattern: &Pattern) -> Option<f64> {
        if self.degraded {
            return None;
        }
        let distance = self.exemplar.pattern.manhattan(pattern);
        (distance < self.radius).then_some(distance)
    }

    /// Contract the radius. Returns `false` if the cell is degraded afterwards.
    pub fn shrink_by(&mut self, delta: f64, bounds: RadiusBounds) -> Result<bool> {
        if !(delta >= 0.0) {
            return Err(MnemoError::InvalidArgument(format!(
                "radius delta must be non-negative, got {}",
                delta
            )));
        }
        if delta > self.radius {
            return Err(MnemoError::InvalidArgument(format!(
                "radius delta {} exceeds radius {}",
                delta, self.radius
            )));
        }
        self.radius -= delta;
        if self.radius <= bounds.min {
            self.degraded = true;
        }
        Ok(!self.degraded)
    }

    /// Widen the radius. Growth past the upper bound degrades the cell.
    pub fn grow_by(&mut self, delta: f64, bounds: RadiusBounds) -> Result<bool> {
        if !(delta >= 0.0) {
            return Err(MnemoError::InvalidArgument(format!(
                "radius delta must be non-negative, got {}",
                delta
            )));
        }
        self.radius += delta;
        if self.radius > bounds.max {
            self.degraded = true;
        }
        Ok(!self.degraded)
    }
}

/// A cell that fired during the last recognition pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Firing {
    pub id: usize,
    pub distance: f64,
}

/// Growable network of [`PatternCell`]s.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassifierNetwork {
    pattern_size: usize,
    default_radius: f64,
    bounds: RadiusBounds,
    cells: SlotArena<PatternCell>,
    firing: Vec<Firing>,
    state: Recognition,
    last_learned: Option<usize>,
}

impl ClassifierNetwork {
    /// Create with explicit parameters and the default radius bounds.
    pub fn new(pattern_size: usize, capacity: usize, default_radius: f64) -> Result<Self> {
        Self::from_config(&ClassifierConfig {
            pattern_size,
            capacity,
            default_radius,
            ..ClassifierConfig::default()
        })
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pattern_size: config.pattern_size,
            default_radius: config.default_radius,
            bounds: RadiusBounds {
                min: config.min_radius,
                max: config.max_radius,
            },
            cells: SlotArena::with_capacity(config.capacity),
            firing: Vec::new(),
            state: Recognition::Miss,
            last_learned: None,
        })
    }

    // --- Accessors ---

    pub fn pattern_size(&self) -> usize {
        self.pattern_size
    }

    pub fn default_radius(&self) -> f64 {
        self.default_radius
    }

    pub fn bounds(&self) -> RadiusBounds {
        self.bounds
    }

    /// Number of learned cells (degraded ones included).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cells.capacity()
    }

    /// Slot the next inserted cell will occupy.
    pub fn ready_index(&self) -> usize {
        self.cells.ready_index()
    }

    /// State of the last recognition pass.
    pub fn state(&self) -> Recognition {
        self.state
    }

    /// Cells that fired during the last recognition pass.
    pub fn firing(&self) -> &[Firing] {
        &self.firing
    }

    pub fn firing_ids(&self) -> Vec<usize> {
        self.firing.iter().map(|f| f.id).collect()
    }

    /// Id of the cell affected by the last `learn`.
    pub fn last_learned_id(&self) -> Option<usize> {
        self.last_learned
    }

    pub fn cell(&self, id: usize) -> Option<&PatternCell> {
        self.cells.get(id)
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, &PatternCell)> {
        self.cells.iter()
    }

    /// Exemplar stored by a live (non-degraded) cell.
    pub fn knowledge(&self, id: usize) -> Option<&Exemplar> {
        self.cells
            .get(id)
            .filter(|c| !c.is_degraded())
            .map(|c| c.exemplar())
    }

    /// Exemplar of the first firing cell, if the last pass was a HIT.
    pub fn hit_knowledge(&self) -> Option<&Exemplar> {
        if self.state != Recognition::Hit {
            return None;
        }
        self.firing.first().and_then(|f| self.knowledge(f.id))
    }

    // --- Core methods ---

    /// Classify `pattern` against every live cell.
    ///
    /// Calling this twice with no `learn` in between yields identical results.
    pub fn recognize(&mut self, pattern: &Pattern) -> Result<Recognition> {
        self.check_len(pattern)?;

        let mut firing = Vec::new();
        for (id, cell) in self.cells.iter() {
            if cell.is_degraded() {
                continue;
            }
            if !self.bounds.contains(cell.radius()) {
                return Err(MnemoError::InconsistentState(format!(
                    "cell {} is live with radius {} outside ({}, {}]",
                    id,
                    cell.radius(),
                    self.bounds.min,
                    self.bounds.max
                )));
            }
            if let Some(distance) = cell.fires(pattern) {
                firing.push(Firing { id, distance });
            }
        }

        self.state = match firing.first() {
            None => Recognition::Miss,
            Some(first) => {
                let head = self.cells.get(first.id).map(|c| c.exemplar());
                let agree = firing.iter().all(|f| {
                    let other = self.cells.get(f.id).map(|c| c.exemplar());
                    match (head, other) {
                        (Some(h), Some(o)) => {
                            h.class_label() == o.class_label() && h.set_label() == o.set_label()
                        }
                        _ => false,
                    }
                });
                if agree {
                    Recognition::Hit
                } else {
                    Recognition::Diff
                }
            }
        };
        self.firing = firing;
        Ok(self.state)
    }

    /// Learn an exemplar, carving class boundaries as needed.
    pub fn learn(&mut self, exemplar: Exemplar) -> Result<bool> {
        match self.recognize(exemplar.pattern())? {
            Recognition::Miss => {
                self.insert(exemplar, self.default_radius);
                Ok(true)
            }
            Recognition::Diff => {
                let mut target_present = false;
                for firing in self.firing.clone() {
                    let same_class = self
                        .cells
                        .get(firing.id)
                        .map_or(false, |c| c.class_label() == exemplar.class_label());
                    if same_class {
                        self.last_learned = Some(firing.id);
                        target_present = true;
                    } else {
                        self.contract(firing)?;
                    }
                }
                if !target_present {
                    self.insert(exemplar, self.default_radius);
                }
                Ok(true)
            }
            Recognition::Hit => {
                let recognized = self.firing.first().copied();
                let recognized_class = recognized
                    .and_then(|f| self.cells.get(f.id))
                    .map(|c| c.class_label().to_string());
                if recognized_class.as_deref() == Some(exemplar.class_label()) {
                    self.last_learned = recognized.map(|f| f.id);
                } else {
                    let mut min_distance = self.default_radius;
                    for firing in self.firing.clone() {
                        self.contract(firing)?;
                        if firing.distance < min_distance {
                            min_distance = firing.distance;
                        }
                    }
                    self.insert(exemplar, min_distance);
                }
                Ok(true)
            }
        }
    }

    /// Widen a cell's radius. Returns `false` if the cell degraded.
    pub fn grow_radius(&mut self, id: usize, delta: f64) -> Result<bool> {
        let bounds = self.bounds;
        let cell = self
            .cells
            .get_mut(id)
            .ok_or_else(|| MnemoError::InvalidArgument(format!("no cell with id {}", id)))?;
        let live = cell.grow_by(delta, bounds)?;
        if !live {
            tracing::debug!(id, radius = cell.radius(), "cell degraded by growth");
        }
        Ok(live)
    }

    /// Check every invariant a restored network must satisfy.
    pub fn verify(&self) -> Result<()> {
        self.cells.verify()?;
        for (id, cell) in self.cells.iter() {
            if cell.exemplar().pattern().len() != self.pattern_size {
                return Err(MnemoError::InconsistentState(format!(
                    "cell {} holds a pattern of length {}, network expects {}",
                    id,
                    cell.exemplar().pattern().len(),
                    self.pattern_size
                )));
            }
            if !cell.is_degraded() && !self.bounds.contains(cell.radius()) {
                return Err(MnemoError::InconsistentState(format!(
                    "cell {} is live with radius {}",
                    id,
                    cell.radius()
                )));
            }
        }
        if let Some(f) = self.firing.iter().find(|f| f.id >= self.cells.len()) {
            return Err(MnemoError::InconsistentState(format!(
                "firing id {} beyond learned cells",
                f.id
            )));
        }
        Ok(())
    }

    // --- Private helpers ---

    fn check_len(&self, pattern: &Pattern) -> Result<()> {
        if pattern.len() != self.pattern_size {
            return Err(MnemoError::PatternLength {
                expected: self.pattern_size,
                got: pattern.len(),
            });
        }
        Ok(())
    }

    /// Shrink a firing cell's radius down to its firing distance.
    fn contract(&mut self, firing: Firing) -> Result<()> {
        let bounds = self.bounds;
        if let Some(cell) = self.cells.get_mut(firing.id) {
            let delta = cell.radius() - firing.distance;
            if !cell.shrink_by(delta, bounds)? {
                tracing::debug!(id = firing.id, radius = cell.radius(), "cell degraded by contraction");
            }
        }
        Ok(())
    }

    fn insert(&mut self, exemplar: Exemplar, radius: f64) {
        let cell = PatternCell::new(exemplar, radius, self.bounds);
        let degraded = cell.is_degraded();
        let id = self.cells.push(cell);
        self.last_learned = Some(id);
        tracing::debug!(id, radius, degraded, capacity = self.cells.capacity(), "cell learned");
    }
}
