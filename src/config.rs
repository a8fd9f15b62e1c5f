//! Configuration for the memory engines.
//!
//! Aggregates per-engine settings into a single [`MemoryConfig`] that can be
//! loaded from JSON. Every struct has a `Default` matching the 16x16 bitmap
//! front-end (64 nibble-sized pattern components).

use serde::{Deserialize, Serialize};

use crate::error::{MnemoError, Result};

/// Adaptive classifier network parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Number of integer components in every pattern.
    pub pattern_size: usize,
    /// Initial number of cell slots.
    pub capacity: usize,
    /// Radius given to cells inserted on MISS.
    pub default_radius: f64,
    /// A cell whose radius falls to or below this bound is degraded.
    pub min_radius: f64,
    /// A cell whose radius grows beyond this bound is degraded.
    pub max_radius: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            pattern_size: 64,
            capacity: 100,
            // (1/3) * 2^8 for byte-sized components
            default_radius: 24.0,
            min_radius: 1.0,
            max_radius: 50.0,
        }
    }
}

impl ClassifierConfig {
    /// Config with the given pattern size and default bounds.
    pub fn with_pattern_size(pattern_size: usize) -> Self {
        Self {
            pattern_size,
            ..Self::default()
        }
    }

    /// Check that the default radius lies inside the live range.
    pub fn validate(&self) -> Result<()> {
        if self.pattern_size == 0 {
            return Err(MnemoError::InvalidArgument(
                "pattern_size must be positive".into(),
            ));
        }
        if !(self.min_radius >= 0.0 && self.min_radius < self.max_radius) {
            return Err(MnemoError::InvalidArgument(format!(
                "radius bounds must satisfy 0 <= min < max, got [{}, {}]",
                self.min_radius, self.max_radius
            )));
        }
        if !(self.default_radius > self.min_radius && self.default_radius <= self.max_radius) {
            return Err(MnemoError::InvalidArgument(format!(
                "default_radius {} outside ({}, {}]",
                self.default_radius, self.min_radius, self.max_radius
            )));
        }
        Ok(())
    }
}

/// Relation store parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationConfig {
    pub capacity: usize,
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

/// Sequence automaton parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub capacity: usize,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

/// Full configuration for a [`Substrate`](crate::highlevel::Substrate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Sight modality classifier
    pub sight: ClassifierConfig,
    /// Hearing modality classifier
    pub hearing: ClassifierConfig,
    /// Sight/hearing relation store
    pub relations: RelationConfig,
    /// Per-domain sequence automata
    pub sequences: SequenceConfig,
    /// Seed for the ambiguity resolver's coin.
    pub seed: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            sight: ClassifierConfig::default(),
            hearing: ClassifierConfig::default(),
            relations: RelationConfig::default(),
            sequences: SequenceConfig::default(),
            seed: 0,
        }
    }
}

impl MemoryConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.sight.validate()?;
        self.hearing.validate()
    }
}
