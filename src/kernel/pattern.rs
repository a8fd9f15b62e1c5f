//! Pattern type: a fixed-length integer vector encoding a sensed bitmap.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A sensed pattern. Length is checked against the owning network.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern {
    data: Vec<i32>,
}

impl Pattern {
    /// Create a zero pattern of given length.
    pub fn zeros(len: usize) -> Self {
        Self { data: vec![0; len] }
    }

    pub fn from_data(data: Vec<i32>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[i32] {
        &self.data
    }

    /// True when every component is zero (no input on this modality).
    pub fn is_null(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// L1 distance. Callers guarantee equal lengths.
    pub fn manhattan(&self, other: &Pattern) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| (a as i64 - b as i64).unsigned_abs())
            .sum::<u64>() as f64
    }
}

impl From<Vec<i32>> for Pattern {
    fn from(data: Vec<i32>) -> Self {
        Self::from_data(data)
    }
}

impl Index<usize> for Pattern {
    type Output = i32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}
