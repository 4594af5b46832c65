//! Seeded random sampling of observations

use crate::data::{Table, Value};
use crate::error::Result;
use crate::selection::{check_labels, clamp_count, Selection};
use rand::prelude::*;
use rand::seq::index;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_SIZE: usize = 15;
pub const DEFAULT_SEED: u64 = 42;

/// Uniform sampler without replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSelector {
    /// Number of rows to draw
    n: usize,
    /// Random seed
    seed: u64,
}

impl SampleSelector {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            seed: DEFAULT_SEED,
        }
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw rows (and aligned labels) in draw order
    pub fn select(&self, data: &Table, labels: Option<&[Value]>) -> Result<Selection> {
        check_labels(data, labels)?;
        let n = clamp_count(self.n, data.n_rows());

        let mut rng = StdRng::seed_from_u64(self.seed);
        let indices = index::sample(&mut rng, data.n_rows(), n).into_vec();

        Selection::from_indices(data, labels, indices)
    }
}

impl Default for SampleSelector {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SIZE)
    }
}

/// Draw `n` distinct rows uniformly at random with a fixed seed
pub fn select_sample(data: &Table, labels: Option<&[Value]>, n: usize, seed: u64) -> Result<Selection> {
    SampleSelector::new(n).with_seed(seed).select(data, labels)
}
