//! Batched iteration over a [`WindowedDataset`].
//!
//! Shuffling is seeded, so a given seed always yields the same batch order.

use crate::core::dataset::{DatasetSample, WindowedDataset};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Default seed used when the caller does not supply one.
pub const DEFAULT_SEED: u64 = 42;

/// Batched, optionally shuffled view over a dataset.
pub struct DataLoader<'a> {
    dataset: &'a WindowedDataset,
    batch_size: usize,
    shuffle: bool,
    seed: u64,
}

impl<'a> DataLoader<'a> {
    /// Create a loader. A `batch_size` of zero is treated as one.
    pub fn new(dataset: &'a WindowedDataset, batch_size: usize, shuffle: bool) -> Self {
        Self {
            dataset,
            batch_size: batch_size.max(1),
            shuffle,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn dataset(&self) -> &'a WindowedDataset {
        self.dataset
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches per pass; the last one may be short.
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// Iterate batches of sample references.
    pub fn iter(&self) -> impl Iterator<Item = Vec<&'a DatasetSample>> + 'a {
        let mut indices: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            indices.shuffle(&mut rng);
        }

        // Indices are a permutation of 0..len, so direct indexing is in range.
        let samples = self.dataset.samples();
        let batches: Vec<Vec<usize>> = indices
            .chunks(self.batch_size)
            .map(<[usize]>::to_vec)
            .collect();
        batches
            .into_iter()
            .map(move |batch| batch.into_iter().map(move |i| &samples[i]).collect())
    }
}
