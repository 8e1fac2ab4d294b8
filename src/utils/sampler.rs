//! # Weighted Sampling
//!
//! Cumulative-weight table for unbiased weighted choice in `O(log n)`.

use crate::{CryptError, CryptResult};
use rand::Rng;

#[derive(Debug, Clone)]
struct Entry<T> {
    cumulative: u64,
    value: T,
}

/// Weighted random selection over a growing set of values.
///
/// # Examples
///
/// ```
/// use cryptgen::WeightedSampler;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut sampler = WeightedSampler::new();
/// sampler.add(1, "rare");
/// sampler.add(0, "never");
/// sampler.add(9, "common");
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let pick = sampler.sample(&mut rng).unwrap();
/// assert_ne!(*pick, "never");
/// ```
#[derive(Debug, Clone)]
pub struct WeightedSampler<T> {
    entries: Vec<Entry<T>>,
    total_weight: u64,
}

impl<T> WeightedSampler<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            total_weight: 0,
        }
    }

    /// Adds `value` with the given weight. Non-positive weights are ignored.
    pub fn add(&mut self, weight: i64, value: T) {
        if weight <= 0 {
            return;
        }

        self.total_weight += weight as u64;
        self.entries.push(Entry {
            cumulative: self.total_weight,
            value,
        });
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draws a value with probability proportional to its weight.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> CryptResult<&T> {
        if self.entries.is_empty() {
            return Err(CryptError::EmptyCollection(
                "weighted sampler has no entries".to_string(),
            ));
        }

        let draw = rng.gen_range(1..=self.total_weight);
        Ok(&self.entries[self.search(draw)].value)
    }

    /// Index of the first entry whose cumulative weight reaches `draw`.
    fn search(&self, draw: u64) -> usize {
        self.entries.partition_point(|entry| entry.cumulative < draw)
    }
}

impl<T> Default for WeightedSampler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(i64, T)> for WeightedSampler<T> {
    fn from_iter<I: IntoIterator<Item = (i64, T)>>(iter: I) -> Self {
        let mut sampler = Self::new();
        for (weight, value) in iter {
            sampler.add(weight, value);
        }
        sampler
    }
}
