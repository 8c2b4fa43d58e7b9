//! Uniform sampling of record positions without replacement.
//!
//! A run draws a uniformly random permutation of `0..population` (Fisher-Yates,
//! via `SliceRandom::shuffle`) and keeps its prefix. Every subset of the
//! requested size is equally likely.
//!
//! Requests larger than the population are clamped to the population size.
//! `*_with_rng` entry points exist for deterministic tests.

use chrono::Utc;
use indexmap::IndexSet;
use rand::prelude::*;
use tracing::warn;

use crate::errors::MenuError;

/// Distinct record positions drawn from `[0, population)`.
///
/// Iteration follows draw order; membership checks are O(1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleIndexSet {
    population: usize,
    positions: IndexSet<usize>,
}

impl SampleIndexSet {
    /// Build a set from explicit positions.
    ///
    /// Duplicates collapse; any position outside `[0, population)` is rejected.
    pub fn from_positions<I>(population: usize, positions: I) -> Result<Self, MenuError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut collected = IndexSet::new();
        for position in positions {
            if position >= population {
                return Err(MenuError::Configuration(format!(
                    "sample position {position} is outside a population of {population}"
                )));
            }
            collected.insert(position);
        }
        Ok(Self {
            population,
            positions: collected,
        })
    }

    /// Population size the positions were drawn from.
    pub fn population(&self) -> usize {
        self.population
    }

    /// Whether `position` was drawn.
    pub fn contains(&self, position: usize) -> bool {
        self.positions.contains(&position)
    }

    /// Number of drawn positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when nothing was drawn.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions in draw order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().copied()
    }

    /// Positions in ascending order.
    pub fn sorted(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self.iter().collect();
        positions.sort_unstable();
        positions
    }
}

/// Effective sample size after clamping to the population.
pub fn effective_sample_size(population: usize, requested: usize) -> usize {
    requested.min(population)
}

/// Sample positions using an RNG seeded from the wall clock.
pub fn sample_indices(population: usize, requested: usize) -> SampleIndexSet {
    let mut rng = run_rng(None);
    sample_indices_with_rng(population, requested, &mut rng)
}

/// Sample positions using a caller-supplied RNG.
pub fn sample_indices_with_rng<R: Rng + ?Sized>(
    population: usize,
    requested: usize,
    rng: &mut R,
) -> SampleIndexSet {
    let take = effective_sample_size(population, requested);
    if take < requested {
        warn!(
            "[weekly_menu:sampler] requested {} recipes but only {} are available; selecting all of them",
            requested, population
        );
    }
    let mut permutation: Vec<usize> = (0..population).collect();
    permutation.shuffle(rng);
    permutation.truncate(take);
    SampleIndexSet {
        population,
        positions: permutation.into_iter().collect(),
    }
}

/// RNG for one run: seeded explicitly, or from the current time so that
/// consecutive runs pick different recipes.
pub fn run_rng(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(clock_seed))
}

fn clock_seed() -> u64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .map(|nanos| nanos as u64)
        .unwrap_or_else(|| now.timestamp() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_population_yields_empty_sample() {
        let mut rng = StdRng::seed_from_u64(1);
        let sample = sample_indices_with_rng(0, 0, &mut rng);
        assert!(sample.is_empty());
        assert_eq!(sample.population(), 0);
    }

    #[test]
    fn full_sample_covers_population() {
        let mut rng = StdRng::seed_from_u64(2);
        let sample = sample_indices_with_rng(9, 9, &mut rng);
        assert_eq!(sample.sorted(), (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn oversized_request_is_clamped() {
        let mut rng = StdRng::seed_from_u64(3);
        let sample = sample_indices_with_rng(5, 7, &mut rng);
        assert_eq!(sample.len(), 5);
        assert_eq!(sample.sorted(), vec![0, 1, 2, 3, 4]);
        assert_eq!(effective_sample_size(5, 7), 5);
    }

    #[test]
    fn same_seed_draws_same_positions() {
        let first = sample_indices_with_rng(50, 7, &mut run_rng(Some(11)));
        let second = sample_indices_with_rng(50, 7, &mut run_rng(Some(11)));
        assert_eq!(first, second);
    }

    #[test]
    fn every_position_is_drawn_roughly_equally() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut hits: HashMap<usize, usize> = HashMap::new();
        let trials = 6_000;
        for _ in 0..trials {
            for position in sample_indices_with_rng(6, 2, &mut rng).iter() {
                *hits.entry(position).or_insert(0) += 1;
            }
        }
        // Each position is expected 2000 times (6000 * 2 / 6).
        for position in 0..6 {
            let count = hits.get(&position).copied().unwrap_or(0);
            assert!((1700..=2300).contains(&count), "position {position}: {count}");
        }
    }

    #[test]
    fn explicit_positions_are_range_checked() {
        let set = SampleIndexSet::from_positions(4, [3, 1, 3]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(1));
        assert!(SampleIndexSet::from_positions(4, [4]).is_err());
    }

    #[test]
    fn unseeded_sampling_stays_in_range() {
        let sample = sample_indices(20, 7);
        assert_eq!(sample.len(), 7);
        assert!(sample.iter().all(|position| position < 20));
    }
}
