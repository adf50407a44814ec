//! Replacement strategies
//!
//! Decide how sampled offspring enter the population.

use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fitness::traits::FitnessValue;
use crate::genome::traits::EvolutionaryGenome;
use crate::population::individual::Individual;
use crate::population::population::Population;

/// Replacement strategy for model-building GAs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacementStrategy {
    /// Offspring overwrite the population slot by slot
    Generational,
    /// Restricted tournament replacement
    ///
    /// Each child is compared with the closest of `window_size` randomly
    /// drawn members and takes its slot only when strictly better. A window
    /// of 0 lets the algorithm pick a size from the population and genome
    /// length.
    RestrictedTournament {
        /// Number of members drawn per child
        window_size: usize,
    },
}

impl Default for ReplacementStrategy {
    fn default() -> Self {
        Self::RestrictedTournament { window_size: 0 }
    }
}

impl ReplacementStrategy {
    /// Window size used when none was configured
    pub fn default_window(population_size: usize, genome_length: usize) -> usize {
        ((population_size as f64 * 0.2) as usize)
            .min(genome_length)
            .max(1)
    }

    /// Resolve an automatic window against the run's dimensions
    pub fn resolved(self, population_size: usize, genome_length: usize) -> Self {
        match self {
            Self::RestrictedTournament { window_size: 0 } => Self::RestrictedTournament {
                window_size: Self::default_window(population_size, genome_length),
            },
            other => other,
        }
    }

    /// Insert `offspring` into `population`
    ///
    /// Returns how many population slots changed hands.
    pub fn apply<G, F, R>(
        &self,
        population: &mut Population<G, F>,
        offspring: Vec<Individual<G, F>>,
        rng: &mut R,
    ) -> usize
    where
        G: EvolutionaryGenome,
        F: FitnessValue,
        R: Rng + ?Sized,
    {
        match *self {
            Self::Generational => {
                let mut replaced = 0;
                for (slot, child) in offspring.into_iter().enumerate() {
                    if slot < population.len() {
                        population.replace(slot, child);
                    } else {
                        population.push(child);
                    }
                    replaced += 1;
                }
                replaced
            }
            Self::RestrictedTournament { window_size } => {
                if population.is_empty() {
                    return 0;
                }
                let window = window_size.clamp(1, population.len());
                let mut replaced = 0;
                for child in offspring {
                    let candidates = sample(rng, population.len(), window).into_vec();
                    let Some(target) = population.closest_in(&candidates, &child.genome) else {
                        continue;
                    };
                    if child.is_better_than(&population[target]) {
                        population.replace(target, child);
                        replaced += 1;
                    }
                }
                replaced
            }
        }
    }
}
