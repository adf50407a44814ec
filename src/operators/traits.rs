//! Operator traits
//!
//! Model-building algorithms replace crossover and mutation with model
//! sampling, so selection is the only classic operator left.

use rand::Rng;

use crate::genome::traits::EvolutionaryGenome;

/// Selection operator trait
///
/// Selects individuals from a population for model building.
pub trait SelectionOperator<G: EvolutionaryGenome>: Send + Sync {
    /// Select a single individual from the population
    ///
    /// Returns the index of the selected individual.
    fn select<R: Rng + ?Sized>(
        &self,
        population: &[(&G, f64)], // (genome, fitness) pairs
        rng: &mut R,
    ) -> usize;

    /// Select multiple individuals from the population
    fn select_many<R: Rng + ?Sized>(
        &self,
        population: &[(&G, f64)],
        count: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        (0..count).map(|_| self.select(population, rng)).collect()
    }
}
