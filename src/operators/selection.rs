//! Selection operators
//!
//! Tournament selection fills the parent set each model is learned from.

use rand::seq::index::sample;
use rand::Rng;

use crate::genome::traits::EvolutionaryGenome;
use crate::operators::traits::SelectionOperator;

/// Tournament selection operator
///
/// Selects the best individual from a random subset of the population,
/// drawn without replacement.
#[derive(Clone, Debug)]
pub struct TournamentSelection {
    /// Tournament size (number of individuals competing)
    pub tournament_size: usize,
}

impl TournamentSelection {
    /// Create a new tournament selection with the given size
    pub fn new(tournament_size: usize) -> Self {
        assert!(tournament_size >= 1, "Tournament size must be at least 1");
        Self { tournament_size }
    }
}

impl<G: EvolutionaryGenome> SelectionOperator<G> for TournamentSelection {
    fn select<R: Rng + ?Sized>(&self, population: &[(&G, f64)], rng: &mut R) -> usize {
        assert!(!population.is_empty(), "Population cannot be empty");

        let tournament_size = self.tournament_size.min(population.len());

        let mut entrants = sample(rng, population.len(), tournament_size).into_iter();
        let mut winner = entrants.next().unwrap_or(0);
        for idx in entrants {
            if population[idx].1 > population[winner].1 {
                winner = idx;
            }
        }
        winner
    }
}
