//! Individual wrapper type
//!
//! A genome together with its fitness, once evaluated.

use serde::{Deserialize, Serialize};

use crate::fitness::traits::FitnessValue;
use crate::genome::traits::EvolutionaryGenome;

/// An individual in the population
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Individual<G, F = f64>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    pub genome: G,
    /// `None` until evaluated
    pub fitness: Option<F>,
    /// Generation whose model produced this genome; 0 for the initial population
    pub birth_generation: usize,
}

impl<G, F> Individual<G, F>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// Unevaluated individual from the initial population
    pub fn new(genome: G) -> Self {
        Self::with_generation(genome, 0)
    }

    pub fn with_fitness(genome: G, fitness: F) -> Self {
        Self {
            genome,
            fitness: Some(fitness),
            birth_generation: 0,
        }
    }

    /// Unevaluated child sampled in `generation`
    pub fn with_generation(genome: G, generation: usize) -> Self {
        Self {
            genome,
            fitness: None,
            birth_generation: generation,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Fitness as f64, `None` when unevaluated
    pub fn fitness_f64(&self) -> Option<f64> {
        self.fitness.as_ref().map(FitnessValue::to_f64)
    }

    pub fn set_fitness(&mut self, fitness: F) {
        self.fitness = Some(fitness);
    }

    /// Strictly fitter than `other`
    ///
    /// An evaluated individual always beats an unevaluated one.
    pub fn is_better_than(&self, other: &Self) -> bool {
        match (&self.fitness, &other.fitness) {
            (Some(f1), Some(f2)) => f1.is_better_than(f2),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::bit_string::BitString;

    #[test]
    fn test_individual_new() {
        let individual: Individual<BitString, usize> = Individual::new(BitString::zeros(3));
        assert!(!individual.is_evaluated());
        assert_eq!(individual.fitness_f64(), None);
        assert_eq!(individual.birth_generation, 0);

        let child: Individual<BitString, usize> = Individual::with_generation(BitString::zeros(3), 7);
        assert_eq!(child.birth_generation, 7);
    }

    #[test]
    fn test_individual_set_fitness() {
        let mut individual: Individual<BitString, usize> = Individual::new(BitString::ones(3));
        individual.set_fitness(3);
        assert!(individual.is_evaluated());
        assert_eq!(individual.fitness_f64(), Some(3.0));
    }

    #[test]
    fn test_individual_is_better_than() {
        let ind1 = Individual::with_fitness(BitString::ones(2), 2usize);
        let ind2 = Individual::with_fitness(BitString::zeros(2), 0usize);
        let tie = Individual::with_fitness(BitString::ones(2), 2usize);
        let unevaluated: Individual<BitString, usize> = Individual::new(BitString::zeros(2));

        assert!(ind1.is_better_than(&ind2));
        assert!(!ind2.is_better_than(&ind1));
        assert!(!tie.is_better_than(&ind1));
        assert!(ind2.is_better_than(&unevaluated));
        assert!(!unevaluated.is_better_than(&ind2));
    }
}
