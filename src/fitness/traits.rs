//! Fitness traits
//!
//! This module defines the fitness evaluation traits.

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

use crate::genome::traits::EvolutionaryGenome;

/// Trait bound for fitness values
///
/// Fitness values must be comparable and convertible to f64 for
/// selection and replacement decisions.
pub trait FitnessValue:
    PartialOrd + Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static
{
    /// Convert fitness to f64
    fn to_f64(&self) -> f64;

    /// Check if this fitness is better than another
    fn is_better_than(&self, other: &Self) -> bool;
}

macro_rules! impl_maximizing_fitness {
    ($($t:ty),*) => {
        $(
            impl FitnessValue for $t {
                fn to_f64(&self) -> f64 {
                    *self as f64
                }

                fn is_better_than(&self, other: &Self) -> bool {
                    self > other
                }
            }
        )*
    };
}

impl_maximizing_fitness!(f64, f32, i64, i32, usize);

/// Fitness evaluation trait
///
/// Defines how to evaluate the fitness of a genome. Higher is better.
#[cfg(feature = "parallel")]
pub trait Fitness: Send + Sync {
    /// The genome type being evaluated
    type Genome: EvolutionaryGenome;

    /// The fitness value type
    type Value: FitnessValue;

    /// Evaluate fitness (higher = better by convention)
    fn evaluate(&self, genome: &Self::Genome) -> Self::Value;

    /// Best attainable fitness, if known
    fn optimum(&self) -> Option<f64> {
        None
    }
}

/// Fitness evaluation trait (non-parallel version)
///
/// Defines how to evaluate the fitness of a genome. Higher is better.
#[cfg(not(feature = "parallel"))]
pub trait Fitness {
    /// The genome type being evaluated
    type Genome: EvolutionaryGenome;

    /// The fitness value type
    type Value: FitnessValue;

    /// Evaluate fitness (higher = better by convention)
    fn evaluate(&self, genome: &Self::Genome) -> Self::Value;

    /// Best attainable fitness, if known
    fn optimum(&self) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitness_value_ordering() {
        assert!(2.0f64.is_better_than(&1.0));
        assert!(!1usize.is_better_than(&1));
        assert!((-1i32).to_f64() < 0.0);
        assert_eq!(7i64.to_f64(), 7.0);
    }
}
