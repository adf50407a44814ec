//! Core genome traits
//!
//! `EvolutionaryGenome` is what the population and replacement machinery
//! needs; `BinaryGenome` is what the models learn from and sample into.

use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::GenomeError;

/// Core genome abstraction for evolutionary algorithms.
///
/// Genomes must be cloneable, serializable, and thread-safe so that
/// populations can be evaluated in parallel.
pub trait EvolutionaryGenome: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Generate a uniformly random genome with `length` genes
    fn generate<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Self;

    /// Distance used to find the closest competitor during replacement
    fn distance(&self, other: &Self) -> f64;
}

/// Genomes that are a fixed-length string of bits
pub trait BinaryGenome: EvolutionaryGenome {
    /// The bits in locus order
    fn bits(&self) -> &[bool];

    /// Build a genome from sampled bits
    fn from_bits(bits: Vec<bool>) -> Result<Self, GenomeError>;

    /// Number of set bits
    fn count_ones(&self) -> usize {
        self.bits().iter().filter(|&&b| b).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    // Genome that refuses to be empty, to exercise the fallible constructor
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct NonEmptyBits(Vec<bool>);

    impl EvolutionaryGenome for NonEmptyBits {
        fn generate<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Self {
            Self((0..length.max(1)).map(|_| rng.gen()).collect())
        }

        fn distance(&self, other: &Self) -> f64 {
            self.0.iter().zip(&other.0).filter(|(a, b)| a != b).count() as f64
        }
    }

    impl BinaryGenome for NonEmptyBits {
        fn bits(&self) -> &[bool] {
            &self.0
        }

        fn from_bits(bits: Vec<bool>) -> Result<Self, GenomeError> {
            if bits.is_empty() {
                return Err(GenomeError::InvalidStructure("no bits".to_string()));
            }
            Ok(Self(bits))
        }
    }

    #[test]
    fn test_count_ones_default() {
        let genome = NonEmptyBits::from_bits(vec![true, false, true, true]).unwrap();
        assert_eq!(genome.count_ones(), 3);
    }

    #[test]
    fn test_from_bits_can_reject() {
        assert!(NonEmptyBits::from_bits(Vec::new()).is_err());
        let mut rng = rand::thread_rng();
        assert_eq!(NonEmptyBits::generate(&mut rng, 0).bits().len(), 1);
    }
}
