//! Bit string genome
//!
//! The fixed-length genome both model families learn from and sample into.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GenomeError;
use crate::genome::traits::{BinaryGenome, EvolutionaryGenome};

/// Fixed-length bit string genome
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitString {
    bits: Vec<bool>,
}

impl BitString {
    /// Wrap bits given in locus order
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// All-zeros string of `length` bits
    pub fn zeros(length: usize) -> Self {
        Self::new(vec![false; length])
    }

    /// All-ones string of `length` bits
    pub fn ones(length: usize) -> Self {
        Self::new(vec![true; length])
    }

    /// Parse a string of `0`/`1` characters
    pub fn parse(s: &str) -> Result<Self, GenomeError> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(GenomeError::InvalidStructure(format!(
                    "unexpected character '{other}' in bit string"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Number of loci
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit at `locus`, `None` past the end
    pub fn get(&self, locus: usize) -> Option<bool> {
        self.bits.get(locus).copied()
    }

    /// Number of loci where the two strings differ
    pub fn hamming_distance(&self, other: &Self) -> usize {
        self.bits
            .iter()
            .zip(&other.bits)
            .filter(|(a, b)| a != b)
            .count()
    }
}

impl EvolutionaryGenome for BitString {
    fn generate<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Self {
        Self::new((0..length).map(|_| rng.gen()).collect())
    }

    fn distance(&self, other: &Self) -> f64 {
        self.hamming_distance(other) as f64
    }
}

impl BinaryGenome for BitString {
    fn bits(&self) -> &[bool] {
        &self.bits
    }

    fn from_bits(bits: Vec<bool>) -> Result<Self, GenomeError> {
        Ok(Self::new(bits))
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}
