//! Benchmark fitness functions
//!
//! Binary test problems. `DeceptiveTrap` is the one that separates
//! model-building algorithms from plain GAs: each block rewards all-zeros
//! while its gradient points towards all-ones, so a block can only be solved
//! when its bits are recombined together.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::fitness::traits::Fitness;
use crate::genome::bit_string::BitString;
use crate::genome::traits::BinaryGenome;

/// OneMax function for bit strings
///
/// Counts the number of 1s in the bit string. Optimum when all bits are 1.
#[derive(Clone, Debug)]
pub struct OneMax {
    length: usize,
}

impl OneMax {
    /// Create a new OneMax function
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Fitness for OneMax {
    type Genome = BitString;
    type Value = usize;

    fn evaluate(&self, genome: &Self::Genome) -> usize {
        genome.count_ones()
    }

    fn optimum(&self) -> Option<f64> {
        Some(self.length as f64)
    }
}

/// Concatenated deceptive trap functions
///
/// The genome is split into blocks. A block of `k` bits with `u` ones scores
/// `k` when `u == 0` and `u - 1` otherwise, so the global optimum is the
/// all-zeros string and the sum of block sizes is the best attainable value.
#[derive(Clone, Debug)]
pub struct DeceptiveTrap {
    blocks: Vec<Vec<usize>>,
    length: usize,
}

impl DeceptiveTrap {
    /// `count` contiguous traps of `trap_size` bits each
    pub fn new(trap_size: usize, count: usize) -> Self {
        Self::with_layout(&[(trap_size, count)])
    }

    /// Contiguous traps given as `(trap_size, count)` groups in genome order
    pub fn with_layout(layout: &[(usize, usize)]) -> Self {
        let mut blocks = Vec::new();
        let mut next = 0;
        for &(size, count) in layout {
            for _ in 0..count {
                blocks.push((next..next + size).collect());
                next += size;
            }
        }
        Self {
            blocks,
            length: next,
        }
    }

    /// Scatter the genes of every block across the genome
    ///
    /// The block structure is unchanged but its bits are no longer adjacent,
    /// which defeats any operator that relies on gene locality.
    pub fn shuffled<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        let mut positions: Vec<usize> = (0..self.length).collect();
        positions.shuffle(rng);
        for block in &mut self.blocks {
            for idx in block.iter_mut() {
                *idx = positions[*idx];
            }
        }
        self
    }

    /// Genome length this function expects
    pub fn length(&self) -> usize {
        self.length
    }

    /// Gene indices of every block
    pub fn blocks(&self) -> &[Vec<usize>] {
        &self.blocks
    }
}

impl Fitness for DeceptiveTrap {
    type Genome = BitString;
    type Value = usize;

    fn evaluate(&self, genome: &Self::Genome) -> usize {
        self.blocks
            .iter()
            .map(|block| {
                let ones = block
                    .iter()
                    .filter(|&&i| genome.get(i).unwrap_or(false))
                    .count();
                if ones == 0 {
                    block.len()
                } else {
                    ones - 1
                }
            })
            .sum()
    }

    fn optimum(&self) -> Option<f64> {
        Some(self.length as f64)
    }
}
