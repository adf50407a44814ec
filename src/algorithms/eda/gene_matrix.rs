//! Parent gene matrix and per-generation parent collection

use std::collections::BTreeMap;

use crate::error::ModelError;
use crate::genome::traits::BinaryGenome;

/// The parent set of one generation, one row per parent
///
/// Every row has the same length. Rows never change once the matrix is
/// built, so model builders address parents by row index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneMatrix {
    rows: Vec<Vec<bool>>,
    genome_length: usize,
}

impl GeneMatrix {
    /// Build from raw rows
    ///
    /// Fails on an empty set and on rows of differing length.
    pub fn new(rows: Vec<Vec<bool>>) -> Result<Self, ModelError> {
        let genome_length = rows.first().ok_or(ModelError::EmptyParentSet)?.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != genome_length) {
            return Err(ModelError::DimensionMismatch {
                expected: genome_length,
                actual: bad.len(),
            });
        }
        Ok(Self {
            rows,
            genome_length,
        })
    }

    /// Build from a slice of binary genomes
    pub fn from_genomes<'a, G, I>(genomes: I) -> Result<Self, ModelError>
    where
        G: BinaryGenome + 'a,
        I: IntoIterator<Item = &'a G>,
    {
        Self::new(genomes.into_iter().map(|g| g.bits().to_vec()).collect())
    }

    /// Number of parents
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false for a constructed matrix
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of loci per parent
    pub fn genome_length(&self) -> usize {
        self.genome_length
    }

    /// Parent `row`
    pub fn row(&self, row: usize) -> &[bool] {
        &self.rows[row]
    }

    /// Iterate over parents in collection order
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Value of locus `var` in parent `row`
    pub fn allele(&self, row: usize, var: usize) -> bool {
        self.rows[row][var]
    }

    /// How often each joint pattern over `vars` occurs
    ///
    /// Pattern positions follow the order of `vars`.
    pub fn pattern_counts(&self, vars: &[usize]) -> BTreeMap<Vec<bool>, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            let pattern: Vec<bool> = vars.iter().map(|&v| row[v]).collect();
            *counts.entry(pattern).or_insert(0) += 1;
        }
        counts
    }

    /// Split `rows` by the value of locus `var`: `[zeros, ones]`
    pub fn split_rows(&self, rows: &[usize], var: usize) -> [Vec<usize>; 2] {
        let (ones, zeros): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&r| self.rows[r][var]);
        [zeros, ones]
    }

    /// Number of `rows` with locus `var` set
    pub fn count_ones(&self, rows: &[usize], var: usize) -> usize {
        rows.iter().filter(|&&r| self.rows[r][var]).count()
    }
}

/// Accumulates the parents selected for one generation
///
/// The generation driver pushes parents one at a time (or a pair per
/// crossover slot). The model is only built once the pool holds exactly the
/// expected number of parents.
#[derive(Clone, Debug)]
pub struct ParentPool {
    expected: usize,
    genome_length: usize,
    rows: Vec<Vec<bool>>,
}

impl ParentPool {
    /// Pool for `expected` parents of `genome_length` loci each
    pub fn new(expected: usize, genome_length: usize) -> Self {
        Self {
            expected,
            genome_length,
            rows: Vec::with_capacity(expected),
        }
    }

    /// Number of parents the pool waits for
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Number of parents collected so far
    pub fn collected(&self) -> usize {
        self.rows.len()
    }

    /// Whether the model can be built
    pub fn is_complete(&self) -> bool {
        self.rows.len() == self.expected
    }

    /// Add one parent
    pub fn collect_parent<G: BinaryGenome>(&mut self, parent: &G) -> Result<(), ModelError> {
        if self.rows.len() >= self.expected {
            return Err(ModelError::ParentPoolFull {
                capacity: self.expected,
            });
        }
        let bits = parent.bits();
        if bits.len() != self.genome_length {
            return Err(ModelError::DimensionMismatch {
                expected: self.genome_length,
                actual: bits.len(),
            });
        }
        self.rows.push(bits.to_vec());
        Ok(())
    }

    /// Add the two parents of one mating slot
    ///
    /// With an odd parent count the final slot carries a single parent, so
    /// the second one is dropped once the pool is full.
    pub fn collect_pair<G: BinaryGenome>(&mut self, first: &G, second: &G) -> Result<(), ModelError> {
        self.collect_parent(first)?;
        if !self.is_complete() {
            self.collect_parent(second)?;
        }
        Ok(())
    }

    /// Hand the collected parents over to model building
    pub fn finish(self) -> Result<GeneMatrix, ModelError> {
        if !self.is_complete() {
            return Err(ModelError::ParentPoolIncomplete {
                collected: self.rows.len(),
                expected: self.expected,
            });
        }
        GeneMatrix::new(self.rows)
    }
}
