//! Marginal product model learned by greedy linkage merging
//!
//! Loci start out as singleton partitions. Each step merges the pair of
//! partitions whose union shortens the minimum description length the most,
//! until no merge helps. Children are then drawn partition by partition from
//! the empirical joint distribution of each partition's loci.
//!
//! Every tie is broken by the sorted order of partition members, so the
//! learned structure depends only on the parent set.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::gene_matrix::GeneMatrix;
use super::scoring;
use crate::error::ModelError;

/// A set of loci modelled jointly
///
/// Members are kept sorted, which makes the member list usable as an
/// identity and as an ordering key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Partition(Vec<usize>);

impl Partition {
    /// Partition holding a single locus
    pub fn singleton(var: usize) -> Self {
        Self(vec![var])
    }

    /// Partition over the given loci (sorted, duplicates removed)
    pub fn from_members(members: impl IntoIterator<Item = usize>) -> Self {
        let set: BTreeSet<usize> = members.into_iter().collect();
        Self(set.into_iter().collect())
    }

    /// Sorted member loci
    pub fn members(&self) -> &[usize] {
        &self.0
    }

    /// Number of loci
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True only for a partition with no loci
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `var` is a member
    pub fn contains(&self, var: usize) -> bool {
        self.0.binary_search(&var).is_ok()
    }

    /// Partition over the loci of both
    pub fn union(&self, other: &Self) -> Self {
        Self::from_members(self.0.iter().chain(other.0.iter()).copied())
    }

    /// Whether the two share a locus
    pub fn overlaps(&self, other: &Self) -> bool {
        self.0.iter().any(|&v| other.contains(v))
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

/// Empirical joint distribution over one partition's loci
///
/// Patterns line up with the partition's sorted members. Only patterns that
/// occur in the parent set are stored, ascending, and their probabilities
/// sum to 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointTable {
    entries: Vec<(Vec<bool>, f64)>,
}

impl JointTable {
    /// Normalise raw pattern counts over `samples` parents
    pub fn from_counts(counts: &BTreeMap<Vec<bool>, usize>, samples: usize) -> Self {
        let n = samples as f64;
        let entries = counts
            .iter()
            .filter(|&(_, &c)| c > 0)
            .map(|(pattern, &c)| (pattern.clone(), c as f64 / n))
            .collect();
        Self { entries }
    }

    /// Observed patterns with their probabilities, ascending by pattern
    pub fn entries(&self) -> &[(Vec<bool>, f64)] {
        &self.entries
    }

    /// Number of distinct observed patterns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no pattern was observed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Probability of `pattern`; 0 when it was never observed
    pub fn probability(&self, pattern: &[bool]) -> f64 {
        self.entries
            .iter()
            .find(|(p, _)| p.as_slice() == pattern)
            .map_or(0.0, |(_, prob)| *prob)
    }

    /// Inverse-CDF lookup for a uniform draw `u` in `[0, 1)`
    ///
    /// Returns the first pattern whose cumulative probability reaches `u`.
    /// If rounding leaves the total just short of `u`, the last pattern is
    /// used.
    pub fn pattern_at(&self, u: f64) -> Option<&[bool]> {
        let mut cumulative = 0.0;
        for (pattern, prob) in &self.entries {
            cumulative += prob;
            if cumulative >= u {
                return Some(pattern);
            }
        }
        self.entries.last().map(|(pattern, _)| pattern.as_slice())
    }
}

/// One committed merge
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeStep {
    /// Lower-ordered partition that was merged
    pub left: Partition,
    /// Higher-ordered partition that was merged
    pub right: Partition,
    /// Reduction in description length, always positive
    pub gain: f64,
    /// Total description length of the model after this merge
    pub description_length: f64,
}

/// Learned marginal product model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkageModel {
    genome_length: usize,
    parent_count: usize,
    groups: Vec<(Partition, JointTable)>,
    merges: Vec<MergeStep>,
    initial_description_length: f64,
}

impl LinkageModel {
    /// Learn the model from a parent set
    pub fn build(genes: &GeneMatrix) -> Result<Self, ModelError> {
        LinkageBuilder::new(genes).build()
    }

    /// Number of loci
    pub fn genome_length(&self) -> usize {
        self.genome_length
    }

    /// Number of parents the model was learned from
    pub fn parent_count(&self) -> usize {
        self.parent_count
    }

    /// Final partitions, ascending
    pub fn partitions(&self) -> impl Iterator<Item = &Partition> {
        self.groups.iter().map(|(p, _)| p)
    }

    /// Number of final partitions
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Joint table of a final partition
    pub fn table(&self, partition: &Partition) -> Option<&JointTable> {
        self.groups
            .binary_search_by(|(p, _)| p.cmp(partition))
            .ok()
            .map(|i| &self.groups[i].1)
    }

    /// Final partition containing `var`
    pub fn group_of(&self, var: usize) -> Option<&Partition> {
        self.partitions().find(|p| p.contains(var))
    }

    /// Merges in the order they were committed
    pub fn merges(&self) -> &[MergeStep] {
        &self.merges
    }

    /// Description length of the all-singleton model
    pub fn initial_description_length(&self) -> f64 {
        self.initial_description_length
    }

    /// Description length of the final model
    pub fn description_length(&self) -> f64 {
        self.merges
            .last()
            .map_or(self.initial_description_length, |m| m.description_length)
    }

    /// Draw one child, one uniform draw per partition in ascending order
    pub fn sample_bits<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<bool> {
        let mut bits = vec![false; self.genome_length];
        for (partition, table) in &self.groups {
            let u: f64 = rng.gen();
            if let Some(pattern) = table.pattern_at(u) {
                for (&var, &bit) in partition.members().iter().zip(pattern) {
                    bits[var] = bit;
                }
            }
        }
        bits
    }
}

impl fmt::Display for LinkageModel {
    /// Partitions from largest to smallest, ties by first locus
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut order: Vec<&Partition> = self.partitions().collect();
        order.sort_by_key(|p| (std::cmp::Reverse(p.len()), p.members().first().copied()));
        for (i, p) in order.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Greedy merge search
// ============================================================================

#[derive(Clone, Debug)]
struct MergeCandidate {
    left: Partition,
    right: Partition,
    gain: f64,
}

/// Working state of one linkage learning pass
struct LinkageBuilder<'g> {
    genes: &'g GeneMatrix,
    partitions: BTreeSet<Partition>,
    /// Keyed by the union of the two partitions
    candidates: BTreeMap<Partition, MergeCandidate>,
    /// Description lengths of live partitions and candidate unions
    lengths: HashMap<Partition, f64>,
}

impl<'g> LinkageBuilder<'g> {
    fn new(genes: &'g GeneMatrix) -> Self {
        Self {
            genes,
            partitions: BTreeSet::new(),
            candidates: BTreeMap::new(),
            lengths: HashMap::new(),
        }
    }

    fn description_length(&mut self, partition: &Partition) -> f64 {
        if let Some(&cached) = self.lengths.get(partition) {
            return cached;
        }
        let counts = self.genes.pattern_counts(partition.members());
        let length = scoring::description_length(&counts, partition.len(), self.genes.len());
        self.lengths.insert(partition.clone(), length);
        length
    }

    fn propose(&mut self, left: &Partition, right: &Partition) {
        let union = left.union(right);
        let gain = self.description_length(left) + self.description_length(right)
            - self.description_length(&union);
        self.candidates.insert(
            union,
            MergeCandidate {
                left: left.clone(),
                right: right.clone(),
                gain,
            },
        );
    }

    fn discard_candidate(&mut self, key: &Partition) {
        if self.candidates.remove(key).is_some() && !self.partitions.contains(key) {
            self.lengths.remove(key);
        }
    }

    /// Scan candidates ascending, pruning the ones that no longer help
    fn best_candidate(&mut self) -> Option<Partition> {
        let mut best: Option<(Partition, f64)> = None;
        let mut stale = Vec::new();
        for (key, candidate) in &self.candidates {
            if candidate.gain <= 0.0 {
                stale.push(key.clone());
            } else if best.as_ref().map_or(true, |(_, g)| candidate.gain > *g) {
                best = Some((key.clone(), candidate.gain));
            }
        }
        for key in stale {
            self.discard_candidate(&key);
        }
        best.map(|(key, _)| key)
    }

    fn merge(&mut self, key: &Partition) -> Result<(Partition, Partition, f64), ModelError> {
        let candidate = self
            .candidates
            .remove(key)
            .ok_or_else(|| ModelError::invariant(format!("merge candidate {key} vanished")))?;
        for side in [&candidate.left, &candidate.right] {
            if !self.partitions.remove(side) {
                return Err(ModelError::invariant(format!(
                    "candidate {key} refers to {side}, which is no longer a partition"
                )));
            }
            self.lengths.remove(side);
        }

        let orphaned: Vec<Partition> = self
            .candidates
            .iter()
            .filter(|(_, c)| {
                [&c.left, &c.right]
                    .into_iter()
                    .any(|p| *p == candidate.left || *p == candidate.right)
            })
            .map(|(k, _)| k.clone())
            .collect();
        for k in orphaned {
            self.discard_candidate(&k);
        }

        let others: Vec<Partition> = self.partitions.iter().cloned().collect();
        self.partitions.insert(key.clone());
        for other in &others {
            if other.overlaps(key) {
                return Err(ModelError::invariant(format!(
                    "partitions {other} and {key} share a locus"
                )));
            }
            self.propose(key, other);
        }

        Ok((candidate.left, candidate.right, candidate.gain))
    }

    fn build(mut self) -> Result<LinkageModel, ModelError> {
        let genome_length = self.genes.genome_length();
        for var in 0..genome_length {
            self.partitions.insert(Partition::singleton(var));
        }
        let singletons: Vec<Partition> = self.partitions.iter().cloned().collect();
        let mut total: f64 = singletons.iter().map(|p| self.description_length(p)).sum();
        let initial_description_length = total;

        for (i, left) in singletons.iter().enumerate() {
            for right in &singletons[i + 1..] {
                self.propose(left, right);
            }
        }

        let mut merges = Vec::new();
        while let Some(key) = self.best_candidate() {
            let (left, right, gain) = self.merge(&key)?;
            total -= gain;
            trace!(merged = %key, gain, description_length = total, "linkage merge");
            merges.push(MergeStep {
                left,
                right,
                gain,
                description_length: total,
            });
        }

        let covered: usize = self.partitions.iter().map(Partition::len).sum();
        if covered != genome_length {
            return Err(ModelError::invariant(format!(
                "partitions cover {covered} of {genome_length} loci"
            )));
        }

        let samples = self.genes.len();
        let groups = self
            .partitions
            .into_iter()
            .map(|p| {
                let table = JointTable::from_counts(&self.genes.pattern_counts(p.members()), samples);
                (p, table)
            })
            .collect();

        Ok(LinkageModel {
            genome_length,
            parent_count: samples,
            groups,
            merges,
            initial_description_length,
        })
    }
}
