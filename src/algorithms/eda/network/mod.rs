//! Bayesian network with decision-tree conditional distributions
//!
//! Every locus starts as a single-leaf tree. The search repeatedly applies
//! the best-scoring leaf split across all trees, where splitting locus `t`'s
//! leaf on locus `s` adds the edge `s -> t` to the dependency graph. A split
//! is only considered while:
//!
//! - the edge keeps the graph acyclic and `s` is not already upstream of `t`
//! - `t` stays under the parent cap (`max_parents`, 0 disables the cap)
//! - the leaf holds at least `min_split` parents
//!
//! Children are drawn locus by locus in topological order, each from the
//! leaf reached by the values already drawn for its parents.

pub mod graph;
pub mod tree;

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::gene_matrix::GeneMatrix;
use super::scoring::{default_split_penalty, LogGammaTable};
use crate::error::ModelError;

pub use graph::{DependencyGraph, NodeSet};
pub use tree::{DecisionForest, Leaf, SplitCandidate, TreeId, TreeNode};

/// Structure-search limits
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Smallest leaf that may still be split
    pub min_split: usize,
    /// Maximum parents per locus, 0 for no limit
    pub max_parents: usize,
    /// Score charged per split; `log2(N)` for `N` parents when unset
    pub split_penalty: Option<f64>,
}

impl NetworkConfig {
    /// Leaves smaller than `min_split` are never split
    pub fn with_min_split(mut self, min_split: usize) -> Self {
        self.min_split = min_split;
        self
    }

    /// Cap the parents of each locus, 0 for no limit
    pub fn with_max_parents(mut self, max_parents: usize) -> Self {
        self.max_parents = max_parents;
        self
    }

    /// Charge `penalty` per split instead of the sample-size default
    pub fn with_split_penalty(mut self, penalty: f64) -> Self {
        self.split_penalty = Some(penalty);
        self
    }
}

/// One committed split
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitStep {
    /// Locus whose tree was split
    pub target: usize,
    /// Locus the leaf was split on, now a parent of `target`
    pub var: usize,
    /// Net score improvement
    pub gain: f64,
    /// Number of splits above the leaf that was split
    pub depth: usize,
}

/// Learned network
#[derive(Clone, Debug)]
pub struct BayesianNetwork {
    parent_count: usize,
    graph: DependencyGraph,
    forest: DecisionForest,
    roots: Vec<TreeId>,
    order: Vec<usize>,
    splits: Vec<SplitStep>,
    split_penalty: f64,
    initial_score: f64,
}

impl BayesianNetwork {
    /// Learn a network from a parent set
    pub fn build(
        genes: &GeneMatrix,
        config: &NetworkConfig,
        lgamma: &LogGammaTable,
    ) -> Result<Self, ModelError> {
        StructureSearch::new(genes, config, lgamma)?.run()
    }

    /// Number of loci, one tree each
    pub fn genome_length(&self) -> usize {
        self.roots.len()
    }

    /// Size of the parent set the network was learned from
    pub fn parent_count(&self) -> usize {
        self.parent_count
    }

    /// Dependencies implied by the committed splits
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Arena holding every locus's decision tree
    pub fn forest(&self) -> &DecisionForest {
        &self.forest
    }

    /// Root of `var`'s decision tree
    pub fn tree(&self, var: usize) -> TreeId {
        self.roots[var]
    }

    /// Loci in the order they are sampled
    pub fn sampling_order(&self) -> &[usize] {
        &self.order
    }

    /// Splits in the order they were committed
    pub fn splits(&self) -> &[SplitStep] {
        &self.splits
    }

    /// Penalty that was charged per split
    pub fn split_penalty(&self) -> f64 {
        self.split_penalty
    }

    /// Total leaf score of the empty network
    pub fn initial_score(&self) -> f64 {
        self.initial_score
    }

    /// Total leaf score minus the penalty for every split
    pub fn score(&self) -> f64 {
        let leaves: f64 = self
            .roots
            .iter()
            .flat_map(|&root| self.forest.leaves(root))
            .filter_map(|id| self.forest.leaf(id))
            .map(Leaf::score)
            .sum();
        leaves - self.split_penalty * self.splits.len() as f64
    }

    /// Leaves across all trees
    pub fn leaf_count(&self) -> usize {
        self.roots.iter().map(|&root| self.forest.leaves(root).len()).sum()
    }

    /// Probability that `var` is set given the rest of `assignment`
    pub fn conditional(&self, var: usize, assignment: &[bool]) -> f64 {
        self.forest.descend(self.roots[var], assignment).probability()
    }

    /// Draw one child in topological order
    pub fn sample_bits<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<bool> {
        let mut bits = vec![false; self.roots.len()];
        for &var in &self.order {
            bits[var] = self.forest.descend(self.roots[var], &bits).sample(rng);
        }
        bits
    }
}

impl fmt::Display for BayesianNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (var, &root) in self.roots.iter().enumerate() {
            writeln!(
                f,
                "Node {var} parents: ({}) children: ({})",
                join(self.graph.parents(var)),
                join(self.graph.children(var))
            )?;
            write!(f, "{}", self.forest.display(root))?;
        }
        Ok(())
    }
}

fn join<'a>(vars: impl IntoIterator<Item = &'a usize>) -> String {
    vars.into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Greedy structure search
// ============================================================================

struct StructureSearch<'a> {
    genes: &'a GeneMatrix,
    config: &'a NetworkConfig,
    lgamma: &'a LogGammaTable,
    penalty: f64,
    graph: DependencyGraph,
    forest: DecisionForest,
    roots: Vec<TreeId>,
}

impl<'a> StructureSearch<'a> {
    fn new(
        genes: &'a GeneMatrix,
        config: &'a NetworkConfig,
        lgamma: &'a LogGammaTable,
    ) -> Result<Self, ModelError> {
        let length = genes.genome_length();
        let all_rows: Vec<usize> = (0..genes.len()).collect();
        let mut forest = DecisionForest::new();
        let mut roots = Vec::with_capacity(length);
        for var in 0..length {
            let leaf = Self::make_leaf(genes, lgamma, all_rows.clone(), var)?;
            roots.push(forest.add_root(var, leaf));
        }
        Ok(Self {
            genes,
            config,
            lgamma,
            penalty: config
                .split_penalty
                .unwrap_or_else(|| default_split_penalty(genes.len())),
            graph: DependencyGraph::new(length),
            forest,
            roots,
        })
    }

    fn make_leaf(
        genes: &GeneMatrix,
        lgamma: &LogGammaTable,
        rows: Vec<usize>,
        owner: usize,
    ) -> Result<Leaf, ModelError> {
        let n1 = genes.count_ones(&rows, owner);
        let score = lgamma.leaf_score(rows.len(), n1);
        Leaf::new(rows, n1, score)
    }

    fn feasible(&self, target: usize, var: usize, leaf_n: usize) -> bool {
        self.graph.may_add_edge(var, target)
            && (self.config.max_parents == 0 || self.graph.in_degree(target) < self.config.max_parents)
            && leaf_n >= self.config.min_split
    }

    /// Score every admissible split of leaf `id` and store the improving ones
    fn propose_all(&mut self, id: TreeId) -> Result<(), ModelError> {
        let target = self.forest.owner(id);
        let on_path = self.forest.path_vars(id);
        let leaf = self
            .forest
            .leaf(id)
            .ok_or_else(|| ModelError::invariant("candidates proposed for a split node"))?;
        let (n, score) = (leaf.n(), leaf.score());

        let mut found = Vec::new();
        for var in 0..self.genes.genome_length() {
            if var == target || on_path.contains(&var) || !self.feasible(target, var, n) {
                continue;
            }
            let [zeros, ones] = self.genes.split_rows(leaf.rows(), var);
            if zeros.is_empty() || ones.is_empty() {
                continue;
            }
            let zeros = (zeros.len(), self.genes.count_ones(&zeros, target));
            let ones = (ones.len(), self.genes.count_ones(&ones, target));
            let gain = self.lgamma.leaf_score(zeros.0, zeros.1) + self.lgamma.leaf_score(ones.0, ones.1)
                - score
                - self.penalty;
            if gain > 0.0 {
                found.push(SplitCandidate {
                    var,
                    gain,
                    zeros,
                    ones,
                });
            }
        }

        if let Some(leaf) = self.forest.leaf_mut(id) {
            leaf.candidates_mut().extend(found.into_iter().map(|c| (c.var, c)));
        }
        Ok(())
    }

    /// Drop every stored candidate the current graph no longer admits
    fn prune(&mut self) {
        for &root in &self.roots {
            let target = self.forest.owner(root);
            for id in self.forest.leaves(root) {
                let mut stale = Vec::new();
                if let Some(leaf) = self.forest.leaf(id) {
                    for &var in leaf.candidates().keys() {
                        if !self.feasible(target, var, leaf.n()) {
                            stale.push(var);
                        }
                    }
                }
                if let Some(leaf) = self.forest.leaf_mut(id) {
                    for var in stale {
                        leaf.candidates_mut().remove(&var);
                    }
                }
            }
        }
    }

    /// Best candidate over loci ascending, leaves depth first, variables ascending
    ///
    /// The first strictly largest gain wins.
    fn best(&self) -> Result<Option<(TreeId, SplitCandidate)>, ModelError> {
        let mut best: Option<(TreeId, SplitCandidate)> = None;
        for (target, &root) in self.roots.iter().enumerate() {
            for id in self.forest.leaves(root) {
                let Some(leaf) = self.forest.leaf(id) else {
                    continue;
                };
                for candidate in leaf.candidates().values() {
                    if !self.feasible(target, candidate.var, leaf.n()) {
                        return Err(ModelError::invariant(format!(
                            "stale split of {target} on {} survived pruning",
                            candidate.var
                        )));
                    }
                    let current = best.map_or(0.0, |(_, c)| c.gain);
                    if candidate.gain > current {
                        best = Some((id, *candidate));
                    }
                }
            }
        }
        Ok(best)
    }

    fn apply(&mut self, id: TreeId, candidate: SplitCandidate) -> Result<SplitStep, ModelError> {
        let target = self.forest.owner(id);
        let depth = self.forest.depth(id);
        let rows = self
            .forest
            .leaf(id)
            .ok_or_else(|| ModelError::invariant("split applied to a split node"))?
            .rows()
            .to_vec();

        let [zeros, ones] = self.genes.split_rows(&rows, candidate.var);
        if (zeros.len(), ones.len()) != (candidate.zeros.0, candidate.ones.0) {
            return Err(ModelError::invariant(format!(
                "split of {target} on {} no longer matches its counts",
                candidate.var
            )));
        }
        let children = [
            Self::make_leaf(self.genes, self.lgamma, zeros, target)?,
            Self::make_leaf(self.genes, self.lgamma, ones, target)?,
        ];

        self.graph.add_edge(candidate.var, target)?;
        let new_leaves = self.forest.split(id, candidate.var, children)?;
        self.prune();
        for leaf in new_leaves {
            self.propose_all(leaf)?;
        }

        trace!(target, var = candidate.var, gain = candidate.gain, depth, "network split");
        Ok(SplitStep {
            target,
            var: candidate.var,
            gain: candidate.gain,
            depth,
        })
    }

    fn run(mut self) -> Result<BayesianNetwork, ModelError> {
        let initial_score: f64 = self
            .roots
            .iter()
            .filter_map(|&root| self.forest.leaf(root))
            .map(Leaf::score)
            .sum();
        for root in self.roots.clone() {
            self.propose_all(root)?;
        }

        let mut splits = Vec::new();
        while let Some((id, candidate)) = self.best()? {
            splits.push(self.apply(id, candidate)?);
        }

        let order = self
            .graph
            .topological_order()
            .ok_or_else(|| ModelError::invariant("dependency graph has a cycle"))?;

        Ok(BayesianNetwork {
            parent_count: self.genes.len(),
            graph: self.graph,
            forest: self.forest,
            roots: self.roots,
            order,
            splits,
            split_penalty: self.penalty,
            initial_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn genes(rows: &[&str]) -> GeneMatrix {
        GeneMatrix::new(
            rows.iter()
                .map(|r| r.chars().map(|c| c == '1').collect())
                .collect(),
        )
        .unwrap()
    }

    fn build(genes: &GeneMatrix, config: &NetworkConfig) -> BayesianNetwork {
        let table = LogGammaTable::new(genes.len());
        BayesianNetwork::build(genes, config, &table).unwrap()
    }

    /// Locus 1 copies locus 0; locus 2 is noise
    fn copied_pair() -> GeneMatrix {
        genes(&[
            "000", "001", "000", "001", "110", "111", "110", "111", "000", "111", "110", "001",
            "000", "111", "110", "001",
        ])
    }

    #[test]
    fn test_learns_copy_dependency() {
        let g = copied_pair();
        let net = build(&g, &NetworkConfig::default());

        assert_eq!(net.graph().edge_count(), 1);
        assert_eq!(net.splits().len(), 1);
        let step = net.splits()[0];
        // Ties resolve to the lowest target, so locus 0 gets split on locus 1
        assert_eq!((step.target, step.var), (0, 1));
        assert!(step.gain > 0.0);

        assert_eq!(net.conditional(0, &[false, true, false]), 1.0);
        assert_eq!(net.conditional(0, &[false, false, false]), 0.0);
        assert_eq!(net.sampling_order(), &[1, 0, 2]);
    }

    #[test]
    fn test_samples_follow_dependency() {
        let g = copied_pair();
        let net = build(&g, &NetworkConfig::default());
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let child = net.sample_bits(&mut rng);
            assert_eq!(child.len(), 3);
            assert_eq!(child[0], child[1]);
        }
    }

    #[test]
    fn test_score_accounts_for_every_split() {
        let g = genes(&[
            "0000", "1100", "0011", "1111", "0000", "1100", "0011", "1111", "0101", "1010",
        ]);
        let net = build(&g, &NetworkConfig::default().with_split_penalty(0.1));
        let gained: f64 = net.splits().iter().map(|s| s.gain).sum();
        assert_relative_eq!(net.score(), net.initial_score() + gained, epsilon = 1e-9);
        assert!(net.splits().iter().all(|s| s.gain > 0.0));
    }

    #[test]
    fn test_parent_cap() {
        let g = genes(&[
            "0000", "1111", "0000", "1111", "0001", "1110", "0011", "1100",
        ]);
        let net = build(&g, &NetworkConfig::default().with_max_parents(1).with_split_penalty(0.0));
        assert!(net.graph().max_in_degree() <= 1);
        assert!(net.graph().topological_order().is_some());
    }

    #[test]
    fn test_min_split_floor_blocks_small_leaves() {
        let g = copied_pair();
        let net = build(&g, &NetworkConfig::default().with_min_split(g.len() + 1));
        assert_eq!(net.graph().edge_count(), 0);
        assert_eq!(net.leaf_count(), 3);
    }

    #[test]
    fn test_huge_penalty_keeps_network_empty() {
        let g = copied_pair();
        let net = build(&g, &NetworkConfig::default().with_split_penalty(1e6));
        assert!(net.splits().is_empty());
        assert_eq!(net.score(), net.initial_score());
    }

    #[test]
    fn test_default_penalty_is_log2_of_parent_count() {
        // One disagreeing row: either split gains about 1.6 before the penalty
        let g = genes(&["00", "00", "00", "01", "11", "11", "11", "11"]);

        let net = build(&g, &NetworkConfig::default());
        assert_relative_eq!(net.split_penalty(), 3.0, epsilon = 1e-12);
        assert!(net.splits().is_empty());

        let net = build(&g, &NetworkConfig::default().with_split_penalty(1.5));
        assert_eq!(net.splits().len(), 1);
        let step = net.splits()[0];
        assert_eq!((step.target, step.var), (0, 1));
        // ln 9! - 2 ln 4! for the parent leaf, -ln 4 and -ln 30 for its halves
        let raw = 362880f64.ln() - 2.0 * 24f64.ln() - 4f64.ln() - 30f64.ln();
        assert_relative_eq!(step.gain, raw - 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_display_dump() {
        let g = genes(&["00", "11", "00", "11", "00", "11", "00", "11"]);
        let net = build(&g, &NetworkConfig::default());
        let text = net.to_string();
        assert!(text.starts_with("Node 0 parents: (1) children: ()\n  x1 = 0:\n"));
        assert!(text.contains("Node 1 parents: () children: (0)\n  p=0.5000 (n=8, n1=4)\n"));
    }

    #[test]
    fn test_single_parent_set() {
        let g = genes(&["1011"]);
        let net = build(&g, &NetworkConfig::default());
        assert!(net.splits().is_empty());
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(net.sample_bits(&mut rng), vec![true, false, true, true]);
    }
}
