//! Model families behind a common interface
//!
//! The generation driver only needs to build a model from the parent set,
//! draw children from it, and describe it. [`ProbabilisticModel`] captures
//! that contract; [`Model`] is the run-time choice between the two families.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::gene_matrix::GeneMatrix;
use super::linkage::LinkageModel;
use super::network::{BayesianNetwork, NetworkConfig};
use super::scoring::LogGammaTable;
use crate::error::{GenomeError, ModelError};
use crate::genome::traits::BinaryGenome;

/// A distribution over bit strings learned from one generation's parents
pub trait ProbabilisticModel: fmt::Display {
    /// Number of loci per child
    fn genome_length(&self) -> usize;

    /// Number of parents the model was learned from
    fn parent_count(&self) -> usize;

    /// Draw one child's bits
    fn sample_bits<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<bool>;

    /// Shape of the learned structure
    fn summary(&self) -> ModelSummary;

    /// Draw one child as a genome
    fn sample<G: BinaryGenome, R: Rng + ?Sized>(&self, rng: &mut R) -> Result<G, GenomeError> {
        G::from_bits(self.sample_bits(rng))
    }

    /// Draw `count` children
    ///
    /// A generation never produces more children than it collected parents.
    fn sample_children<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<bool>>, ModelError> {
        if count > self.parent_count() {
            return Err(ModelError::ChildrenExceedParents {
                requested: count,
                available: self.parent_count(),
            });
        }
        Ok((0..count).map(|_| self.sample_bits(rng)).collect())
    }
}

/// Which model family to learn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Marginal product model over linkage groups
    #[default]
    Linkage,
    /// Bayesian network with decision trees
    Bayesian,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linkage => write!(f, "linkage"),
            Self::Bayesian => write!(f, "bayesian"),
        }
    }
}

/// Model family and its structure-search limits
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub kind: ModelKind,
    /// Only read when `kind` is [`ModelKind::Bayesian`]
    pub network: NetworkConfig,
}

impl ModelConfig {
    pub fn linkage() -> Self {
        Self::default()
    }

    pub fn bayesian(network: NetworkConfig) -> Self {
        Self {
            kind: ModelKind::Bayesian,
            network,
        }
    }
}

/// Compact description of a learned model, recorded per generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub kind: ModelKind,
    pub genome_length: usize,
    /// Linkage groups, or loci without parents in a network
    pub groups: usize,
    /// Loci in the largest linkage group, or the largest in-degree plus one
    pub largest_group: usize,
    /// Dependency edges; always 0 for a linkage model
    pub edges: usize,
    /// Decision-tree leaves; always 0 for a linkage model
    pub leaves: usize,
    /// Merges or splits committed while learning
    pub structure_steps: usize,
}

impl ProbabilisticModel for LinkageModel {
    fn genome_length(&self) -> usize {
        LinkageModel::genome_length(self)
    }

    fn parent_count(&self) -> usize {
        LinkageModel::parent_count(self)
    }

    fn sample_bits<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<bool> {
        LinkageModel::sample_bits(self, rng)
    }

    fn summary(&self) -> ModelSummary {
        ModelSummary {
            kind: ModelKind::Linkage,
            genome_length: LinkageModel::genome_length(self),
            groups: self.group_count(),
            largest_group: self.partitions().map(|p| p.len()).max().unwrap_or(0),
            edges: 0,
            leaves: 0,
            structure_steps: self.merges().len(),
        }
    }
}

impl ProbabilisticModel for BayesianNetwork {
    fn genome_length(&self) -> usize {
        BayesianNetwork::genome_length(self)
    }

    fn parent_count(&self) -> usize {
        BayesianNetwork::parent_count(self)
    }

    fn sample_bits<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<bool> {
        BayesianNetwork::sample_bits(self, rng)
    }

    fn summary(&self) -> ModelSummary {
        let graph = self.graph();
        let length = BayesianNetwork::genome_length(self);
        ModelSummary {
            kind: ModelKind::Bayesian,
            genome_length: length,
            groups: (0..length).filter(|&v| graph.in_degree(v) == 0).count(),
            largest_group: if length == 0 { 0 } else { graph.max_in_degree() + 1 },
            edges: graph.edge_count(),
            leaves: self.leaf_count(),
            structure_steps: self.splits().len(),
        }
    }
}

/// A learned model of either family
#[derive(Clone, Debug)]
pub enum Model {
    Linkage(LinkageModel),
    Bayesian(BayesianNetwork),
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Linkage(_) => ModelKind::Linkage,
            Self::Bayesian(_) => ModelKind::Bayesian,
        }
    }

    pub fn as_linkage(&self) -> Option<&LinkageModel> {
        match self {
            Self::Linkage(m) => Some(m),
            Self::Bayesian(_) => None,
        }
    }

    pub fn as_network(&self) -> Option<&BayesianNetwork> {
        match self {
            Self::Bayesian(m) => Some(m),
            Self::Linkage(_) => None,
        }
    }
}

impl ProbabilisticModel for Model {
    fn genome_length(&self) -> usize {
        match self {
            Self::Linkage(m) => ProbabilisticModel::genome_length(m),
            Self::Bayesian(m) => ProbabilisticModel::genome_length(m),
        }
    }

    fn parent_count(&self) -> usize {
        match self {
            Self::Linkage(m) => ProbabilisticModel::parent_count(m),
            Self::Bayesian(m) => ProbabilisticModel::parent_count(m),
        }
    }

    fn sample_bits<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<bool> {
        match self {
            Self::Linkage(m) => ProbabilisticModel::sample_bits(m, rng),
            Self::Bayesian(m) => ProbabilisticModel::sample_bits(m, rng),
        }
    }

    fn summary(&self) -> ModelSummary {
        match self {
            Self::Linkage(m) => m.summary(),
            Self::Bayesian(m) => m.summary(),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linkage(m) => fmt::Display::fmt(m, f),
            Self::Bayesian(m) => fmt::Display::fmt(m, f),
        }
    }
}

/// Builds one model per generation with run-scoped caches
#[derive(Clone, Debug)]
pub struct ModelBuilder {
    config: ModelConfig,
    lgamma: LogGammaTable,
}

impl ModelBuilder {
    /// Builder for parent sets of up to `max_parents` genomes
    ///
    /// Larger parent sets still work; their counts fall outside the cached
    /// log-gamma range and are computed on demand.
    pub fn new(config: ModelConfig, max_parents: usize) -> Self {
        Self {
            config,
            lgamma: LogGammaTable::new(max_parents),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Learn a model from one generation's parents
    pub fn build(&self, genes: &GeneMatrix) -> Result<Model, ModelError> {
        match self.config.kind {
            ModelKind::Linkage => LinkageModel::build(genes).map(Model::Linkage),
            ModelKind::Bayesian => {
                BayesianNetwork::build(genes, &self.config.network, &self.lgamma).map(Model::Bayesian)
            }
        }
    }
}
