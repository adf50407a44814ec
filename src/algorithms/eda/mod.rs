//! Estimation of Distribution Algorithms (EDAs)
//!
//! Model-building GAs replace crossover and mutation with a probabilistic
//! model learned from the selected parents:
//! - **Linkage model**: greedy MDL merging of loci into jointly modelled groups
//! - **Bayesian network**: greedy decision-tree splits over a dependency DAG
//!
//! A generation:
//! 1. Selects the parent set from the population
//! 2. Learns one model from the parents
//! 3. Samples children from the model
//! 4. Evaluates the children and merges them into the population

pub mod gene_matrix;
pub mod linkage;
pub mod model;
pub mod network;
pub mod pmbga;
pub mod scoring;

pub use gene_matrix::{GeneMatrix, ParentPool};
pub use linkage::{JointTable, LinkageModel, MergeStep, Partition};
pub use model::{Model, ModelBuilder, ModelConfig, ModelKind, ModelSummary, ProbabilisticModel};
pub use network::{BayesianNetwork, DependencyGraph, NetworkConfig, SplitStep};
pub use pmbga::{GenerationOutcome, Pmbga, PmbgaBuilder, PmbgaConfig};
pub use scoring::LogGammaTable;
