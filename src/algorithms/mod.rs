//! Evolutionary algorithms
//!
//! This module provides the model-building algorithms.

pub mod eda;

pub mod prelude {
    pub use super::eda::{
        BayesianNetwork, DependencyGraph, GeneMatrix, GenerationOutcome, JointTable,
        LinkageModel, LogGammaTable, MergeStep, Model, ModelBuilder, ModelConfig, ModelKind,
        ModelSummary, NetworkConfig, ParentPool, Partition, Pmbga, PmbgaBuilder, PmbgaConfig,
        ProbabilisticModel, SplitStep,
    };
}
