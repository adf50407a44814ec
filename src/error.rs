//! Error types for pmbga
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Error type for genome operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenomeError {
    /// Invalid genome structure
    #[error("Invalid genome structure: {0}")]
    InvalidStructure(String),
}

/// Error type for model building and sampling
///
/// Numerical edge cases (empty leaves, degenerate entropy, rounding during
/// inverse-CDF sampling) never show up here; they are resolved where they
/// occur. Everything in this enum aborts the current build.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// A model was requested from an empty parent set
    #[error("Cannot build a model from an empty parent set")]
    EmptyParentSet,

    /// A parent genome does not have the expected length
    #[error("Parent length mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// More parents were offered than the generation collects
    #[error("Parent pool is full ({capacity} parents already collected)")]
    ParentPoolFull { capacity: usize },

    /// The model was built before the parent set was complete
    #[error("Parent pool incomplete: collected {collected} of {expected}")]
    ParentPoolIncomplete { collected: usize, expected: usize },

    /// More children were requested than parents were collected
    #[error("Requested {requested} children but only {available} parents were collected")]
    ChildrenExceedParents { requested: usize, available: usize },

    /// Internal bookkeeping no longer matches the model structure
    #[error("Model invariant violated: {0}")]
    InvariantViolation(String),
}

impl ModelError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}

/// Top-level error type for evolution operations
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Genome error
    #[error("Genome error: {0}")]
    Genome(#[from] GenomeError),

    /// Model building or sampling failed
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Empty population
    #[error("Empty population")]
    EmptyPopulation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genome_error_display() {
        let err = GenomeError::InvalidStructure("unexpected character 'x'".to_string());
        assert_eq!(err.to_string(), "Invalid genome structure: unexpected character 'x'");
    }

    #[test]
    fn test_model_error_display() {
        let err = ModelError::ChildrenExceedParents {
            requested: 12,
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "Requested 12 children but only 10 parents were collected"
        );

        let err = ModelError::invariant("candidate references a deleted partition");
        assert_eq!(
            err.to_string(),
            "Model invariant violated: candidate references a deleted partition"
        );
    }

    #[test]
    fn test_evolution_error_from_model_error() {
        let evo_err: EvolutionError = ModelError::EmptyParentSet.into();
        assert!(matches!(evo_err, EvolutionError::Model(_)));
        assert_eq!(
            evo_err.to_string(),
            "Model error: Cannot build a model from an empty parent set"
        );
    }

    #[test]
    fn test_evolution_error_from_genome_error() {
        let genome_err = GenomeError::InvalidStructure("bad shape".to_string());
        let evo_err: EvolutionError = genome_err.into();
        assert!(matches!(evo_err, EvolutionError::Genome(_)));
    }
}
