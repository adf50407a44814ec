//! Diagnostics and statistics
//!
//! This module provides statistics collection for evolutionary runs,
//! including a per-generation summary of the learned model.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::algorithms::eda::model::ModelSummary;
use crate::fitness::traits::FitnessValue;
use crate::genome::traits::EvolutionaryGenome;
use crate::population::population::Population;

/// Statistics for a single generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number
    pub generation: usize,
    /// Total fitness evaluations so far
    pub evaluations: usize,
    /// Best fitness in this generation
    pub best_fitness: f64,
    /// Worst fitness in this generation
    pub worst_fitness: f64,
    /// Mean fitness
    pub mean_fitness: f64,
    /// Fitness standard deviation
    pub fitness_std: f64,
    /// Offspring that made it into the population
    pub replacements: usize,
    /// Shape of the model learned this generation
    pub model: Option<ModelSummary>,
    /// Timing information
    pub timing: TimingStats,
}

/// Timing statistics
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimingStats {
    /// Time spent on fitness evaluation (ms)
    pub evaluation_ms: f64,
    /// Time spent collecting the parent set (ms)
    pub selection_ms: f64,
    /// Time spent building the model (ms)
    pub model_build_ms: f64,
    /// Time spent sampling offspring (ms)
    pub sampling_ms: f64,
    /// Total generation time (ms)
    pub total_ms: f64,
}

impl TimingStats {
    /// Create new timing stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Set evaluation time
    pub fn with_evaluation(mut self, duration: Duration) -> Self {
        self.evaluation_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set selection time
    pub fn with_selection(mut self, duration: Duration) -> Self {
        self.selection_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set model build time
    pub fn with_model_build(mut self, duration: Duration) -> Self {
        self.model_build_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set sampling time
    pub fn with_sampling(mut self, duration: Duration) -> Self {
        self.sampling_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set total time
    pub fn with_total(mut self, duration: Duration) -> Self {
        self.total_ms = duration.as_secs_f64() * 1000.0;
        self
    }
}

impl GenerationStats {
    /// Compute statistics from a population
    pub fn from_population<G, F>(
        population: &Population<G, F>,
        generation: usize,
        evaluations: usize,
    ) -> Self
    where
        G: EvolutionaryGenome,
        F: FitnessValue,
    {
        let fitnesses: Vec<f64> = population.iter().filter_map(|i| i.fitness_f64()).collect();

        let mut stats = Self {
            generation,
            evaluations,
            best_fitness: f64::NEG_INFINITY,
            worst_fitness: f64::INFINITY,
            mean_fitness: 0.0,
            fitness_std: 0.0,
            replacements: 0,
            model: None,
            timing: TimingStats::default(),
        };
        if fitnesses.is_empty() {
            return stats;
        }

        let n = fitnesses.len() as f64;
        let mean = fitnesses.iter().sum::<f64>() / n;
        stats.best_fitness = fitnesses.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        stats.worst_fitness = fitnesses.iter().copied().fold(f64::INFINITY, f64::min);
        stats.mean_fitness = mean;
        if fitnesses.len() > 1 {
            let variance = fitnesses.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / (n - 1.0);
            stats.fitness_std = variance.sqrt();
        }
        stats
    }

    /// Set timing information
    pub fn with_timing(mut self, timing: TimingStats) -> Self {
        self.timing = timing;
        self
    }

    /// Attach the summary of this generation's model
    pub fn with_model(mut self, model: ModelSummary) -> Self {
        self.model = Some(model);
        self
    }

    /// Record how many offspring replaced population members
    pub fn with_replacements(mut self, replacements: usize) -> Self {
        self.replacements = replacements;
        self
    }
}

/// Statistics collector for an entire evolution run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Statistics per generation
    pub generations: Vec<GenerationStats>,
    /// Total runtime in milliseconds
    pub total_runtime_ms: f64,
    /// Reason for termination
    pub termination_reason: Option<String>,
}

impl EvolutionStats {
    /// Create a new stats collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generation's statistics
    pub fn record(&mut self, stats: GenerationStats) {
        self.generations.push(stats);
    }

    /// Get the number of generations recorded
    pub fn num_generations(&self) -> usize {
        self.generations.len()
    }

    /// Get the history of best fitness values
    pub fn best_fitness_history(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.best_fitness).collect()
    }

    /// Total time spent building models across the run (ms)
    pub fn total_model_build_ms(&self) -> f64 {
        self.generations.iter().map(|g| g.timing.model_build_ms).sum()
    }

    /// Set the termination reason
    pub fn set_termination_reason(&mut self, reason: &str) {
        self.termination_reason = Some(reason.to_string());
    }

    /// Set the total runtime
    pub fn set_runtime(&mut self, duration: Duration) {
        self.total_runtime_ms = duration.as_secs_f64() * 1000.0;
    }
}

/// Result of an evolution run
#[derive(Clone, Debug)]
pub struct EvolutionResult<G, F = f64>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// The best genome found
    pub best_genome: G,
    /// The best fitness value
    pub best_fitness: F,
    /// Number of generations completed
    pub generations: usize,
    /// Total fitness evaluations
    pub evaluations: usize,
    /// Statistics for the run
    pub stats: EvolutionStats,
}

impl<G, F> EvolutionResult<G, F>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// Create a new evolution result
    pub fn new(best_genome: G, best_fitness: F, generations: usize, evaluations: usize) -> Self {
        Self {
            best_genome,
            best_fitness,
            generations,
            evaluations,
            stats: EvolutionStats::new(),
        }
    }

    /// Add statistics to the result
    pub fn with_stats(mut self, stats: EvolutionStats) -> Self {
        self.stats = stats;
        self
    }
}

pub mod prelude {
    pub use super::{EvolutionResult, EvolutionStats, GenerationStats, TimingStats};
}
