//! Probabilistic model-building genetic algorithm
//!
//! Each generation runs in two phases. First the parent set is collected by
//! tournament selection. Then a single model (linkage or Bayesian network)
//! is learned from it, the children are drawn from that model, evaluated,
//! and inserted into the population by the configured replacement strategy.

use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::gene_matrix::{GeneMatrix, ParentPool};
use super::model::{Model, ModelBuilder, ModelConfig, ModelKind, ProbabilisticModel};
use super::network::NetworkConfig;
use crate::diagnostics::{EvolutionResult, EvolutionStats, GenerationStats, TimingStats};
use crate::error::EvolutionError;
use crate::fitness::traits::{Fitness, FitnessValue};
use crate::genome::bit_string::BitString;
use crate::genome::traits::BinaryGenome;
use crate::operators::replacement::ReplacementStrategy;
use crate::operators::selection::TournamentSelection;
use crate::operators::traits::SelectionOperator;
use crate::population::individual::Individual;
use crate::population::population::Population;
use crate::termination::{
    default_termination, AnyOf, EvolutionState, MaxGenerations, NoImprovement, TargetFitness,
    TerminationCriterion,
};

/// Configuration for the PMBGA
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PmbgaConfig {
    /// Population size; also the number of parents and children per generation
    pub population_size: usize,
    /// Bits per genome
    pub genome_length: usize,
    /// Tournament size for parent selection
    pub tournament_size: usize,
    /// How children enter the population
    pub replacement: ReplacementStrategy,
    /// Model family and structure limits
    pub model: ModelConfig,
    /// Also stop as soon as the fitness function's known optimum is reached
    pub stop_at_optimum: bool,
}

impl Default for PmbgaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            genome_length: 0,
            tournament_size: 2,
            replacement: ReplacementStrategy::default(),
            model: ModelConfig::default(),
            stop_at_optimum: false,
        }
    }
}

/// Builder for [`Pmbga`]
pub struct PmbgaBuilder<F, Fit, Term>
where
    F: FitnessValue,
{
    config: PmbgaConfig,
    fitness: Option<Fit>,
    termination: Term,
    _phantom: std::marker::PhantomData<F>,
}

impl<F: FitnessValue> PmbgaBuilder<F, (), AnyOf> {
    /// Create a new builder with default configuration
    ///
    /// Runs stop on [`default_termination`] unless another rule is set.
    pub fn new() -> Self {
        Self {
            config: PmbgaConfig::default(),
            fitness: None,
            termination: default_termination(),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F: FitnessValue> Default for PmbgaBuilder<F, (), AnyOf> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, Fit, Term> PmbgaBuilder<F, Fit, Term>
where
    F: FitnessValue,
{
    /// Replace the whole configuration
    pub fn config(mut self, config: PmbgaConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the population size
    pub fn population_size(mut self, size: usize) -> Self {
        self.config.population_size = size;
        self
    }

    /// Set the number of bits per genome
    pub fn genome_length(mut self, length: usize) -> Self {
        self.config.genome_length = length;
        self
    }

    /// Set the tournament size (at least 1)
    pub fn tournament_size(mut self, size: usize) -> Self {
        self.config.tournament_size = size.max(1);
        self
    }

    /// Set the replacement strategy
    pub fn replacement(mut self, replacement: ReplacementStrategy) -> Self {
        self.config.replacement = replacement;
        self
    }

    /// Restricted tournament replacement with the given window (0 = automatic)
    pub fn rtr_window(mut self, window_size: usize) -> Self {
        self.config.replacement = ReplacementStrategy::RestrictedTournament { window_size };
        self
    }

    /// Set the model configuration
    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    /// Learn a linkage (marginal product) model each generation
    pub fn linkage(mut self) -> Self {
        self.config.model.kind = ModelKind::Linkage;
        self
    }

    /// Learn a Bayesian network each generation
    pub fn bayesian(mut self, network: NetworkConfig) -> Self {
        self.config.model = ModelConfig::bayesian(network);
        self
    }

    /// Set the minimum leaf size for network splits
    pub fn min_split(mut self, min_split: usize) -> Self {
        self.config.model.network.min_split = min_split;
        self
    }

    /// Set the per-locus parent cap (0 = unbounded)
    pub fn max_parents(mut self, max_parents: usize) -> Self {
        self.config.model.network.max_parents = max_parents;
        self
    }

    /// Set the per-split penalty
    pub fn split_penalty(mut self, penalty: f64) -> Self {
        self.config.model.network.split_penalty = Some(penalty.max(0.0));
        self
    }

    /// Stop early once the best fitness reaches [`Fitness::optimum`]
    pub fn stop_at_optimum(mut self) -> Self {
        self.config.stop_at_optimum = true;
        self
    }

    /// Set the fitness function
    pub fn fitness<NewFit>(self, fitness: NewFit) -> PmbgaBuilder<F, NewFit, Term>
    where
        NewFit: Fitness<Genome = BitString, Value = F>,
    {
        PmbgaBuilder {
            config: self.config,
            fitness: Some(fitness),
            termination: self.termination,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Set the termination criterion
    pub fn termination<NewTerm>(self, termination: NewTerm) -> PmbgaBuilder<F, Fit, NewTerm>
    where
        NewTerm: TerminationCriterion,
    {
        PmbgaBuilder {
            config: self.config,
            fitness: self.fitness,
            termination,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Run exactly `max` generations
    pub fn max_generations(self, max: usize) -> PmbgaBuilder<F, Fit, MaxGenerations> {
        self.termination(MaxGenerations::new(max))
    }

    /// Stop after `max_generations`, or earlier once the best fitness has
    /// not improved for `max_no_change` generations (0 disables that rule)
    pub fn stop_after(
        self,
        max_generations: usize,
        max_no_change: usize,
    ) -> PmbgaBuilder<F, Fit, AnyOf> {
        self.termination(AnyOf::new(vec![
            Box::new(NoImprovement::new(max_no_change)),
            Box::new(MaxGenerations::new(max_generations)),
        ]))
    }
}

impl<F, Fit, Term> PmbgaBuilder<F, Fit, Term>
where
    F: FitnessValue,
    Fit: Fitness<Genome = BitString, Value = F> + Sync,
    Term: TerminationCriterion,
{
    /// Validate the configuration and build the algorithm
    pub fn build(self) -> Result<Pmbga<F, Fit, Term>, EvolutionError> {
        if self.config.population_size < 2 {
            return Err(EvolutionError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        if self.config.genome_length == 0 {
            return Err(EvolutionError::Configuration(
                "Genome length must be specified".to_string(),
            ));
        }
        if self.config.tournament_size == 0 {
            return Err(EvolutionError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }

        let fitness = self.fitness.ok_or_else(|| {
            EvolutionError::Configuration("Fitness function must be specified".to_string())
        })?;

        let replacement = self
            .config
            .replacement
            .resolved(self.config.population_size, self.config.genome_length);

        Ok(Pmbga {
            selection: TournamentSelection::new(self.config.tournament_size),
            models: ModelBuilder::new(self.config.model.clone(), self.config.population_size),
            replacement,
            config: self.config,
            fitness,
            termination: self.termination,
            _phantom: std::marker::PhantomData,
        })
    }
}

/// What one generation produced
#[derive(Clone, Debug)]
pub struct GenerationOutcome {
    /// The model learned from this generation's parents
    pub model: Model,
    /// Fitness evaluations spent on the children
    pub evaluations: usize,
    /// Children that took a population slot
    pub replacements: usize,
    /// Phase timings
    pub timing: TimingStats,
}

/// Probabilistic model-building GA over bit strings
pub struct Pmbga<F, Fit, Term>
where
    F: FitnessValue,
{
    config: PmbgaConfig,
    fitness: Fit,
    termination: Term,
    selection: TournamentSelection,
    models: ModelBuilder,
    replacement: ReplacementStrategy,
    _phantom: std::marker::PhantomData<F>,
}

impl<F, Fit, Term> Pmbga<F, Fit, Term>
where
    F: FitnessValue,
    Fit: Fitness<Genome = BitString, Value = F> + Sync,
    Term: TerminationCriterion,
{
    /// Create a builder
    pub fn builder() -> PmbgaBuilder<F, (), AnyOf> {
        PmbgaBuilder::new()
    }

    /// The validated configuration
    pub fn config(&self) -> &PmbgaConfig {
        &self.config
    }

    /// Replacement strategy with the automatic window resolved
    pub fn replacement(&self) -> ReplacementStrategy {
        self.replacement
    }

    /// Random, evaluated starting population
    pub fn initial_population<R: Rng>(&self, rng: &mut R) -> (Population<BitString, F>, usize) {
        let mut population =
            Population::random(self.config.population_size, self.config.genome_length, rng);
        let evaluations = population.evaluate_parallel(&self.fitness);
        (population, evaluations)
    }

    /// Phase one: fill the parent pool by tournament selection
    pub fn collect_parents<R: Rng>(
        &self,
        population: &Population<BitString, F>,
        rng: &mut R,
    ) -> Result<GeneMatrix, EvolutionError> {
        let candidates = population.as_selection_pool();
        if candidates.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }
        let count = self.config.population_size;
        let picks = self.selection.select_many(&candidates, count, rng);

        let mut pool = ParentPool::new(count, self.config.genome_length);
        for slot in picks.chunks(2) {
            match *slot {
                [a, b] => pool.collect_pair(candidates[a].0, candidates[b].0)?,
                [a] => pool.collect_parent(candidates[a].0)?,
                _ => {}
            }
        }
        Ok(pool.finish()?)
    }

    /// Run one generation against `population`
    ///
    /// Children are stamped with `generation` as their birth generation.
    pub fn step<R: Rng>(
        &self,
        population: &mut Population<BitString, F>,
        generation: usize,
        rng: &mut R,
    ) -> Result<GenerationOutcome, EvolutionError> {
        let gen_start = Instant::now();

        let phase = Instant::now();
        let genes = self.collect_parents(population, rng)?;
        let selection_time = phase.elapsed();

        let phase = Instant::now();
        let model = self.models.build(&genes)?;
        let build_time = phase.elapsed();
        trace!(generation, "learned model:\n{model}");

        let phase = Instant::now();
        let children = model
            .sample_children(self.config.population_size, rng)?
            .into_iter()
            .map(|bits| BitString::from_bits(bits).map(|g| Individual::with_generation(g, generation)))
            .collect::<Result<Vec<_>, _>>()?;
        let sampling_time = phase.elapsed();

        let phase = Instant::now();
        let mut offspring = Population::from_individuals(children);
        let evaluations = offspring.evaluate_parallel(&self.fitness);
        let evaluation_time = phase.elapsed();

        let replacements = self
            .replacement
            .apply(population, offspring.into_iter().collect(), rng);

        let timing = TimingStats::new()
            .with_selection(selection_time)
            .with_model_build(build_time)
            .with_sampling(sampling_time)
            .with_evaluation(evaluation_time)
            .with_total(gen_start.elapsed());

        Ok(GenerationOutcome {
            model,
            evaluations,
            replacements,
            timing,
        })
    }

    /// Run the algorithm
    pub fn run<R: Rng>(&self, rng: &mut R) -> Result<EvolutionResult<BitString, F>, EvolutionError> {
        self.run_with_model(rng).map(|(result, _)| result)
    }

    /// Run the algorithm and also return the model of the final generation
    pub fn run_with_model<R: Rng>(
        &self,
        rng: &mut R,
    ) -> Result<(EvolutionResult<BitString, F>, Option<Model>), EvolutionError> {
        let start_time = Instant::now();
        info!(
            population_size = self.config.population_size,
            genome_length = self.config.genome_length,
            model = %self.config.model.kind,
            replacement = ?self.replacement,
            "starting PMBGA run"
        );

        let optimum = self
            .config
            .stop_at_optimum
            .then(|| self.fitness.optimum())
            .flatten()
            .map(TargetFitness::new);

        let (mut population, mut evaluations) = self.initial_population(rng);

        let mut stats = EvolutionStats::new();
        let mut fitness_history: Vec<f64> = Vec::new();
        let mut generation = 0usize;
        let mut last_model = None;

        let mut best = population
            .best()
            .ok_or(EvolutionError::EmptyPopulation)?
            .clone();

        let gen_stats = GenerationStats::from_population(&population, 0, evaluations);
        fitness_history.push(gen_stats.best_fitness);
        stats.record(gen_stats);

        loop {
            let state = EvolutionState {
                generation,
                evaluations,
                best_fitness: best.fitness_f64().unwrap_or(f64::NEG_INFINITY),
                fitness_history: &fitness_history,
            };

            let reason = optimum
                .as_ref()
                .and_then(|target| target.should_stop(&state))
                .or_else(|| self.termination.should_stop(&state));
            if let Some(reason) = reason {
                stats.set_termination_reason(reason);
                break;
            }

            let outcome = self.step(&mut population, generation + 1, rng)?;
            evaluations += outcome.evaluations;

            if let Some(pop_best) = population.best() {
                if pop_best.is_better_than(&best) {
                    best = pop_best.clone();
                }
            }

            generation += 1;

            let summary = outcome.model.summary();
            let gen_stats = GenerationStats::from_population(&population, generation, evaluations)
                .with_timing(outcome.timing)
                .with_replacements(outcome.replacements)
                .with_model(summary.clone());
            debug!(
                generation,
                best = gen_stats.best_fitness,
                mean = gen_stats.mean_fitness,
                replacements = outcome.replacements,
                groups = summary.groups,
                edges = summary.edges,
                steps = summary.structure_steps,
                "generation complete"
            );
            fitness_history.push(gen_stats.best_fitness);
            stats.record(gen_stats);
            last_model = Some(outcome.model);
        }

        stats.set_runtime(start_time.elapsed());
        info!(
            generations = generation,
            evaluations,
            best_fitness = best.fitness_f64(),
            model_build_ms = stats.total_model_build_ms(),
            reason = stats.termination_reason.as_deref().unwrap_or("unknown"),
            "PMBGA run finished"
        );

        let best_fitness = best.fitness.clone().ok_or_else(|| {
            EvolutionError::Configuration("Best individual was never evaluated".to_string())
        })?;
        let result = EvolutionResult::new(best.genome, best_fitness, generation, evaluations)
            .with_stats(stats);
        Ok((result, last_model))
    }
}
