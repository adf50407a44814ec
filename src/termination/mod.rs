//! Termination criteria
//!
//! Stopping rules evaluated by the generation driver before each generation.
//! A driver built without an explicit rule stops on [`default_termination`]:
//! a generation cap combined with a no-improvement window.

/// Progress of a run, as seen by a stopping rule
#[derive(Clone, Copy, Debug)]
pub struct EvolutionState<'a> {
    /// Generations completed so far
    pub generation: usize,
    /// Total fitness evaluations so far
    pub evaluations: usize,
    /// Best fitness found so far
    pub best_fitness: f64,
    /// Best fitness of the population after each generation, starting with
    /// the initial population
    pub fitness_history: &'a [f64],
}

/// Termination criterion trait
pub trait TerminationCriterion: Send + Sync {
    /// Reason for stopping, or `None` to run another generation
    fn should_stop(&self, state: &EvolutionState<'_>) -> Option<&'static str>;
}

/// Generation cap used by [`default_termination`]
pub const DEFAULT_MAX_GENERATIONS: usize = 1000;

/// No-improvement window used by [`default_termination`]
pub const DEFAULT_MAX_NO_CHANGE: usize = 100;

/// Stop at [`DEFAULT_MAX_GENERATIONS`] or after [`DEFAULT_MAX_NO_CHANGE`]
/// generations without a better best fitness, whichever comes first
pub fn default_termination() -> AnyOf {
    AnyOf::new(vec![
        Box::new(NoImprovement::new(DEFAULT_MAX_NO_CHANGE)),
        Box::new(MaxGenerations::new(DEFAULT_MAX_GENERATIONS)),
    ])
}

/// Terminate after a maximum number of generations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxGenerations(pub usize);

impl MaxGenerations {
    /// Stop once `max` generations have run
    pub fn new(max: usize) -> Self {
        Self(max)
    }
}

impl TerminationCriterion for MaxGenerations {
    fn should_stop(&self, state: &EvolutionState<'_>) -> Option<&'static str> {
        (state.generation >= self.0).then_some("Maximum generations reached")
    }
}

/// Terminate when the best fitness has not improved for `generations`
/// consecutive generations
///
/// A window of 0 never fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoImprovement {
    /// Length of the window, 0 to disable
    pub generations: usize,
}

impl NoImprovement {
    /// Stop after `generations` generations without a new best
    pub fn new(generations: usize) -> Self {
        Self { generations }
    }

    /// Generations since the history last reached a new maximum
    fn stalled_for(history: &[f64]) -> usize {
        let mut best = f64::NEG_INFINITY;
        let mut improved_at = 0;
        for (generation, &fitness) in history.iter().enumerate() {
            if fitness > best {
                best = fitness;
                improved_at = generation;
            }
        }
        history.len().saturating_sub(improved_at + 1)
    }
}

impl TerminationCriterion for NoImprovement {
    fn should_stop(&self, state: &EvolutionState<'_>) -> Option<&'static str> {
        if self.generations == 0 {
            return None;
        }
        (Self::stalled_for(state.fitness_history) >= self.generations)
            .then_some("Best fitness unchanged")
    }
}

/// Terminate when the best fitness reaches `target`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetFitness {
    /// Fitness to reach
    pub target: f64,
}

impl TargetFitness {
    /// Stop once the best fitness is at least `target`
    pub fn new(target: f64) -> Self {
        Self { target }
    }
}

impl TerminationCriterion for TargetFitness {
    fn should_stop(&self, state: &EvolutionState<'_>) -> Option<&'static str> {
        (state.best_fitness >= self.target).then_some("Target fitness reached")
    }
}

/// Stop on the first rule that fires, reporting that rule's reason
pub struct AnyOf {
    criteria: Vec<Box<dyn TerminationCriterion>>,
}

impl AnyOf {
    /// Rules are checked in order
    pub fn new(criteria: Vec<Box<dyn TerminationCriterion>>) -> Self {
        Self { criteria }
    }
}

impl TerminationCriterion for AnyOf {
    fn should_stop(&self, state: &EvolutionState<'_>) -> Option<&'static str> {
        self.criteria.iter().find_map(|c| c.should_stop(state))
    }
}

pub mod prelude {
    pub use super::{
        default_termination, AnyOf, EvolutionState, MaxGenerations, NoImprovement, TargetFitness,
        TerminationCriterion,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(generation: usize, best_fitness: f64, fitness_history: &[f64]) -> EvolutionState<'_> {
        EvolutionState {
            generation,
            evaluations: 0,
            best_fitness,
            fitness_history,
        }
    }

    #[test]
    fn test_max_generations() {
        let criterion = MaxGenerations::new(100);
        assert_eq!(criterion.should_stop(&state(99, 0.0, &[])), None);
        assert_eq!(
            criterion.should_stop(&state(100, 0.0, &[])),
            Some("Maximum generations reached")
        );
    }

    #[test]
    fn test_no_improvement_counts_from_last_new_best() {
        assert_eq!(NoImprovement::stalled_for(&[]), 0);
        assert_eq!(NoImprovement::stalled_for(&[1.0, 2.0, 3.0]), 0);
        assert_eq!(NoImprovement::stalled_for(&[1.0, 5.0, 5.0, 4.0]), 2);

        let criterion = NoImprovement::new(3);
        assert_eq!(criterion.should_stop(&state(3, 5.0, &[1.0, 5.0, 5.0, 5.0])), None);
        assert_eq!(
            criterion.should_stop(&state(4, 5.0, &[1.0, 5.0, 5.0, 5.0, 5.0])),
            Some("Best fitness unchanged")
        );
        // A late improvement restarts the window
        assert_eq!(criterion.should_stop(&state(5, 6.0, &[5.0, 5.0, 5.0, 5.0, 6.0])), None);
    }

    #[test]
    fn test_no_improvement_zero_window_never_fires() {
        let history = [1.0; 50];
        assert_eq!(NoImprovement::new(0).should_stop(&state(49, 1.0, &history)), None);
    }

    #[test]
    fn test_target_fitness() {
        let criterion = TargetFitness::new(10.0);
        assert_eq!(criterion.should_stop(&state(0, 9.0, &[])), None);
        assert_eq!(criterion.should_stop(&state(0, 10.0, &[])), Some("Target fitness reached"));
    }

    #[test]
    fn test_any_of_reports_the_rule_that_fired() {
        let criterion = AnyOf::new(vec![
            Box::new(MaxGenerations::new(100)),
            Box::new(TargetFitness::new(10.0)),
        ]);

        assert_eq!(criterion.should_stop(&state(50, 0.0, &[])), None);
        assert_eq!(
            criterion.should_stop(&state(100, 0.0, &[])),
            Some("Maximum generations reached")
        );
        assert_eq!(criterion.should_stop(&state(50, 10.0, &[])), Some("Target fitness reached"));
    }

    #[test]
    fn test_default_termination() {
        let rules = default_termination();
        let flat = vec![3.0; DEFAULT_MAX_NO_CHANGE + 1];
        assert_eq!(
            rules.should_stop(&state(DEFAULT_MAX_NO_CHANGE, 3.0, &flat)),
            Some("Best fitness unchanged")
        );
        assert_eq!(rules.should_stop(&state(DEFAULT_MAX_NO_CHANGE, 3.0, &flat[1..])), None);

        let rising: Vec<f64> = (0..=DEFAULT_MAX_GENERATIONS).map(|g| g as f64).collect();
        assert_eq!(
            rules.should_stop(&state(DEFAULT_MAX_GENERATIONS, 1000.0, &rising)),
            Some("Maximum generations reached")
        );
    }
}
