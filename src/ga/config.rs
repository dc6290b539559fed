//! Genetic optimizer configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// GA parameters.
///
/// # Example
///
/// ```
/// use u_allocate::ga::GaConfig;
///
/// let config = GaConfig::default()
///     .with_population_size(40)
///     .with_max_generations(50)
///     .with_seed(7)
///     .with_parallel(false);
/// assert_eq!(config.tournament_size, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GaConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Generation cap.
    pub max_generations: usize,
    /// Contestants per tournament.
    pub tournament_size: usize,
    /// Probability a selected pair is recombined.
    pub crossover_rate: f64,
    /// Probability a child is mutated.
    pub mutation_rate: f64,
    /// Share of the population carried unchanged into the next generation.
    pub elitism_rate: f64,
    /// Generations considered by the convergence check.
    pub convergence_window: usize,
    /// Convergence variance threshold.
    pub convergence_threshold: f64,
    /// Evaluate fitness on the rayon pool.
    pub parallel: bool,
    /// RNG seed. `None` = fresh entropy.
    pub seed: Option<u64>,
    /// Wall-clock limit for the search (ms). `None` = generation cap only.
    pub time_limit_ms: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 200,
            tournament_size: 5,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            elitism_rate: 0.1,
            convergence_window: 10,
            convergence_threshold: 0.001,
            parallel: true,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl GaConfig {
    /// Sets the population size (at least 2).
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Sets the generation cap.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the tournament size (at least 1).
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size.max(1);
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the elitism rate.
    pub fn with_elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the wall-clock limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Number of elites carried per generation (at least 1).
    pub fn elite_count(&self) -> usize {
        let n = (self.population_size as f64 * self.elitism_rate).round() as usize;
        n.clamp(1, self.population_size.max(1))
    }
}
