//! Generational GA loop.
//!
//! # Algorithm
//!
//! 1. Seed one individual with each task's highest-success candidate; fill
//!    the rest with uniform random candidates at full capacity.
//! 2. Each generation: carry the elites (with their cached evaluations),
//!    then fill by tournament selection, single-point crossover and
//!    mutation. Unchanged children keep their parent's evaluation.
//! 3. Evaluate new individuals (in parallel on the rayon pool if enabled).
//! 4. Stop at the generation cap, on convergence, or on cancellation.
//!
//! Convergence: the top-10 fitness values of the last
//! `convergence_window` generations have pooled variance below
//! `convergence_threshold`.
//!
//! All randomness comes from one [`SmallRng`] seeded per run, and
//! evaluation is order-independent, so a fixed seed reproduces the run
//! regardless of the thread count.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use super::config::GaConfig;
use super::operators::{tournament, GeneticOperators};
use super::population::{Gene, Individual, Population};
use super::problem::AllocationProblem;
use crate::models::GenerationStats;

/// Top individuals sampled per generation for the convergence check.
const CONVERGENCE_SAMPLE: usize = 10;

/// Cooperative cancellation flag shared between a run and its owner.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a wall-clock deadline after which the token reads as cancelled.
    ///
    /// A timeout too large to represent means no deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Result of one GA run.
#[derive(Debug, Clone)]
pub struct GaOutcome {
    /// Best individual found (evaluated).
    pub best: Individual,
    /// Best and mean fitness per generation, starting at generation 0.
    pub trajectory: Vec<GenerationStats>,
    /// Generations run after initialization.
    pub generations: usize,
    /// Whether the convergence criterion fired.
    pub converged: bool,
    /// `false` if the run stopped on cancellation or its time limit.
    pub completed: bool,
    /// Seed actually used.
    pub seed: u64,
}

/// Runs the allocation GA.
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA to completion, convergence, or cancellation.
    pub fn run(
        problem: &AllocationProblem<'_>,
        config: &GaConfig,
        cancel: &CancelToken,
    ) -> GaOutcome {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = SmallRng::seed_from_u64(seed);
        let ops = GeneticOperators::default();

        let stride = problem.task_count();
        let size = config.population_size.max(2);
        let elites = config.elite_count().min(size);
        let time_limit = config
            .time_limit_ms
            .and_then(|ms| Instant::now().checked_add(Duration::from_millis(ms)));

        let seeded: Vec<Gene> = (0..stride).map(|t| problem.seeded_gene(t)).collect();
        let mut population = Population::with_capacity(stride, size);
        population.push(&seeded, None);
        while population.len() < size {
            let genes: Vec<Gene> = (0..stride)
                .map(|t| problem.random_gene(t, &mut rng))
                .collect();
            population.push(&genes, None);
        }
        population.evaluate(problem, config.parallel);

        let mut trajectory = vec![stats(&population, 0)];
        let mut window: VecDeque<Vec<f64>> = VecDeque::with_capacity(config.convergence_window);
        window.push_back(population.top_fitness(CONVERGENCE_SAMPLE));

        let mut next = Population::with_capacity(stride, size);
        let mut generations = 0;
        let mut converged = false;
        let mut completed = true;

        while generations < config.max_generations {
            if cancel.is_cancelled() || time_limit.is_some_and(|t| Instant::now() >= t) {
                debug!(generations, "GA stopped early");
                completed = false;
                break;
            }

            next.clear();
            for &i in population.ranked().iter().take(elites) {
                next.push(population.individual(i), population.evaluation(i).copied());
            }

            while next.len() < size {
                let a = tournament(&population, config.tournament_size, &mut rng);
                let b = tournament(&population, config.tournament_size, &mut rng);

                let children = if rng.random::<f64>() < config.crossover_rate {
                    let (c1, c2) = ops.crossover(
                        population.individual(a),
                        population.individual(b),
                        &mut rng,
                    );
                    [(c1, None), (c2, None)]
                } else {
                    [
                        (population.individual(a).to_vec(), population.evaluation(a).copied()),
                        (population.individual(b).to_vec(), population.evaluation(b).copied()),
                    ]
                };

                for (mut genes, mut eval) in children {
                    if next.len() >= size {
                        break;
                    }
                    if rng.random::<f64>() < config.mutation_rate
                        && ops.mutate(&mut genes, problem, &mut rng)
                    {
                        eval = None;
                    }
                    next.push(&genes, eval);
                }
            }

            std::mem::swap(&mut population, &mut next);
            population.evaluate(problem, config.parallel);
            generations += 1;

            let gen_stats = stats(&population, generations);
            trace!(
                generation = generations,
                best = gen_stats.best_fitness,
                mean = gen_stats.mean_fitness,
                "generation complete"
            );
            trajectory.push(gen_stats);

            if window.len() == config.convergence_window.max(1) {
                window.pop_front();
            }
            window.push_back(population.top_fitness(CONVERGENCE_SAMPLE));
            if window.len() == config.convergence_window.max(1)
                && pooled_variance(&window) < config.convergence_threshold
            {
                converged = true;
                break;
            }
        }

        let mut best = population
            .best_index()
            .map(|i| population.to_individual(i))
            .unwrap_or_else(|| Individual::new(seeded));
        best.evaluate(problem);

        debug!(
            seed,
            generations,
            converged,
            completed,
            best = best.evaluation().map(|e| e.fitness),
            "GA finished"
        );

        GaOutcome {
            best,
            trajectory,
            generations,
            converged,
            completed,
            seed,
        }
    }
}

fn stats(population: &Population, generation: usize) -> GenerationStats {
    GenerationStats {
        generation,
        best_fitness: population
            .best_index()
            .and_then(|i| population.evaluation(i))
            .map(|e| e.fitness)
            .unwrap_or(0.0),
        mean_fitness: population.mean_fitness(),
    }
}

/// Variance of all values across the window.
fn pooled_variance(window: &VecDeque<Vec<f64>>) -> f64 {
    let values: Vec<f64> = window.iter().flatten().copied().collect();
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScheduleConfig;
    use crate::models::{ConstraintSet, OptimizationRequest, Resource, Task, TimeWindow, MS_PER_HOUR};
    use crate::scoring::WeightedScoringModel;

    fn fixture() -> (Vec<Task>, Vec<Resource>, OptimizationRequest) {
        let tasks = (0..6)
            .map(|i| {
                Task::new(format!("T{i}"))
                    .with_skill(if i % 2 == 0 { "a" } else { "b" })
                    .with_duration_hours(2.0 + i as f64)
            })
            .collect();
        let resources = vec![
            Resource::labor("R1").with_skill("a", 0.9).with_cost(80.0),
            Resource::labor("R2").with_skill("a", 0.4).with_skill("b", 0.6).with_cost(40.0),
            Resource::labor("R3").with_skill("b", 0.9).with_cost(70.0),
        ];
        let req = OptimizationRequest::new(vec!["P".into()], TimeWindow::new(0, 200 * MS_PER_HOUR))
            .with_constraints(ConstraintSet::new().with_budget(10_000.0));
        (tasks, resources, req)
    }

    fn config() -> GaConfig {
        GaConfig::default()
            .with_population_size(20)
            .with_max_generations(30)
            .with_seed(42)
    }

    #[test]
    fn test_best_fitness_never_decreases() {
        let (tasks, resources, req) = fixture();
        let problem = AllocationProblem::new(
            &tasks,
            &resources,
            &req,
            &WeightedScoringModel::new(),
            &ScheduleConfig::default(),
        )
        .unwrap();

        let outcome = GaRunner::run(&problem, &config(), &CancelToken::new());
        assert!(outcome.completed);
        assert_eq!(outcome.seed, 42);
        assert_eq!(outcome.trajectory.len(), outcome.generations + 1);
        for w in outcome.trajectory.windows(2) {
            assert!(w[1].best_fitness >= w[0].best_fitness - 1e-12);
        }
        let best = outcome.best.evaluation().unwrap();
        let last = outcome.trajectory.last().unwrap();
        assert!((best.fitness - last.best_fitness).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let (tasks, resources, req) = fixture();
        let problem = AllocationProblem::new(
            &tasks,
            &resources,
            &req,
            &WeightedScoringModel::new(),
            &ScheduleConfig::default(),
        )
        .unwrap();

        let a = GaRunner::run(&problem, &config(), &CancelToken::new());
        let b = GaRunner::run(&problem, &config().with_parallel(false), &CancelToken::new());
        assert_eq!(a.best.genes, b.best.genes);
        assert_eq!(a.generations, b.generations);
        assert_eq!(a.trajectory, b.trajectory);
    }

    #[test]
    fn test_cancelled_before_start() {
        let (tasks, resources, req) = fixture();
        let problem = AllocationProblem::new(
            &tasks,
            &resources,
            &req,
            &WeightedScoringModel::new(),
            &ScheduleConfig::default(),
        )
        .unwrap();

        let token = CancelToken::new();
        token.clone().cancel();
        assert!(token.is_cancelled());

        let outcome = GaRunner::run(&problem, &config(), &token);
        assert!(!outcome.completed);
        assert_eq!(outcome.generations, 0);
        assert!(outcome.best.evaluation().is_some());
    }

    #[test]
    fn test_converges_on_trivial_problem() {
        let tasks = vec![Task::new("T1").with_skill("a")];
        let resources = vec![Resource::labor("R1").with_skill("a", 1.0)];
        let req = OptimizationRequest::new(vec!["P".into()], TimeWindow::new(0, 10 * MS_PER_HOUR));
        let problem = AllocationProblem::new(
            &tasks,
            &resources,
            &req,
            &WeightedScoringModel::new(),
            &ScheduleConfig::default(),
        )
        .unwrap();

        // Mutation-free: every individual stays on the single candidate at full capacity.
        let cfg = config().with_mutation_rate(0.0).with_max_generations(100);
        let outcome = GaRunner::run(&problem, &cfg, &CancelToken::new());
        assert!(outcome.converged);
        assert!(outcome.generations < 100);
    }

    #[test]
    fn test_unrepresentable_deadlines_mean_no_limit() {
        let (tasks, resources, req) = fixture();
        let problem = AllocationProblem::new(
            &tasks,
            &resources,
            &req,
            &WeightedScoringModel::new(),
            &ScheduleConfig::default(),
        )
        .unwrap();

        let token = CancelToken::new().with_timeout(Duration::MAX);
        assert!(!token.is_cancelled());

        let cfg = config().with_time_limit(Duration::MAX).with_max_generations(5);
        assert_eq!(cfg.time_limit_ms, Some(u64::MAX));
        let outcome = GaRunner::run(&problem, &cfg, &token);
        assert!(outcome.completed);
        assert!(outcome.generations > 0);
    }

    #[test]
    fn test_pooled_variance() {
        let mut w = VecDeque::new();
        w.push_back(vec![1.0, 1.0]);
        w.push_back(vec![3.0, 3.0]);
        assert!((pooled_variance(&w) - 1.0).abs() < 1e-12);
    }
}
