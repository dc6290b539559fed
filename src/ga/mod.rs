//! GA-based resource allocation.
//!
//! A self-contained generational GA specialized for task-to-resource
//! allocation: arena population, tournament selection, single-point
//! crossover, reassign/perturb mutation, elitism and a variance-based
//! convergence check.
//!
//! # Encoding
//!
//! One [`Gene`] per task, in task input order: (task, resource, capacity
//! fraction, start, end). Start and end are written by the forward pass
//! during evaluation.
//!
//! # Submodules
//!
//! - [`operators`]: Crossover, mutation and selection
//!
//! # Reference
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization and Machine Learning"
//! - Hartmann (1998), "A competitive genetic algorithm for resource-constrained project scheduling"

mod config;
pub mod operators;
mod population;
mod problem;
mod runner;

pub use config::GaConfig;
pub use population::{compare, Evaluation, Gene, Individual, Population};
pub use problem::{AllocationProblem, Candidate, FitnessWeights};
pub use runner::{CancelToken, GaOutcome, GaRunner};
