//! Resource-allocation optimization engine.
//!
//! Assigns qualified resources to project tasks with a genetic search,
//! turns the best assignment into a critical-path schedule and reports
//! risks, bottlenecks and cost/time scenarios around it.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Resource`, `Calendar`, `ConstraintSet`,
//!   `OptimizationRequest`, `SchedulingPlan`, `OptimizationResult`
//! - **`validation`**: Request and input integrity checks (duplicate IDs, DAG cycles)
//! - **`features`**: Per task-resource pair feature extraction
//! - **`scoring`**: Pluggable `ScoringModel` with a weighted default
//! - **`ga`**: Allocation genetic algorithm (encoding, operators, runner)
//! - **`scheduler`**: Placement, CPM forward/backward pass, KPIs
//! - **`analysis`**: Risk warnings, bottlenecks, scenarios, recommendations
//! - **`collaborators`**: Repository and result-store traits with in-memory impls
//! - **`orchestrator`**: Async engine with idempotent submission, retries, cancellation
//! - **`config`**, **`error`**: Engine configuration and error types
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use u_allocate::collaborators::{
//!     InMemoryProjectRepository, InMemoryResourceRepository, InMemoryResultStore,
//! };
//! use u_allocate::models::{OptimizationRequest, Resource, Task, TimeWindow, MS_PER_DAY};
//! use u_allocate::OptimizationEngine;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let projects = InMemoryProjectRepository::new().with_project(
//!     "P1",
//!     vec![Task::new("T1").with_skill("welding").with_duration_hours(4.0)],
//! );
//! let resources = InMemoryResourceRepository::new(vec![
//!     Resource::labor("R1").with_skill("welding", 0.9).with_cost(50.0),
//! ]);
//! let engine = OptimizationEngine::builder(
//!     Arc::new(projects),
//!     Arc::new(resources),
//!     Arc::new(InMemoryResultStore::new()),
//! )
//! .build();
//!
//! let request = OptimizationRequest::new(vec!["P1".into()], TimeWindow::new(0, 7 * MS_PER_DAY))
//!     .with_seed(1);
//! let result = engine.run(request).await.unwrap();
//! assert!(result.feasible);
//! assert_eq!(result.allocations[0].resource_id.as_deref(), Some("R1"));
//! # });
//! ```

pub mod analysis;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod features;
pub mod ga;
pub mod models;
pub mod orchestrator;
pub mod scheduler;
pub mod scoring;
pub mod validation;

pub use config::EngineConfig;
pub use error::{EngineError, InfraError};
pub use orchestrator::{optimize, OptimizationEngine, RunStatus};
pub use scoring::{ScoringModel, WeightedScoringModel};
