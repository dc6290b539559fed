//! External collaborator interfaces.
//!
//! The engine reads tasks and resources from repositories and hands
//! finished results to a store. All three are async trait objects so the
//! engine can sit in front of any database or service; [`memory`] ships
//! in-process implementations.

pub mod memory;

use async_trait::async_trait;

use crate::error::InfraError;
use crate::models::{OptimizationResult, RequestId, Resource, ResourceFilter, Task, TimeWindow};

pub use memory::{InMemoryProjectRepository, InMemoryResourceRepository, InMemoryResultStore};

/// Source of tasks.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Tasks of the given projects relevant to `horizon`.
    async fn get_tasks(
        &self,
        project_ids: &[String],
        horizon: &TimeWindow,
    ) -> Result<Vec<Task>, InfraError>;
}

/// Source of resources.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Resources passing `filter`.
    async fn get_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, InfraError>;
}

/// Durable result storage.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Stores (or replaces) a result under its request ID.
    async fn save(&self, result: &OptimizationResult) -> Result<(), InfraError>;

    /// Loads a result.
    async fn get(&self, request_id: &RequestId) -> Result<Option<OptimizationResult>, InfraError>;
}
