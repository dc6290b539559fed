//! In-process collaborator implementations.
//!
//! Each one can be told to fail its next `n` calls, which is how retry and
//! degraded-persistence paths are exercised.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ProjectRepository, ResourceRepository, ResultStore};
use crate::error::InfraError;
use crate::models::{OptimizationResult, RequestId, Resource, ResourceFilter, Task, TimeWindow};

/// Countdown of injected failures.
#[derive(Debug, Default)]
struct FailureBudget(AtomicU32);

impl FailureBudget {
    fn set(&self, n: u32) {
        self.0.store(n, Ordering::SeqCst);
    }

    /// Consumes one failure if any remain.
    fn take(&self) -> bool {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Tasks keyed by project ID.
#[derive(Debug, Default)]
pub struct InMemoryProjectRepository {
    projects: RwLock<BTreeMap<String, Vec<Task>>>,
    failures: FailureBudget,
    calls: AtomicU32,
}

impl InMemoryProjectRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a project's tasks.
    pub fn with_project(self, project_id: impl Into<String>, tasks: Vec<Task>) -> Self {
        self.insert(project_id, tasks);
        self
    }

    /// Adds or replaces a project's tasks.
    pub fn insert(&self, project_id: impl Into<String>, tasks: Vec<Task>) {
        self.projects.write().insert(project_id.into(), tasks);
    }

    /// Fails the next `n` calls.
    pub fn fail_next(&self, n: u32) {
        self.failures.set(n);
    }

    /// Number of calls received (including failed ones).
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    /// Tasks of the listed projects, in project order, that can start
    /// before the horizon ends. Unknown projects contribute nothing.
    async fn get_tasks(
        &self,
        project_ids: &[String],
        horizon: &TimeWindow,
    ) -> Result<Vec<Task>, InfraError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.take() {
            return Err(InfraError::Unavailable("project repository".into()));
        }
        let projects = self.projects.read();
        Ok(project_ids
            .iter()
            .filter_map(|id| projects.get(id))
            .flatten()
            .filter(|t| t.earliest_start_ms < horizon.end_ms)
            .cloned()
            .collect())
    }
}

/// Flat resource pool.
#[derive(Debug, Default)]
pub struct InMemoryResourceRepository {
    resources: RwLock<Vec<Resource>>,
    failures: FailureBudget,
}

impl InMemoryResourceRepository {
    /// Creates a repository holding `resources`.
    pub fn new(resources: Vec<Resource>) -> Self {
        Self {
            resources: RwLock::new(resources),
            failures: FailureBudget::default(),
        }
    }

    /// Fails the next `n` calls.
    pub fn fail_next(&self, n: u32) {
        self.failures.set(n);
    }
}

#[async_trait]
impl ResourceRepository for InMemoryResourceRepository {
    async fn get_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, InfraError> {
        if self.failures.take() {
            return Err(InfraError::Unavailable("resource repository".into()));
        }
        Ok(self
            .resources
            .read()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

/// Results keyed by request ID.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: RwLock<HashMap<RequestId, OptimizationResult>>,
    failures: FailureBudget,
    saves: AtomicU32,
}

impl InMemoryResultStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next `n` calls.
    pub fn fail_next(&self, n: u32) {
        self.failures.set(n);
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn save(&self, result: &OptimizationResult) -> Result<(), InfraError> {
        if self.failures.take() {
            return Err(InfraError::Persistence("result store".into()));
        }
        self.results
            .write()
            .insert(result.request_id.clone(), result.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, request_id: &RequestId) -> Result<Option<OptimizationResult>, InfraError> {
        if self.failures.take() {
            return Err(InfraError::Unavailable("result store".into()));
        }
        Ok(self.results.read().get(request_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResourceType, MS_PER_HOUR};

    #[tokio::test]
    async fn test_project_repository() {
        let repo = InMemoryProjectRepository::new()
            .with_project("P1", vec![Task::new("T1"), Task::new("T2").with_earliest_start(10 * MS_PER_HOUR)])
            .with_project("P2", vec![Task::new("T3")]);
        let horizon = TimeWindow::new(0, 5 * MS_PER_HOUR);

        let tasks = repo
            .get_tasks(&["P2".to_string(), "P1".to_string(), "P9".to_string()], &horizon)
            .await
            .unwrap();
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T3", "T1"]);

        repo.fail_next(1);
        assert!(repo.get_tasks(&["P1".to_string()], &horizon).await.is_err());
        assert!(repo.get_tasks(&["P1".to_string()], &horizon).await.is_ok());
        assert_eq!(repo.calls(), 3);
    }

    #[tokio::test]
    async fn test_resource_filter() {
        let repo = InMemoryResourceRepository::new(vec![
            Resource::labor("R1"),
            Resource::equipment("E1"),
        ]);
        let only_equipment = ResourceFilter::all().with_type(ResourceType::Equipment);
        let found = repo.get_resources(&only_equipment).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "E1");
    }

    #[tokio::test]
    async fn test_store_failures_count_down() {
        let store = InMemoryResultStore::new();
        store.fail_next(2);
        let id = RequestId::new("missing");
        assert!(store.get(&id).await.is_err());
        assert!(store.get(&id).await.is_err());
        assert_eq!(store.get(&id).await.unwrap(), None);
        assert!(store.is_empty());
        assert_eq!(store.save_count(), 0);
    }
}
