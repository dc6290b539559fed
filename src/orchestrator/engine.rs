//! Asynchronous optimization engine.
//!
//! The engine owns a registry of runs keyed by request ID. Submitting a
//! request that is already running or finished returns its ID without
//! starting a second run. Collaborator reads are retried under the
//! configured [`RetryPolicy`](super::RetryPolicy); a failed save degrades
//! the result to `persisted = false` instead of failing it.
//!
//! The registry holds running requests, failures, and results the store
//! could not take. A persisted result leaves the registry and is served
//! from the [`ResultStore`] from then on.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::pipeline::optimize;
use crate::analysis::request_of;
use crate::collaborators::{ProjectRepository, ResourceRepository, ResultStore};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ga::CancelToken;
use crate::models::{
    OptimizationRequest, OptimizationResult, Recommendation, RecommendationStatus, RequestId,
};
use crate::scoring::{ScoringModel, WeightedScoringModel};
use crate::validation::validate_request;

/// Externally visible state of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Accepted and still computing.
    Pending,
    /// Finished; the result may be infeasible or incomplete.
    Completed(Box<OptimizationResult>),
    /// Aborted by an infrastructure or internal error.
    Failed(String),
}

impl RunStatus {
    /// Whether the run is still computing.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The finished result, if any.
    pub fn result(&self) -> Option<&OptimizationResult> {
        match self {
            Self::Completed(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum RunState {
    Running(CancelToken),
    Completed(Box<OptimizationResult>),
    Failed(String),
}

impl RunState {
    fn status(&self) -> RunStatus {
        match self {
            Self::Running(_) => RunStatus::Pending,
            Self::Completed(result) => RunStatus::Completed(result.clone()),
            Self::Failed(reason) => RunStatus::Failed(reason.clone()),
        }
    }
}

struct Inner {
    projects: Arc<dyn ProjectRepository>,
    resources: Arc<dyn ResourceRepository>,
    store: Arc<dyn ResultStore>,
    scoring: Arc<dyn ScoringModel>,
    config: EngineConfig,
    runs: Mutex<HashMap<RequestId, RunState>>,
}

/// Builder for [`OptimizationEngine`].
pub struct EngineBuilder {
    projects: Arc<dyn ProjectRepository>,
    resources: Arc<dyn ResourceRepository>,
    store: Arc<dyn ResultStore>,
    scoring: Option<Arc<dyn ScoringModel>>,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Replaces the default [`WeightedScoringModel`].
    pub fn with_scoring_model(mut self, scoring: Arc<dyn ScoringModel>) -> Self {
        self.scoring = Some(scoring);
        self
    }

    /// Replaces the default configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the engine.
    pub fn build(self) -> OptimizationEngine {
        let scoring = self
            .scoring
            .unwrap_or_else(|| Arc::new(WeightedScoringModel::new()));
        OptimizationEngine {
            inner: Arc::new(Inner {
                projects: self.projects,
                resources: self.resources,
                store: self.store,
                scoring,
                config: self.config,
                runs: Mutex::new(HashMap::new()),
            }),
        }
    }
}

/// Request-level orchestrator.
///
/// Cheap to clone; clones share the same registry and collaborators.
#[derive(Clone)]
pub struct OptimizationEngine {
    inner: Arc<Inner>,
}

impl OptimizationEngine {
    /// Starts building an engine around its three collaborators.
    pub fn builder(
        projects: Arc<dyn ProjectRepository>,
        resources: Arc<dyn ResourceRepository>,
        store: Arc<dyn ResultStore>,
    ) -> EngineBuilder {
        EngineBuilder {
            projects,
            resources,
            store,
            scoring: None,
            config: EngineConfig::default(),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Number of requests held in the in-memory registry.
    pub fn tracked_runs(&self) -> usize {
        self.inner.runs.lock().len()
    }

    /// Validates `request` and starts it in the background.
    ///
    /// Returns the request ID immediately. Re-submitting a running or
    /// finished request is a no-op; a failed one is started again.
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, request: OptimizationRequest) -> Result<RequestId, EngineError> {
        validate_request(&request)?;
        let id = request.request_id.clone();

        let Some(token) = self.register(&id) else {
            debug!(request_id = %id, "duplicate submission ignored");
            return Ok(id);
        };

        info!(request_id = %id, goal = request.goal.as_str(), "request submitted");
        let engine = self.clone();
        tokio::spawn(async move {
            // The outcome is recorded in the registry.
            let _ = engine.execute(request, token).await;
        });
        Ok(id)
    }

    /// Runs `request` to completion on the caller's task.
    ///
    /// A finished request returns its stored result; one still running
    /// elsewhere is rejected with [`EngineError::AlreadyRunning`].
    pub async fn run(&self, request: OptimizationRequest) -> Result<OptimizationResult, EngineError> {
        validate_request(&request)?;
        let id = request.request_id.clone();

        let token = {
            let mut runs = self.inner.runs.lock();
            match runs.get(&id) {
                Some(RunState::Running(_)) => return Err(EngineError::AlreadyRunning(id)),
                Some(RunState::Completed(result)) => return Ok((**result).clone()),
                _ => {}
            }
            let token = self.new_token();
            runs.insert(id, RunState::Running(token.clone()));
            token
        };
        self.execute(request, token).await
    }

    /// Requests cancellation of a running request.
    ///
    /// The run stops after its current generation and reports its best
    /// allocation with `completed = false`. Returns `false` if the request
    /// is not running.
    pub fn cancel(&self, request_id: &RequestId) -> bool {
        match self.inner.runs.lock().get(request_id) {
            Some(RunState::Running(token)) => {
                token.cancel();
                info!(request_id = %request_id, "cancellation requested");
                true
            }
            _ => false,
        }
    }

    /// Current status of a request, falling back to the result store for
    /// requests this engine has not seen.
    pub async fn get_result(&self, request_id: &RequestId) -> Result<RunStatus, EngineError> {
        let local = self.inner.runs.lock().get(request_id).map(RunState::status);
        if let Some(status) = local {
            return Ok(status);
        }

        let stored = self
            .inner
            .config
            .retry
            .run("get_result", || self.inner.store.get(request_id))
            .await?;
        match stored {
            Some(result) => Ok(RunStatus::Completed(Box::new(result))),
            None => Err(EngineError::UnknownRequest(request_id.clone())),
        }
    }

    /// Marks a recommendation accepted.
    pub async fn accept_recommendation(
        &self,
        recommendation_id: &str,
    ) -> Result<Recommendation, EngineError> {
        self.decide(recommendation_id, RecommendationStatus::Accepted)
            .await
    }

    /// Marks a recommendation rejected.
    pub async fn reject_recommendation(
        &self,
        recommendation_id: &str,
    ) -> Result<Recommendation, EngineError> {
        self.decide(recommendation_id, RecommendationStatus::Rejected)
            .await
    }

    /// Inserts a running entry unless the request is running or finished.
    fn register(&self, id: &RequestId) -> Option<CancelToken> {
        let mut runs = self.inner.runs.lock();
        if matches!(
            runs.get(id),
            Some(RunState::Running(_)) | Some(RunState::Completed(_))
        ) {
            return None;
        }
        let token = self.new_token();
        runs.insert(id.clone(), RunState::Running(token.clone()));
        Some(token)
    }

    fn new_token(&self) -> CancelToken {
        match self.inner.config.run_timeout_ms {
            Some(ms) => CancelToken::new().with_timeout(Duration::from_millis(ms)),
            None => CancelToken::new(),
        }
    }

    async fn execute(
        &self,
        request: OptimizationRequest,
        token: CancelToken,
    ) -> Result<OptimizationResult, EngineError> {
        let id = request.request_id.clone();
        let outcome = self.compute(request, token).await;

        let mut runs = self.inner.runs.lock();
        match &outcome {
            Ok(result) if result.persisted => {
                runs.remove(&id);
            }
            Ok(result) => {
                runs.insert(id, RunState::Completed(Box::new(result.clone())));
            }
            Err(err) => {
                warn!(request_id = %id, error = %err, "optimization failed");
                runs.insert(id, RunState::Failed(err.to_string()));
            }
        }
        drop(runs);
        outcome
    }

    async fn compute(
        &self,
        request: OptimizationRequest,
        token: CancelToken,
    ) -> Result<OptimizationResult, EngineError> {
        let inner = &self.inner;
        let retry = &inner.config.retry;

        // Finished by an earlier run and already evicted from the registry.
        match inner.store.get(&request.request_id).await {
            Ok(Some(stored)) => {
                debug!(request_id = %request.request_id, "serving stored result");
                return Ok(stored);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(request_id = %request.request_id, error = %err, "result lookup failed");
            }
        }

        let tasks = retry
            .run("get_tasks", || {
                inner.projects.get_tasks(&request.project_ids, &request.horizon)
            })
            .await?;
        let resources = retry
            .run("get_resources", || {
                inner.resources.get_resources(&request.resource_filter)
            })
            .await?;
        debug!(
            request_id = %request.request_id,
            tasks = tasks.len(),
            resources = resources.len(),
            "inputs loaded"
        );

        let id = request.request_id.clone();
        let config = inner.config.clone();
        let scoring = Arc::clone(&inner.scoring);
        let mut result = tokio::task::spawn_blocking(move || {
            optimize(&request, &tasks, &resources, &config, scoring.as_ref(), &token)
        })
        .await
        .map_err(|e| EngineError::Internal(format!("optimization task failed: {e}")))??;

        result.persisted = true;
        if let Err(err) = retry.run("save_result", || inner.store.save(&result)).await {
            warn!(request_id = %id, error = %err, "result not persisted");
            result.persisted = false;
        }

        info!(
            request_id = %id,
            feasible = result.feasible,
            completed = result.completed,
            persisted = result.persisted,
            "request finished"
        );
        Ok(result)
    }

    async fn decide(
        &self,
        recommendation_id: &str,
        status: RecommendationStatus,
    ) -> Result<Recommendation, EngineError> {
        let not_found = || EngineError::RecommendationNotFound(recommendation_id.to_string());
        let request_id = request_of(recommendation_id).ok_or_else(not_found)?;

        let local = {
            let mut runs = self.inner.runs.lock();
            match runs.get_mut(&request_id) {
                Some(RunState::Completed(result)) => Some(
                    apply(result, recommendation_id, status)
                        .map(|(rec, changed)| (rec, changed.then(|| (**result).clone()))),
                ),
                Some(_) => Some(Err(not_found())),
                None => None,
            }
        };

        let (recommendation, snapshot) = match local {
            Some(decided) => decided?,
            None => {
                let mut result = self
                    .inner
                    .config
                    .retry
                    .run("get_result", || self.inner.store.get(&request_id))
                    .await?
                    .ok_or_else(|| EngineError::UnknownRequest(request_id.clone()))?;
                let (rec, changed) = apply(&mut result, recommendation_id, status)?;
                (rec, changed.then_some(result))
            }
        };

        if let Some(result) = snapshot {
            info!(
                recommendation_id,
                status = status.as_str(),
                "recommendation decided"
            );
            if let Err(err) = self.inner.store.save(&result).await {
                warn!(recommendation_id, error = %err, "decision not persisted");
            }
        }
        Ok(recommendation)
    }
}

/// Applies a decision. Repeating the current decision is a no-op; changing
/// a decided recommendation is an error. Returns whether anything changed.
fn apply(
    result: &mut OptimizationResult,
    recommendation_id: &str,
    status: RecommendationStatus,
) -> Result<(Recommendation, bool), EngineError> {
    let rec = result
        .recommendation_mut(recommendation_id)
        .ok_or_else(|| EngineError::RecommendationNotFound(recommendation_id.to_string()))?;
    if rec.status == status {
        return Ok((rec.clone(), false));
    }
    if rec.status != RecommendationStatus::Pending {
        return Err(EngineError::RecommendationDecided {
            id: recommendation_id.to_string(),
            status: rec.status.as_str().to_string(),
        });
    }
    rec.status = status;
    Ok((rec.clone(), true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{
        InMemoryProjectRepository, InMemoryResourceRepository, InMemoryResultStore,
    };
    use crate::error::InfraError;
    use crate::ga::GaConfig;
    use crate::models::{Resource, Task, TimeWindow, MS_PER_HOUR};
    use crate::orchestrator::RetryPolicy;

    struct Fixture {
        projects: Arc<InMemoryProjectRepository>,
        resources: Arc<InMemoryResourceRepository>,
        store: Arc<InMemoryResultStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let tasks = vec![
                Task::new("T1").with_skill("concrete").with_duration_hours(8.0),
                Task::new("T2")
                    .with_skill("framing")
                    .with_duration_hours(8.0)
                    .with_dependency("T1"),
                Task::new("T3").with_skill("survey").with_duration_hours(1.0),
            ];
            let resources = vec![
                Resource::labor("R1")
                    .with_skill("concrete", 0.8)
                    .with_skill("framing", 0.6)
                    .with_cost(60.0),
                Resource::labor("R2")
                    .with_skill("framing", 0.9)
                    .with_skill("survey", 0.7)
                    .with_cost(75.0),
            ];
            Self {
                projects: Arc::new(InMemoryProjectRepository::new().with_project("P1", tasks)),
                resources: Arc::new(InMemoryResourceRepository::new(resources)),
                store: Arc::new(InMemoryResultStore::new()),
            }
        }

        fn config() -> EngineConfig {
            EngineConfig::default()
                .with_ga(
                    GaConfig::default()
                        .with_population_size(20)
                        .with_max_generations(20),
                )
                .with_retry(RetryPolicy::immediate(3))
        }

        fn engine(&self) -> OptimizationEngine {
            self.engine_with(Self::config())
        }

        fn engine_with(&self, config: EngineConfig) -> OptimizationEngine {
            OptimizationEngine::builder(
                self.projects.clone(),
                self.resources.clone(),
                self.store.clone(),
            )
            .with_config(config)
            .build()
        }
    }

    fn request(id: &str) -> OptimizationRequest {
        OptimizationRequest::new(
            vec!["P1".into()],
            TimeWindow::new(0, 30 * 24 * MS_PER_HOUR),
        )
        .with_id(RequestId::new(id))
        .with_seed(11)
    }

    async fn wait(engine: &OptimizationEngine, id: &RequestId) -> RunStatus {
        for _ in 0..500 {
            let status = engine.get_result(id).await.unwrap();
            if !status.is_pending() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("request {id} did not finish");
    }

    #[tokio::test]
    async fn test_submit_and_poll() {
        let fx = Fixture::new();
        let engine = fx.engine();

        let id = engine.submit(request("req-1")).unwrap();
        assert_eq!(id, RequestId::new("req-1"));

        let status = wait(&engine, &id).await;
        let result = status.result().unwrap();
        assert!(result.feasible);
        assert!(result.persisted);
        assert_eq!(fx.store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_submit_runs_once() {
        let fx = Fixture::new();
        let engine = fx.engine();

        let first = engine.submit(request("req-dup")).unwrap();
        let second = engine.submit(request("req-dup")).unwrap();
        assert_eq!(first, second);

        wait(&engine, &first).await;
        let third = engine.submit(request("req-dup")).unwrap();
        assert_eq!(third, first);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(fx.projects.calls(), 1);
        assert_eq!(fx.store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_synchronously() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let bad = OptimizationRequest::new(vec![], TimeWindow::new(10, 0));

        assert!(matches!(engine.submit(bad), Err(EngineError::Validation(_))));
        assert_eq!(fx.projects.calls(), 0);
    }

    #[tokio::test]
    async fn test_transient_read_failure_is_retried() {
        let fx = Fixture::new();
        fx.projects.fail_next(2);
        let engine = fx.engine();

        let result = engine.run(request("req-flaky")).await.unwrap();
        assert!(result.feasible);
        assert_eq!(fx.projects.calls(), 3);
    }

    #[tokio::test]
    async fn test_read_failure_aborts() {
        let fx = Fixture::new();
        fx.resources.fail_next(10);
        let engine = fx.engine();

        let err = engine.run(request("req-down")).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Infra(InfraError::RetriesExhausted { attempts: 3, .. })
        ));
        let status = engine.get_result(&RequestId::new("req-down")).await.unwrap();
        assert!(matches!(status, RunStatus::Failed(_)));
        assert!(fx.store.is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_degrades_persisted_flag() {
        let fx = Fixture::new();
        fx.store.fail_next(10);
        let engine = fx.engine();

        let result = engine.run(request("req-nosave")).await.unwrap();
        assert!(!result.persisted);
        assert!(result.feasible);

        let status = engine.get_result(&result.request_id).await.unwrap();
        assert!(!status.result().unwrap().persisted);
    }

    #[tokio::test]
    async fn test_cancel_before_first_generation() {
        let fx = Fixture::new();
        let engine = fx.engine_with(Fixture::config().with_ga(
            GaConfig::default()
                .with_population_size(20)
                .with_max_generations(10_000),
        ));

        let id = engine.submit(request("req-cancel")).unwrap();
        assert!(engine.cancel(&id));

        let status = wait(&engine, &id).await;
        let result = status.result().unwrap();
        assert!(!result.completed);
        assert_eq!(result.allocations.len(), 3);
        assert!(!engine.cancel(&id));
    }

    #[tokio::test]
    async fn test_run_timeout_reports_incomplete() {
        let fx = Fixture::new();
        let engine = fx.engine_with(Fixture::config().with_run_timeout(Duration::ZERO));

        let result = engine.run(request("req-timeout")).await.unwrap();
        assert!(!result.completed);
        assert!(result.feasible);
    }

    #[tokio::test]
    async fn test_unknown_request() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let err = engine.get_result(&RequestId::new("nope")).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownRequest(_)));
        assert!(!engine.cancel(&RequestId::new("nope")));
    }

    #[tokio::test]
    async fn test_accept_and_reject() {
        let fx = Fixture::new();
        let engine = fx.engine();
        engine.run(request("req-rec")).await.unwrap();

        let accepted = engine.accept_recommendation("req-rec-rec-1").await.unwrap();
        assert_eq!(accepted.status, RecommendationStatus::Accepted);

        // Repeating the same decision is a no-op.
        let again = engine.accept_recommendation("req-rec-rec-1").await.unwrap();
        assert_eq!(again.status, RecommendationStatus::Accepted);
        assert_eq!(fx.store.save_count(), 2);

        let err = engine.reject_recommendation("req-rec-rec-1").await.unwrap_err();
        assert!(matches!(err, EngineError::RecommendationDecided { .. }));

        let rejected = engine.reject_recommendation("req-rec-rec-2").await.unwrap();
        assert_eq!(rejected.status, RecommendationStatus::Rejected);

        let err = engine.accept_recommendation("req-rec-rec-99").await.unwrap_err();
        assert!(matches!(err, EngineError::RecommendationNotFound(_)));
        let err = engine.accept_recommendation("garbage").await.unwrap_err();
        assert!(matches!(err, EngineError::RecommendationNotFound(_)));

        let stored = fx.store.get(&RequestId::new("req-rec")).await.unwrap().unwrap();
        assert_eq!(stored.recommendations[0].status, RecommendationStatus::Accepted);
        assert_eq!(stored.recommendations[1].status, RecommendationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_store_fallback_across_engines() {
        let fx = Fixture::new();
        fx.engine().run(request("req-shared")).await.unwrap();

        // A fresh engine has an empty registry but shares the store.
        let other = fx.engine();
        let id = RequestId::new("req-shared");
        assert!(other.get_result(&id).await.unwrap().result().is_some());

        let rec = other.accept_recommendation("req-shared-rec-1").await.unwrap();
        assert_eq!(rec.status, RecommendationStatus::Accepted);
        let stored = fx.store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.recommendations[0].status, RecommendationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_persisted_runs_leave_registry() {
        let fx = Fixture::new();
        let engine = fx.engine();

        engine.run(request("req-a")).await.unwrap();
        let id = engine.submit(request("req-b")).unwrap();
        wait(&engine, &id).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(engine.tracked_runs(), 0);
        assert_eq!(fx.store.len(), 2);

        // Still served, and decided, through the store.
        assert!(engine.get_result(&id).await.unwrap().result().is_some());
        let rec = engine.accept_recommendation("req-b-rec-1").await.unwrap();
        assert_eq!(rec.status, RecommendationStatus::Accepted);
        assert_eq!(engine.tracked_runs(), 0);

        // Unpersisted results stay in memory.
        fx.store.fail_next(10);
        let kept = engine.run(request("req-c")).await.unwrap();
        assert!(!kept.persisted);
        assert_eq!(engine.tracked_runs(), 1);
    }

    #[tokio::test]
    async fn test_run_returns_finished_result() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let first = engine.run(request("req-again")).await.unwrap();
        let second = engine.run(request("req-again")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fx.projects.calls(), 1);
    }
}
