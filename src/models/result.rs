//! Optimization result model.
//!
//! Everything an optimization run reports: the winning allocations, the
//! time-phased plan, performance metrics against a naive baseline, ranked
//! recommendations, warnings, bottlenecks and alternative scenarios.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{RequestId, ResourceType, SchedulingPlan, TimeWindow};

/// One task-to-resource allocation (gene of the winning individual).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Allocation {
    /// Task ID.
    pub task_id: String,
    /// Resource ID. `None` = no qualified resource exists.
    pub resource_id: Option<String>,
    /// Share of the resource's capacity consumed (0.25..=1.0).
    pub fraction: f64,
    /// Start (ms).
    pub start_ms: i64,
    /// End (ms).
    pub end_ms: i64,
    /// Projected cost.
    pub cost: f64,
    /// Predicted success probability.
    pub success_probability: f64,
}

impl Allocation {
    /// Duration (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Whether a resource is assigned.
    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.resource_id.is_some()
    }
}

/// Best/mean fitness of one generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GenerationStats {
    /// Zero-based generation index.
    pub generation: usize,
    /// Fitness of the elite individual.
    pub best_fitness: f64,
    /// Population mean fitness.
    pub mean_fitness: f64,
}

/// Performance of the chosen plan against the naive baseline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceMetrics {
    /// Projected total cost.
    pub total_cost: f64,
    /// Naive baseline total cost.
    pub baseline_cost: f64,
    /// (baseline − optimized) / baseline × 100. Negative = costlier.
    pub cost_savings_pct: f64,
    /// Plan span (ms).
    pub span_ms: i64,
    /// Naive baseline span (ms).
    pub baseline_span_ms: i64,
    /// (baseline − optimized) / baseline × 100. Negative = slower.
    pub time_savings_pct: f64,
    /// Mean utilization across the resource pool (percent).
    pub avg_utilization_pct: f64,
    /// Utilization per resource ID (percent).
    pub utilization_by_resource: BTreeMap<String, f64>,
    /// Mean predicted success of assigned allocations.
    pub mean_success_probability: f64,
    /// Confidence in the plan (0..1).
    pub confidence: f64,
}

/// Lifecycle of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    /// Awaiting a decision.
    Pending,
    /// Accepted by a collaborator.
    Accepted,
    /// Rejected by a collaborator.
    Rejected,
}

impl RecommendationStatus {
    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Recommendation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Assign a resource to a task.
    AssignResource,
}

/// A ranked, actionable recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    /// Unique ID (`<request id>-rec-<rank>`).
    pub id: String,
    /// 1-based rank.
    pub rank: usize,
    /// Category.
    pub kind: RecommendationKind,
    /// Task ID.
    pub task_id: String,
    /// Recommended resource ID.
    pub resource_id: String,
    /// Why this recommendation was made.
    pub rationale: String,
    /// Confidence (0..1).
    pub confidence: f64,
    /// Expected cost.
    pub expected_cost: f64,
    /// Decision status.
    pub status: RecommendationStatus,
}

/// Warning severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth knowing.
    Info,
    /// Needs attention.
    Warning,
    /// Plan cannot be executed as is.
    Critical,
}

/// Warning category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Projected cost reached the warning share of the budget.
    BudgetThreshold,
    /// A task finishes after its deadline.
    DeadlineRisk,
    /// A resource is loaded above 100%.
    OverAllocation,
    /// A resource lacks a required safety certification.
    MissingCertification,
    /// No qualified resource exists for a task.
    UnassignedTask,
    /// An allocation runs outside the resource's availability.
    OutsideAvailability,
}

/// A risk warning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warning {
    /// Category.
    pub kind: WarningKind,
    /// Severity.
    pub severity: Severity,
    /// Related task or resource ID (empty for project-wide warnings).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// A resource-type capacity shortfall within one period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bottleneck {
    /// Resource type.
    pub resource_type: ResourceType,
    /// Period.
    pub period: TimeWindow,
    /// Demanded resource-hours.
    pub demand_hours: f64,
    /// Available resource-hours.
    pub capacity_hours: f64,
    /// (demand − capacity) / capacity × 100.
    pub shortfall_pct: f64,
    /// Estimated delay until spare capacity absorbs the excess (ms).
    pub estimated_delay_ms: i64,
    /// Estimated cost of closing the gap.
    pub estimated_cost_impact: f64,
    /// Tasks drawing on this type within the period.
    pub affected_task_ids: Vec<String>,
}

/// A labeled cost/time trade-off derived from the baseline plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    /// Label (e.g. "cost-optimized").
    pub label: String,
    /// Relative cost change (percent).
    pub cost_delta_pct: f64,
    /// Relative span change (percent).
    pub time_delta_pct: f64,
    /// Absolute cost change.
    pub cost_delta: f64,
    /// Absolute span change (ms).
    pub time_delta_ms: i64,
    /// Baseline cost + `cost_delta`.
    pub total_cost: f64,
    /// Baseline span + `time_delta_ms`.
    pub total_duration_ms: i64,
    /// Advantages.
    pub pros: Vec<String>,
    /// Drawbacks.
    pub cons: Vec<String>,
    /// Allocations re-timed for this scenario.
    pub allocations: Vec<Allocation>,
}

/// Complete output of one optimization run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationResult {
    /// Originating request.
    pub request_id: RequestId,
    /// Every task has a qualified resource.
    pub feasible: bool,
    /// Tasks without any qualified resource.
    pub unsatisfiable_tasks: Vec<String>,
    /// Search ran to convergence or the generation cap (not cancelled/timed out).
    pub completed: bool,
    /// Search stopped on the convergence criterion.
    pub converged: bool,
    /// Result reached the result store.
    pub persisted: bool,
    /// RNG seed used.
    pub seed: u64,
    /// Generations evaluated.
    pub generations: usize,
    /// Winning fitness.
    pub fitness: f64,
    /// Elite/mean fitness per generation.
    pub fitness_trajectory: Vec<GenerationStats>,
    /// Winning allocations, one per task in input order.
    pub allocations: Vec<Allocation>,
    /// Time-phased plan.
    pub plan: SchedulingPlan,
    /// Metrics against the naive baseline.
    pub metrics: PerformanceMetrics,
    /// Ranked recommendations.
    pub recommendations: Vec<Recommendation>,
    /// Risk warnings.
    pub warnings: Vec<Warning>,
    /// Capacity shortfalls.
    pub bottlenecks: Vec<Bottleneck>,
    /// Trade-off scenarios.
    pub scenarios: Vec<Scenario>,
}

impl OptimizationResult {
    /// Allocation for a task.
    pub fn allocation_for(&self, task_id: &str) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.task_id == task_id)
    }

    /// Mutable recommendation by ID.
    pub fn recommendation_mut(&mut self, id: &str) -> Option<&mut Recommendation> {
        self.recommendations.iter_mut().find(|r| r.id == id)
    }

    /// Warnings of a given kind.
    pub fn warnings_of(&self, kind: WarningKind) -> Vec<&Warning> {
        self.warnings.iter().filter(|w| w.kind == kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_helpers() {
        let a = Allocation {
            task_id: "T1".into(),
            resource_id: None,
            fraction: 1.0,
            start_ms: 100,
            end_ms: 400,
            cost: 0.0,
            success_probability: 0.0,
        };
        assert_eq!(a.duration_ms(), 300);
        assert!(!a.is_assigned());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&RecommendationStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
    }
}
