//! Time-phased plan (solution) model.
//!
//! A plan records, per task, the earliest/latest start and finish computed
//! by the forward and backward passes, the resulting slack, the critical
//! path, a bucketed resource utilization timeline and milestones.

use serde::{Deserialize, Serialize};

use super::TimeWindow;

/// A time-phased scheduling plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchedulingPlan {
    /// Plan start (ms).
    pub start_ms: i64,
    /// Plan end (ms). Always ≥ every task's finish.
    pub end_ms: i64,
    /// Per-task timings in input task order.
    pub tasks: Vec<TaskTiming>,
    /// Zero-slack task IDs ordered by earliest start.
    pub critical_path: Vec<String>,
    /// Resource load per time bucket.
    pub utilization: Vec<UtilizationSample>,
    /// Completion milestones.
    pub milestones: Vec<Milestone>,
}

/// Network timings of one task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskTiming {
    /// Task ID.
    pub task_id: String,
    /// Allocated resource. `None` = unassigned.
    pub resource_id: Option<String>,
    /// Allocated capacity fraction.
    pub fraction: f64,
    /// Earliest start (ms).
    pub earliest_start_ms: i64,
    /// Earliest finish (ms).
    pub earliest_finish_ms: i64,
    /// Latest start without delaying the plan end (ms).
    pub latest_start_ms: i64,
    /// Latest finish without delaying the plan end (ms).
    pub latest_finish_ms: i64,
    /// Latest start − earliest start (ms).
    pub slack_ms: i64,
    /// Whether the task is on the critical path.
    pub critical: bool,
}

/// Summed capacity fraction of one resource over one bucket.
///
/// `load` is time-weighted: a fraction-1.0 allocation covering half the
/// bucket contributes 0.5.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UtilizationSample {
    /// Resource ID.
    pub resource_id: String,
    /// Bucket.
    pub period: TimeWindow,
    /// Time-weighted summed fraction.
    pub load: f64,
    /// Peak instantaneous summed fraction within the bucket.
    pub peak: f64,
}

/// A named point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    /// Display name.
    pub name: String,
    /// Task whose finish defines the milestone. `None` = project completion.
    pub task_id: Option<String>,
    /// Instant (ms).
    pub at_ms: i64,
}

impl TaskTiming {
    /// Duration (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.earliest_finish_ms - self.earliest_start_ms
    }

    /// Scheduled interval.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.earliest_start_ms, self.earliest_finish_ms)
    }
}

impl SchedulingPlan {
    /// Plan span (ms).
    pub fn span_ms(&self) -> i64 {
        (self.end_ms - self.start_ms).max(0)
    }

    /// Timing for a task.
    pub fn timing_for(&self, task_id: &str) -> Option<&TaskTiming> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    /// Whether a task is on the critical path.
    pub fn is_critical(&self, task_id: &str) -> bool {
        self.critical_path.iter().any(|id| id == task_id)
    }

    /// Latest finish across all tasks (ms).
    pub fn latest_task_finish(&self) -> Option<i64> {
        self.tasks.iter().map(|t| t.earliest_finish_ms).max()
    }

    /// Highest peak load a resource reaches in any bucket.
    pub fn peak_load(&self, resource_id: &str) -> f64 {
        self.utilization
            .iter()
            .filter(|s| s.resource_id == resource_id)
            .map(|s| s.peak)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(id: &str, es: i64, ef: i64, slack: i64) -> TaskTiming {
        TaskTiming {
            task_id: id.into(),
            resource_id: Some("R1".into()),
            fraction: 1.0,
            earliest_start_ms: es,
            earliest_finish_ms: ef,
            latest_start_ms: es + slack,
            latest_finish_ms: ef + slack,
            slack_ms: slack,
            critical: slack == 0,
        }
    }

    #[test]
    fn test_plan_queries() {
        let plan = SchedulingPlan {
            start_ms: 0,
            end_ms: 8_000,
            tasks: vec![timing("T1", 0, 5_000, 0), timing("T2", 1_000, 4_000, 4_000)],
            critical_path: vec!["T1".into()],
            utilization: vec![UtilizationSample {
                resource_id: "R1".into(),
                period: TimeWindow::new(0, 8_000),
                load: 0.75,
                peak: 1.0,
            }],
            milestones: Vec::new(),
        };

        assert_eq!(plan.span_ms(), 8_000);
        assert_eq!(plan.latest_task_finish(), Some(5_000));
        assert!(plan.is_critical("T1"));
        assert!(!plan.is_critical("T2"));
        assert_eq!(plan.timing_for("T2").unwrap().duration_ms(), 3_000);
        assert!((plan.peak_load("R1") - 1.0).abs() < 1e-10);
        assert!((plan.peak_load("R9") - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_plan() {
        let plan = SchedulingPlan::default();
        assert_eq!(plan.span_ms(), 0);
        assert_eq!(plan.latest_task_finish(), None);
    }
}
