//! Task model.
//!
//! A task is one unit of work that receives exactly one resource allocation.
//! Tasks are immutable inputs to an optimization run.

use serde::{Deserialize, Serialize};

use super::calendar::MS_PER_HOUR;

/// A task to be staffed and scheduled.
///
/// # Time Representation
/// All times are in milliseconds relative to a scheduling epoch (t=0).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Skill tags a resource must hold to perform this task.
    pub required_skills: Vec<String>,
    /// Safety certifications the performing resource must hold.
    pub required_certifications: Vec<String>,
    /// Estimated duration at full capacity with a nominal resource (ms).
    pub base_duration_ms: i64,
    /// Earliest start (ms).
    pub earliest_start_ms: i64,
    /// Latest allowed finish (ms). `None` = only the project deadline applies.
    pub deadline_ms: Option<i64>,
    /// Predecessor task IDs (finish-to-start).
    pub dependencies: Vec<String>,
    /// Relative share of the budget this task is expected to consume.
    pub budget_weight: f64,
    /// Technical complexity (0.0 = trivial, 1.0 = hardest).
    pub complexity: f64,
    /// Site accessibility (0.0 = inaccessible, 1.0 = unrestricted).
    pub site_accessibility: f64,
}

impl Task {
    /// Creates a task with a one-hour nominal duration.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            required_skills: Vec::new(),
            required_certifications: Vec::new(),
            base_duration_ms: MS_PER_HOUR,
            earliest_start_ms: 0,
            deadline_ms: None,
            dependencies: Vec::new(),
            budget_weight: 1.0,
            complexity: 0.5,
            site_accessibility: 1.0,
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a required skill tag.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.required_skills.push(skill.into());
        self
    }

    /// Adds a required safety certification.
    pub fn with_certification(mut self, cert: impl Into<String>) -> Self {
        self.required_certifications.push(cert.into());
        self
    }

    /// Sets the base duration (ms).
    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.base_duration_ms = duration_ms;
        self
    }

    /// Sets the base duration (hours).
    pub fn with_duration_hours(self, hours: f64) -> Self {
        self.with_duration_ms((hours * MS_PER_HOUR as f64).round() as i64)
    }

    /// Sets the earliest start (ms).
    pub fn with_earliest_start(mut self, start_ms: i64) -> Self {
        self.earliest_start_ms = start_ms;
        self
    }

    /// Sets the task deadline (ms).
    pub fn with_deadline(mut self, deadline_ms: i64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }

    /// Adds a predecessor.
    pub fn with_dependency(mut self, task_id: impl Into<String>) -> Self {
        self.dependencies.push(task_id.into());
        self
    }

    /// Sets the budget weight.
    pub fn with_budget_weight(mut self, weight: f64) -> Self {
        self.budget_weight = weight;
        self
    }

    /// Sets the complexity (clamped to 0..1).
    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = complexity.clamp(0.0, 1.0);
        self
    }

    /// Sets the site accessibility (clamped to 0..1).
    pub fn with_site_accessibility(mut self, accessibility: f64) -> Self {
        self.site_accessibility = accessibility.clamp(0.0, 1.0);
        self
    }

    /// Base duration in hours.
    pub fn base_hours(&self) -> f64 {
        self.base_duration_ms as f64 / MS_PER_HOUR as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let task = Task::new("T1")
            .with_name("Pour foundation")
            .with_skill("concrete")
            .with_certification("confined-space")
            .with_duration_hours(8.0)
            .with_earliest_start(1_000)
            .with_deadline(100 * MS_PER_HOUR)
            .with_dependency("T0")
            .with_complexity(1.7)
            .with_site_accessibility(0.6);

        assert_eq!(task.id, "T1");
        assert_eq!(task.required_skills, vec!["concrete".to_string()]);
        assert_eq!(task.base_duration_ms, 8 * MS_PER_HOUR);
        assert_eq!(task.earliest_start_ms, 1_000);
        assert_eq!(task.deadline_ms, Some(100 * MS_PER_HOUR));
        assert_eq!(task.dependencies, vec!["T0".to_string()]);
        assert!((task.complexity - 1.0).abs() < 1e-10);
        assert!((task.base_hours() - 8.0).abs() < 1e-10);
    }
}
