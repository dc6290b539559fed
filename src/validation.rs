//! Input validation for optimization requests.
//!
//! Checks structural integrity of the request and of the task/resource sets
//! before any search begins. Detects:
//! - Empty task or resource sets
//! - Malformed horizons and constraint values
//! - Duplicate IDs
//! - Unknown dependency references
//! - Circular dependencies (DAG validation)
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::models::{OptimizationRequest, Resource, Task};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// No tasks were selected.
    EmptyTaskSet,
    /// No resources were selected.
    EmptyResourceSet,
    /// Horizon is empty or inverted.
    InvalidHorizon,
    /// Goal string did not name a known goal.
    UnknownGoal,
    /// Two entities share the same ID.
    DuplicateId,
    /// A task references a dependency that doesn't exist.
    InvalidPredecessor,
    /// Dependency graph contains a cycle.
    CyclicDependency,
    /// A task has a non-positive duration.
    InvalidDuration,
    /// A constraint or preference value is out of range.
    InvalidConstraint,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationErrorKind::EmptyTaskSet => "empty task set",
            ValidationErrorKind::EmptyResourceSet => "empty resource set",
            ValidationErrorKind::InvalidHorizon => "invalid horizon",
            ValidationErrorKind::UnknownGoal => "unknown goal",
            ValidationErrorKind::DuplicateId => "duplicate id",
            ValidationErrorKind::InvalidPredecessor => "invalid predecessor",
            ValidationErrorKind::CyclicDependency => "cyclic dependency",
            ValidationErrorKind::InvalidDuration => "invalid duration",
            ValidationErrorKind::InvalidConstraint => "invalid constraint",
        };
        f.write_str(name)
    }
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the request envelope (before any repository access).
///
/// Checks:
/// 1. At least one project is selected
/// 2. The horizon has positive length
/// 3. Budget limit (if any) is positive and finite
/// 4. `max_resources_per_task` ≥ 1
/// 5. Working hours (if any) lie in (0, 24]
/// 6. Objective weights are finite and non-negative
pub fn validate_request(request: &OptimizationRequest) -> ValidationResult {
    let mut errors = Vec::new();

    if request.project_ids.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyTaskSet,
            "Request selects no projects",
        ));
    }

    if !request.horizon.is_valid() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidHorizon,
            format!(
                "Horizon [{}, {}) is empty or inverted",
                request.horizon.start_ms, request.horizon.end_ms
            ),
        ));
    }

    let constraints = &request.constraints;
    if let Some(budget) = constraints.budget_limit {
        if !budget.is_finite() || budget <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidConstraint,
                format!("Budget limit must be positive, got {budget}"),
            ));
        }
    }
    if constraints.max_resources_per_task == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidConstraint,
            "max_resources_per_task must be at least 1",
        ));
    }
    if let Some(hours) = constraints.working_hours_per_day {
        if !(hours > 0.0 && hours <= 24.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidConstraint,
                format!("Working hours per day must be in (0, 24], got {hours}"),
            ));
        }
    }

    let w = request.preferences.weights;
    if [w.cost, w.time, w.quality]
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
    {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidConstraint,
            "Objective weights must be finite and non-negative",
        ));
    }

    finish(errors)
}

/// Validates the task and resource sets fetched for a request.
///
/// Checks:
/// 1. Neither set is empty
/// 2. No duplicate task IDs or resource IDs
/// 3. All base durations are positive
/// 4. All dependency references point to existing tasks
/// 5. No circular dependencies
pub fn validate_input(tasks: &[Task], resources: &[Resource]) -> ValidationResult {
    let mut errors = Vec::new();

    if tasks.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyTaskSet,
            "No tasks to allocate",
        ));
    }
    if resources.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyResourceSet,
            "No resources to allocate",
        ));
    }

    let mut resource_ids = HashSet::new();
    for r in resources {
        if !resource_ids.insert(r.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate resource ID: {}", r.id),
            ));
        }
    }

    let mut task_ids = HashSet::new();
    for task in tasks {
        if !task_ids.insert(task.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", task.id),
            ));
        }
        if task.base_duration_ms <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!(
                    "Task '{}' has non-positive duration {}ms",
                    task.id, task.base_duration_ms
                ),
            ));
        }
    }

    for task in tasks {
        for dep in &task.dependencies {
            if !task_ids.contains(dep.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPredecessor,
                    format!("Task '{}' depends on unknown task '{}'", task.id, dep),
                ));
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(tasks) {
        errors.push(cycle_err);
    }

    finish(errors)
}

/// Topological order of task indices (Kahn's algorithm, ties by input order).
///
/// Unknown dependency IDs are ignored. Returns `None` if the graph has a cycle.
pub fn topological_order(tasks: &[Task]) -> Option<Vec<usize>> {
    let index: HashMap<&str, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), i))
        .collect();

    let mut indegree = vec![0usize; tasks.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.dependencies {
            if let Some(&p) = index.get(dep.as_str()) {
                successors[p].push(i);
                indegree[i] += 1;
            }
        }
    }

    // Min-index ready set keeps the order stable.
    let mut ready: std::collections::BTreeSet<usize> =
        (0..tasks.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(tasks.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &s in &successors[next] {
            indegree[s] -= 1;
            if indegree[s] == 0 {
                ready.insert(s);
            }
        }
    }

    (order.len() == tasks.len()).then_some(order)
}

/// Detects cycles in the dependency graph using DFS.
///
/// # Algorithm
/// If a back-edge is found (visiting a node currently in the recursion
/// stack), a cycle exists.
fn detect_cycles(tasks: &[Task]) -> Option<ValidationError> {
    // dependency → dependents
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in tasks {
        for dep in &task.dependencies {
            adj.entry(dep.as_str()).or_default().push(task.id.as_str());
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for task in tasks {
        let node = task.id.as_str();
        if !visited.contains(node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving task '{node}'"),
            ));
        }
    }

    None
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return true;
            }
            if !visited.contains(next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(node);
    false
}
