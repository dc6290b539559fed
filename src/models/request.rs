//! Optimization request model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{ConstraintSet, Preferences, ResourceType, TimeWindow};
use crate::validation::{ValidationError, ValidationErrorKind};

/// Opaque request identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh UUIDv4 identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optimization goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    /// Cheapest assignment.
    MinimizeCost,
    /// Shortest project span.
    MinimizeDuration,
    /// Highest predicted success.
    MaximizeQuality,
    /// Cost efficiency and utilization balanced.
    BalanceCostTime,
    /// Keep resources busy.
    MaximizeUtilization,
    /// Use [`Preferences::weights`](super::Preferences).
    Custom,
}

impl Goal {
    /// Wire name of the goal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::MinimizeCost => "minimize_cost",
            Goal::MinimizeDuration => "minimize_duration",
            Goal::MaximizeQuality => "maximize_quality",
            Goal::BalanceCostTime => "balance_cost_time",
            Goal::MaximizeUtilization => "maximize_utilization",
            Goal::Custom => "custom",
        }
    }
}

impl FromStr for Goal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimize_cost" => Ok(Goal::MinimizeCost),
            "minimize_duration" => Ok(Goal::MinimizeDuration),
            "maximize_quality" => Ok(Goal::MaximizeQuality),
            "balance_cost_time" => Ok(Goal::BalanceCostTime),
            "maximize_utilization" => Ok(Goal::MaximizeUtilization),
            "custom" => Ok(Goal::Custom),
            other => Err(ValidationError::new(
                ValidationErrorKind::UnknownGoal,
                format!("Unknown optimization goal '{other}'"),
            )),
        }
    }
}

/// Selects resources from the resource repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceFilter {
    /// Explicit resource IDs. Empty = any.
    pub ids: Vec<String>,
    /// Allowed resource types. Empty = any.
    pub types: Vec<ResourceType>,
    /// Resources must hold at least one of these skills. Empty = any.
    pub any_skills: Vec<String>,
}

impl ResourceFilter {
    /// Matches every resource.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to the given IDs.
    pub fn with_ids(mut self, ids: Vec<String>) -> Self {
        self.ids = ids;
        self
    }

    /// Restricts to a resource type.
    pub fn with_type(mut self, resource_type: ResourceType) -> Self {
        self.types.push(resource_type);
        self
    }

    /// Whether a resource passes the filter.
    pub fn matches(&self, resource: &super::Resource) -> bool {
        (self.ids.is_empty() || self.ids.contains(&resource.id))
            && (self.types.is_empty() || self.types.contains(&resource.resource_type))
            && (self.any_skills.is_empty()
                || self.any_skills.iter().any(|s| resource.has_skill(s)))
    }
}

/// A request to optimize resource allocation for one or more projects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationRequest {
    /// Idempotency key.
    pub request_id: RequestId,
    /// Projects whose tasks are optimized.
    pub project_ids: Vec<String>,
    /// Resource pool selector.
    pub resource_filter: ResourceFilter,
    /// Optimization goal.
    pub goal: Goal,
    /// Hard constraints.
    pub constraints: ConstraintSet,
    /// Soft preferences.
    pub preferences: Preferences,
    /// Planning horizon.
    pub horizon: TimeWindow,
    /// Identity of the requester.
    pub requested_by: String,
    /// RNG seed. `None` = engine default.
    pub seed: Option<u64>,
}

impl OptimizationRequest {
    /// Creates a request with a generated ID and the balanced goal.
    pub fn new(project_ids: Vec<String>, horizon: TimeWindow) -> Self {
        Self {
            request_id: RequestId::generate(),
            project_ids,
            resource_filter: ResourceFilter::all(),
            goal: Goal::BalanceCostTime,
            constraints: ConstraintSet::default(),
            preferences: Preferences::default(),
            horizon,
            requested_by: String::new(),
            seed: None,
        }
    }

    /// Sets the request ID.
    pub fn with_id(mut self, id: RequestId) -> Self {
        self.request_id = id;
        self
    }

    /// Sets the goal.
    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = goal;
        self
    }

    /// Sets the constraints.
    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets the preferences.
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Sets the resource filter.
    pub fn with_resource_filter(mut self, filter: ResourceFilter) -> Self {
        self.resource_filter = filter;
        self
    }

    /// Sets the requester identity.
    pub fn requested_by(mut self, who: impl Into<String>) -> Self {
        self.requested_by = who.into();
        self
    }

    /// Fixes the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
