//! Request-scoped constraints and preferences.
//!
//! Hard limits (budget, deadline, skills, safety) live in [`ConstraintSet`];
//! soft objectives and toggles live in [`Preferences`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Resource, Task};

/// Constraints applied to one optimization request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConstraintSet {
    /// Maximum total cost. `None` = unbounded.
    pub budget_limit: Option<f64>,
    /// Project deadline (ms). `None` = horizon end only bounds reporting.
    pub deadline_ms: Option<i64>,
    /// Maximum resources per task. Must be at least 1.
    pub max_resources_per_task: usize,
    /// Standard working hours per day; caps every resource's working day.
    pub working_hours_per_day: Option<f64>,
    /// Extra skills required per task ID, on top of the task's own tags.
    pub required_skills: BTreeMap<String, Vec<String>>,
    /// Skill-triggered certification requirements.
    pub safety_rules: Vec<SafetyRule>,
}

/// Any task requiring `skill` must be performed by a holder of `certification`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SafetyRule {
    /// Triggering skill tag.
    pub skill: String,
    /// Required certification.
    pub certification: String,
}

impl SafetyRule {
    /// Creates a new safety rule.
    pub fn new(skill: impl Into<String>, certification: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            certification: certification.into(),
        }
    }
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            budget_limit: None,
            deadline_ms: None,
            max_resources_per_task: 1,
            working_hours_per_day: None,
            required_skills: BTreeMap::new(),
            safety_rules: Vec::new(),
        }
    }
}

impl ConstraintSet {
    /// Creates an unconstrained set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the budget limit.
    pub fn with_budget(mut self, limit: f64) -> Self {
        self.budget_limit = Some(limit);
        self
    }

    /// Sets the project deadline (ms).
    pub fn with_deadline(mut self, deadline_ms: i64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }

    /// Sets standard working hours per day.
    pub fn with_working_hours(mut self, hours: f64) -> Self {
        self.working_hours_per_day = Some(hours);
        self
    }

    /// Requires an extra skill for one task.
    pub fn with_required_skill(
        mut self,
        task_id: impl Into<String>,
        skill: impl Into<String>,
    ) -> Self {
        self.required_skills
            .entry(task_id.into())
            .or_default()
            .push(skill.into());
        self
    }

    /// Adds a safety rule.
    pub fn with_safety_rule(mut self, rule: SafetyRule) -> Self {
        self.safety_rules.push(rule);
        self
    }

    /// All skills a resource needs for `task` (task tags + per-task extras), deduplicated.
    pub fn skills_for<'a>(&'a self, task: &'a Task) -> Vec<&'a str> {
        let mut skills: Vec<&str> = task.required_skills.iter().map(String::as_str).collect();
        if let Some(extra) = self.required_skills.get(&task.id) {
            skills.extend(extra.iter().map(String::as_str));
        }
        skills.sort_unstable();
        skills.dedup();
        skills
    }

    /// All certifications a resource needs for `task`, deduplicated.
    pub fn certifications_for<'a>(&'a self, task: &'a Task) -> Vec<&'a str> {
        let skills = self.skills_for(task);
        let mut certs: Vec<&str> = task
            .required_certifications
            .iter()
            .map(String::as_str)
            .chain(
                self.safety_rules
                    .iter()
                    .filter(|rule| skills.contains(&rule.skill.as_str()))
                    .map(|rule| rule.certification.as_str()),
            )
            .collect();
        certs.sort_unstable();
        certs.dedup();
        certs
    }

    /// Whether `resource` holds every skill `task` needs.
    pub fn is_qualified(&self, task: &Task, resource: &Resource) -> bool {
        self.skills_for(task)
            .iter()
            .all(|skill| resource.has_skill(skill))
    }

    /// Whether `resource` holds every certification `task` needs.
    pub fn is_certified(&self, task: &Task, resource: &Resource) -> bool {
        self.certifications_for(task)
            .iter()
            .all(|cert| resource.has_certification(cert))
    }
}

/// Relative objective weights. Only consulted for the `Custom` goal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ObjectiveWeights {
    /// Weight on cost efficiency.
    pub cost: f64,
    /// Weight on schedule span.
    pub time: f64,
    /// Weight on predicted success.
    pub quality: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            cost: 1.0,
            time: 1.0,
            quality: 1.0,
        }
    }
}

impl ObjectiveWeights {
    /// Weights scaled to sum to 1.0. All-zero weights become uniform.
    pub fn normalized(&self) -> Self {
        let sum = self.cost.max(0.0) + self.time.max(0.0) + self.quality.max(0.0);
        if sum <= 0.0 {
            return Self {
                cost: 1.0 / 3.0,
                time: 1.0 / 3.0,
                quality: 1.0 / 3.0,
            };
        }
        Self {
            cost: self.cost.max(0.0) / sum,
            time: self.time.max(0.0) / sum,
            quality: self.quality.max(0.0) / sum,
        }
    }
}

/// Soft preferences for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    /// Objective weights.
    pub weights: ObjectiveWeights,
    /// Permit resource load above 100% up to the overtime ceiling.
    pub allow_overtime: bool,
    /// Reward allocations to local resources.
    pub prefer_local: bool,
    /// Reward allocations to resources holding every certification the task needs.
    pub prefer_certified: bool,
}

impl Preferences {
    /// Default preferences.
    pub fn new() -> Self {
        Self::default()
    }

    /// Permits overtime.
    pub fn with_overtime(mut self) -> Self {
        self.allow_overtime = true;
        self
    }

    /// Sets objective weights.
    pub fn with_weights(mut self, cost: f64, time: f64, quality: f64) -> Self {
        self.weights = ObjectiveWeights {
            cost,
            time,
            quality,
        };
        self
    }

    /// Prefers local resources.
    pub fn prefer_local(mut self) -> Self {
        self.prefer_local = true;
        self
    }

    /// Prefers certified resources.
    pub fn prefer_certified(mut self) -> Self {
        self.prefer_certified = true;
        self
    }
}
