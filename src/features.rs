//! Task/resource feature extraction.
//!
//! Converts a (task, resource) pair into a fixed-size numeric vector the
//! scoring model consumes. Extraction is pure and deterministic.
//!
//! # Fields
//!
//! | Index | Field | Range | Source |
//! |-------|-------|-------|--------|
//! | 0 | complexity | 0..1 | task |
//! | 1 | duration | 0..1 | task base hours, `h / (h + 40)` |
//! | 2 | proficiency | 0..1 or [`UNQUALIFIED`] | weakest required skill level |
//! | 3 | experience | 0..1 | resource years, `y / (y + 5)` |
//! | 4 | condition | 0..1 | equipment condition (1.0 otherwise) |
//! | 5 | site accessibility | 0..1 | task |
//! | 6 | seasonal indicator | 0..1 | horizon start (1.0 = mid-winter) |
//! | 7 | delay rate | 0..1 | resource history |

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::models::{ConstraintSet, Resource, Task, TimeWindow, MS_PER_DAY};

/// Number of features.
pub const FEATURE_COUNT: usize = 8;

/// Proficiency sentinel for a resource lacking a required skill.
pub const UNQUALIFIED: f64 = -1.0;

/// Proficiency used when a task requires no particular skill.
const NEUTRAL_PROFICIENCY: f64 = 0.5;

/// Fixed-size feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub complexity: f64,
    pub duration: f64,
    pub proficiency: f64,
    pub experience: f64,
    pub condition: f64,
    pub site_accessibility: f64,
    pub seasonal: f64,
    pub delay_rate: f64,
}

impl FeatureVector {
    /// Whether the resource lacks a required skill.
    #[inline]
    pub fn is_unqualified(&self) -> bool {
        self.proficiency == UNQUALIFIED
    }

    /// Fields in documented order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.complexity,
            self.duration,
            self.proficiency,
            self.experience,
            self.condition,
            self.site_accessibility,
            self.seasonal,
            self.delay_rate,
        ]
    }
}

/// Request-scoped inputs shared by every extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    /// Constraints contributing per-task skill requirements.
    pub constraints: &'a ConstraintSet,
    /// Seasonal indicator for the run.
    pub seasonal: f64,
}

impl<'a> ExtractionContext<'a> {
    /// Builds a context whose seasonal indicator derives from the horizon start.
    pub fn for_horizon(constraints: &'a ConstraintSet, horizon: &TimeWindow) -> Self {
        Self {
            constraints,
            seasonal: seasonal_indicator(horizon.start_ms),
        }
    }
}

/// Seasonal harshness of an instant: 1.0 at day 0 of the year, 0.0 mid-year.
///
/// Assumes a Unix-like epoch and a 365-day year.
pub fn seasonal_indicator(epoch_ms: i64) -> f64 {
    let day_of_year = epoch_ms.div_euclid(MS_PER_DAY).rem_euclid(365) as f64;
    0.5 + 0.5 * (2.0 * PI * day_of_year / 365.0).cos()
}

/// Extracts the feature vector for assigning `resource` to `task`.
///
/// A resource missing any required skill yields [`UNQUALIFIED`] proficiency
/// instead of an error, so the optimizer can penalize the pairing.
pub fn extract(task: &Task, resource: &Resource, ctx: &ExtractionContext<'_>) -> FeatureVector {
    let skills = ctx.constraints.skills_for(task);
    let proficiency = if skills.is_empty() {
        NEUTRAL_PROFICIENCY
    } else if skills.iter().all(|s| resource.has_skill(s)) {
        skills
            .iter()
            .map(|s| resource.skill_level(s))
            .fold(f64::INFINITY, f64::min)
    } else {
        UNQUALIFIED
    };

    let hours = task.base_hours().max(0.0);
    let years = resource.experience_years.max(0.0);

    FeatureVector {
        complexity: task.complexity.clamp(0.0, 1.0),
        duration: hours / (hours + 40.0),
        proficiency,
        experience: years / (years + 5.0),
        condition: resource.condition.unwrap_or(1.0).clamp(0.0, 1.0),
        site_accessibility: task.site_accessibility.clamp(0.0, 1.0),
        seasonal: ctx.seasonal.clamp(0.0, 1.0),
        delay_rate: resource.historical_delay_rate.clamp(0.0, 1.0),
    }
}
