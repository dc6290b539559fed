//! Pluggable scoring strategy.
//!
//! A [`ScoringModel`] maps a [`FeatureVector`] to a predicted success
//! probability and an expected duration factor. The optimizer only depends
//! on the trait, so a trained model can replace the weighted reference
//! implementation without touching the search.
//!
//! Implementations must be pure: the optimizer calls `score` concurrently
//! from worker threads with shared, read-only parameters.

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Output of a scoring model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Probability the allocation succeeds on time and on budget (0..1).
    pub success_probability: f64,
    /// Multiplier on the task's base duration (> 0).
    pub duration_factor: f64,
}

/// Scoring strategy.
pub trait ScoringModel: Send + Sync {
    /// Scores one feature vector.
    fn score(&self, features: &FeatureVector) -> Score;

    /// Name of the model (for logs).
    fn name(&self) -> &str;
}

/// Coefficients of [`WeightedScoringModel`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringWeights {
    pub success_bias: f64,
    pub success_proficiency: f64,
    pub success_experience: f64,
    pub success_condition: f64,
    pub success_accessibility: f64,
    pub success_complexity: f64,
    pub success_delay: f64,
    pub success_seasonal: f64,
    pub duration_complexity_gap: f64,
    pub duration_delay: f64,
    pub duration_access: f64,
    pub duration_seasonal: f64,
    pub duration_wear: f64,
    pub duration_proficiency: f64,
    pub duration_experience: f64,
    /// Lower clamp of the duration factor.
    pub min_duration_factor: f64,
    /// Upper clamp of the duration factor; also used for unqualified pairs.
    pub max_duration_factor: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            success_bias: 0.6,
            success_proficiency: 0.3,
            success_experience: 0.1,
            success_condition: 0.1,
            success_accessibility: 0.05,
            success_complexity: 0.2,
            success_delay: 0.3,
            success_seasonal: 0.05,
            duration_complexity_gap: 0.4,
            duration_delay: 0.5,
            duration_access: 0.2,
            duration_seasonal: 0.1,
            duration_wear: 0.1,
            duration_proficiency: 0.2,
            duration_experience: 0.1,
            min_duration_factor: 0.5,
            max_duration_factor: 2.0,
        }
    }
}

/// Deterministic linear reference model.
///
/// Features are centred at 0.5 so a nominal resource on a nominal task
/// scores near `success_bias` with a duration factor near 1.0.
#[derive(Debug, Clone, Default)]
pub struct WeightedScoringModel {
    weights: ScoringWeights,
}

impl WeightedScoringModel {
    /// Creates a model with default coefficients.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model with custom coefficients.
    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Coefficients in use.
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }
}

impl ScoringModel for WeightedScoringModel {
    fn score(&self, f: &FeatureVector) -> Score {
        let w = &self.weights;
        if f.is_unqualified() {
            return Score {
                success_probability: 0.0,
                duration_factor: w.max_duration_factor,
            };
        }

        let success = w.success_bias
            + w.success_proficiency * (f.proficiency - 0.5)
            + w.success_experience * (f.experience - 0.5)
            + w.success_condition * (f.condition - 0.5)
            + w.success_accessibility * (f.site_accessibility - 0.5)
            - w.success_complexity * (f.complexity - 0.5)
            - w.success_delay * f.delay_rate
            - w.success_seasonal * f.seasonal;

        let factor = 1.0
            + w.duration_complexity_gap * f.complexity * (1.0 - f.proficiency)
            + w.duration_delay * f.delay_rate
            + w.duration_access * (1.0 - f.site_accessibility)
            + w.duration_seasonal * f.seasonal
            + w.duration_wear * (1.0 - f.condition)
            - w.duration_proficiency * (f.proficiency - 0.5)
            - w.duration_experience * (f.experience - 0.5);

        Score {
            success_probability: success.clamp(0.0, 1.0),
            duration_factor: factor.clamp(w.min_duration_factor, w.max_duration_factor),
        }
    }

    fn name(&self) -> &str {
        "weighted"
    }
}
