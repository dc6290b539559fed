//! Engine configuration.
//!
//! Every section has serde defaults, so a partial JSON document only
//! overrides what it names:
//!
//! ```
//! use u_allocate::config::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{ "ga": { "population_size": 30 } }"#).unwrap();
//! assert_eq!(config.ga.population_size, 30);
//! assert_eq!(config.ga.max_generations, 200);
//! assert_eq!(config.retry.max_attempts, 3);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EngineError;
use crate::ga::GaConfig;
use crate::models::MS_PER_DAY;
use crate::orchestrator::RetryPolicy;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Genetic optimizer parameters.
    pub ga: GaConfig,
    /// Retry policy for collaborator calls.
    pub retry: RetryPolicy,
    /// Placement and plan-building parameters.
    pub schedule: ScheduleConfig,
    /// Risk analysis parameters.
    pub risk: RiskConfig,
    /// Scenario templates, in output order.
    pub scenarios: Vec<ScenarioTemplate>,
    /// Wall-clock bound on one search (ms). `None` = generation cap only.
    pub run_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ga: GaConfig::default(),
            retry: RetryPolicy::default(),
            schedule: ScheduleConfig::default(),
            risk: RiskConfig::default(),
            scenarios: ScenarioTemplate::defaults(),
            run_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replaces the GA section.
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    /// Replaces the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the search timeout.
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }
}

/// Placement and plan-building parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Width of utilization and bottleneck buckets (ms).
    pub bucket_ms: i64,
    /// Smallest capacity fraction an allocation may use.
    pub min_fraction: f64,
    /// Fraction perturbation step.
    pub fraction_step: f64,
    /// Load ceiling per resource when overtime is allowed.
    pub overtime_ceiling: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            bucket_ms: MS_PER_DAY,
            min_fraction: 0.25,
            fraction_step: 0.25,
            overtime_ceiling: 1.25,
        }
    }
}

/// Risk analysis parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskConfig {
    /// Share of the budget at which a budget warning fires.
    pub budget_warning_ratio: f64,
    /// Multiplier on the mean cost rate for acquiring extra capacity.
    pub acquisition_premium: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            budget_warning_ratio: 0.95,
            acquisition_premium: 1.5,
        }
    }
}

/// A labeled cost/time trade-off applied to the baseline plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioTemplate {
    /// Scenario label.
    pub label: String,
    /// Relative cost change (percent).
    pub cost_delta_pct: f64,
    /// Relative span change (percent).
    pub time_delta_pct: f64,
    /// Advantages.
    #[serde(default)]
    pub pros: Vec<String>,
    /// Drawbacks.
    #[serde(default)]
    pub cons: Vec<String>,
    /// Skip when the request already allows overtime.
    #[serde(default)]
    pub skip_if_overtime: bool,
}

impl ScenarioTemplate {
    /// Creates a template.
    pub fn new(label: impl Into<String>, cost_delta_pct: f64, time_delta_pct: f64) -> Self {
        Self {
            label: label.into(),
            cost_delta_pct,
            time_delta_pct,
            pros: Vec::new(),
            cons: Vec::new(),
            skip_if_overtime: false,
        }
    }

    /// Adds an advantage.
    pub fn with_pro(mut self, pro: impl Into<String>) -> Self {
        self.pros.push(pro.into());
        self
    }

    /// Adds a drawback.
    pub fn with_con(mut self, con: impl Into<String>) -> Self {
        self.cons.push(con.into());
        self
    }

    /// Skips this template when overtime is already allowed.
    pub fn unless_overtime(mut self) -> Self {
        self.skip_if_overtime = true;
        self
    }

    /// Built-in templates: cost-optimized, time-optimized, overtime.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("cost-optimized", -15.0, 20.0)
                .with_pro("Lower total cost")
                .with_pro("Fewer premium resources")
                .with_con("Longer project duration")
                .with_con("Less schedule buffer"),
            Self::new("time-optimized", 25.0, -20.0)
                .with_pro("Earlier completion")
                .with_pro("More schedule buffer")
                .with_con("Higher total cost")
                .with_con("Higher resource load"),
            Self::new("overtime", 12.0, -10.0)
                .with_pro("Earlier completion without new resources")
                .with_con("Overtime premium")
                .with_con("Fatigue and safety exposure")
                .unless_overtime(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.schedule.bucket_ms, MS_PER_DAY);
        assert!((c.schedule.min_fraction - 0.25).abs() < 1e-10);
        assert!((c.schedule.overtime_ceiling - 1.25).abs() < 1e-10);
        assert!((c.risk.budget_warning_ratio - 0.95).abs() < 1e-10);
        assert!((c.risk.acquisition_premium - 1.5).abs() < 1e-10);
        assert_eq!(c.scenarios.len(), 3);
        assert!(c.scenarios[2].skip_if_overtime);
        assert!(c.run_timeout_ms.is_none());
    }

    #[test]
    fn test_partial_json() {
        let c = EngineConfig::from_json(
            r#"{
                "schedule": { "bucket_ms": 3600000 },
                "scenarios": [ { "label": "lean", "cost_delta_pct": -5, "time_delta_pct": 5 } ],
                "run_timeout_ms": 500
            }"#,
        )
        .unwrap();
        assert_eq!(c.schedule.bucket_ms, 3_600_000);
        assert!((c.schedule.min_fraction - 0.25).abs() < 1e-10);
        assert_eq!(c.scenarios.len(), 1);
        assert_eq!(c.scenarios[0].label, "lean");
        assert!(c.scenarios[0].pros.is_empty());
        assert_eq!(c.run_timeout_ms, Some(500));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            EngineConfig::from_json("{ nope"),
            Err(EngineError::Config(_))
        ));
    }
}
