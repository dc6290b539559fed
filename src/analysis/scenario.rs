//! Trade-off scenarios.
//!
//! Each template scales the baseline plan's total cost and span by fixed
//! percentages. Derived allocations keep their resources; their offsets from
//! the plan start stretch by the time factor and their costs scale by the
//! cost factor. Totals are always `baseline + delta`.

use crate::config::ScenarioTemplate;
use crate::models::{Allocation, Preferences, Scenario, SchedulingPlan};

/// Derives scenarios from the baseline allocation, in template order.
pub fn generate(
    templates: &[ScenarioTemplate],
    plan: &SchedulingPlan,
    allocations: &[Allocation],
    baseline_cost: f64,
    preferences: &Preferences,
) -> Vec<Scenario> {
    let span = plan.span_ms();
    templates
        .iter()
        .filter(|t| !(t.skip_if_overtime && preferences.allow_overtime))
        .map(|t| {
            let cost_factor = t.cost_delta_pct / 100.0;
            let time_factor = t.time_delta_pct / 100.0;
            let cost_delta = baseline_cost * cost_factor;
            let time_delta_ms = (span as f64 * time_factor).round() as i64;

            let stretch = |at: i64| {
                plan.start_ms + ((at - plan.start_ms) as f64 * (1.0 + time_factor)).round() as i64
            };
            let derived = allocations
                .iter()
                .map(|a| Allocation {
                    start_ms: stretch(a.start_ms),
                    end_ms: stretch(a.end_ms),
                    cost: a.cost * (1.0 + cost_factor),
                    ..a.clone()
                })
                .collect();

            Scenario {
                label: t.label.clone(),
                cost_delta_pct: t.cost_delta_pct,
                time_delta_pct: t.time_delta_pct,
                cost_delta,
                time_delta_ms,
                total_cost: baseline_cost + cost_delta,
                total_duration_ms: span + time_delta_ms,
                pros: t.pros.clone(),
                cons: t.cons.clone(),
                allocations: derived,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation(task: &str, start: i64, end: i64, cost: f64) -> Allocation {
        Allocation {
            task_id: task.into(),
            resource_id: Some("R1".into()),
            fraction: 1.0,
            start_ms: start,
            end_ms: end,
            cost,
            success_probability: 0.8,
        }
    }

    fn plan() -> SchedulingPlan {
        SchedulingPlan {
            start_ms: 1_000,
            end_ms: 11_000,
            ..SchedulingPlan::default()
        }
    }

    #[test]
    fn test_default_templates() {
        let allocs = vec![allocation("T1", 1_000, 6_000, 300.0), allocation("T2", 6_000, 11_000, 700.0)];
        let scenarios = generate(
            &ScenarioTemplate::defaults(),
            &plan(),
            &allocs,
            1_000.0,
            &Preferences::new(),
        );

        let labels: Vec<&str> = scenarios.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["cost-optimized", "time-optimized", "overtime"]);

        let cost = &scenarios[0];
        assert!((cost.total_cost - 850.0).abs() < 1e-9);
        assert_eq!(cost.total_duration_ms, 12_000);
        assert_eq!(cost.allocations[1].start_ms, 7_000);
        assert_eq!(cost.allocations[1].end_ms, 13_000);
        assert!((cost.allocations[0].cost - 255.0).abs() < 1e-9);

        let fast = &scenarios[1];
        assert!((fast.total_cost - 1_250.0).abs() < 1e-9);
        assert_eq!(fast.total_duration_ms, 8_000);
    }

    #[test]
    fn test_totals_are_baseline_plus_delta() {
        let allocs = vec![allocation("T1", 1_000, 4_333, 123.45)];
        for s in generate(&ScenarioTemplate::defaults(), &plan(), &allocs, 987.65, &Preferences::new()) {
            assert!((987.65 + s.cost_delta - s.total_cost).abs() < 1e-9);
            assert_eq!(10_000 + s.time_delta_ms, s.total_duration_ms);
            assert!((s.cost_delta / 987.65 * 100.0 - s.cost_delta_pct).abs() < 1e-9);
        }
    }

    #[test]
    fn test_overtime_skipped_when_allowed() {
        let scenarios = generate(
            &ScenarioTemplate::defaults(),
            &plan(),
            &[],
            100.0,
            &Preferences::new().with_overtime(),
        );
        assert_eq!(scenarios.len(), 2);
        assert!(scenarios.iter().all(|s| s.label != "overtime"));
    }
}
