//! Risk warnings.

use tracing::warn;

use crate::config::RiskConfig;
use crate::ga::{AllocationProblem, Evaluation, Gene};
use crate::models::{Severity, TimeWindow, Warning, WarningKind};
use crate::scheduler::peak_load;
use crate::scheduler::network::LOAD_EPSILON;

/// Inspects a placed allocation for risks.
///
/// Warnings come project-wide first (budget), then per task in input order,
/// then per resource in pool order.
pub fn assess(
    problem: &AllocationProblem<'_>,
    genes: &[Gene],
    eval: &Evaluation,
    config: &RiskConfig,
) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if let Some(budget) = problem.budget_limit.filter(|b| *b > 0.0) {
        if eval.total_cost >= config.budget_warning_ratio * budget {
            let severity = if eval.total_cost > budget {
                Severity::Critical
            } else {
                Severity::Warning
            };
            warnings.push(Warning {
                kind: WarningKind::BudgetThreshold,
                severity,
                entity_id: String::new(),
                message: format!(
                    "Projected cost {:.2} is {:.1}% of the budget {:.2}",
                    eval.total_cost,
                    eval.total_cost / budget * 100.0,
                    budget
                ),
            });
        }
    }

    for gene in genes {
        let task = &problem.tasks[gene.task];
        let candidate = gene.resource.and_then(|r| problem.candidate(gene.task, r));

        let Some(candidate) = candidate else {
            warn!(task = %task.id, "no qualified resource");
            warnings.push(Warning {
                kind: WarningKind::UnassignedTask,
                severity: Severity::Critical,
                entity_id: task.id.clone(),
                message: format!("No resource holds every skill task {} requires", task.id),
            });
            continue;
        };
        let resource = &problem.resources[candidate.resource];

        if !candidate.certified {
            warnings.push(Warning {
                kind: WarningKind::MissingCertification,
                severity: Severity::Warning,
                entity_id: task.id.clone(),
                message: format!(
                    "{} lacks a safety certification required by task {}",
                    resource.id, task.id
                ),
            });
        }

        if let Some(deadline) = problem.deadlines[gene.task] {
            if gene.end_ms > deadline {
                warnings.push(Warning {
                    kind: WarningKind::DeadlineRisk,
                    severity: Severity::Warning,
                    entity_id: task.id.clone(),
                    message: format!(
                        "Task {} finishes {} ms after its deadline",
                        task.id,
                        gene.end_ms - deadline
                    ),
                });
            }
        }

        let window = TimeWindow::new(gene.start_ms, gene.end_ms);
        if !resource.availability.covers(&window) {
            warnings.push(Warning {
                kind: WarningKind::OutsideAvailability,
                severity: Severity::Warning,
                entity_id: task.id.clone(),
                message: format!(
                    "Task {} runs outside the availability of {}",
                    task.id, resource.id
                ),
            });
        }
    }

    for (r, resource) in problem.resources.iter().enumerate() {
        let peak = peak_load(genes, r);
        if peak > 1.0 + LOAD_EPSILON {
            let severity = if problem.preferences.allow_overtime {
                Severity::Info
            } else {
                Severity::Warning
            };
            warnings.push(Warning {
                kind: WarningKind::OverAllocation,
                severity,
                entity_id: resource.id.clone(),
                message: format!("{} peaks at {:.0}% load", resource.id, peak * 100.0),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScheduleConfig;
    use crate::models::{
        Calendar, ConstraintSet, OptimizationRequest, Preferences, Resource, SafetyRule, Task,
        MS_PER_HOUR,
    };
    use crate::scoring::{ScoringWeights, WeightedScoringModel};

    const H: i64 = MS_PER_HOUR;

    fn unit_model() -> WeightedScoringModel {
        WeightedScoringModel::with_weights(ScoringWeights {
            min_duration_factor: 1.0,
            max_duration_factor: 1.0,
            ..ScoringWeights::default()
        })
    }

    fn run(
        tasks: &[Task],
        resources: &[Resource],
        req: &OptimizationRequest,
        genes: &mut [Gene],
    ) -> Vec<Warning> {
        let problem = AllocationProblem::new(
            tasks,
            resources,
            req,
            &unit_model(),
            &ScheduleConfig::default(),
        )
        .unwrap();
        let eval = problem.evaluate(genes);
        assess(&problem, genes, &eval, &RiskConfig::default())
    }

    fn horizon() -> TimeWindow {
        TimeWindow::new(0, 100 * H)
    }

    #[test]
    fn test_clean_plan_has_no_warnings() {
        let tasks = vec![Task::new("T1").with_duration_hours(2.0)];
        let resources = vec![Resource::labor("R1").with_cost(10.0)];
        let req = OptimizationRequest::new(vec!["P".into()], horizon())
            .with_constraints(ConstraintSet::new().with_budget(1_000.0));
        let mut genes = vec![Gene::new(0, Some(0), 1.0)];
        assert!(run(&tasks, &resources, &req, &mut genes).is_empty());
    }

    #[test]
    fn test_budget_threshold() {
        let tasks = vec![Task::new("T1").with_duration_hours(10.0)];
        let resources = vec![Resource::labor("R1").with_cost(10.0)];
        // Cost 100 against budget 104 (96%).
        let req = OptimizationRequest::new(vec!["P".into()], horizon())
            .with_constraints(ConstraintSet::new().with_budget(104.0));
        let mut genes = vec![Gene::new(0, Some(0), 1.0)];
        let warnings = run(&tasks, &resources, &req, &mut genes);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::BudgetThreshold);
        assert_eq!(warnings[0].severity, Severity::Warning);

        let over = OptimizationRequest::new(vec!["P".into()], horizon())
            .with_constraints(ConstraintSet::new().with_budget(50.0));
        let warnings = run(&tasks, &resources, &over, &mut genes);
        assert_eq!(warnings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_task_level_warnings() {
        let tasks = vec![
            Task::new("T1")
                .with_skill("weld")
                .with_duration_hours(4.0)
                .with_deadline(2 * H),
            Task::new("T2").with_skill("dive"),
        ];
        let resources = vec![Resource::labor("R1")
            .with_skill("weld", 0.8)
            .with_availability(Calendar::always().with_blocked(H, 2 * H))];
        let req = OptimizationRequest::new(vec!["P".into()], horizon()).with_constraints(
            ConstraintSet::new().with_safety_rule(SafetyRule::new("weld", "hot-work")),
        );
        let mut genes = vec![Gene::new(0, Some(0), 1.0), Gene::new(1, None, 1.0)];
        let warnings = run(&tasks, &resources, &req, &mut genes);

        let kinds: Vec<WarningKind> = warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![
                WarningKind::MissingCertification,
                WarningKind::DeadlineRisk,
                WarningKind::OutsideAvailability,
                WarningKind::UnassignedTask,
            ]
        );
        assert_eq!(warnings[3].severity, Severity::Critical);
        assert_eq!(warnings[3].entity_id, "T2");
    }

    #[test]
    fn test_overtime_overallocation_is_info() {
        let tasks = vec![
            Task::new("T1").with_duration_hours(2.0),
            Task::new("T2").with_duration_hours(2.0),
        ];
        let resources = vec![Resource::labor("R1")];
        let req = OptimizationRequest::new(vec!["P".into()], horizon())
            .with_preferences(Preferences::new().with_overtime());
        let mut genes = vec![Gene::new(0, Some(0), 1.0), Gene::new(1, Some(0), 0.25)];
        let warnings = run(&tasks, &resources, &req, &mut genes);

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::OverAllocation);
        assert_eq!(warnings[0].severity, Severity::Info);
        assert_eq!(warnings[0].entity_id, "R1");
    }
}
