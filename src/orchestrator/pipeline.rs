//! Synchronous optimization pipeline.
//!
//! validate → candidates and scores → GA → plan → metrics → recommendations,
//! warnings, bottlenecks, scenarios. Pure given its inputs and seed; the
//! engine runs it on a blocking thread.

use tracing::{info, warn};

use crate::analysis;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ga::{AllocationProblem, CancelToken, GaRunner};
use crate::models::{Allocation, OptimizationRequest, OptimizationResult, Resource, Task};
use crate::scheduler::{kpi, RunStatusFlags, ScheduleBuilder};
use crate::scoring::ScoringModel;
use crate::validation::{validate_input, validate_request};

/// Runs one optimization over already loaded tasks and resources.
///
/// Infeasibility is reported on the result, never as an error.
pub fn optimize(
    request: &OptimizationRequest,
    tasks: &[Task],
    resources: &[Resource],
    config: &EngineConfig,
    scoring: &dyn ScoringModel,
    cancel: &CancelToken,
) -> Result<OptimizationResult, EngineError> {
    validate_request(request)?;
    validate_input(tasks, resources)?;

    let problem = AllocationProblem::new(tasks, resources, request, scoring, &config.schedule)?;

    let unsatisfiable_tasks: Vec<String> = problem
        .unsatisfiable()
        .into_iter()
        .map(|t| tasks[t].id.clone())
        .collect();
    if !unsatisfiable_tasks.is_empty() {
        warn!(
            request_id = %request.request_id,
            tasks = ?unsatisfiable_tasks,
            "tasks without a qualified resource"
        );
    }

    let mut ga = config.ga.clone();
    ga.seed = request.seed.or(ga.seed);
    let outcome = GaRunner::run(&problem, &ga, cancel);

    let mut best = outcome.best;
    let eval = best.evaluate(&problem);
    let genes = best.genes;

    let mut baseline_genes = problem.baseline_genes();
    let baseline = problem.evaluate(&mut baseline_genes);

    let plan = ScheduleBuilder::new(&problem, &config.schedule).build(&genes);

    let allocations: Vec<Allocation> = genes
        .iter()
        .map(|g| {
            let candidate = g.resource.and_then(|r| problem.candidate(g.task, r));
            Allocation {
                task_id: tasks[g.task].id.clone(),
                resource_id: candidate.map(|c| resources[c.resource].id.clone()),
                fraction: g.fraction,
                start_ms: g.start_ms,
                end_ms: g.end_ms,
                cost: candidate.map_or(0.0, |c| c.cost),
                success_probability: candidate.map_or(0.0, |c| c.success),
            }
        })
        .collect();

    let metrics = kpi::calculate(
        &problem,
        &genes,
        &eval,
        &baseline,
        RunStatusFlags {
            converged: outcome.converged,
            completed: outcome.completed,
        },
    );

    let recommendations = analysis::recommend(&request.request_id, &allocations, &plan);
    let warnings = analysis::assess(&problem, &genes, &eval, &config.risk);
    let bottlenecks =
        analysis::find_bottlenecks(&problem, &genes, &plan, &config.schedule, &config.risk);
    let scenarios = analysis::generate_scenarios(
        &config.scenarios,
        &plan,
        &allocations,
        eval.total_cost,
        &request.preferences,
    );

    info!(
        request_id = %request.request_id,
        model = scoring.name(),
        seed = outcome.seed,
        generations = outcome.generations,
        fitness = eval.fitness,
        feasible = unsatisfiable_tasks.is_empty(),
        "optimization finished"
    );

    Ok(OptimizationResult {
        request_id: request.request_id.clone(),
        feasible: unsatisfiable_tasks.is_empty(),
        unsatisfiable_tasks,
        completed: outcome.completed,
        converged: outcome.converged,
        persisted: false,
        seed: outcome.seed,
        generations: outcome.generations,
        fitness: eval.fitness,
        fitness_trajectory: outcome.trajectory,
        allocations,
        plan,
        metrics,
        recommendations,
        warnings,
        bottlenecks,
        scenarios,
    })
}
