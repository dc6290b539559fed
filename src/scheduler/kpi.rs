//! Plan performance metrics.
//!
//! Compares the chosen allocation against a naive baseline (every task on
//! its lowest-ID qualified resource at full capacity, placed by the same
//! forward pass).
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Cost savings | (baseline − optimized) / baseline × 100 |
//! | Time savings | (baseline span − span) / baseline span × 100 |
//! | Avg utilization | Mean over the pool of delivered effort / span |
//! | Confidence | mean success × convergence factor × completion factor |

use std::collections::BTreeMap;

use crate::ga::{AllocationProblem, Evaluation, Gene};
use crate::models::PerformanceMetrics;

/// Confidence multiplier when the search did not converge.
const UNCONVERGED_FACTOR: f64 = 0.9;
/// Confidence multiplier when the search was cut short.
const INCOMPLETE_FACTOR: f64 = 0.8;

/// Search status flags feeding the confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatusFlags {
    pub converged: bool,
    pub completed: bool,
}

/// Computes metrics for placed `genes` with evaluation `eval`.
pub fn calculate(
    problem: &AllocationProblem<'_>,
    genes: &[Gene],
    eval: &Evaluation,
    baseline: &Evaluation,
    flags: RunStatusFlags,
) -> PerformanceMetrics {
    let utilization_by_resource: BTreeMap<String, f64> = problem
        .utilization_by_resource(genes, eval.span_ms)
        .into_iter()
        .enumerate()
        .map(|(r, pct)| (problem.resources[r].id.clone(), pct))
        .collect();

    let confidence = eval.mean_success
        * if flags.converged { 1.0 } else { UNCONVERGED_FACTOR }
        * if flags.completed { 1.0 } else { INCOMPLETE_FACTOR };

    PerformanceMetrics {
        total_cost: eval.total_cost,
        baseline_cost: baseline.total_cost,
        cost_savings_pct: savings_pct(baseline.total_cost, eval.total_cost),
        span_ms: eval.span_ms,
        baseline_span_ms: baseline.span_ms,
        time_savings_pct: savings_pct(baseline.span_ms as f64, eval.span_ms as f64),
        avg_utilization_pct: eval.utilization_pct,
        utilization_by_resource,
        mean_success_probability: eval.mean_success,
        confidence: confidence.clamp(0.0, 1.0),
    }
}

/// `(baseline − value) / baseline × 100`, zero for a non-positive baseline.
pub fn savings_pct(baseline: f64, value: f64) -> f64 {
    if baseline > 0.0 {
        (baseline - value) / baseline * 100.0
    } else {
        0.0
    }
}
