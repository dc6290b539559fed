//! Capacity bottlenecks per resource type and period.
//!
//! Demand in a bucket is the working time drawn by allocations on resources
//! of a type (fraction × daily share × overlap). Capacity is the
//! calendar-available time of every resource of that type in the bucket,
//! scaled by the same daily share. A bucket is a bottleneck when demand
//! exceeds capacity.
//!
//! Buckets are full width: the last one extends past the plan end, and its
//! spare capacity counts.
//!
//! The delay estimate walks forward through later buckets of the same type,
//! spending their spare capacity on the excess; if the plan ends first, the
//! remainder is worked off at the type's nominal capacity rate.

use std::collections::BTreeSet;

use crate::config::{RiskConfig, ScheduleConfig};
use crate::ga::{AllocationProblem, Gene};
use crate::models::{Bottleneck, ResourceType, SchedulingPlan, TimeWindow, MS_PER_HOUR};
use crate::scheduler::buckets;

/// Finds bottlenecks in a placed allocation, ordered by type then period.
pub fn find_bottlenecks(
    problem: &AllocationProblem<'_>,
    genes: &[Gene],
    plan: &SchedulingPlan,
    schedule: &ScheduleConfig,
    risk: &RiskConfig,
) -> Vec<Bottleneck> {
    let width = schedule.bucket_ms.max(1);
    let count = ((plan.end_ms - plan.start_ms).max(0) + width - 1) / width;
    let periods = buckets(plan.start_ms, plan.start_ms + count * width, width);
    let types: BTreeSet<ResourceType> = problem
        .resources
        .iter()
        .map(|r| r.resource_type)
        .collect();

    let mut out = Vec::new();
    for resource_type in types {
        let members: Vec<usize> = (0..problem.resources.len())
            .filter(|&r| problem.resources[r].resource_type == resource_type)
            .collect();
        let on_type = |g: &Gene| {
            g.resource
                .is_some_and(|r| members.contains(&r) && problem.candidate(g.task, r).is_some())
        };

        let demand: Vec<f64> = periods
            .iter()
            .map(|p| {
                genes
                    .iter()
                    .filter(|g| on_type(g))
                    .filter_map(|g| {
                        let share = problem.daily_shares[g.resource?];
                        Some(
                            g.fraction
                                * share
                                * TimeWindow::new(g.start_ms, g.end_ms).overlap_ms(p) as f64,
                        )
                    })
                    .sum()
            })
            .collect();
        let capacity: Vec<f64> = periods
            .iter()
            .map(|p| {
                members
                    .iter()
                    .map(|&r| {
                        problem.resources[r].availability.available_ms_in(p) as f64
                            * problem.daily_shares[r]
                    })
                    .sum()
            })
            .collect();

        let rate: f64 = members
            .iter()
            .map(|&r| problem.daily_shares[r])
            .sum();
        let cost_rate = members
            .iter()
            .map(|&r| problem.resources[r].cost_per_hour)
            .sum::<f64>()
            / members.len().max(1) as f64;

        for (k, period) in periods.iter().enumerate() {
            let excess = demand[k] - capacity[k];
            if excess <= 0.0 {
                continue;
            }
            let shortfall_pct = if capacity[k] > 0.0 {
                excess / capacity[k] * 100.0
            } else {
                100.0
            };

            let delay = absorb_delay(excess, k, &periods, &demand, &capacity, plan.end_ms, rate);
            let excess_hours = excess / MS_PER_HOUR as f64;

            let affected_task_ids = genes
                .iter()
                .filter(|g| on_type(g) && TimeWindow::new(g.start_ms, g.end_ms).overlaps(period))
                .map(|g| problem.tasks[g.task].id.clone())
                .collect();

            out.push(Bottleneck {
                resource_type,
                period: *period,
                demand_hours: demand[k] / MS_PER_HOUR as f64,
                capacity_hours: capacity[k] / MS_PER_HOUR as f64,
                shortfall_pct,
                estimated_delay_ms: delay,
                estimated_cost_impact: excess_hours * cost_rate * risk.acquisition_premium,
                affected_task_ids,
            });
        }
    }
    out
}

/// Time from the end of bucket `k` until later spare capacity absorbs `excess`.
fn absorb_delay(
    excess: f64,
    k: usize,
    periods: &[TimeWindow],
    demand: &[f64],
    capacity: &[f64],
    plan_end_ms: i64,
    rate: f64,
) -> i64 {
    let origin = periods[k].end_ms;
    let mut remaining = excess;
    for j in k + 1..periods.len() {
        let spare = capacity[j] - demand[j];
        if spare <= 0.0 {
            continue;
        }
        if spare >= remaining {
            let len = periods[j].duration_ms() as f64;
            let within = (remaining / spare * len).ceil() as i64;
            return periods[j].start_ms + within - origin;
        }
        remaining -= spare;
    }
    let tail = if rate > 0.0 { remaining / rate } else { remaining };
    (plan_end_ms - origin).max(0) + tail.ceil() as i64
}
