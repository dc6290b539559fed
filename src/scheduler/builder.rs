//! Time-phased plan construction.
//!
//! Turns placed genes into a [`SchedulingPlan`]: earliest times come from
//! the forward pass, latest times from a backward pass over dependency and
//! resource-sequencing edges, then slack, critical path, bucketed
//! utilization and milestones.
//!
//! # Backward pass
//!
//! A resource-sequencing edge `a → b` exists when both allocations use the
//! same resource, `a` finishes no later than `b` starts, and their fractions
//! could not run side by side. Every edge points from an earlier to a later
//! start, so visiting tasks by descending earliest start is a valid reverse
//! topological order and slack is never negative.
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-Path Planning and Scheduling"

use crate::config::ScheduleConfig;
use crate::ga::{AllocationProblem, Gene};
use crate::models::{Milestone, SchedulingPlan, TaskTiming, TimeWindow, UtilizationSample};

use super::network::{load_at, ResourceTimeline, LOAD_EPSILON};

/// Builds plans for one problem.
pub struct ScheduleBuilder<'p, 'a> {
    problem: &'p AllocationProblem<'a>,
    bucket_ms: i64,
}

impl<'p, 'a> ScheduleBuilder<'p, 'a> {
    /// Creates a builder.
    pub fn new(problem: &'p AllocationProblem<'a>, config: &ScheduleConfig) -> Self {
        Self {
            problem,
            bucket_ms: config.bucket_ms.max(1),
        }
    }

    /// Builds the plan for placed `genes` (one per task, in task order).
    pub fn build(&self, genes: &[Gene]) -> SchedulingPlan {
        let problem = self.problem;
        let n = genes.len();
        let start_ms = problem.horizon.start_ms;
        let end_ms = genes.iter().map(|g| g.end_ms).fold(start_ms, i64::max);

        let successors = self.successors(genes);

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            (genes[b].start_ms, genes[b].end_ms, b).cmp(&(genes[a].start_ms, genes[a].end_ms, a))
        });

        let mut latest_start = vec![0i64; n];
        let mut latest_finish = vec![0i64; n];
        for &i in &order {
            let lf = successors[i]
                .iter()
                .map(|&s| latest_start[s])
                .fold(end_ms, i64::min);
            latest_finish[i] = lf;
            latest_start[i] = lf - (genes[i].end_ms - genes[i].start_ms);
        }

        let tasks: Vec<TaskTiming> = genes
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let slack = latest_start[i] - g.start_ms;
                TaskTiming {
                    task_id: problem.tasks[g.task].id.clone(),
                    resource_id: self.assigned(g).map(|r| problem.resources[r].id.clone()),
                    fraction: g.fraction,
                    earliest_start_ms: g.start_ms,
                    earliest_finish_ms: g.end_ms,
                    latest_start_ms: latest_start[i],
                    latest_finish_ms: latest_finish[i],
                    slack_ms: slack,
                    critical: slack == 0,
                }
            })
            .collect();

        let mut critical: Vec<usize> = (0..n).filter(|&i| tasks[i].critical).collect();
        critical.sort_by_key(|&i| (genes[i].start_ms, i));
        let critical_path = critical.into_iter().map(|i| tasks[i].task_id.clone()).collect();

        SchedulingPlan {
            start_ms,
            end_ms,
            utilization: self.utilization(genes, start_ms, end_ms),
            milestones: self.milestones(genes, end_ms),
            critical_path,
            tasks,
        }
    }

    fn assigned(&self, gene: &Gene) -> Option<usize> {
        gene.resource
            .filter(|&r| self.problem.candidate(gene.task, r).is_some())
    }

    /// Dependency successors plus resource-sequencing successors.
    fn successors(&self, genes: &[Gene]) -> Vec<Vec<usize>> {
        let n = genes.len();
        let mut successors = vec![Vec::new(); n];
        for (i, preds) in self.problem.predecessors.iter().enumerate().take(n) {
            for &p in preds {
                successors[p].push(i);
            }
        }

        let limit = self.problem.capacity_limit + LOAD_EPSILON;
        for a in 0..n {
            let Some(ra) = self.assigned(&genes[a]) else {
                continue;
            };
            for b in 0..n {
                if a == b || self.assigned(&genes[b]) != Some(ra) {
                    continue;
                }
                if genes[a].end_ms <= genes[b].start_ms
                    && genes[a].fraction + genes[b].fraction > limit
                {
                    successors[a].push(b);
                }
            }
        }
        successors
    }

    /// Time-weighted and peak load per resource per bucket.
    ///
    /// Only resources with at least one allocation appear; empty buckets are
    /// omitted.
    fn utilization(&self, genes: &[Gene], start_ms: i64, end_ms: i64) -> Vec<UtilizationSample> {
        let resources = self.problem.resources;
        let timeline = ResourceTimeline::from_genes(resources.len(), genes);
        let buckets = buckets(start_ms, end_ms, self.bucket_ms);

        let mut samples = Vec::new();
        for (r, resource) in resources.iter().enumerate() {
            let intervals = timeline.intervals(r);
            if intervals.is_empty() {
                continue;
            }
            for period in &buckets {
                let weighted: f64 = intervals
                    .iter()
                    .map(|iv| {
                        iv.fraction
                            * TimeWindow::new(iv.start_ms, iv.end_ms).overlap_ms(period) as f64
                    })
                    .sum();
                if weighted <= 0.0 {
                    continue;
                }
                samples.push(UtilizationSample {
                    resource_id: resource.id.clone(),
                    period: *period,
                    load: weighted / period.duration_ms() as f64,
                    peak: timeline.peak_in(r, period.start_ms, period.end_ms),
                });
            }
        }
        samples
    }

    /// Completion of every terminal task, then project completion.
    fn milestones(&self, genes: &[Gene], end_ms: i64) -> Vec<Milestone> {
        let n = genes.len();
        let mut has_successor = vec![false; n];
        for preds in self.problem.predecessors.iter().take(n) {
            for &p in preds {
                has_successor[p] = true;
            }
        }

        let mut terminal: Vec<usize> = (0..n).filter(|&i| !has_successor[i]).collect();
        terminal.sort_by_key(|&i| (genes[i].end_ms, i));

        let mut milestones: Vec<Milestone> = terminal
            .into_iter()
            .map(|i| {
                let task = &self.problem.tasks[genes[i].task];
                let label = if task.name.is_empty() { &task.id } else { &task.name };
                Milestone {
                    name: format!("{label} complete"),
                    task_id: Some(task.id.clone()),
                    at_ms: genes[i].end_ms,
                }
            })
            .collect();
        milestones.push(Milestone {
            name: "Project complete".into(),
            task_id: None,
            at_ms: end_ms,
        });
        milestones
    }
}

/// Consecutive buckets covering `[start_ms, end_ms)`; the last one is clipped.
pub fn buckets(start_ms: i64, end_ms: i64, width_ms: i64) -> Vec<TimeWindow> {
    let width = width_ms.max(1);
    let mut out = Vec::new();
    let mut t = start_ms;
    while t < end_ms {
        let next = (t + width).min(end_ms);
        out.push(TimeWindow::new(t, next));
        t = next;
    }
    out
}

/// Peak summed fraction of `genes` on resource `r` at any instant.
pub fn peak_load(genes: &[Gene], r: usize) -> f64 {
    let timeline = ResourceTimeline::from_genes(r + 1, genes);
    let intervals = timeline.intervals(r);
    intervals
        .iter()
        .map(|iv| load_at(intervals, iv.start_ms))
        .fold(0.0, f64::max)
}
