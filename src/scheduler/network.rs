//! Resource-constrained forward pass.
//!
//! Places allocations in time, in dependency order, so that
//!
//! - every task starts after all its predecessors finish,
//! - no task starts before the horizon start or its own earliest start,
//! - a resource's summed capacity fraction never exceeds the capacity limit,
//! - a resource works only its daily share (its own daily capacity, capped
//!   by the request's working hours), so durations stretch by `1 / share`.
//!
//! # Algorithm
//!
//! Serial schedule generation: for each task in topological order, compute
//! the ready time, then try the ready time and every later interval end on
//! the assigned resource (each aligned to the resource calendar) and take the
//! earliest one where the allocation fits.
//!
//! # Reference
//! Kolisch (1996), "Serial and parallel resource-constrained project
//! scheduling methods revisited"

use crate::ga::{AllocationProblem, Gene};

/// Tolerance on summed fractions.
pub const LOAD_EPSILON: f64 = 1e-9;

/// One placed interval on a resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start_ms: i64,
    pub end_ms: i64,
    pub fraction: f64,
}

/// Placed intervals per resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceTimeline {
    intervals: Vec<Vec<Interval>>,
}

impl ResourceTimeline {
    /// Creates an empty timeline for `resource_count` resources.
    pub fn new(resource_count: usize) -> Self {
        Self {
            intervals: vec![Vec::new(); resource_count],
        }
    }

    /// Rebuilds a timeline from already placed genes.
    pub fn from_genes(resource_count: usize, genes: &[Gene]) -> Self {
        let mut timeline = Self::new(resource_count);
        for gene in genes {
            if let Some(r) = gene.resource.filter(|&r| r < resource_count) {
                timeline.push(r, gene.start_ms, gene.end_ms, gene.fraction);
            }
        }
        timeline
    }

    /// Records an interval.
    pub fn push(&mut self, resource: usize, start_ms: i64, end_ms: i64, fraction: f64) {
        self.intervals[resource].push(Interval {
            start_ms,
            end_ms,
            fraction,
        });
    }

    /// Intervals placed on a resource.
    pub fn intervals(&self, resource: usize) -> &[Interval] {
        &self.intervals[resource]
    }

    /// Ends of intervals on `resource` strictly after `after_ms`.
    pub fn ends_after(&self, resource: usize, after_ms: i64) -> impl Iterator<Item = i64> + '_ {
        self.intervals[resource]
            .iter()
            .map(|iv| iv.end_ms)
            .filter(move |&end| end > after_ms)
    }

    /// Peak summed fraction on `resource` within `[start_ms, end_ms)`.
    pub fn peak_in(&self, resource: usize, start_ms: i64, end_ms: i64) -> f64 {
        let ivs = &self.intervals[resource];
        // Load only rises at interval starts, so checking the window start
        // and every start inside the window finds the peak.
        std::iter::once(start_ms)
            .chain(
                ivs.iter()
                    .map(|iv| iv.start_ms)
                    .filter(|&s| s > start_ms && s < end_ms),
            )
            .map(|t| load_at(ivs, t))
            .fold(0.0, f64::max)
    }

    /// Peak summed fraction on `resource` over all time.
    pub fn peak_load(&self, resource: usize) -> f64 {
        let ivs = &self.intervals[resource];
        ivs.iter()
            .map(|iv| load_at(ivs, iv.start_ms))
            .fold(0.0, f64::max)
    }
}

/// Summed fraction of intervals active at instant `t`.
pub fn load_at(intervals: &[Interval], t: i64) -> f64 {
    intervals
        .iter()
        .filter(|iv| iv.start_ms <= t && t < iv.end_ms)
        .map(|iv| iv.fraction)
        .sum()
}

/// Places `genes` (one per task, in task order) and writes their start and
/// end times. Returns the resulting resource timeline.
///
/// Genes without a qualified resource are placed at their ready time with
/// the task's base duration and occupy no resource.
pub fn forward_pass(problem: &AllocationProblem<'_>, genes: &mut [Gene]) -> ResourceTimeline {
    let mut timeline = ResourceTimeline::new(problem.resources.len());
    let mut finish = vec![problem.horizon.start_ms; genes.len()];

    for &t in &problem.order {
        debug_assert_eq!(genes[t].task, t);
        let task = &problem.tasks[t];
        let ready = problem.predecessors[t]
            .iter()
            .map(|&p| finish[p])
            .fold(problem.horizon.start_ms.max(task.earliest_start_ms), i64::max);

        let duration = problem.duration_ms(&genes[t]);
        let gene = &mut genes[t];

        let start = match gene
            .resource
            .filter(|&r| problem.candidate(t, r).is_some())
        {
            Some(r) => {
                let calendar = &problem.resources[r].availability;
                let mut starts: Vec<i64> = std::iter::once(ready)
                    .chain(timeline.ends_after(r, ready))
                    .map(|s| calendar.next_available(s).unwrap_or(s))
                    .collect();
                starts.sort_unstable();
                starts.dedup();

                let limit = problem.capacity_limit + LOAD_EPSILON;
                let start = starts
                    .iter()
                    .copied()
                    .find(|&s| timeline.peak_in(r, s, s + duration) + gene.fraction <= limit)
                    .or_else(|| starts.last().copied())
                    .unwrap_or(ready);
                timeline.push(r, start, start + duration, gene.fraction);
                start
            }
            None => ready,
        };

        gene.start_ms = start;
        gene.end_ms = start + duration;
        finish[t] = gene.end_ms;
    }

    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScheduleConfig;
    use crate::models::{
        Calendar, ConstraintSet, OptimizationRequest, Preferences, Resource, Task, TimeWindow,
        MS_PER_HOUR,
    };
    use crate::scoring::{ScoringWeights, WeightedScoringModel};

    const H: i64 = MS_PER_HOUR;

    /// Scoring model with a duration factor of exactly 1.0.
    fn unit_model() -> WeightedScoringModel {
        WeightedScoringModel::with_weights(ScoringWeights {
            min_duration_factor: 1.0,
            max_duration_factor: 1.0,
            ..ScoringWeights::default()
        })
    }

    fn request(preferences: Preferences) -> OptimizationRequest {
        OptimizationRequest::new(vec!["P".into()], TimeWindow::new(0, 100 * H))
            .with_constraints(ConstraintSet::new())
            .with_preferences(preferences)
    }

    #[test]
    fn test_interval_load() {
        let mut tl = ResourceTimeline::new(1);
        tl.push(0, 0, 10, 0.5);
        tl.push(0, 5, 15, 0.5);
        tl.push(0, 12, 20, 0.25);

        assert!((tl.peak_in(0, 0, 5) - 0.5).abs() < 1e-10);
        assert!((tl.peak_in(0, 0, 20) - 1.0).abs() < 1e-10);
        assert!((tl.peak_in(0, 10, 12) - 0.5).abs() < 1e-10);
        assert!((tl.peak_load(0) - 1.0).abs() < 1e-10);
        assert_eq!(tl.ends_after(0, 10).collect::<Vec<_>>(), vec![15, 20]);
        assert_eq!(tl.peak_in(0, 20, 30), 0.0);
    }

    #[test]
    fn test_dependencies_and_resource_serialization() {
        let tasks = vec![
            Task::new("A").with_duration_hours(2.0),
            Task::new("B").with_duration_hours(3.0).with_dependency("A"),
            Task::new("C").with_duration_hours(1.0),
        ];
        let resources = vec![Resource::labor("R1")];
        let req = request(Preferences::new());
        let problem = AllocationProblem::new(
            &tasks,
            &resources,
            &req,
            &unit_model(),
            &ScheduleConfig::default(),
        )
        .unwrap();

        let mut genes: Vec<Gene> = (0..3).map(|t| Gene::new(t, Some(0), 1.0)).collect();
        let tl = forward_pass(&problem, &mut genes);

        // A [0,2h), B [2h,5h) after A; C waits for R1.
        assert_eq!((genes[0].start_ms, genes[0].end_ms), (0, 2 * H));
        assert_eq!((genes[1].start_ms, genes[1].end_ms), (2 * H, 5 * H));
        assert_eq!((genes[2].start_ms, genes[2].end_ms), (5 * H, 6 * H));
        assert!(tl.peak_load(0) <= 1.0 + LOAD_EPSILON);
    }

    #[test]
    fn test_fractions_share_resource() {
        let tasks = vec![
            Task::new("A").with_duration_hours(2.0),
            Task::new("B").with_duration_hours(2.0),
        ];
        let resources = vec![Resource::labor("R1")];
        let req = request(Preferences::new());
        let problem = AllocationProblem::new(
            &tasks,
            &resources,
            &req,
            &unit_model(),
            &ScheduleConfig::default(),
        )
        .unwrap();

        let mut genes = vec![Gene::new(0, Some(0), 0.5), Gene::new(1, Some(0), 0.5)];
        let tl = forward_pass(&problem, &mut genes);

        // Half capacity doubles duration; both run side by side.
        assert_eq!(genes[0].start_ms, 0);
        assert_eq!(genes[1].start_ms, 0);
        assert_eq!(genes[0].end_ms, 4 * H);
        assert!((tl.peak_load(0) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_overtime_raises_limit() {
        let tasks = vec![
            Task::new("A").with_duration_hours(1.0),
            Task::new("B").with_duration_hours(1.0),
        ];
        let resources = vec![Resource::labor("R1")];
        let req = request(Preferences::new().with_overtime());
        let problem = AllocationProblem::new(
            &tasks,
            &resources,
            &req,
            &unit_model(),
            &ScheduleConfig::default(),
        )
        .unwrap();

        let mut genes = vec![Gene::new(0, Some(0), 1.0), Gene::new(1, Some(0), 0.25)];
        forward_pass(&problem, &mut genes);
        assert_eq!(genes[1].start_ms, 0);
    }

    #[test]
    fn test_daily_capacity_and_working_hours_stretch_placement() {
        let tasks = vec![
            Task::new("A").with_duration_hours(2.0),
            Task::new("B").with_duration_hours(1.0).with_dependency("A"),
        ];
        let resources = vec![
            Resource::labor("R1"),
            Resource::labor("R2").with_daily_capacity(8.0),
        ];
        let place = |constraints: ConstraintSet| {
            let req = request(Preferences::new()).with_constraints(constraints);
            let problem = AllocationProblem::new(
                &tasks,
                &resources,
                &req,
                &unit_model(),
                &ScheduleConfig::default(),
            )
            .unwrap();
            let mut genes = vec![Gene::new(0, Some(0), 1.0), Gene::new(1, Some(1), 1.0)];
            forward_pass(&problem, &mut genes);
            genes
        };

        // R2 works 8h of 24: B takes three times its full-capacity duration.
        let open = place(ConstraintSet::new());
        assert_eq!((open[0].start_ms, open[0].end_ms), (0, 2 * H));
        assert_eq!((open[1].start_ms, open[1].end_ms), (2 * H, 5 * H));

        // An 8h working day caps R1 as well.
        let capped = place(ConstraintSet::new().with_working_hours(8.0));
        assert_eq!((capped[0].start_ms, capped[0].end_ms), (0, 6 * H));
        assert_eq!((capped[1].start_ms, capped[1].end_ms), (6 * H, 9 * H));
    }

    #[test]
    fn test_calendar_alignment_and_earliest_start() {
        let tasks = vec![Task::new("A")
            .with_duration_hours(1.0)
            .with_earliest_start(H)];
        let resources = vec![Resource::labor("R1")
            .with_availability(Calendar::always().with_blocked(0, 3 * H))];
        let req = request(Preferences::new());
        let problem = AllocationProblem::new(
            &tasks,
            &resources,
            &req,
            &unit_model(),
            &ScheduleConfig::default(),
        )
        .unwrap();

        let mut genes = vec![Gene::new(0, Some(0), 1.0)];
        forward_pass(&problem, &mut genes);
        assert_eq!(genes[0].start_ms, 3 * H);
    }

    #[test]
    fn test_unassigned_placed_at_ready() {
        let tasks = vec![
            Task::new("A").with_duration_hours(2.0),
            Task::new("B")
                .with_skill("diving")
                .with_duration_hours(1.0)
                .with_dependency("A"),
        ];
        let resources = vec![Resource::labor("R1")];
        let req = request(Preferences::new());
        let problem = AllocationProblem::new(
            &tasks,
            &resources,
            &req,
            &unit_model(),
            &ScheduleConfig::default(),
        )
        .unwrap();

        let mut genes = vec![Gene::new(0, Some(0), 1.0), Gene::new(1, None, 1.0)];
        let tl = forward_pass(&problem, &mut genes);
        assert_eq!((genes[1].start_ms, genes[1].end_ms), (2 * H, 3 * H));
        assert_eq!(tl.intervals(0).len(), 1);
    }
}
