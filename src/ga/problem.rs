//! Allocation GA problem definition.
//!
//! Bridges the domain models (Task, Resource, request constraints) to the
//! genetic optimizer: precomputes qualified candidates with their scored
//! durations and costs, places individuals in time and computes fitness.

use rand::Rng;
use rand::prelude::IndexedRandom;

use super::population::{Evaluation, Gene};
use crate::config::ScheduleConfig;
use crate::features::{extract, ExtractionContext};
use crate::models::{Goal, OptimizationRequest, Preferences, Resource, Task, TimeWindow, MS_PER_HOUR};
use crate::scheduler::network::{forward_pass, LOAD_EPSILON};
use crate::scoring::ScoringModel;
use crate::validation::{topological_order, ValidationError, ValidationErrorKind};

/// A qualified resource for one task, with scored estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Resource index.
    pub resource: usize,
    /// Duration at full capacity: base × duration factor (ms).
    pub full_duration_ms: i64,
    /// Projected cost (fraction-independent).
    pub cost: f64,
    /// Predicted success probability.
    pub success: f64,
    /// Holds every certification the task needs.
    pub certified: bool,
    /// Resource is local.
    pub local: bool,
}

/// Fitness term weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessWeights {
    pub cost: f64,
    pub utilization: f64,
    pub time: f64,
    pub quality: f64,
    /// Penalty per violation.
    pub violation: f64,
    /// Constant offset.
    pub bias: f64,
}

impl FitnessWeights {
    /// Weights for a goal. `BalanceCostTime` is the canonical
    /// `0.4·cost + 0.4·utilization − 0.1·violations + 0.2`.
    pub fn for_goal(goal: Goal, preferences: &Preferences) -> Self {
        let (cost, utilization, time, quality) = match goal {
            Goal::BalanceCostTime => (0.4, 0.4, 0.0, 0.0),
            Goal::MinimizeCost => (0.6, 0.2, 0.0, 0.0),
            Goal::MinimizeDuration => (0.2, 0.2, 0.4, 0.0),
            Goal::MaximizeQuality => (0.2, 0.2, 0.0, 0.4),
            Goal::MaximizeUtilization => (0.2, 0.6, 0.0, 0.0),
            Goal::Custom => {
                let w = preferences.weights.normalized();
                (0.8 * w.cost, 0.2, 0.8 * w.time, 0.8 * w.quality)
            }
        };
        Self {
            cost,
            utilization,
            time,
            quality,
            violation: 0.1,
            bias: 0.2,
        }
    }
}

/// GA problem for resource allocation.
///
/// Holds only request-scoped, read-only data, so it can be shared across
/// evaluation threads.
pub struct AllocationProblem<'a> {
    /// Tasks in input order.
    pub tasks: &'a [Task],
    /// Resource pool.
    pub resources: &'a [Resource],
    /// Qualified candidates per task, ordered by resource ID.
    pub candidates: Vec<Vec<Candidate>>,
    /// Predecessor task indices per task.
    pub predecessors: Vec<Vec<usize>>,
    /// Topological placement order.
    pub order: Vec<usize>,
    /// Planning horizon.
    pub horizon: TimeWindow,
    /// Effective deadline per task (task deadline ∧ project deadline).
    pub deadlines: Vec<Option<i64>>,
    /// Budget limit.
    pub budget_limit: Option<f64>,
    /// Share of each day a resource can work: its own daily capacity,
    /// capped by the request's working hours.
    pub daily_shares: Vec<f64>,
    /// Maximum summed fraction per resource at any instant.
    pub capacity_limit: f64,
    /// Fitness weights.
    pub weights: FitnessWeights,
    /// Soft preferences.
    pub preferences: Preferences,
    /// Smallest allowed fraction.
    pub min_fraction: f64,
    /// Fraction perturbation step.
    pub fraction_step: f64,
}

impl<'a> AllocationProblem<'a> {
    /// Builds a problem from domain models.
    ///
    /// Every (task, resource) pair is scored once here; the search never
    /// calls the scoring model again.
    pub fn new(
        tasks: &'a [Task],
        resources: &'a [Resource],
        request: &OptimizationRequest,
        scoring: &dyn ScoringModel,
        schedule: &ScheduleConfig,
    ) -> Result<Self, ValidationError> {
        let order = topological_order(tasks).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                "Task dependencies contain a cycle",
            )
        })?;

        let constraints = &request.constraints;
        let ctx = ExtractionContext::for_horizon(constraints, &request.horizon);

        let working_share = constraints
            .working_hours_per_day
            .map(|h| (h / 24.0).clamp(0.0, 1.0));
        let daily_shares: Vec<f64> = resources
            .iter()
            .map(|r| match working_share {
                Some(w) => w.min(r.daily_share()),
                None => r.daily_share(),
            })
            .collect();

        // Lowest resource ID first for every tie.
        let mut by_id: Vec<usize> = (0..resources.len()).collect();
        by_id.sort_by(|&a, &b| resources[a].id.cmp(&resources[b].id));

        let candidates = tasks
            .iter()
            .map(|task| {
                by_id
                    .iter()
                    .filter_map(|&r| {
                        let resource = &resources[r];
                        // No working time at all.
                        if daily_shares[r] <= 0.0 {
                            return None;
                        }
                        let features = extract(task, resource, &ctx);
                        if features.is_unqualified() {
                            return None;
                        }
                        let score = scoring.score(&features);
                        let full_duration_ms =
                            ((task.base_duration_ms as f64 * score.duration_factor).round() as i64)
                                .max(1);
                        Some(Candidate {
                            resource: r,
                            full_duration_ms,
                            cost: resource.cost_per_hour * full_duration_ms as f64
                                / MS_PER_HOUR as f64,
                            success: score.success_probability,
                            certified: constraints.is_certified(task, resource),
                            local: resource.is_local,
                        })
                    })
                    .collect()
            })
            .collect();

        let index: std::collections::HashMap<&str, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();
        let predecessors = tasks
            .iter()
            .map(|t| {
                t.dependencies
                    .iter()
                    .filter_map(|d| index.get(d.as_str()).copied())
                    .collect()
            })
            .collect();

        let deadlines = tasks
            .iter()
            .map(|t| match (t.deadline_ms, constraints.deadline_ms) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            })
            .collect();

        let capacity_limit = if request.preferences.allow_overtime {
            schedule.overtime_ceiling.max(1.0)
        } else {
            1.0
        };

        Ok(Self {
            tasks,
            resources,
            candidates,
            predecessors,
            order,
            horizon: request.horizon,
            deadlines,
            budget_limit: constraints.budget_limit,
            daily_shares,
            capacity_limit,
            weights: FitnessWeights::for_goal(request.goal, &request.preferences),
            preferences: request.preferences.clone(),
            min_fraction: schedule.min_fraction.clamp(0.01, 1.0),
            fraction_step: schedule.fraction_step.max(0.01),
        })
    }

    /// Number of tasks (genes per individual).
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Task indices without any qualified resource.
    pub fn unsatisfiable(&self) -> Vec<usize> {
        (0..self.tasks.len())
            .filter(|&t| self.candidates[t].is_empty())
            .collect()
    }

    /// Candidate entry for a (task, resource) pair.
    pub fn candidate(&self, task: usize, resource: usize) -> Option<&Candidate> {
        self.candidates[task].iter().find(|c| c.resource == resource)
    }

    /// Elapsed duration of a gene: full-capacity working time stretched by
    /// its fraction and by the resource's daily share.
    pub fn duration_ms(&self, gene: &Gene) -> i64 {
        match gene.resource.and_then(|r| self.candidate(gene.task, r)) {
            Some(c) => {
                let rate = gene.fraction.max(self.min_fraction) * self.daily_shares[c.resource];
                ((c.full_duration_ms as f64 / rate).round() as i64).max(1)
            }
            None => self.tasks[gene.task].base_duration_ms.max(1),
        }
    }

    /// Random gene: uniform qualified candidate at full capacity.
    pub fn random_gene<R: Rng>(&self, task: usize, rng: &mut R) -> Gene {
        let resource = self.candidates[task].choose(rng).map(|c| c.resource);
        Gene::new(task, resource, 1.0)
    }

    /// Gene on the candidate with the highest predicted success.
    pub fn seeded_gene(&self, task: usize) -> Gene {
        // First maximum keeps the lowest resource ID.
        let best = self.candidates[task]
            .iter()
            .fold(None::<&Candidate>, |best, c| match best {
                Some(b) if b.success >= c.success => Some(b),
                _ => Some(c),
            });
        Gene::new(task, best.map(|c| c.resource), 1.0)
    }

    /// Naive baseline gene: lowest-ID qualified candidate at full capacity.
    pub fn baseline_gene(&self, task: usize) -> Gene {
        Gene::new(task, self.candidates[task].first().map(|c| c.resource), 1.0)
    }

    /// Naive baseline individual.
    pub fn baseline_genes(&self) -> Vec<Gene> {
        (0..self.task_count()).map(|t| self.baseline_gene(t)).collect()
    }

    /// Places `genes` in time and computes their fitness.
    pub fn evaluate(&self, genes: &mut [Gene]) -> Evaluation {
        let timeline = forward_pass(self, genes);

        let finish = genes.iter().map(|g| g.end_ms).max().unwrap_or(self.horizon.start_ms);
        let span_ms = (finish - self.horizon.start_ms).max(0);

        let mut violations = 0u32;
        let mut total_cost = 0.0;
        let mut success_sum = 0.0;
        let mut assigned = 0usize;
        let mut local = 0usize;
        let mut certified = 0usize;

        for gene in genes.iter() {
            match gene.resource.and_then(|r| self.candidate(gene.task, r)) {
                Some(c) => {
                    assigned += 1;
                    total_cost += c.cost;
                    success_sum += c.success;
                    if c.local {
                        local += 1;
                    }
                    if c.certified {
                        certified += 1;
                    } else {
                        violations += 1;
                    }
                }
                // Missing required skill.
                None => violations += 1,
            }
            if let Some(deadline) = self.deadlines[gene.task] {
                if gene.end_ms > deadline {
                    violations += 1;
                }
            }
        }

        violations += (0..self.resources.len())
            .filter(|&r| timeline.peak_load(r) > self.capacity_limit + LOAD_EPSILON)
            .count() as u32;

        let utilization = self.utilization_by_resource(genes, span_ms);
        let utilization_pct = if utilization.is_empty() {
            0.0
        } else {
            utilization.iter().sum::<f64>() / utilization.len() as f64
        };
        let mean_success = if assigned == 0 {
            0.0
        } else {
            success_sum / assigned as f64
        };

        let cost_score = match self.budget_limit {
            Some(limit) if limit > 0.0 => (1.0 - total_cost / limit).clamp(0.0, 1.0),
            _ => 1.0,
        };
        let utilization_score = (utilization_pct / 100.0).clamp(0.0, 1.0);
        let time_score = if self.horizon.duration_ms() > 0 {
            (1.0 - span_ms as f64 / self.horizon.duration_ms() as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let w = &self.weights;
        let mut fitness = w.cost * cost_score
            + w.utilization * utilization_score
            + w.time * time_score
            + w.quality * mean_success
            - w.violation * violations as f64
            + w.bias;

        let n = genes.len().max(1) as f64;
        if self.preferences.prefer_local {
            fitness += 0.05 * local as f64 / n;
        }
        if self.preferences.prefer_certified {
            fitness += 0.05 * certified as f64 / n;
        }

        Evaluation {
            fitness,
            violations,
            total_cost,
            utilization_pct,
            span_ms,
            mean_success,
        }
    }

    /// Utilization per resource (percent of `span_ms`), in resource order.
    pub fn utilization_by_resource(&self, genes: &[Gene], span_ms: i64) -> Vec<f64> {
        let mut busy = vec![0.0f64; self.resources.len()];
        for gene in genes {
            if let Some(r) = gene.resource {
                busy[r] += gene.fraction * (gene.end_ms - gene.start_ms) as f64;
            }
        }
        if span_ms <= 0 {
            return vec![0.0; self.resources.len()];
        }
        busy.into_iter()
            .map(|b| 100.0 * b / span_ms as f64)
            .collect()
    }
}
