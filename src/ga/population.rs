//! Arena-backed population.
//!
//! # Encoding
//!
//! An individual is an ordered list of [`Gene`]s, one per task, in task
//! input order. A population stores all individuals back to back in one flat
//! `Vec<Gene>` with a stride of `task_count`, plus a parallel fitness cache.
//! Mutating an individual's genes clears its cache entry.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::problem::AllocationProblem;

/// One allocation: (task, resource, capacity fraction, start, end).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    /// Task index.
    pub task: usize,
    /// Resource index. `None` = no qualified resource.
    pub resource: Option<usize>,
    /// Allocated capacity fraction.
    pub fraction: f64,
    /// Start (ms), written by the forward pass.
    pub start_ms: i64,
    /// End (ms), written by the forward pass.
    pub end_ms: i64,
}

impl Gene {
    /// Creates an unplaced gene.
    pub fn new(task: usize, resource: Option<usize>, fraction: f64) -> Self {
        Self {
            task,
            resource,
            fraction,
            start_ms: 0,
            end_ms: 0,
        }
    }
}

/// Cached fitness of an individual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Scalar fitness (higher = better).
    pub fitness: f64,
    /// Constraint breaches (capacity, skill, certification, deadline).
    pub violations: u32,
    /// Projected total cost.
    pub total_cost: f64,
    /// Mean pool utilization (percent).
    pub utilization_pct: f64,
    /// Span from horizon start to the last finish (ms).
    pub span_ms: i64,
    /// Mean success probability of assigned genes.
    pub mean_success: f64,
}

/// Orders evaluations; `Greater` = better.
///
/// Higher fitness wins; ties prefer fewer violations, then lower cost.
pub fn compare(a: &Evaluation, b: &Evaluation) -> Ordering {
    a.fitness
        .total_cmp(&b.fitness)
        .then_with(|| b.violations.cmp(&a.violations))
        .then_with(|| b.total_cost.total_cmp(&a.total_cost))
}

/// A standalone individual (used for results and diagnostics).
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    /// Genes in task order.
    pub genes: Vec<Gene>,
    evaluation: Option<Evaluation>,
}

impl Individual {
    /// Creates an unevaluated individual.
    pub fn new(genes: Vec<Gene>) -> Self {
        Self {
            genes,
            evaluation: None,
        }
    }

    /// Cached evaluation.
    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    /// Evaluates (placing genes in time) unless cached.
    pub fn evaluate(&mut self, problem: &AllocationProblem<'_>) -> Evaluation {
        if let Some(eval) = self.evaluation {
            return eval;
        }
        let eval = problem.evaluate(&mut self.genes);
        self.evaluation = Some(eval);
        eval
    }

    /// Mutable genes; clears the cached evaluation.
    pub fn genes_mut(&mut self) -> &mut [Gene] {
        self.evaluation = None;
        &mut self.genes
    }
}

/// Fixed-stride population arena.
#[derive(Debug, Clone, Default)]
pub struct Population {
    stride: usize,
    genes: Vec<Gene>,
    evals: Vec<Option<Evaluation>>,
}

impl Population {
    /// Creates an empty arena for `capacity` individuals of `stride` genes.
    pub fn with_capacity(stride: usize, capacity: usize) -> Self {
        Self {
            stride,
            genes: Vec::with_capacity(stride * capacity),
            evals: Vec::with_capacity(capacity),
        }
    }

    /// Number of individuals.
    pub fn len(&self) -> usize {
        self.evals.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.evals.is_empty()
    }

    /// Genes per individual.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Removes all individuals, keeping the allocation.
    pub fn clear(&mut self) {
        self.genes.clear();
        self.evals.clear();
    }

    /// Appends an individual.
    pub fn push(&mut self, genes: &[Gene], evaluation: Option<Evaluation>) {
        debug_assert_eq!(genes.len(), self.stride);
        self.genes.extend_from_slice(genes);
        self.evals.push(evaluation);
    }

    /// Genes of individual `i`.
    pub fn individual(&self, i: usize) -> &[Gene] {
        &self.genes[i * self.stride..(i + 1) * self.stride]
    }

    /// Mutable genes of individual `i`; clears its cached evaluation.
    pub fn individual_mut(&mut self, i: usize) -> &mut [Gene] {
        self.evals[i] = None;
        &mut self.genes[i * self.stride..(i + 1) * self.stride]
    }

    /// Cached evaluation of individual `i`.
    pub fn evaluation(&self, i: usize) -> Option<&Evaluation> {
        self.evals[i].as_ref()
    }

    /// Evaluates every individual without a cached evaluation.
    ///
    /// Evaluation only reads request-scoped data, so the parallel path
    /// produces the same values as the sequential one.
    pub fn evaluate(&mut self, problem: &AllocationProblem<'_>, parallel: bool) {
        if self.stride == 0 {
            return;
        }
        if parallel {
            self.genes
                .par_chunks_mut(self.stride)
                .zip(self.evals.par_iter_mut())
                .filter(|(_, eval)| eval.is_none())
                .for_each(|(genes, eval)| *eval = Some(problem.evaluate(genes)));
        } else {
            for (genes, eval) in self.genes.chunks_mut(self.stride).zip(self.evals.iter_mut()) {
                if eval.is_none() {
                    *eval = Some(problem.evaluate(genes));
                }
            }
        }
    }

    /// Compares individuals `a` and `b` (`Greater` = `a` better).
    ///
    /// Unevaluated individuals rank last; equal individuals prefer the lower index.
    pub fn compare_individuals(&self, a: usize, b: usize) -> Ordering {
        match (&self.evals[a], &self.evals[b]) {
            (Some(ea), Some(eb)) => compare(ea, eb).then_with(|| b.cmp(&a)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => b.cmp(&a),
        }
    }

    /// Indices sorted best first.
    pub fn ranked(&self) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..self.len()).collect();
        idx.sort_by(|&a, &b| self.compare_individuals(b, a));
        idx
    }

    /// Index of the best individual.
    pub fn best_index(&self) -> Option<usize> {
        (0..self.len()).max_by(|&a, &b| self.compare_individuals(a, b))
    }

    /// Fitness values of evaluated individuals, best first, at most `n`.
    pub fn top_fitness(&self, n: usize) -> Vec<f64> {
        self.ranked()
            .into_iter()
            .filter_map(|i| self.evals[i].map(|e| e.fitness))
            .take(n)
            .collect()
    }

    /// Mean fitness of evaluated individuals.
    pub fn mean_fitness(&self) -> f64 {
        let values: Vec<f64> = self.evals.iter().flatten().map(|e| e.fitness).collect();
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    }

    /// Copies individual `i` out of the arena.
    pub fn to_individual(&self, i: usize) -> Individual {
        Individual {
            genes: self.individual(i).to_vec(),
            evaluation: self.evals[i],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(fitness: f64, violations: u32, cost: f64) -> Evaluation {
        Evaluation {
            fitness,
            violations,
            total_cost: cost,
            utilization_pct: 0.0,
            span_ms: 0,
            mean_success: 0.0,
        }
    }

    fn genes(task_count: usize, resource: usize) -> Vec<Gene> {
        (0..task_count)
            .map(|t| Gene::new(t, Some(resource), 1.0))
            .collect()
    }

    #[test]
    fn test_compare_tie_break() {
        assert_eq!(compare(&eval(0.5, 0, 10.0), &eval(0.4, 0, 1.0)), Ordering::Greater);
        assert_eq!(compare(&eval(0.5, 1, 10.0), &eval(0.5, 2, 1.0)), Ordering::Greater);
        assert_eq!(compare(&eval(0.5, 1, 10.0), &eval(0.5, 1, 20.0)), Ordering::Greater);
        assert_eq!(compare(&eval(0.5, 1, 10.0), &eval(0.5, 1, 10.0)), Ordering::Equal);
    }

    #[test]
    fn test_arena_layout() {
        let mut pop = Population::with_capacity(3, 2);
        pop.push(&genes(3, 0), None);
        pop.push(&genes(3, 1), Some(eval(0.7, 0, 5.0)));

        assert_eq!(pop.len(), 2);
        assert_eq!(pop.stride(), 3);
        assert_eq!(pop.individual(1)[2].resource, Some(1));
        assert!(pop.evaluation(0).is_none());

        pop.individual_mut(1)[0].fraction = 0.5;
        assert!(pop.evaluation(1).is_none());
    }

    #[test]
    fn test_ranking_and_best() {
        let mut pop = Population::with_capacity(1, 4);
        pop.push(&genes(1, 0), Some(eval(0.2, 0, 1.0)));
        pop.push(&genes(1, 0), Some(eval(0.9, 0, 1.0)));
        pop.push(&genes(1, 0), None);
        pop.push(&genes(1, 0), Some(eval(0.9, 0, 1.0)));

        assert_eq!(pop.ranked(), vec![1, 3, 0, 2]);
        assert_eq!(pop.best_index(), Some(1));
        assert_eq!(pop.top_fitness(2), vec![0.9, 0.9]);
        assert!((pop.mean_fitness() - 2.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_clear_keeps_stride() {
        let mut pop = Population::with_capacity(2, 1);
        pop.push(&genes(2, 0), None);
        pop.clear();
        assert!(pop.is_empty());
        assert_eq!(pop.stride(), 2);
    }

    #[test]
    fn test_individual_cache_invalidation() {
        let mut ind = Individual::new(genes(2, 0));
        ind.evaluation = Some(eval(0.3, 0, 0.0));
        assert!(ind.evaluation().is_some());
        ind.genes_mut()[0].fraction = 0.75;
        assert!(ind.evaluation().is_none());
    }
}
