//! Genetic operators for allocation chromosomes.
//!
//! Provides single-point crossover over the ordered gene list, tournament
//! selection, and runtime-selectable mutation via [`GeneticOperators`].
//!
//! # Usage
//!
//! ```
//! use u_allocate::ga::operators::{GeneticOperators, MutationType};
//!
//! let ops = GeneticOperators::default();
//! assert_eq!(ops.mutation_type, MutationType::Mixed);
//! ```

use rand::Rng;
use rand::prelude::IndexedRandom;

use super::population::{Gene, Population};
use super::problem::AllocationProblem;

/// Mutation strategy for allocation chromosomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    /// Move one gene to a different qualified resource.
    Reassign,
    /// Step one gene's capacity fraction up or down.
    Perturb,
    /// Reassign or perturb with equal probability.
    Mixed,
}

/// Runtime-selectable genetic operators.
#[derive(Debug, Clone)]
pub struct GeneticOperators {
    /// Mutation strategy.
    pub mutation_type: MutationType,
}

impl Default for GeneticOperators {
    fn default() -> Self {
        Self {
            mutation_type: MutationType::Mixed,
        }
    }
}

impl GeneticOperators {
    /// Single-point crossover; see [`single_point_crossover`].
    pub fn crossover<R: Rng>(&self, p1: &[Gene], p2: &[Gene], rng: &mut R) -> (Vec<Gene>, Vec<Gene>) {
        single_point_crossover(p1, p2, rng)
    }

    /// Mutates one random gene using the configured strategy.
    ///
    /// Returns whether anything changed.
    pub fn mutate<R: Rng>(
        &self,
        genes: &mut [Gene],
        problem: &AllocationProblem<'_>,
        rng: &mut R,
    ) -> bool {
        if genes.is_empty() {
            return false;
        }
        let idx = rng.random_range(0..genes.len());
        let reassign = match self.mutation_type {
            MutationType::Reassign => true,
            MutationType::Perturb => false,
            MutationType::Mixed => rng.random_bool(0.5),
        };
        if reassign {
            reassign_mutation(&mut genes[idx], problem, rng)
                || perturb_mutation(&mut genes[idx], problem, rng)
        } else {
            perturb_mutation(&mut genes[idx], problem, rng)
        }
    }
}

/// Single-point crossover: child 1 takes `p1[..cut]` and `p2[cut..]`,
/// child 2 the reverse. Parents shorter than two genes are copied.
pub fn single_point_crossover<R: Rng>(
    p1: &[Gene],
    p2: &[Gene],
    rng: &mut R,
) -> (Vec<Gene>, Vec<Gene>) {
    let n = p1.len().min(p2.len());
    if n < 2 {
        return (p1.to_vec(), p2.to_vec());
    }
    let cut = rng.random_range(1..n);
    let c1 = p1[..cut].iter().chain(&p2[cut..]).copied().collect();
    let c2 = p2[..cut].iter().chain(&p1[cut..]).copied().collect();
    (c1, c2)
}

/// Reassigns a gene to a different qualified resource.
///
/// Returns `false` when the task has fewer than two candidates.
pub fn reassign_mutation<R: Rng>(
    gene: &mut Gene,
    problem: &AllocationProblem<'_>,
    rng: &mut R,
) -> bool {
    let others: Vec<usize> = problem.candidates[gene.task]
        .iter()
        .map(|c| c.resource)
        .filter(|&r| Some(r) != gene.resource)
        .collect();
    match others.choose(rng) {
        Some(&r) => {
            gene.resource = Some(r);
            true
        }
        None => false,
    }
}

/// Moves a gene's fraction one step up or down within `[min_fraction, 1.0]`.
///
/// Returns `false` for genes without a resource.
pub fn perturb_mutation<R: Rng>(
    gene: &mut Gene,
    problem: &AllocationProblem<'_>,
    rng: &mut R,
) -> bool {
    if gene.resource.is_none() {
        return false;
    }
    let step = problem.fraction_step;
    let lo = problem.min_fraction;
    let up = (gene.fraction + step).min(1.0);
    let down = (gene.fraction - step).max(lo);

    let next = if gene.fraction >= 1.0 {
        down
    } else if gene.fraction <= lo {
        up
    } else if rng.random_bool(0.5) {
        up
    } else {
        down
    };
    if (next - gene.fraction).abs() < f64::EPSILON {
        return false;
    }
    gene.fraction = next;
    true
}

/// Tournament selection: best of `size` uniformly drawn individuals.
pub fn tournament<R: Rng>(population: &Population, size: usize, rng: &mut R) -> usize {
    let n = population.len();
    let mut best = rng.random_range(0..n);
    for _ in 1..size.max(1) {
        let challenger = rng.random_range(0..n);
        if population.compare_individuals(challenger, best).is_gt() {
            best = challenger;
        }
    }
    best
}
