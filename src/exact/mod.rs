//! Exact solver by complete enumeration.
//!
//! Walks every permutation of the customers and keeps the cheapest feasible
//! tour. Only usable for a handful of locations; it serves as the optimality
//! reference for the annealing engine.

use crate::error::{Result, SolverError};
use crate::heuristics::permutation::LexicographicPermutations;
use crate::instance::{ProblemInstance, DEPOT};
use crate::solution::Solution;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct BruteForceConfig {
    /// Largest instance (depot included) the solver accepts
    pub max_dimension: usize,
}

impl Default for BruteForceConfig {
    fn default() -> Self {
        BruteForceConfig { max_dimension: 11 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExactResult {
    pub solution: Solution,
    /// Permutations enumerated
    pub permutations: u64,
    /// Permutations that passed the feasibility check
    pub feasible_permutations: u64,
    pub computation_time: f64,
}

pub struct BruteForceSolver {
    pub config: BruteForceConfig,
}

impl BruteForceSolver {
    pub fn new() -> Self {
        BruteForceSolver {
            config: BruteForceConfig::default(),
        }
    }

    pub fn with_config(config: BruteForceConfig) -> Self {
        BruteForceSolver { config }
    }

    pub fn solve(&self, instance: &ProblemInstance) -> Result<ExactResult> {
        if instance.dimension > self.config.max_dimension {
            return Err(SolverError::InstanceTooLarge {
                dimension: instance.dimension,
                limit: self.config.max_dimension,
            });
        }

        let start = Instant::now();
        let mut permutations = 0u64;
        let mut feasible_permutations = 0u64;
        let mut best: Option<Solution> = None;

        for mut order in LexicographicPermutations::of_customers(instance.dimension) {
            permutations += 1;
            order.push(DEPOT);
            if !instance.is_feasible(&order) {
                continue;
            }
            feasible_permutations += 1;

            let cost = instance.tour_cost(&order);
            if best.as_ref().map_or(true, |b| cost < b.cost()) {
                best = Some(Solution::from_order(instance, order));
            }
        }

        let solution = best.ok_or(SolverError::InfeasibleInstance {
            strategy: "brute force",
            attempts: permutations,
        })?;
        log::info!(
            "Brute force on {}: optimum {} ({} of {} permutations feasible)",
            instance.name,
            solution.cost(),
            feasible_permutations,
            permutations
        );

        Ok(ExactResult {
            solution,
            permutations,
            feasible_permutations,
            computation_time: start.elapsed().as_secs_f64(),
        })
    }
}

impl Default for BruteForceSolver {
    fn default() -> Self {
        Self::new()
    }
}
