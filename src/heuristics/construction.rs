//! Construction of a feasible starting order.
//!
//! Two strategies are provided: drawing random orders until one satisfies the
//! load limits, and walking the permutations of the customers in lexicographic
//! order. Both give up with [`SolverError::InfeasibleInstance`] once their bound
//! is exhausted instead of looping forever.

use crate::error::{Result, SolverError};
use crate::heuristics::permutation::LexicographicPermutations;
use crate::instance::{ProblemInstance, DEPOT};
use crate::solution::Solution;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &ProblemInstance, rng: &mut ChaCha8Rng) -> Result<Solution>;
    fn name(&self) -> &str;
}

/// Randomized retry
///
/// Draws uniformly random customer orders (sampling without replacement) and
/// keeps the first one that passes the feasibility check.
pub struct RandomRestartConstruction {
    pub max_attempts: u64,
}

impl RandomRestartConstruction {
    pub fn new() -> Self {
        RandomRestartConstruction {
            max_attempts: 100_000,
        }
    }

    pub fn with_max_attempts(max_attempts: u64) -> Self {
        RandomRestartConstruction { max_attempts }
    }
}

impl Default for RandomRestartConstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for RandomRestartConstruction {
    fn construct(&self, instance: &ProblemInstance, rng: &mut ChaCha8Rng) -> Result<Solution> {
        let mut customers: Vec<usize> = (1..instance.dimension).collect();

        for attempt in 1..=self.max_attempts {
            customers.shuffle(rng);
            let mut order = customers.clone();
            order.push(DEPOT);

            if instance.is_feasible(&order) {
                log::debug!("Random construction succeeded after {} attempts", attempt);
                return Ok(Solution::from_order(instance, order));
            }
        }

        log::warn!(
            "Random construction gave up after {} attempts on {}",
            self.max_attempts,
            instance.name
        );
        Err(SolverError::InfeasibleInstance {
            strategy: "random restart",
            attempts: self.max_attempts,
        })
    }

    fn name(&self) -> &str {
        "RandomRestart"
    }
}

/// Exhaustive enumeration
///
/// Returns the lexicographically first feasible order. Exponential in the number
/// of customers: meant for small instances and as a test oracle.
pub struct ExhaustiveConstruction {
    /// Stop after this many permutations (None = whole space)
    pub max_permutations: Option<u64>,
}

impl ExhaustiveConstruction {
    pub fn new() -> Self {
        ExhaustiveConstruction {
            max_permutations: None,
        }
    }

    pub fn with_max_permutations(max_permutations: u64) -> Self {
        ExhaustiveConstruction {
            max_permutations: Some(max_permutations),
        }
    }
}

impl Default for ExhaustiveConstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for ExhaustiveConstruction {
    fn construct(&self, instance: &ProblemInstance, _rng: &mut ChaCha8Rng) -> Result<Solution> {
        let mut checked = 0u64;

        for mut order in LexicographicPermutations::of_customers(instance.dimension) {
            if self.max_permutations.is_some_and(|max| checked >= max) {
                break;
            }
            checked += 1;

            order.push(DEPOT);
            if instance.is_feasible(&order) {
                return Ok(Solution::from_order(instance, order));
            }
        }

        Err(SolverError::InfeasibleInstance {
            strategy: "exhaustive enumeration",
            attempts: checked,
        })
    }

    fn name(&self) -> &str {
        "Exhaustive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Location 1 cannot be visited first: its limit is below the initial load
    fn create_test_instance() -> ProblemInstance {
        ProblemInstance::new(
            "blocked-first",
            vec![vec![1; 4]; 4],
            vec![0, 3, 3, 3],
            vec![9, 5, 9, 9],
        )
        .unwrap()
    }

    #[test]
    fn test_random_never_starts_with_blocked_location() {
        let instance = create_test_instance();
        let heuristic = RandomRestartConstruction::new();

        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let sol = heuristic.construct(&instance, &mut rng).unwrap();
            assert_ne!(sol.order()[0], 1);
            assert!(sol.is_complete(&instance));
            assert!(sol.is_feasible(&instance));
            assert_eq!(sol.cost(), instance.tour_cost(sol.order()));
        }
    }

    #[test]
    fn test_random_is_reproducible() {
        let instance = create_test_instance();
        let heuristic = RandomRestartConstruction::new();
        let a = heuristic.construct(&instance, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        let b = heuristic.construct(&instance, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_gives_up_on_infeasible_instance() {
        // Every customer limit is below the initial load
        let instance =
            ProblemInstance::new("dead", vec![vec![1; 3]; 3], vec![0, 2, 2], vec![9, 1, 1]).unwrap();
        let heuristic = RandomRestartConstruction::with_max_attempts(25);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        match heuristic.construct(&instance, &mut rng) {
            Err(SolverError::InfeasibleInstance { attempts, .. }) => assert_eq!(attempts, 25),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_exhaustive_returns_first_feasible() {
        let instance = create_test_instance();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let sol = ExhaustiveConstruction::new().construct(&instance, &mut rng).unwrap();
        // [1, 2, 3] is rejected, [1, 3, 2] too; [2, 1, 3] enters 1 with load 6 > 5
        assert_eq!(sol.order(), &[2, 3, 1, 0]);
    }

    #[test]
    fn test_exhaustive_reports_exhaustion() {
        let instance =
            ProblemInstance::new("dead", vec![vec![1; 3]; 3], vec![0, 2, 2], vec![9, 1, 1]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        match ExhaustiveConstruction::new().construct(&instance, &mut rng) {
            Err(SolverError::InfeasibleInstance { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("unexpected {:?}", other),
        }

        let capped = ExhaustiveConstruction::with_max_permutations(1);
        let instance = create_test_instance();
        assert!(capped.construct(&instance, &mut rng).is_err());
    }

    #[test]
    fn test_depot_only_instance() {
        let instance = ProblemInstance::new("depot", vec![vec![0]], vec![0], vec![0]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let sol = RandomRestartConstruction::new().construct(&instance, &mut rng).unwrap();
        assert_eq!(sol.order(), &[0]);
        let sol = ExhaustiveConstruction::new().construct(&instance, &mut rng).unwrap();
        assert_eq!(sol.order(), &[0]);
    }
}
