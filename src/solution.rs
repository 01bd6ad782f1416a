//! Solution representation for the load-limited TSP.
//!
//! A solution is a visiting order (every customer once, then the depot) with its
//! cached travel cost. Solutions are values: moves build a new solution instead
//! of patching an existing one, so the cost can never drift from the order.

use crate::instance::{ProblemInstance, DEPOT};
use serde::Serialize;

/// Represents a solution: a closed tour and its total traveled distance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    /// Visiting order; the depot start is implicit and the depot closes the tour
    order: Vec<usize>,
    /// Total traveled distance of `order`
    cost: i64,
}

impl Solution {
    /// Create a solution from a visiting order, evaluating its cost
    pub fn from_order(instance: &ProblemInstance, order: Vec<usize>) -> Self {
        let cost = instance.tour_cost(&order);
        Solution { order, cost }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn cost(&self) -> i64 {
        self.cost
    }

    /// Check that the order visits every customer exactly once and ends at the depot
    pub fn is_complete(&self, instance: &ProblemInstance) -> bool {
        is_tour(&self.order, instance.dimension)
    }

    /// Verify the load-limit rule for this order
    pub fn is_feasible(&self, instance: &ProblemInstance) -> bool {
        instance.is_feasible(&self.order)
    }

    /// Load on board when leaving the depot and after each visit
    pub fn load_profile(&self, instance: &ProblemInstance) -> Vec<i64> {
        let mut load = instance.total_initial_load();
        let mut profile = Vec::with_capacity(self.order.len() + 1);
        profile.push(load);

        for &node in &self.order {
            load -= instance.demand(node) as i64;
            profile.push(load);
        }

        profile
    }

    /// Get maximum load during tour
    pub fn max_load(&self, instance: &ProblemInstance) -> i64 {
        self.load_profile(instance).into_iter().max().unwrap_or(0)
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution")?;
        writeln!(f, "  Cost: {}", self.cost)?;
        writeln!(f, "  Tour: {:?}", self.order)
    }
}

/// True when `order` is a permutation of `1..dimension` followed by the depot
pub fn is_tour(order: &[usize], dimension: usize) -> bool {
    if order.len() != dimension || order.last() != Some(&DEPOT) {
        return false;
    }

    let mut seen = vec![false; dimension];
    for &node in order {
        if node >= dimension || seen[node] {
            return false;
        }
        seen[node] = true;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_instance() -> ProblemInstance {
        ProblemInstance::new(
            "test",
            vec![
                vec![0, 2, 9, 10],
                vec![1, 0, 6, 4],
                vec![15, 7, 0, 8],
                vec![6, 3, 12, 0],
            ],
            vec![0, 2, 3, 1],
            vec![10, 6, 6, 6],
        )
        .unwrap()
    }

    #[test]
    fn test_solution_creation() {
        let instance = create_test_instance();
        let sol = Solution::from_order(&instance, vec![1, 3, 2, 0]);
        // 0->1 (2) + 1->3 (4) + 3->2 (12) + 2->0 (15)
        assert_eq!(sol.cost(), 33);
        assert!(sol.is_complete(&instance));
    }

    #[test]
    fn test_is_tour() {
        assert!(is_tour(&[2, 1, 3, 0], 4));
        assert!(is_tour(&[0], 1));
        assert!(!is_tour(&[0, 1, 2, 3], 4));
        assert!(!is_tour(&[1, 1, 3, 0], 4));
        assert!(!is_tour(&[1, 2, 0], 4));
        assert!(!is_tour(&[1, 2, 7, 0], 4));
    }

    #[test]
    fn test_load_profile() {
        let instance = create_test_instance();
        let sol = Solution::from_order(&instance, vec![1, 3, 2, 0]);
        assert_eq!(sol.load_profile(&instance), vec![6, 4, 3, 0, 0]);
        assert_eq!(sol.max_load(&instance), 6);
        assert!(sol.is_feasible(&instance));
    }
}
