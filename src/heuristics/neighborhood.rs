//! Pairwise-exchange neighborhood.
//!
//! A neighbor is obtained by swapping the locations at two positions of the
//! order. The depot never moves, and only orders accepted by the feasibility
//! check are part of the neighborhood. Building the full neighborhood costs
//! O(n^2) swaps times an O(n) check, which dominates the annealing run time.

use crate::instance::{ProblemInstance, DEPOT};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

/// Swap neighborhood restricted to orders within the load limits
pub struct SwapNeighborhood<'a> {
    instance: &'a ProblemInstance,
}

impl<'a> SwapNeighborhood<'a> {
    pub fn new(instance: &'a ProblemInstance) -> Self {
        SwapNeighborhood { instance }
    }

    /// All distinct feasible orders one exchange away from `order`
    pub fn neighbors(&self, order: &[usize]) -> Vec<Vec<usize>> {
        let n = order.len();
        let mut neighbors = Vec::new();

        for i in 0..n {
            for j in i + 1..n {
                // Don't swap depot
                if order[i] == DEPOT || order[j] == DEPOT {
                    continue;
                }

                let mut candidate = order.to_vec();
                candidate.swap(i, j);

                if candidate.as_slice() == order {
                    continue;
                }
                if self.instance.is_feasible(&candidate) {
                    neighbors.push(candidate);
                }
            }
        }

        neighbors
    }

    /// One neighbor of `order` drawn uniformly among those not in `excluding`.
    ///
    /// `None` means the order has no move left to offer.
    pub fn neighbor(
        &self,
        order: &[usize],
        excluding: &HashSet<Vec<usize>>,
        rng: &mut ChaCha8Rng,
    ) -> Option<Vec<usize>> {
        let neighbors = self.neighbors(order);
        Self::sample(&neighbors, excluding, rng).cloned()
    }

    /// Draw uniformly from an already generated neighborhood, skipping excluded orders
    pub fn sample<'n>(
        neighbors: &'n [Vec<usize>],
        excluding: &HashSet<Vec<usize>>,
        rng: &mut ChaCha8Rng,
    ) -> Option<&'n Vec<usize>> {
        if neighbors.is_empty() {
            return None;
        }

        // Cheap rejection while collisions are rare
        for _ in 0..neighbors.len() {
            let candidate = &neighbors[rng.gen_range(0..neighbors.len())];
            if !excluding.contains(candidate) {
                return Some(candidate);
            }
        }

        let remaining: Vec<&Vec<usize>> = neighbors
            .iter()
            .filter(|candidate| !excluding.contains(*candidate))
            .collect();
        remaining.choose(rng).copied()
    }
}
