//! Heuristics module.
//!
//! Starting-solution construction, the pairwise-exchange neighborhood and the
//! simulated annealing engine built on top of them.

pub mod permutation;
pub mod construction;
pub mod neighborhood;
pub mod annealing;

pub use construction::*;
pub use neighborhood::SwapNeighborhood;
pub use annealing::*;
