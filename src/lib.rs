//! SA-TSP Solver Library
//!
//! Simulated annealing for a single-vehicle tour with per-location load limits:
//! the vehicle leaves the depot carrying every customer's demand, unloads at
//! each stop and must never arrive somewhere carrying more than that
//! location's limit.
//!
//! # Features
//!
//! - Instance loader for the plain-text matrix format
//! - Random-restart and exhaustive starting solutions
//! - Simulated annealing over pairwise swaps with a recorded search trace
//! - Brute-force optimum for small instances
//! - Benchmarking and trace plotting tools
//!
//! # Example
//!
//! ```no_run
//! use sa_tsp_solver::instance::ProblemInstance;
//! use sa_tsp_solver::heuristics::annealing::{AnnealingConfig, SimulatedAnnealing};
//!
//! let instance = ProblemInstance::from_file("instance.txt").unwrap();
//! let config = AnnealingConfig { seed: Some(42), ..Default::default() };
//! let result = SimulatedAnnealing::new(&instance, config).unwrap().run().unwrap();
//!
//! println!("Solution cost: {}", result.best.cost());
//! ```

pub mod error;
pub mod instance;
pub mod solution;
pub mod heuristics;
pub mod exact;
pub mod benchmark;
pub mod visualization;

pub use error::{Result, SolverError};
pub use instance::ProblemInstance;
pub use solution::Solution;
