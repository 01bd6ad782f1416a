//! Error types for the solver.

use thiserror::Error;

/// Main error type for loading instances and running the solvers
#[derive(Debug, Error)]
pub enum SolverError {
    /// The instance file is structurally broken (raised by the loader only)
    #[error("Malformed instance at line {line}: {message}")]
    MalformedInstance { line: usize, message: String },

    /// Distance matrix, demands and limits disagree on the number of locations
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// No feasible visiting order was found within the search bound
    #[error("Infeasible instance: {strategy} found no feasible order after {attempts} attempts")]
    InfeasibleInstance { strategy: &'static str, attempts: u64 },

    /// Annealing parameters out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A starting solution handed to the engine is not a feasible tour
    #[error("Invalid starting solution: {0}")]
    InvalidSolution(String),

    /// Brute force refused because the permutation space is too large
    #[error("Instance too large for exhaustive search: {dimension} locations (limit {limit})")]
    InstanceTooLarge { dimension: usize, limit: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Result type alias for solver operations
pub type Result<T> = std::result::Result<T, SolverError>;
