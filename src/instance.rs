//! Module for parsing and representing problem instances.
//!
//! An instance is a complete directed graph given as an integer distance matrix,
//! together with a demand and a load limit for every location. Location 0 is the depot.
//! The vehicle leaves the depot carrying the sum of all demands and drops the
//! demand of each location it visits; a location can only be entered while the
//! load on board does not exceed that location's own limit.

use crate::error::{Result, SolverError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Index of the depot, the fixed start and end of every tour
pub const DEPOT: usize = 0;

/// Represents a complete problem instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemInstance {
    /// Name of the instance (file stem when loaded from disk)
    pub name: String,
    /// Number of locations (including depot)
    pub dimension: usize,
    /// Distance matrix, row-major, not required to be symmetric
    pub distance_matrix: Vec<Vec<i32>>,
    /// Load dropped at each location
    pub demands: Vec<i32>,
    /// Maximum load allowed on board when entering each location
    pub limits: Vec<i32>,
}

impl ProblemInstance {
    /// Build an instance, checking that all dimensions agree
    pub fn new(
        name: &str,
        distance_matrix: Vec<Vec<i32>>,
        demands: Vec<i32>,
        limits: Vec<i32>,
    ) -> Result<Self> {
        let dimension = distance_matrix.len();
        if dimension == 0 {
            return Err(SolverError::DimensionMismatch(
                "instance must contain at least the depot".to_string(),
            ));
        }
        if let Some((row, cols)) = distance_matrix
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != dimension)
            .map(|(i, r)| (i, r.len()))
        {
            return Err(SolverError::DimensionMismatch(format!(
                "distance row {} has {} entries, expected {}",
                row, cols, dimension
            )));
        }
        if demands.len() != dimension {
            return Err(SolverError::DimensionMismatch(format!(
                "{} demands for {} locations",
                demands.len(),
                dimension
            )));
        }
        if limits.len() != dimension {
            return Err(SolverError::DimensionMismatch(format!(
                "{} limits for {} locations",
                limits.len(),
                dimension
            )));
        }

        Ok(ProblemInstance {
            name: name.to_string(),
            dimension,
            distance_matrix,
            demands,
            limits,
        })
    }

    /// Parse an instance from a text file.
    ///
    /// Line 1 holds the size, the next `size` lines the distance matrix, and the
    /// last two non-blank lines the demands and the limits.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::parse(&name, &content)
    }

    /// Parse an instance from its textual representation
    pub fn parse(name: &str, content: &str) -> Result<Self> {
        let lines: Vec<&str> = content.lines().collect();

        let header = lines.first().map(|l| l.trim()).unwrap_or("");
        let dimension: usize = header.parse().map_err(|_| SolverError::MalformedInstance {
            line: 1,
            message: format!("invalid size '{}'", header),
        })?;
        if dimension == 0 {
            return Err(SolverError::MalformedInstance {
                line: 1,
                message: "size must be at least 1".to_string(),
            });
        }
        // Matrix rows, then demands and limits
        if lines.len() < dimension.saturating_add(3) {
            return Err(SolverError::MalformedInstance {
                line: 1,
                message: format!(
                    "size {} needs at least {} more lines, file has {}",
                    dimension,
                    dimension.saturating_add(2),
                    lines.len().saturating_sub(1)
                ),
            });
        }

        let mut distance_matrix = Vec::with_capacity(dimension);
        for row in 0..dimension {
            let line_no = row + 2;
            let line = lines.get(row + 1).ok_or_else(|| SolverError::MalformedInstance {
                line: line_no,
                message: format!("missing distance row {}", row),
            })?;
            let values = parse_row(line, line_no, dimension, "distance row")?;
            if let Some(&d) = values.iter().find(|&&d| d < 0) {
                return Err(SolverError::MalformedInstance {
                    line: line_no,
                    message: format!("negative distance {}", d),
                });
            }
            distance_matrix.push(values);
        }

        // Trailing blank lines are tolerated
        let mut end = lines.len();
        while end > dimension + 1 && lines[end - 1].trim().is_empty() {
            end -= 1;
        }
        if end < dimension + 3 {
            return Err(SolverError::MalformedInstance {
                line: end + 1,
                message: "missing demands and limits lines".to_string(),
            });
        }

        let demands_idx = end - 2;
        let limits_idx = end - 1;
        let demands = parse_row(lines[demands_idx], demands_idx + 1, dimension, "demands")?;
        let limits = parse_row(lines[limits_idx], limits_idx + 1, dimension, "limits")?;

        Self::new(name, distance_matrix, demands, limits)
    }

    /// Number of locations, depot included
    #[inline]
    pub fn size(&self) -> usize {
        self.dimension
    }

    /// Get the distance from `i` to `j`
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> i32 {
        self.distance_matrix[i][j]
    }

    #[inline]
    pub fn demand(&self, v: usize) -> i32 {
        self.demands[v]
    }

    #[inline]
    pub fn limit(&self, v: usize) -> i32 {
        self.limits[v]
    }

    /// Load on board when leaving the depot: the sum of all demands
    pub fn total_initial_load(&self) -> i64 {
        self.demands.iter().map(|&d| d as i64).sum()
    }

    /// Position of the first location entered with a load above its limit.
    ///
    /// The load starts at [`total_initial_load`](Self::total_initial_load) and every
    /// visited location removes its demand after the check.
    pub fn first_violation(&self, order: &[usize]) -> Option<usize> {
        let mut load = self.total_initial_load();

        for (pos, &v) in order.iter().enumerate() {
            if load > self.limit(v) as i64 {
                return Some(pos);
            }
            load -= self.demand(v) as i64;
        }

        None
    }

    /// Verify if a visiting order respects the load limits
    pub fn is_feasible(&self, order: &[usize]) -> bool {
        self.first_violation(order).is_none()
    }

    /// Total traveled distance of a visiting order.
    ///
    /// The depot is not stored at the front of `order`, so the first edge is
    /// `depot -> order[0]`; the closing edge back to the depot is the last pair
    /// since `order` ends with the depot.
    pub fn tour_cost(&self, order: &[usize]) -> i64 {
        let Some(&first) = order.first() else {
            return 0;
        };

        let mut total = self.distance(DEPOT, first) as i64;
        for pair in order.windows(2) {
            total += self.distance(pair[0], pair[1]) as i64;
        }

        total
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let mut distances: Vec<i64> = Vec::new();
        let mut symmetric = true;
        for i in 0..self.dimension {
            for j in 0..self.dimension {
                if i == j {
                    continue;
                }
                distances.push(self.distance(i, j) as i64);
                if self.distance(i, j) != self.distance(j, i) {
                    symmetric = false;
                }
            }
        }
        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<i64>() as f64 / distances.len() as f64
        };
        let max_distance = distances.iter().copied().max().unwrap_or(0);

        let total_initial_load = self.total_initial_load();
        let open_first_visits = (1..self.dimension)
            .filter(|&v| self.limit(v) as i64 >= total_initial_load)
            .count();

        InstanceStatistics {
            name: self.name.clone(),
            dimension: self.dimension,
            total_initial_load,
            min_limit: self.limits.iter().copied().min().unwrap_or(0),
            max_limit: self.limits.iter().copied().max().unwrap_or(0),
            open_first_visits,
            symmetric,
            avg_distance,
            max_distance,
        }
    }
}

impl FromStr for ProblemInstance {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse("unnamed", s)
    }
}

fn parse_row(line: &str, line_no: usize, expected: usize, what: &str) -> Result<Vec<i32>> {
    let values = line
        .split_whitespace()
        .map(|tok| {
            tok.parse::<i32>().map_err(|_| SolverError::MalformedInstance {
                line: line_no,
                message: format!("invalid integer '{}' in {}", tok, what),
            })
        })
        .collect::<Result<Vec<i32>>>()?;

    if values.len() != expected {
        return Err(SolverError::MalformedInstance {
            line: line_no,
            message: format!("expected {} values in {}, found {}", expected, what, values.len()),
        });
    }

    Ok(values)
}

/// Statistics about a problem instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub total_initial_load: i64,
    pub min_limit: i32,
    pub max_limit: i32,
    /// Customers whose limit admits the full initial load, i.e. valid first stops
    pub open_first_visits: usize,
    pub symmetric: bool,
    pub avg_distance: f64,
    pub max_distance: i64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Locations: {} (1 depot + {} customers)", self.dimension, self.dimension - 1)?;
        writeln!(f, "  Initial load: {}", self.total_initial_load)?;
        writeln!(f, "  Limits: {} .. {}", self.min_limit, self.max_limit)?;
        writeln!(f, "  Possible first stops: {}", self.open_first_visits)?;
        writeln!(f, "  Symmetric distances: {}", self.symmetric)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {}", self.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_instance() -> ProblemInstance {
        ProblemInstance::new(
            "line",
            vec![vec![0, 1, 2], vec![1, 0, 1], vec![2, 1, 0]],
            vec![0, 0, 0],
            vec![999, 999, 999],
        )
        .unwrap()
    }

    #[test]
    fn test_tour_cost_includes_depot_start_edge() {
        let instance = create_test_instance();
        assert_eq!(instance.tour_cost(&[1, 2, 0]), 4);
        assert_eq!(instance.tour_cost(&[2, 1, 0]), 4);
        // Re-evaluation has no hidden state
        assert_eq!(instance.tour_cost(&[1, 2, 0]), instance.tour_cost(&[1, 2, 0]));
    }

    #[test]
    fn test_tour_cost_asymmetric() {
        let instance = ProblemInstance::new(
            "asym",
            vec![vec![0, 5, 7], vec![1, 0, 3], vec![2, 9, 0]],
            vec![0, 0, 0],
            vec![0, 0, 0],
        )
        .unwrap();
        // 0->1 (5) + 1->2 (3) + 2->0 (2)
        assert_eq!(instance.tour_cost(&[1, 2, 0]), 10);
        // 0->2 (7) + 2->1 (9) + 1->0 (1)
        assert_eq!(instance.tour_cost(&[2, 1, 0]), 17);
    }

    #[test]
    fn test_tour_cost_widens_to_i64() {
        let big = i32::MAX;
        let instance = ProblemInstance::new(
            "big",
            vec![vec![0, big, big], vec![big, 0, big], vec![big, big, 0]],
            vec![0, 0, 0],
            vec![0, 0, 0],
        )
        .unwrap();
        assert_eq!(instance.tour_cost(&[1, 2, 0]), 3 * big as i64);
    }

    #[test]
    fn test_feasibility_uses_own_limit() {
        // Total load 10; location 1 only admits 5, location 2 admits 10
        let instance = ProblemInstance::new(
            "limits",
            vec![vec![0; 3]; 3],
            vec![0, 5, 5],
            vec![0, 5, 10],
        )
        .unwrap();
        assert_eq!(instance.total_initial_load(), 10);
        assert!(!instance.is_feasible(&[1, 2, 0]));
        assert_eq!(instance.first_violation(&[1, 2, 0]), Some(0));
        assert!(instance.is_feasible(&[2, 1, 0]));
    }

    #[test]
    fn test_feasibility_checks_depot_at_end() {
        let instance = ProblemInstance::new(
            "depot",
            vec![vec![0; 2]; 2],
            vec![-3, 3],
            vec![-1, 0],
        )
        .unwrap();
        // Load 0 enters 1 (limit 0), drops to -3, then enters depot with limit -1
        assert!(instance.is_feasible(&[1, 0]));

        let strict = ProblemInstance::new("depot", vec![vec![0; 2]; 2], vec![-3, 3], vec![-4, 0]).unwrap();
        assert_eq!(strict.first_violation(&[1, 0]), Some(1));
    }

    #[test]
    fn test_new_rejects_dimension_mismatch() {
        let err = ProblemInstance::new("bad", vec![vec![0, 1], vec![1, 0]], vec![0], vec![0, 0]);
        assert!(matches!(err, Err(SolverError::DimensionMismatch(_))));

        let err = ProblemInstance::new("bad", vec![vec![0, 1], vec![1]], vec![0, 0], vec![0, 0]);
        assert!(matches!(err, Err(SolverError::DimensionMismatch(_))));

        let err = ProblemInstance::new("bad", vec![], vec![], vec![]);
        assert!(matches!(err, Err(SolverError::DimensionMismatch(_))));
    }

    #[test]
    fn test_parse_instance() {
        let text = "3\n0 1 2\n1 0 1\n2 1 0\n0 4 6\n10 10 4\n\n";
        let instance: ProblemInstance = text.parse().unwrap();
        assert_eq!(instance.size(), 3);
        assert_eq!(instance.distance(0, 2), 2);
        assert_eq!(instance.demands, vec![0, 4, 6]);
        assert_eq!(instance.limits, vec![10, 10, 4]);
        assert_eq!(instance.total_initial_load(), 10);
    }

    #[test]
    fn test_parse_skips_lines_between_matrix_and_demands() {
        let text = "2\n0  3\n3 0\n\nsome note\n1 1\n5 5\n";
        let instance = ProblemInstance::parse("gap", text).unwrap();
        assert_eq!(instance.demands, vec![1, 1]);
        assert_eq!(instance.limits, vec![5, 5]);
        assert_eq!(instance.name, "gap");
    }

    #[test]
    fn test_parse_reports_offending_line() {
        let short_row = "3\n0 1 2\n1 0\n2 1 0\n0 0 0\n9 9 9\n";
        match ProblemInstance::parse("x", short_row) {
            Err(SolverError::MalformedInstance { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {:?}", other),
        }

        let bad_token = "2\n0 1\n1 0\n0 x\n9 9\n";
        match ProblemInstance::parse("x", bad_token) {
            Err(SolverError::MalformedInstance { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected {:?}", other),
        }

        let bad_limits = "2\n0 1\n1 0\n0 0\n9 9 9\n";
        match ProblemInstance::parse("x", bad_limits) {
            Err(SolverError::MalformedInstance { line, .. }) => assert_eq!(line, 5),
            other => panic!("unexpected {:?}", other),
        }

        match ProblemInstance::parse("x", "abc\n") {
            Err(SolverError::MalformedInstance { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected {:?}", other),
        }

        let truncated = "2\n0 1\n1 0\n";
        assert!(matches!(
            ProblemInstance::parse("x", truncated),
            Err(SolverError::MalformedInstance { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_size_larger_than_file() {
        match ProblemInstance::parse("x", "99999999999999999\n0\n") {
            Err(SolverError::MalformedInstance { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected {:?}", other),
        }

        let header_too_big = format!("{}\n0\n0\n0\n", usize::MAX);
        assert!(matches!(
            ProblemInstance::parse("x", &header_too_big),
            Err(SolverError::MalformedInstance { line: 1, .. })
        ));
    }

    #[test]
    fn test_statistics() {
        let instance = create_test_instance();
        let stats = instance.statistics();
        assert_eq!(stats.dimension, 3);
        assert!(stats.symmetric);
        assert_eq!(stats.max_distance, 2);
        assert_eq!(stats.open_first_visits, 2);
        assert!(stats.to_string().contains("line"));
    }
}
