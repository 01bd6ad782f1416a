//! Benchmarking module.
//!
//! Runs the annealing engine several times on one instance, each run with its
//! own seed, random stream and working/best state (the instance is shared
//! read-only), then aggregates the outcomes.

use crate::error::Result;
use crate::exact::BruteForceSolver;
use crate::heuristics::annealing::{AnnealingConfig, SimulatedAnnealing, StopReason};
use crate::instance::ProblemInstance;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Outcome of a single annealing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run: usize,
    pub seed: u64,
    pub initial_cost: i64,
    pub best_cost: i64,
    pub stages: usize,
    pub iterations: usize,
    pub accepted_moves: usize,
    pub stop_reason: StopReason,
    /// Computation time in seconds
    pub time: f64,
    /// Relative gap to the proven optimum, in percent (if known)
    pub gap_to_optimum: Option<f64>,
}

/// Aggregated statistics over all runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkStatistics {
    pub instance: String,
    pub runs: usize,
    pub best_cost: i64,
    pub worst_cost: i64,
    pub mean_cost: f64,
    pub median_cost: f64,
    pub std_cost: f64,
    pub mean_time: f64,
    pub optimum: Option<i64>,
    /// Runs that reached the optimum
    pub optimum_hits: Option<usize>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of independent runs
    pub num_runs: usize,
    /// Run `i` uses seed `base_seed + i`
    pub base_seed: u64,
    pub annealing: AnnealingConfig,
    /// Compare against brute force when the instance is small enough
    pub compare_exact: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            base_seed: 42,
            annealing: AnnealingConfig::default(),
            compare_exact: true,
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    instance_name: String,
    records: Vec<RunRecord>,
    optimum: Option<i64>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            instance_name: String::new(),
            records: Vec::new(),
            optimum: None,
        }
    }

    /// Run all configured runs, calling `on_run` after each one
    pub fn run<F: FnMut(&RunRecord)>(&mut self, instance: &ProblemInstance, mut on_run: F) -> Result<()> {
        log::info!("Running benchmark on instance: {}", instance.name);
        self.instance_name = instance.name.clone();
        self.records.clear();

        self.optimum = if self.config.compare_exact {
            let solver = BruteForceSolver::new();
            if instance.dimension <= solver.config.max_dimension {
                Some(solver.solve(instance)?.solution.cost())
            } else {
                None
            }
        } else {
            None
        };

        for run in 0..self.config.num_runs {
            let seed = self.config.base_seed.wrapping_add(run as u64);
            let config = AnnealingConfig {
                seed: Some(seed),
                ..self.config.annealing.clone()
            };

            let result = SimulatedAnnealing::new(instance, config)?.run()?;
            let gap_to_optimum = self.optimum.filter(|&opt| opt > 0).map(|opt| {
                (result.best.cost() - opt) as f64 / opt as f64 * 100.0
            });

            let record = RunRecord {
                run,
                seed,
                initial_cost: result.initial_cost,
                best_cost: result.best.cost(),
                stages: result.stages,
                iterations: result.iterations,
                accepted_moves: result.accepted_moves,
                stop_reason: result.stop_reason,
                time: result.elapsed_secs,
                gap_to_optimum,
            };
            on_run(&record);
            self.records.push(record);
        }

        Ok(())
    }

    /// Compute statistics over the recorded runs
    pub fn compute_statistics(&self) -> Option<BenchmarkStatistics> {
        if self.records.is_empty() {
            return None;
        }

        let costs: Vec<f64> = self.records.iter().map(|r| r.best_cost as f64).collect();
        let times: Vec<f64> = self.records.iter().map(|r| r.time).collect();
        let (mean_cost, median_cost, std_cost) = describe(&costs);
        let (mean_time, _, _) = describe(&times);

        let best_cost = self.records.iter().map(|r| r.best_cost).min().unwrap_or(0);
        let worst_cost = self.records.iter().map(|r| r.best_cost).max().unwrap_or(0);
        let optimum_hits = self
            .optimum
            .map(|opt| self.records.iter().filter(|r| r.best_cost == opt).count());

        Some(BenchmarkStatistics {
            instance: self.instance_name.clone(),
            runs: self.records.len(),
            best_cost,
            worst_cost,
            mean_cost,
            median_cost,
            std_cost,
            mean_time,
            optimum: self.optimum,
            optimum_hits,
        })
    }

    /// Cheapest run, the faster one on ties
    pub fn best_run(&self) -> Option<&RunRecord> {
        self.records
            .iter()
            .min_by_key(|r| (r.best_cost, OrderedFloat(r.time)))
    }

    /// Export run records to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for record in &self.records {
            writer.serialize(record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("      Simulated Annealing Benchmark\n");
        report.push_str("========================================\n\n");

        let Some(stats) = self.compute_statistics() else {
            report.push_str("No runs recorded.\n");
            return report;
        };

        report.push_str(&format!("Instance: {}\n", stats.instance));
        report.push_str(&format!("Runs: {}\n", stats.runs));
        report.push_str("-".repeat(60).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:>10} {:>10} {:>12} {:>12} {:>10}\n",
            "Best", "Worst", "Mean", "Median", "Std"
        ));
        report.push_str(&format!(
            "{:>10} {:>10} {:>12.2} {:>12.2} {:>10.2}\n",
            stats.best_cost, stats.worst_cost, stats.mean_cost, stats.median_cost, stats.std_cost
        ));
        report.push_str("-".repeat(60).as_str());
        report.push('\n');
        report.push_str(&format!("Mean time: {:.4}s\n", stats.mean_time));

        if let (Some(opt), Some(hits)) = (stats.optimum, stats.optimum_hits) {
            report.push_str(&format!("Optimum (brute force): {} reached in {}/{} runs\n", opt, hits, stats.runs));
        }
        if let Some(best) = self.best_run() {
            report.push_str(&format!("Best run: #{} (seed {}), cost {}\n", best.run, best.seed, best.best_cost));
        }

        report
    }

    /// Get all run records
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }
}

/// Mean, median and sample standard deviation
fn describe(values: &[f64]) -> (f64, f64, f64) {
    use statrs::statistics::{Data, Median, Statistics};

    let mean = values.iter().mean();
    let median = Data::new(values.to_vec()).median();
    let std = if values.len() > 1 { values.iter().std_dev() } else { 0.0 };
    (mean, median, std)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(num_runs: usize) -> BenchmarkConfig {
        BenchmarkConfig {
            num_runs,
            base_seed: 10,
            annealing: AnnealingConfig {
                initial_temperature: 50.0,
                final_temperature: 0.1,
                cooling_alpha: 0.8,
                max_accepted_per_round: 5,
                max_iterations_per_round: 20,
                ..Default::default()
            },
            compare_exact: true,
        }
    }

    fn create_test_instance() -> ProblemInstance {
        ProblemInstance::new(
            "bench",
            vec![
                vec![0, 2, 9, 10],
                vec![1, 0, 6, 4],
                vec![15, 7, 0, 8],
                vec![6, 3, 12, 0],
            ],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        )
        .unwrap()
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
    }

    #[test]
    fn test_runs_use_distinct_seeds() {
        let instance = create_test_instance();
        let mut benchmark = Benchmark::new(quick_config(3));
        let mut seen = Vec::new();
        benchmark.run(&instance, |r| seen.push(r.seed)).unwrap();

        assert_eq!(seen, vec![10, 11, 12]);
        assert_eq!(benchmark.records().len(), 3);
        for record in benchmark.records() {
            assert!(record.best_cost <= record.initial_cost);
            assert!(record.best_cost >= 21);
        }
    }

    #[test]
    fn test_statistics_and_report() {
        let instance = create_test_instance();
        let mut benchmark = Benchmark::new(quick_config(4));
        assert!(benchmark.compute_statistics().is_none());

        benchmark.run(&instance, |_| {}).unwrap();
        let stats = benchmark.compute_statistics().unwrap();
        assert_eq!(stats.runs, 4);
        assert_eq!(stats.optimum, Some(21));
        assert!(stats.best_cost <= stats.worst_cost);
        assert!(stats.mean_cost >= stats.best_cost as f64);
        assert!(stats.std_cost >= 0.0);

        let report = benchmark.generate_report();
        assert!(report.contains("bench"));
        assert!(report.contains("Optimum"));
    }

    #[test]
    fn test_describe() {
        let (mean, median, std) = describe(&[1.0, 2.0, 3.0, 4.0]);
        assert!((mean - 2.5).abs() < 1e-12);
        assert!((median - 2.5).abs() < 1e-12);
        assert!((std - 1.2909944487358056).abs() < 1e-9);

        let (mean, _, std) = describe(&[7.0]);
        assert_eq!(mean, 7.0);
        assert_eq!(std, 0.0);
    }
}
