//! Simulated annealing over the pairwise-exchange neighborhood.
//!
//! The search runs two nested loops. Each outer stage holds the temperature
//! fixed and runs inner rounds; a round samples feasible neighbors of the
//! working solution (never retrying one already tried in the same round) and
//! moves to a neighbor whenever the Metropolis test accepts it. The round ends
//! when the iteration cap or the accepted-move cap is hit, or when no untried
//! neighbor is left. After each stage the temperature is multiplied by `alpha`;
//! the run stops once it falls below the final temperature.

use crate::error::{Result, SolverError};
use crate::heuristics::construction::{
    ConstructionHeuristic, ExhaustiveConstruction, RandomRestartConstruction,
};
use crate::heuristics::neighborhood::SwapNeighborhood;
use crate::instance::ProblemInstance;
use crate::solution::Solution;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

/// Metropolis acceptance test.
///
/// Improving and equal moves are always taken without consuming randomness.
/// A worsening move of `delta` is taken when `exp(-delta / T)` beats a uniform
/// draw from `[0, 1)`.
///
/// # Panics
///
/// Panics if a worsening move is tested at a non-positive temperature.
pub fn metropolis_accept(
    current_cost: i64,
    candidate_cost: i64,
    temperature: f64,
    rng: &mut ChaCha8Rng,
) -> bool {
    let delta = candidate_cost - current_cost;
    if delta <= 0 {
        return true;
    }

    assert!(
        temperature > 0.0,
        "Metropolis test evaluated at non-positive temperature {}",
        temperature
    );
    let u: f64 = rng.gen();
    (-(delta as f64) / temperature).exp() > u
}

/// Geometric cooling: `T <- alpha * T` after every stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoolingSchedule {
    temperature: f64,
    initial: f64,
    final_temperature: f64,
    alpha: f64,
}

impl CoolingSchedule {
    pub fn new(initial: f64, final_temperature: f64, alpha: f64) -> Result<Self> {
        if !(initial.is_finite() && initial > 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "initial temperature must be positive, got {}",
                initial
            )));
        }
        if !(final_temperature > 0.0 && final_temperature < initial) {
            return Err(SolverError::InvalidConfig(format!(
                "final temperature must lie in (0, {}), got {}",
                initial, final_temperature
            )));
        }
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(SolverError::InvalidConfig(format!(
                "cooling alpha must lie in (0, 1), got {}",
                alpha
            )));
        }

        Ok(CoolingSchedule {
            temperature: initial,
            initial,
            final_temperature,
            alpha,
        })
    }

    #[inline]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Cool down by one stage and return the new temperature
    pub fn advance(&mut self) -> f64 {
        self.temperature *= self.alpha;
        self.temperature
    }

    /// The outer loop stops once the temperature drops below the final one
    pub fn is_frozen(&self) -> bool {
        self.temperature < self.final_temperature
    }

    /// Number of stages run from `initial` until frozen
    pub fn stage_bound(&self) -> usize {
        let ratio = (self.final_temperature / self.initial).ln() / self.alpha.ln();
        ratio.floor() as usize + 1
    }
}

/// When an inner round is considered the end of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundTermination {
    /// Rounds end on their caps only; cooling decides when the run stops
    Capped,
    /// A round without any accepted move also ends the run
    Converged,
}

/// How the starting solution is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum InitialStrategy {
    RandomRestart { max_attempts: u64 },
    Exhaustive { max_permutations: Option<u64> },
}

impl InitialStrategy {
    fn heuristic(&self) -> Box<dyn ConstructionHeuristic> {
        match *self {
            InitialStrategy::RandomRestart { max_attempts } => {
                Box::new(RandomRestartConstruction::with_max_attempts(max_attempts))
            }
            InitialStrategy::Exhaustive { max_permutations } => {
                Box::new(ExhaustiveConstruction { max_permutations })
            }
        }
    }
}

impl Default for InitialStrategy {
    fn default() -> Self {
        InitialStrategy::RandomRestart {
            max_attempts: 100_000,
        }
    }
}

/// Simulated annealing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    /// Starting temperature
    pub initial_temperature: f64,
    /// Stop once the temperature falls below this value
    pub final_temperature: f64,
    /// Geometric decay applied after every stage
    pub cooling_alpha: f64,
    /// Accepted moves after which a round ends
    pub max_accepted_per_round: usize,
    /// Sampled neighbors after which a round ends
    pub max_iterations_per_round: usize,
    /// Inner rounds run at each temperature
    pub rounds_per_stage: usize,
    pub termination: RoundTermination,
    pub initial: InitialStrategy,
    /// Random seed (drawn from entropy when absent)
    pub seed: Option<u64>,
    /// Wall-clock budget in seconds
    pub time_limit: Option<f64>,
    /// Maximum number of temperature stages
    pub max_stages: Option<usize>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        AnnealingConfig {
            initial_temperature: 40.0,
            final_temperature: 0.001,
            cooling_alpha: 0.99,
            max_accepted_per_round: 50,
            max_iterations_per_round: 175,
            rounds_per_stage: 1,
            termination: RoundTermination::Capped,
            initial: InitialStrategy::default(),
            seed: None,
            time_limit: None,
            max_stages: None,
        }
    }
}

impl AnnealingConfig {
    /// Load a (possibly partial) JSON configuration; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AnnealingConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        CoolingSchedule::new(
            self.initial_temperature,
            self.final_temperature,
            self.cooling_alpha,
        )?;

        if self.max_accepted_per_round == 0 {
            return Err(SolverError::InvalidConfig(
                "max_accepted_per_round must be positive".to_string(),
            ));
        }
        if self.max_iterations_per_round == 0 {
            return Err(SolverError::InvalidConfig(
                "max_iterations_per_round must be positive".to_string(),
            ));
        }
        if self.rounds_per_stage == 0 {
            return Err(SolverError::InvalidConfig(
                "rounds_per_stage must be positive".to_string(),
            ));
        }
        self.time_budget()?;

        Ok(())
    }

    /// Wall-clock budget as a `Duration`; negative, NaN or out-of-range limits are rejected
    pub fn time_budget(&self) -> Result<Option<Duration>> {
        self.time_limit
            .map(|limit| {
                Duration::try_from_secs_f64(limit).map_err(|_| {
                    SolverError::InvalidConfig(format!(
                        "time limit must be a representable non-negative number of seconds, got {}",
                        limit
                    ))
                })
            })
            .transpose()
    }
}

/// One (temperature, objective) observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceSample {
    pub temperature: f64,
    pub cost: i64,
}

/// Append-only record of the search, for reporting only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchTrace {
    /// Best cost of each stage
    stages: Vec<TraceSample>,
    /// Working cost at the end of each inner round
    rounds: Vec<TraceSample>,
}

impl SearchTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a trace from previously exported samples
    pub fn from_samples(stages: Vec<TraceSample>, rounds: Vec<TraceSample>) -> Self {
        SearchTrace { stages, rounds }
    }

    pub fn record_stage(&mut self, temperature: f64, cost: i64) {
        self.stages.push(TraceSample { temperature, cost });
    }

    pub fn record_round(&mut self, temperature: f64, cost: i64) {
        self.rounds.push(TraceSample { temperature, cost });
    }

    pub fn stages(&self) -> &[TraceSample] {
        &self.stages
    }

    pub fn rounds(&self) -> &[TraceSample] {
        &self.rounds
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty() && self.rounds.is_empty()
    }
}

/// Why the outer loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Temperature fell below the final temperature
    Frozen,
    /// A round accepted no move (stricter termination only)
    Converged,
    TimeLimit,
    StageLimit,
}

/// Result of a simulated annealing run
#[derive(Debug, Clone, Serialize)]
pub struct AnnealingResult {
    /// Cheapest stage solution of the run
    pub best: Solution,
    pub initial_cost: i64,
    pub trace: SearchTrace,
    pub stages: usize,
    /// Total number of sampled neighbors
    pub iterations: usize,
    pub accepted_moves: usize,
    pub improving_moves: usize,
    pub final_temperature: f64,
    pub stop_reason: StopReason,
    /// Seed the run was drawn from; replaying it gives the same result
    pub seed: u64,
    pub elapsed_secs: f64,
}

struct RoundOutcome {
    working: Solution,
    best: Solution,
    iterations: usize,
    accepted: usize,
    improving: usize,
}

/// Simulated Annealing
///
/// Owns the random stream of a run: it is seeded once at construction and
/// threaded through construction, sampling and acceptance.
pub struct SimulatedAnnealing<'a> {
    instance: &'a ProblemInstance,
    config: AnnealingConfig,
    neighborhood: SwapNeighborhood<'a>,
    rng: ChaCha8Rng,
    seed: u64,
}

impl<'a> SimulatedAnnealing<'a> {
    pub fn new(instance: &'a ProblemInstance, config: AnnealingConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random::<u64>);

        Ok(SimulatedAnnealing {
            instance,
            neighborhood: SwapNeighborhood::new(instance),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            config,
        })
    }

    /// Build a starting solution with the configured strategy, then anneal it
    pub fn run(&mut self) -> Result<AnnealingResult> {
        let heuristic = self.config.initial.heuristic();
        let initial = heuristic.construct(self.instance, &mut self.rng)?;
        log::info!(
            "{} start on {}: cost {}",
            heuristic.name(),
            self.instance.name,
            initial.cost()
        );
        self.improve(initial)
    }

    /// Anneal from a given feasible starting solution
    pub fn improve(&mut self, initial: Solution) -> Result<AnnealingResult> {
        if !initial.is_complete(self.instance) {
            return Err(SolverError::InvalidSolution(format!(
                "{:?} is not a tour of {} locations",
                initial.order(),
                self.instance.dimension
            )));
        }
        if !initial.is_feasible(self.instance) {
            return Err(SolverError::InvalidSolution(format!(
                "{:?} violates the load limits",
                initial.order()
            )));
        }

        let start = Instant::now();
        let time_limit = self.config.time_budget()?;
        let mut schedule = CoolingSchedule::new(
            self.config.initial_temperature,
            self.config.final_temperature,
            self.config.cooling_alpha,
        )?;

        log::info!(
            "Annealing {} (n={}) from T={} to T={} (alpha={}, seed={}, up to {} stages)",
            self.instance.name,
            self.instance.dimension,
            self.config.initial_temperature,
            self.config.final_temperature,
            self.config.cooling_alpha,
            self.seed,
            schedule.stage_bound()
        );

        let initial_cost = initial.cost();
        let mut working = initial.clone();
        let mut best = initial;
        let mut trace = SearchTrace::new();
        let mut stage_solutions: Vec<Solution> = Vec::new();
        let mut iterations = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;

        let stop_reason = loop {
            if schedule.is_frozen() {
                break StopReason::Frozen;
            }
            if time_limit.is_some_and(|limit| start.elapsed() >= limit) {
                log::info!("Time limit reached after {} stages", stage_solutions.len());
                break StopReason::TimeLimit;
            }
            if self.config.max_stages.is_some_and(|max| stage_solutions.len() >= max) {
                log::info!("Stage limit reached");
                break StopReason::StageLimit;
            }

            let temperature = schedule.temperature();
            let mut stage_best = working.clone();
            let mut stage_accepted = 0usize;
            let mut converged = false;

            for _ in 0..self.config.rounds_per_stage {
                let round = self.inner_round(working, temperature);
                iterations += round.iterations;
                accepted_moves += round.accepted;
                improving_moves += round.improving;
                stage_accepted += round.accepted;

                trace.record_round(temperature, round.working.cost());
                if round.best.cost() < stage_best.cost() {
                    stage_best = round.best;
                }
                working = round.working;

                if round.accepted == 0 && self.config.termination == RoundTermination::Converged {
                    converged = true;
                    break;
                }
            }

            trace.record_stage(temperature, stage_best.cost());
            if stage_best.cost() < best.cost() {
                best = stage_best.clone();
            }
            log::debug!(
                "Stage {}: T={:.6} stage best={} working={} best={} accepted={}",
                stage_solutions.len() + 1,
                temperature,
                stage_best.cost(),
                working.cost(),
                best.cost(),
                stage_accepted
            );

            schedule.advance();
            stage_solutions.push(stage_best);

            if converged {
                log::info!("No move accepted at T={:.6}, stopping", temperature);
                break StopReason::Converged;
            }
        };

        let stages = stage_solutions.len();
        let final_best = stage_solutions
            .into_iter()
            .min_by_key(|s| s.cost())
            .unwrap_or_else(|| best.clone());
        debug_assert_eq!(final_best.cost(), best.cost());

        let elapsed = start.elapsed().as_secs_f64();
        log::info!(
            "Annealing finished ({:?}): cost {} -> {} in {} stages, {:.3}s",
            stop_reason,
            initial_cost,
            final_best.cost(),
            stages,
            elapsed
        );

        Ok(AnnealingResult {
            best: final_best,
            initial_cost,
            trace,
            stages,
            iterations,
            accepted_moves,
            improving_moves,
            final_temperature: schedule.temperature(),
            stop_reason,
            seed: self.seed,
            elapsed_secs: elapsed,
        })
    }

    /// One Metropolis round at a fixed temperature
    fn inner_round(&mut self, start: Solution, temperature: f64) -> RoundOutcome {
        let mut working = start;
        let mut best = working.clone();
        let mut neighbors = self.neighborhood.neighbors(working.order());
        let mut tried: HashSet<Vec<usize>> = HashSet::new();
        let mut iterations = 0;
        let mut accepted = 0;
        let mut improving = 0;

        while iterations < self.config.max_iterations_per_round
            && accepted < self.config.max_accepted_per_round
        {
            let Some(candidate) = SwapNeighborhood::sample(&neighbors, &tried, &mut self.rng) else {
                // Empty or fully tried neighborhood ends the round
                break;
            };
            let candidate = candidate.clone();
            iterations += 1;
            tried.insert(candidate.clone());

            let candidate_cost = self.instance.tour_cost(&candidate);
            if metropolis_accept(working.cost(), candidate_cost, temperature, &mut self.rng) {
                if candidate_cost < working.cost() {
                    improving += 1;
                }
                accepted += 1;
                neighbors = self.neighborhood.neighbors(&candidate);
                working = Solution::from_order(self.instance, candidate);

                if working.cost() < best.cost() {
                    best = working.clone();
                }
            }
        }

        RoundOutcome {
            working,
            best,
            iterations,
            accepted,
            improving,
        }
    }
}
