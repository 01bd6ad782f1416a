//! SA-TSP Solver - Command Line Interface
//!
//! Simulated annealing for the single-vehicle tour with per-location load limits.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use sa_tsp_solver::benchmark::{Benchmark, BenchmarkConfig};
use sa_tsp_solver::exact::{BruteForceConfig, BruteForceSolver};
use sa_tsp_solver::heuristics::annealing::{
    AnnealingConfig, InitialStrategy, RoundTermination, SearchTrace, SimulatedAnnealing,
};
use sa_tsp_solver::heuristics::construction::{ConstructionHeuristic, RandomRestartConstruction};
use sa_tsp_solver::instance::ProblemInstance;
use sa_tsp_solver::visualization::{export_trace_csv, TracePlotter};
use sa_tsp_solver::Result;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sa-tsp-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Simulated annealing for the TSP with per-location load limits")]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Annealing parameters that override the configuration file
#[derive(clap::Args, Clone)]
struct AnnealingArgs {
    /// JSON configuration file; missing fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Starting temperature
    #[arg(long)]
    initial_temperature: Option<f64>,

    /// Final temperature
    #[arg(long)]
    final_temperature: Option<f64>,

    /// Geometric cooling factor
    #[arg(long)]
    alpha: Option<f64>,

    /// Accepted moves per round
    #[arg(long)]
    max_accepted: Option<usize>,

    /// Sampled neighbors per round
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Inner rounds per temperature
    #[arg(long)]
    rounds: Option<usize>,

    /// Stop after a round without accepted moves
    #[arg(long)]
    converge: bool,

    /// Starting solution strategy
    #[arg(long, value_enum)]
    initial: Option<Initial>,

    /// Time limit in seconds
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// Maximum number of temperature stages
    #[arg(long)]
    max_stages: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance with simulated annealing
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        #[command(flatten)]
        annealing: AnnealingArgs,

        /// Random seed (drawn from entropy when omitted)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output result to JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export the search trace as CSV
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Plot the search trace (.svg or .png)
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Solve a small instance to optimality by enumeration
    Exact {
        #[arg(short, long)]
        instance: PathBuf,

        /// Largest instance accepted
        #[arg(long, default_value = "11")]
        max_dimension: usize,

        /// Output result to JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print instance statistics
    Analyze {
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Run the annealing engine several times with consecutive seeds
    Benchmark {
        #[arg(short, long)]
        instance: PathBuf,

        #[command(flatten)]
        annealing: AnnealingArgs,

        /// Number of runs
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Seed of the first run
        #[arg(long, default_value = "42")]
        base_seed: u64,

        /// Skip the brute-force comparison
        #[arg(long)]
        no_exact: bool,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Initial {
    RandomRestart,
    Exhaustive,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let outcome = match cli.command {
        Commands::Solve { instance, annealing, seed, output, trace, plot } => {
            solve_instance(&instance, &annealing, seed, output, trace, plot, cli.verbose)
        }

        Commands::Exact { instance, max_dimension, output } => {
            solve_exact(&instance, max_dimension, output)
        }

        Commands::Analyze { instance } => analyze_instance(&instance),

        Commands::Benchmark { instance, annealing, runs, base_seed, no_exact, output } => {
            run_benchmark(&instance, &annealing, runs, base_seed, !no_exact, output)
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_instance(path: &Path) -> Result<ProblemInstance> {
    println!("Loading instance from {:?}...", path);
    ProblemInstance::from_file(path)
}

fn build_config(args: &AnnealingArgs) -> Result<AnnealingConfig> {
    let mut config = match &args.config {
        Some(path) => AnnealingConfig::from_json_file(path)?,
        None => AnnealingConfig::default(),
    };

    if let Some(t) = args.initial_temperature {
        config.initial_temperature = t;
    }
    if let Some(t) = args.final_temperature {
        config.final_temperature = t;
    }
    if let Some(alpha) = args.alpha {
        config.cooling_alpha = alpha;
    }
    if let Some(n) = args.max_accepted {
        config.max_accepted_per_round = n;
    }
    if let Some(n) = args.max_iterations {
        config.max_iterations_per_round = n;
    }
    if let Some(n) = args.rounds {
        config.rounds_per_stage = n;
    }
    if args.converge {
        config.termination = RoundTermination::Converged;
    }
    match args.initial {
        Some(Initial::RandomRestart) if !matches!(config.initial, InitialStrategy::RandomRestart { .. }) => {
            config.initial = InitialStrategy::default();
        }
        Some(Initial::Exhaustive) if !matches!(config.initial, InitialStrategy::Exhaustive { .. }) => {
            config.initial = InitialStrategy::Exhaustive { max_permutations: None };
        }
        _ => {}
    }
    if args.time_limit.is_some() {
        config.time_limit = args.time_limit;
    }
    if args.max_stages.is_some() {
        config.max_stages = args.max_stages;
    }

    config.validate()?;
    Ok(config)
}

fn solve_instance(
    path: &Path,
    args: &AnnealingArgs,
    seed: Option<u64>,
    output: Option<PathBuf>,
    trace: Option<PathBuf>,
    plot: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let instance = load_instance(path)?;
    if verbose {
        println!("{}", instance.statistics());
    }

    let mut config = build_config(args)?;
    if seed.is_some() {
        config.seed = seed;
    }

    let mut engine = SimulatedAnnealing::new(&instance, config)?;
    let result = engine.run()?;

    println!("\n========== Results ==========");
    println!("Instance: {}", instance.name);
    println!("Initial cost: {}", result.initial_cost);
    println!("Best cost: {}", result.best.cost());
    println!("Tour: {}", result.best);
    println!("Stages: {}", result.stages);
    println!("Iterations: {}", result.iterations);
    println!("Accepted moves: {} ({} improving)", result.accepted_moves, result.improving_moves);
    println!("Final temperature: {:.6}", result.final_temperature);
    println!("Stop reason: {:?}", result.stop_reason);
    println!("Seed: {}", result.seed);
    println!("Time: {:.4}s", result.elapsed_secs);

    if verbose {
        println!("\nLoad profile: {:?}", result.best.load_profile(&instance));
        println!("Max load: {}", result.best.max_load(&instance));
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&out_path, json)?;
        println!("\nResult saved to {:?}", out_path);
    }

    if let Some(trace_path) = trace {
        export_trace_csv(&result.trace, &trace_path)?;
        println!("Trace saved to {:?}", trace_path);
    }

    if let Some(plot_path) = plot {
        save_plot(&instance.name, &result.trace, &plot_path)?;
    }

    Ok(())
}

fn save_plot(title: &str, trace: &SearchTrace, path: &Path) -> Result<()> {
    let plotter = TracePlotter::new();
    let svg = plotter.generate_svg(title, trace);

    let wants_png = path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("png"));
    if !wants_png {
        plotter.save_svg(&svg, path)?;
        println!("Plot saved to {:?}", path);
        return Ok(());
    }

    match plotter.save_png(&svg, path) {
        Ok(()) => println!("Plot saved to {:?}", path),
        Err(e) => {
            // fallback: write SVG if PNG conversion failed
            let svg_path = path.with_extension("svg");
            plotter.save_svg(&svg, &svg_path)?;
            log::warn!("PNG conversion failed ({}), saved SVG to {:?}", e, svg_path);
        }
    }
    Ok(())
}

fn solve_exact(path: &Path, max_dimension: usize, output: Option<PathBuf>) -> Result<()> {
    let instance = load_instance(path)?;

    let solver = BruteForceSolver::with_config(BruteForceConfig { max_dimension });
    let result = solver.solve(&instance)?;

    println!("\n========== Exact Results ==========");
    println!("Optimal cost: {}", result.solution.cost());
    println!("Tour: {}", result.solution);
    println!("Permutations: {} ({} feasible)", result.permutations, result.feasible_permutations);
    println!("Time: {:.4}s", result.computation_time);

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&out_path, json)?;
        println!("\nResult saved to {:?}", out_path);
    }

    Ok(())
}

fn analyze_instance(path: &Path) -> Result<()> {
    let instance = load_instance(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    println!("Load limits:");
    let load = instance.total_initial_load();
    for v in 1..instance.size() {
        let marker = if i64::from(instance.limit(v)) >= load { "open" } else { "blocked" };
        println!("  {:>4}: demand {:>6}, limit {:>6} ({} as first stop)", v, instance.demand(v), instance.limit(v), marker);
    }
    println!("  depot: limit {}, load on return {}", instance.limit(0), instance.demand(0));

    // Quick feasibility probe with a bounded number of restarts
    let probe = RandomRestartConstruction::with_max_attempts(10_000);
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    match probe.construct(&instance, &mut rng) {
        Ok(solution) => println!("\nFeasible order found: {} (cost {})", solution, solution.cost()),
        Err(e) => println!("\nNo feasible order found by {}: {}", probe.name(), e),
    }

    Ok(())
}

fn run_benchmark(
    path: &Path,
    args: &AnnealingArgs,
    runs: usize,
    base_seed: u64,
    compare_exact: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let instance = load_instance(path)?;

    let config = BenchmarkConfig {
        num_runs: runs,
        base_seed,
        annealing: build_config(args)?,
        compare_exact,
    };

    let pb = ProgressBar::new(runs as u64);
    if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}") {
        pb.set_style(style);
    }

    let mut benchmark = Benchmark::new(config);
    benchmark.run(&instance, |record| {
        pb.set_message(format!("seed {} -> {}", record.seed, record.best_cost));
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    println!("{}", benchmark.generate_report());

    if let Some(out_path) = output {
        benchmark.export_to_csv(&out_path)?;
        println!("Results saved to {:?}", out_path);
    }

    Ok(())
}
