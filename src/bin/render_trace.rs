use sa_tsp_solver::visualization::{load_trace_csv, TracePlotter};
use std::path::PathBuf;

/// Re-render saved trace CSVs: `render_trace <trace.csv>... [--log]`
fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let log_temperature = args.iter().any(|a| a == "--log");
    let inputs: Vec<PathBuf> = args.iter().filter(|a| !a.starts_with("--")).map(PathBuf::from).collect();

    if inputs.is_empty() {
        eprintln!("usage: render_trace <trace.csv>... [--log]");
        std::process::exit(1);
    }

    let plotter = TracePlotter { log_temperature, ..Default::default() };
    let mut failures = 0;

    for path in &inputs {
        let trace = match load_trace_csv(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Failed to read {:?}: {}", path, e);
                failures += 1;
                continue;
            }
        };

        let title = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        let svg = plotter.generate_svg(&title, &trace);
        let out = path.with_extension("png");
        match plotter.save_png(&svg, &out) {
            Ok(()) => println!("Rendered {:?} -> {:?}", path, out),
            Err(e) => {
                let svg_out = path.with_extension("svg");
                match plotter.save_svg(&svg, &svg_out) {
                    Ok(()) => println!("Rendered {:?} -> {:?} (PNG failed: {})", path, svg_out, e),
                    Err(e) => {
                        eprintln!("Failed to write {:?}: {}", svg_out, e);
                        failures += 1;
                    }
                }
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}
