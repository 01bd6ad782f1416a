//! Visualization utilities for annealing runs.
//!
//! Renders the objective-versus-temperature curve of a [`SearchTrace`] as SVG
//! (optionally rasterised to PNG) and moves traces to and from CSV.

use crate::error::Result;
use crate::heuristics::annealing::{SearchTrace, TraceSample};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::Command;
#[cfg(feature = "png")]
use resvg::usvg;
#[cfg(feature = "png")]
use resvg::render;
#[cfg(feature = "png")]
use resvg::FitTo;
#[cfg(feature = "png")]
use resvg::tiny_skia::{Pixmap, Transform};
#[cfg(feature = "png")]
use resvg::usvg::TreeParsing;

/// SVG plot generator for search traces
pub struct TracePlotter {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Plot temperatures on a log10 axis
    pub log_temperature: bool,
}

impl Default for TracePlotter {
    fn default() -> Self {
        TracePlotter {
            width: 1000.0,
            height: 400.0,
            margin: 60.0,
            log_temperature: false,
        }
    }
}

impl TracePlotter {
    pub fn new() -> Self {
        Self::default()
    }

    fn x_value(&self, temperature: f64) -> f64 {
        if self.log_temperature {
            temperature.max(f64::MIN_POSITIVE).log10()
        } else {
            temperature
        }
    }

    /// Generate the objective value x temperature plot.
    ///
    /// Round-end costs are drawn in blue, stage bests in a thicker red line.
    pub fn generate_svg(&self, title: &str, trace: &SearchTrace) -> String {
        let mut svg = String::new();

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .stage {{ stroke: #ff0000; stroke-width: 3; fill: none; }}
    .round {{ stroke: #0000ff; stroke-width: 1.5; fill: none; }}
    .grid {{ stroke: #bdc3c7; stroke-width: 1; stroke-dasharray: 3,3; }}
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .label {{ font-family: Arial; font-size: 12px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ffffff"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r#"<text x="{}" y="25" class="title">{} | Objective Value x Temperature (red: stage best, blue: round end)</text>
"#,
            self.margin,
            escape(title)
        ));

        let samples: Vec<&TraceSample> = trace.stages().iter().chain(trace.rounds()).collect();
        if samples.is_empty() {
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" class="label">empty trace</text>
"#,
                self.margin,
                self.height / 2.0
            ));
            svg.push_str("</svg>");
            return svg;
        }

        let x_min = samples.iter().map(|s| OrderedFloat(self.x_value(s.temperature))).min().map_or(0.0, |v| v.0);
        let x_max = samples.iter().map(|s| OrderedFloat(self.x_value(s.temperature))).max().map_or(1.0, |v| v.0);
        let y_min = samples.iter().map(|s| s.cost).min().unwrap_or(0) as f64;
        let y_max = samples.iter().map(|s| s.cost).max().unwrap_or(1) as f64;

        let plot_width = self.width - 2.0 * self.margin;
        let plot_height = self.height - 2.0 * self.margin;
        let x_scale = plot_width / (x_max - x_min).max(1e-9);
        let y_scale = plot_height / (y_max - y_min).max(1.0);
        let bottom = self.height - self.margin;

        let project = |s: &TraceSample| -> (f64, f64) {
            (
                self.margin + (self.x_value(s.temperature) - x_min) * x_scale,
                bottom - (s.cost as f64 - y_min) * y_scale,
            )
        };

        // Grid and axes
        for k in 0..=4 {
            let y = self.margin + plot_height * k as f64 / 4.0;
            let value = y_max - (y_max - y_min) * k as f64 / 4.0;
            svg.push_str(&format!(
                r#"<line x1="{}" y1="{:.2}" x2="{}" y2="{:.2}" class="grid"/>
<text x="5" y="{:.2}" class="label">{:.0}</text>
"#,
                self.margin, y, self.width - self.margin, y, y + 4.0, value
            ));

            let x = self.margin + plot_width * k as f64 / 4.0;
            let mut t = x_min + (x_max - x_min) * k as f64 / 4.0;
            if self.log_temperature {
                t = 10f64.powf(t);
            }
            svg.push_str(&format!(
                r#"<line x1="{:.2}" y1="{}" x2="{:.2}" y2="{}" class="grid"/>
<text x="{:.2}" y="{}" class="label">{:.3}</text>
"#,
                x, self.margin, x, bottom, x - 10.0, bottom + 20.0, t
            ));
        }
        svg.push_str(&format!(
            r#"<line x1="{m}" y1="{b}" x2="{r}" y2="{b}" class="axis"/>
<line x1="{m}" y1="{m}" x2="{m}" y2="{b}" class="axis"/>
<text x="{cx}" y="{ly}" class="label">Temperature</text>
"#,
            m = self.margin,
            b = bottom,
            r = self.width - self.margin,
            cx = self.width / 2.0,
            ly = self.height - 10.0
        ));

        for (series, class) in [(trace.rounds(), "round"), (trace.stages(), "stage")] {
            let mut path = String::new();
            for (i, sample) in series.iter().enumerate() {
                let (x, y) = project(sample);
                if i == 0 {
                    path.push_str(&format!("M {:.2} {:.2}", x, y));
                } else {
                    path.push_str(&format!(" L {:.2} {:.2}", x, y));
                }
            }
            if !path.is_empty() {
                svg.push_str(&format!(
                    r#"<path d="{}" class="{}"/>
"#,
                    path, class
                ));
            }
        }

        svg.push_str("</svg>");

        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Save SVG as PNG.
    /// Uses resvg when built with the `png` feature, otherwise tries `rsvg-convert`,
    /// then `magick convert`, then `inkscape`.
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let path = path.as_ref();
        #[cfg(feature = "png")]
        {
            let opt = usvg::Options::default();
            let rtree = usvg::Tree::from_str(svg, &opt).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::Other, format!("usvg parse error: {}", e))
            })?;
            let mut pixmap = Pixmap::new(self.width as u32, self.height as u32).ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "Failed to create pixmap")
            })?;
            render(&rtree, FitTo::Original, Transform::default(), pixmap.as_mut())
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "resvg render failed"))?;
            pixmap.save_png(path).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::Other, format!("save_png failed: {}", e))
            })?;
            return Ok(());
        }

        // Fallback: write temporary svg and try external converters
        let tmp_svg = path.with_extension("svg.tmp");
        self.save_svg(svg, &tmp_svg)?;

        let out = path.to_string_lossy().to_string();
        let tmp = tmp_svg.to_string_lossy().to_string();
        let (out, tmp) = (out.as_str(), tmp.as_str());
        let converters: [(&str, Vec<&str>); 3] = [
            ("rsvg-convert", vec!["-o", out, tmp]),
            ("magick", vec!["convert", tmp, out]),
            ("inkscape", vec![tmp, "--export-type=png", "--export-filename", out]),
        ];

        for (program, args) in &converters {
            if let Ok(status) = Command::new(program).args(args).status() {
                if status.success() {
                    let _ = std::fs::remove_file(&tmp_svg);
                    return Ok(());
                }
            }
        }

        let _ = std::fs::remove_file(&tmp_svg);
        Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "No SVG->PNG converter succeeded (tried rsvg-convert, magick, inkscape)",
        ))
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Series {
    Stage,
    Round,
}

#[derive(Debug, Serialize, Deserialize)]
struct TraceRow {
    series: Series,
    temperature: f64,
    cost: i64,
}

/// Write a trace as CSV rows `series,temperature,cost`
pub fn export_trace_csv<P: AsRef<Path>>(trace: &SearchTrace, path: P) -> Result<()> {
    let file = File::create(path)?;
    write_trace_csv(trace, file)
}

pub fn write_trace_csv<W: Write>(trace: &SearchTrace, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let rows = trace
        .stages()
        .iter()
        .map(|s| (Series::Stage, s))
        .chain(trace.rounds().iter().map(|s| (Series::Round, s)));
    for (series, sample) in rows {
        writer.serialize(TraceRow {
            series,
            temperature: sample.temperature,
            cost: sample.cost,
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Read a trace written by [`export_trace_csv`]
pub fn load_trace_csv<P: AsRef<Path>>(path: P) -> Result<SearchTrace> {
    let file = File::open(path)?;
    read_trace_csv(file)
}

pub fn read_trace_csv<R: std::io::Read>(input: R) -> Result<SearchTrace> {
    let mut reader = csv::Reader::from_reader(input);
    let mut stages = Vec::new();
    let mut rounds = Vec::new();

    for row in reader.deserialize() {
        let row: TraceRow = row?;
        let sample = TraceSample {
            temperature: row.temperature,
            cost: row.cost,
        };
        match row.series {
            Series::Stage => stages.push(sample),
            Series::Round => rounds.push(sample),
        }
    }

    Ok(SearchTrace::from_samples(stages, rounds))
}
