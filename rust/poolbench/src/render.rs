//! SVG rendering of the scaling chart.
//!
//! The chart shows the serial baseline as a dashed horizontal line with a shaded
//! ±1σ band, and the parallel mean duration per worker count as a curve with
//! ±1σ error bars.

use crate::{
    experiment::RepeatedRuns,
    summary::{MeanStd, Summary, summarize},
};
use poolbench_common::{Result, error::Error};
use std::{fmt::Write as _, path::Path};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;
const PLOT_LEFT: f64 = 80.0;
const PLOT_RIGHT: f64 = 770.0;
const PLOT_TOP: f64 = 60.0;
const PLOT_BOTTOM: f64 = 530.0;
const CAP_HALF_WIDTH: f64 = 5.0;
const MAX_X_TICKS: usize = 16;

const SERIAL_COLOR: &str = "#d62728";
const PARALLEL_COLOR: &str = "#1f77b4";
const GRID_COLOR: &str = "#b0b0b0";

pub const TITLE: &str = "Scaling Performance: Serial vs Parallel";
pub const X_LABEL: &str = "Number of Processes";
pub const Y_LABEL: &str = "Time [s]";

/// Aggregates the repeated runs and writes the chart to `path`.
///
/// Returns the summary the chart was drawn from.
pub fn summarize_and_render(runs: &RepeatedRuns, path: impl AsRef<Path>) -> Result<Summary> {
    let summary = summarize(&runs.serial_secs, &runs.parallel_secs)?;
    write_svg(&summary, path)?;
    Ok(summary)
}

/// Writes the chart for `summary` to `path`.
pub fn write_svg(summary: &Summary, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, render_svg(summary))
        .map_err(|e| Error::io(path.display().to_string(), e))?;
    log::info!("scaling chart written to {}", path.display());
    Ok(())
}

/// Renders the chart for `summary` as a standalone SVG document.
#[must_use]
pub fn render_svg(summary: &Summary) -> String {
    let n = summary.worker_counts.len().max(1);
    let frame = Frame::new(n, y_extent(summary));
    let mut svg = String::with_capacity(16 * 1024);

    writeln!(
        &mut svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" \
         viewBox=\"0 0 {WIDTH} {HEIGHT}\" font-family=\"Helvetica, Arial, sans-serif\">"
    )
    .ok();
    writeln!(
        &mut svg,
        "  <rect width=\"{WIDTH}\" height=\"{HEIGHT}\" fill=\"#ffffff\"/>"
    )
    .ok();
    writeln!(
        &mut svg,
        "  <text x=\"{:.1}\" y=\"35\" font-size=\"18\" text-anchor=\"middle\">{TITLE}</text>",
        (PLOT_LEFT + PLOT_RIGHT) / 2.0
    )
    .ok();

    render_grid(&mut svg, &frame, n);
    render_serial(&mut svg, &frame, n, &summary.serial);
    render_parallel(&mut svg, &frame, summary);

    writeln!(
        &mut svg,
        "  <rect x=\"{PLOT_LEFT}\" y=\"{PLOT_TOP}\" width=\"{:.1}\" height=\"{:.1}\" \
         fill=\"none\" stroke=\"#000000\"/>",
        PLOT_RIGHT - PLOT_LEFT,
        PLOT_BOTTOM - PLOT_TOP
    )
    .ok();
    writeln!(
        &mut svg,
        "  <text x=\"{:.1}\" y=\"580\" font-size=\"14\" text-anchor=\"middle\">{X_LABEL}</text>",
        (PLOT_LEFT + PLOT_RIGHT) / 2.0
    )
    .ok();
    writeln!(
        &mut svg,
        "  <text x=\"25\" y=\"{0:.1}\" font-size=\"14\" text-anchor=\"middle\" \
         transform=\"rotate(-90 25 {0:.1})\">{Y_LABEL}</text>",
        (PLOT_TOP + PLOT_BOTTOM) / 2.0
    )
    .ok();

    render_legend(&mut svg, &summary.serial);
    svg.push_str("</svg>\n");
    svg
}

/// Maps data coordinates into the plot area.
struct Frame {
    x_max: f64,
    y_max: f64,
    y_step: f64,
}

impl Frame {
    fn new(n: usize, (y_max, y_step): (f64, f64)) -> Frame {
        Frame {
            x_max: n as f64 + 0.5,
            y_max,
            y_step,
        }
    }

    fn x(&self, workers: f64) -> f64 {
        let x_min = 0.5;
        PLOT_LEFT + (workers - x_min) / (self.x_max - x_min) * (PLOT_RIGHT - PLOT_LEFT)
    }

    fn y(&self, secs: f64) -> f64 {
        let secs = secs.clamp(0.0, self.y_max);
        PLOT_BOTTOM - secs / self.y_max * (PLOT_BOTTOM - PLOT_TOP)
    }
}

/// Returns the top of the y axis and its tick step.
fn y_extent(summary: &Summary) -> (f64, f64) {
    let highest = summary
        .parallel
        .iter()
        .map(MeanStd::upper)
        .fold(summary.serial.upper(), f64::max);
    let padded = if highest.is_finite() && highest > 0.0 {
        highest * 1.1
    } else {
        1.0
    };
    let step = nice_step(padded / 5.0);
    ((padded / step).ceil() * step, step)
}

/// Rounds `raw` up to 1, 2 or 5 times a power of ten.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn tick_decimals(step: f64) -> usize {
    (-step.log10().floor()).max(0.0) as usize
}

fn render_grid(svg: &mut String, frame: &Frame, n: usize) {
    let decimals = tick_decimals(frame.y_step);
    let num_y_ticks = (frame.y_max / frame.y_step).round() as usize;
    for i in 0..=num_y_ticks {
        let value = i as f64 * frame.y_step;
        let y = frame.y(value);
        writeln!(
            svg,
            "  <line x1=\"{PLOT_LEFT}\" y1=\"{y:.1}\" x2=\"{PLOT_RIGHT}\" y2=\"{y:.1}\" \
             stroke=\"{GRID_COLOR}\" stroke-opacity=\"0.5\"/>"
        )
        .ok();
        writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" text-anchor=\"end\">{value:.decimals$}</text>",
            PLOT_LEFT - 8.0,
            y + 4.0
        )
        .ok();
    }

    let x_step = n.div_ceil(MAX_X_TICKS).max(1);
    for workers in (1..=n).step_by(x_step) {
        let x = frame.x(workers as f64);
        writeln!(
            svg,
            "  <line x1=\"{x:.1}\" y1=\"{PLOT_TOP}\" x2=\"{x:.1}\" y2=\"{PLOT_BOTTOM}\" \
             stroke=\"{GRID_COLOR}\" stroke-opacity=\"0.5\"/>"
        )
        .ok();
        writeln!(
            svg,
            "  <text x=\"{x:.1}\" y=\"{:.1}\" font-size=\"12\" text-anchor=\"middle\">{workers}</text>",
            PLOT_BOTTOM + 20.0
        )
        .ok();
    }
}

/// Draws the serial mean across the plot and its ±1σ band over worker counts `1..=n`.
fn render_serial(svg: &mut String, frame: &Frame, n: usize, serial: &MeanStd) {
    let top = frame.y(serial.upper());
    let bottom = frame.y(serial.lower());
    let (left, right) = serial_band_span(frame, n);
    writeln!(
        svg,
        "  <rect class=\"serial-band\" x=\"{left:.1}\" y=\"{top:.1}\" width=\"{:.1}\" \
         height=\"{:.1}\" fill=\"{SERIAL_COLOR}\" fill-opacity=\"0.1\"/>",
        right - left,
        bottom - top
    )
    .ok();
    let y = frame.y(serial.mean);
    writeln!(
        svg,
        "  <line class=\"serial-mean\" x1=\"{PLOT_LEFT}\" y1=\"{y:.1}\" x2=\"{PLOT_RIGHT}\" \
         y2=\"{y:.1}\" stroke=\"{SERIAL_COLOR}\" stroke-width=\"1.5\" stroke-dasharray=\"6 4\"/>"
    )
    .ok();
}

fn serial_band_span(frame: &Frame, n: usize) -> (f64, f64) {
    (frame.x(1.0), frame.x(n as f64))
}

fn render_parallel(svg: &mut String, frame: &Frame, summary: &Summary) {
    let points: Vec<(f64, &MeanStd)> = summary
        .worker_counts
        .iter()
        .zip(&summary.parallel)
        .map(|(&workers, stats)| (frame.x(workers as f64), stats))
        .collect();

    for (x, stats) in &points {
        let (top, bottom) = (frame.y(stats.upper()), frame.y(stats.lower()));
        writeln!(
            svg,
            "  <g class=\"error-bar\" stroke=\"{PARALLEL_COLOR}\">\
             <line x1=\"{x:.1}\" y1=\"{top:.1}\" x2=\"{x:.1}\" y2=\"{bottom:.1}\"/>\
             <line x1=\"{:.1}\" y1=\"{top:.1}\" x2=\"{:.1}\" y2=\"{top:.1}\"/>\
             <line x1=\"{:.1}\" y1=\"{bottom:.1}\" x2=\"{:.1}\" y2=\"{bottom:.1}\"/></g>",
            x - CAP_HALF_WIDTH,
            x + CAP_HALF_WIDTH,
            x - CAP_HALF_WIDTH,
            x + CAP_HALF_WIDTH
        )
        .ok();
    }

    let mut polyline = String::new();
    for (x, stats) in &points {
        if !polyline.is_empty() {
            polyline.push(' ');
        }
        write!(&mut polyline, "{x:.1},{:.1}", frame.y(stats.mean)).ok();
    }
    writeln!(
        svg,
        "  <polyline points=\"{polyline}\" fill=\"none\" stroke=\"{PARALLEL_COLOR}\" stroke-width=\"1.5\"/>"
    )
    .ok();

    for (x, stats) in &points {
        writeln!(
            svg,
            "  <circle class=\"marker\" cx=\"{x:.1}\" cy=\"{:.1}\" r=\"4\" fill=\"{PARALLEL_COLOR}\"/>",
            frame.y(stats.mean)
        )
        .ok();
    }
}

fn render_legend(svg: &mut String, serial: &MeanStd) {
    let (x, y) = (PLOT_RIGHT - 190.0, PLOT_TOP + 12.0);
    writeln!(
        svg,
        "  <rect x=\"{x}\" y=\"{y}\" width=\"178\" height=\"52\" fill=\"#ffffff\" \
         fill-opacity=\"0.8\" stroke=\"#cccccc\"/>"
    )
    .ok();
    writeln!(
        svg,
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{SERIAL_COLOR}\" \
         stroke-width=\"1.5\" stroke-dasharray=\"6 4\"/>",
        x + 10.0,
        y + 17.0,
        x + 40.0,
        y + 17.0
    )
    .ok();
    writeln!(
        svg,
        "  <text x=\"{}\" y=\"{}\" font-size=\"12\">Serial Avg ({:.2}s)</text>",
        x + 48.0,
        y + 21.0,
        serial.mean
    )
    .ok();
    writeln!(
        svg,
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{PARALLEL_COLOR}\" stroke-width=\"1.5\"/>",
        x + 10.0,
        y + 37.0,
        x + 40.0,
        y + 37.0
    )
    .ok();
    writeln!(
        svg,
        "  <circle cx=\"{}\" cy=\"{}\" r=\"4\" fill=\"{PARALLEL_COLOR}\"/>",
        x + 25.0,
        y + 37.0
    )
    .ok();
    writeln!(
        svg,
        "  <text x=\"{}\" y=\"{}\" font-size=\"12\">Parallel</text>",
        x + 48.0,
        y + 41.0
    )
    .ok();
}
