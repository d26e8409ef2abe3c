//! Aggregation of repeated experiment runs.

use poolbench_common::{Result, error::Error, verify_arg};
use serde::{Deserialize, Serialize};

/// Mean and population standard deviation of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
}

impl MeanStd {
    /// `mean - std`, the lower edge of the ±1σ band.
    pub fn lower(&self) -> f64 {
        self.mean - self.std
    }

    /// `mean + std`, the upper edge of the ±1σ band.
    pub fn upper(&self) -> f64 {
        self.mean + self.std
    }
}

/// Computes the mean and population standard deviation (divisor `n`) of `values`.
pub fn mean_std(values: &[f64]) -> Result<MeanStd> {
    verify_arg!(values, !values.is_empty());
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Ok(MeanStd {
        mean,
        std: variance.sqrt(),
    })
}

/// Serial baseline and per-worker-count statistics over all repetitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// `1..=N`, aligned with `parallel`.
    pub worker_counts: Vec<usize>,
    pub serial: MeanStd,
    pub parallel: Vec<MeanStd>,
}

impl Summary {
    /// Mean serial time divided by mean parallel time, per worker count.
    pub fn speedup(&self) -> Vec<f64> {
        self.parallel
            .iter()
            .map(|p| {
                if p.mean > 0.0 {
                    self.serial.mean / p.mean
                } else {
                    f64::INFINITY
                }
            })
            .collect()
    }
}

/// Aggregates serial durations (one per repetition) and the repetition × worker-count
/// matrix of parallel durations.
///
/// Statistics for the parallel matrix are taken column-wise, across repetitions.
///
/// # Errors
///
/// `InvalidArgument` if there are no repetitions, if the matrix has no columns,
/// if its row count differs from the number of serial durations, or if rows
/// differ in length.
pub fn summarize(serial: &[f64], parallel: &[Vec<f64>]) -> Result<Summary> {
    verify_arg!(serial, !serial.is_empty());
    verify_arg!(parallel, parallel.len() == serial.len());
    let width = parallel[0].len();
    verify_arg!(parallel, width > 0);
    if let Some(row) = parallel.iter().position(|row| row.len() != width) {
        return Err(Error::invalid_arg(
            "parallel",
            format!(
                "row {row} has {} entries, expected {width}",
                parallel[row].len()
            ),
        ));
    }

    let mut columns = Vec::with_capacity(width);
    let mut column = Vec::with_capacity(parallel.len());
    for i in 0..width {
        column.clear();
        column.extend(parallel.iter().map(|row| row[i]));
        columns.push(mean_std(&column)?);
    }

    Ok(Summary {
        worker_counts: (1..=width).collect(),
        serial: mean_std(serial)?,
        parallel: columns,
    })
}
