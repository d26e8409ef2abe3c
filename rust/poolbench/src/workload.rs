//! CPU-bound workloads measured by the scaling benchmark.

use serde::{Deserialize, Serialize};
use std::{fmt, hint::black_box, ops::Range, str::FromStr};

/// A pure function of an input value and the workload's own fixed parameters.
///
/// Implementations must be stateless: the same input always produces the same
/// output, whichever thread evaluates it.
pub trait Workload: Send + Sync + 'static {
    fn apply(&self, x: u64) -> f64;
}

impl<F> Workload for F
where
    F: Fn(u64) -> f64 + Send + Sync + 'static,
{
    fn apply(&self, x: u64) -> f64 {
        self(x)
    }
}

/// The family of computation performed by a [`Kernel`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    /// `sum over iterations of sin(x)^e + cos(x)^e`.
    #[default]
    Trig,
    /// `x^e`; too cheap to benefit from parallelism, useful as a contrast.
    Power,
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelKind::Trig => f.write_str("trig"),
            KernelKind::Power => f.write_str("power"),
        }
    }
}

impl FromStr for KernelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trig" => Ok(KernelKind::Trig),
            "power" => Ok(KernelKind::Power),
            other => Err(format!("unknown kernel '{other}' (expected 'trig' or 'power')")),
        }
    }
}

/// The benchmark workload: a [`KernelKind`] with its exponent and iteration count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    pub kind: KernelKind,
    pub exponent: i32,
    /// Number of repetitions of the trigonometric term; ignored by [`KernelKind::Power`].
    pub iterations: u32,
}

impl Kernel {
    pub fn trig(exponent: i32, iterations: u32) -> Kernel {
        Kernel {
            kind: KernelKind::Trig,
            exponent,
            iterations,
        }
    }

    pub fn power(exponent: i32) -> Kernel {
        Kernel {
            kind: KernelKind::Power,
            exponent,
            iterations: 1,
        }
    }
}

impl Workload for Kernel {
    fn apply(&self, x: u64) -> f64 {
        match self.kind {
            KernelKind::Trig => {
                let mut res = 0.0;
                for _ in 0..self.iterations {
                    // Keeps the loop from being folded into a single evaluation.
                    let x = black_box(x as f64);
                    res += x.sin().powi(self.exponent) + x.cos().powi(self.exponent);
                }
                res
            }
            KernelKind::Power => (x as f64).powi(self.exponent),
        }
    }
}

/// Evaluates `workload` over `domain` on the calling thread.
pub fn evaluate_serial<W: Workload + ?Sized>(workload: &W, domain: Range<u64>) -> Vec<f64> {
    domain.map(|x| workload.apply(x)).collect()
}
