//! Experiment parameters.

use crate::workload::{Kernel, KernelKind};
use poolbench_common::{Result, verify_arg};
use poolbench_workflow::thread_pool::available_parallelism;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Parameters of one scaling experiment, passed explicitly into the harness.
///
/// The defaults reproduce the lecture setup: five million inputs, exponent 2,
/// 50 trigonometric iterations per input, two repetitions, and one worker
/// configuration per available processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Number of inputs; the domain is `0..domain_size`.
    pub domain_size: u64,
    pub exponent: i32,
    pub iterations: u32,
    pub kernel: KernelKind,
    /// Number of independent experiment executions.
    pub repeats: usize,
    /// Largest worker count to measure. `None` means the host's processor count.
    pub max_workers: Option<usize>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            domain_size: 5_000_000,
            exponent: 2,
            iterations: 50,
            kernel: KernelKind::Trig,
            repeats: 2,
            max_workers: None,
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        verify_arg!(domain_size, self.domain_size > 0);
        verify_arg!(repeats, self.repeats > 0);
        verify_arg!(
            max_workers,
            self.max_workers != Some(0),
            "at least one worker is required"
        );
        Ok(())
    }

    /// The input domain shared by the serial and every parallel measurement.
    pub fn domain(&self) -> Range<u64> {
        0..self.domain_size
    }

    /// The largest worker count measured, `N`.
    pub fn worker_limit(&self) -> usize {
        self.max_workers.unwrap_or_else(available_parallelism)
    }

    pub fn workload(&self) -> Kernel {
        match self.kernel {
            KernelKind::Trig => Kernel::trig(self.exponent, self.iterations),
            KernelKind::Power => Kernel::power(self.exponent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poolbench_common::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = ExperimentConfig::default();
        assert_eq!(config.domain(), 0..5_000_000);
        assert_eq!(config.repeats, 2);
        assert_eq!(config.workload(), Kernel::trig(2, 50));
        assert_eq!(config.worker_limit(), available_parallelism());
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_repeats() {
        let config = ExperimentConfig {
            repeats: 0,
            ..Default::default()
        };
        match config.validate().unwrap_err().kind() {
            ErrorKind::InvalidArgument { name, .. } => assert_eq!(name, "repeats"),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_empty_domain_and_zero_workers() {
        let empty = ExperimentConfig {
            domain_size: 0,
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let no_workers = ExperimentConfig {
            max_workers: Some(0),
            ..Default::default()
        };
        assert_eq!(
            no_workers.validate().unwrap_err().to_string(),
            "invalid argument max_workers: at least one worker is required"
        );
    }

    #[test]
    fn test_power_workload_from_config() {
        let config = ExperimentConfig {
            kernel: KernelKind::Power,
            exponent: 3,
            ..Default::default()
        };
        assert_eq!(config.workload(), Kernel::power(3));
    }
}
