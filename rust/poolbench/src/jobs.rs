//! Self-describing batch jobs for the unordered-results pipeline.
//!
//! Each [`WorkItem`] carries all of its parameters, so a batch can mix
//! heterogeneous jobs and still be dispatched through the single [`run_job`]
//! entry point.

use crate::workload::{Kernel, Workload};
use serde::{Deserialize, Serialize};
use std::{ops::Range, thread, time::Duration};

const AIR_DENSITY: f64 = 1.225;
const REFERENCE_AREA: f64 = 0.1;

/// The default range the simulated setup delay is drawn from.
pub const DEFAULT_SETUP_DELAY: Range<Duration> = Duration::from_millis(500)..Duration::from_millis(1500);

/// A simulated wind-tunnel measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindTunnelTest {
    pub id: u32,
    /// m/s
    pub velocity: f64,
    /// degrees
    pub angle_of_attack: f64,
    /// Simulated rig preparation time, spent before the computation.
    pub setup_delay: Duration,
}

impl WindTunnelTest {
    /// Drag force in newtons: `0.5 · ρ · v² · A · (1 + 0.01·α)`.
    pub fn drag(&self) -> f64 {
        0.5 * AIR_DENSITY
            * self.velocity.powi(2)
            * REFERENCE_AREA
            * (1.0 + 0.01 * self.angle_of_attack)
    }

    /// Whole-number velocities print without a fractional part (`V=17m/s`); the
    /// angle always keeps one (`Alpha=3.0deg`).
    pub fn summary(&self, drag: f64) -> String {
        format!(
            "Test {:02}: V={}m/s, Alpha={:?}deg -> Drag={drag:.2}N",
            self.id, self.velocity, self.angle_of_attack
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkItem {
    WindTunnel(WindTunnelTest),
    /// Evaluates `kernel` at a single input.
    Kernel { id: u32, x: u64, kernel: Kernel },
}

/// Result of one [`WorkItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub id: u32,
    pub value: f64,
    pub summary: String,
}

/// Executes one work item on the calling thread.
pub fn run_job(item: WorkItem) -> JobOutcome {
    match item {
        WorkItem::WindTunnel(test) => {
            if !test.setup_delay.is_zero() {
                thread::sleep(test.setup_delay);
            }
            let drag = test.drag();
            JobOutcome {
                id: test.id,
                value: drag,
                summary: test.summary(drag),
            }
        }
        WorkItem::Kernel { id, x, kernel } => {
            let value = kernel.apply(x);
            JobOutcome {
                id,
                value,
                summary: format!("Job {id:02}: {}(x={x}) = {value:.4}", kernel.kind),
            }
        }
    }
}

/// Builds `count` wind-tunnel tests: test `i` runs at `10 + i` m/s and `i / 2` degrees,
/// with a setup delay drawn uniformly from `setup_delay`.
pub fn wind_tunnel_batch(count: u32, setup_delay: Range<Duration>) -> Vec<WorkItem> {
    wind_tunnel_batch_with_rng(count, setup_delay, &mut fastrand::Rng::new())
}

pub fn wind_tunnel_batch_with_rng(
    count: u32,
    setup_delay: Range<Duration>,
    rng: &mut fastrand::Rng,
) -> Vec<WorkItem> {
    let spread = setup_delay.end.saturating_sub(setup_delay.start);
    (0..count)
        .map(|i| {
            WorkItem::WindTunnel(WindTunnelTest {
                id: i,
                velocity: 10.0 + f64::from(i),
                angle_of_attack: f64::from(i) / 2.0,
                setup_delay: setup_delay.start + spread.mul_f64(rng.f64()),
            })
        })
        .collect()
}
