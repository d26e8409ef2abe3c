//! Terminal progress bar for result streams.

use indicatif::{ProgressBar, ProgressStyle};
use poolbench_workflow::progress::ProgressObserver;
use std::time::Duration;

const TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec}, eta {eta})";

/// Drives an indicatif bar from [`ProgressObserver`] events.
pub struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    pub fn new() -> Self {
        BarObserver {
            bar: ProgressBar::no_length(),
        }
    }

    /// A bar that never draws.
    #[cfg(test)]
    pub fn hidden() -> Self {
        BarObserver {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for BarObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for BarObserver {
    fn on_start(&mut self, total: Option<u64>) {
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        self.bar.set_style(style);
        if let Some(total) = total {
            self.bar.set_length(total);
        }
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_item(&mut self) {
        self.bar.inc(1);
    }

    fn on_finish(&mut self) {
        self.bar.finish();
    }
}
