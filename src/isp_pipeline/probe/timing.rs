//! Wall-clock time spent in each step of a run.

use std::time::{Duration, Instant};

use tracing::info;

/// Step durations in the order the steps ran.
#[derive(Debug, Default, Clone)]
pub struct StepTimings {
    steps: Vec<(&'static str, Duration)>,
}

impl StepTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `step` and records its duration under `name`, whether it succeeds or not.
    pub fn measure<T>(&mut self, name: &'static str, step: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = step();
        self.record(name, start.elapsed());
        result
    }

    fn record(&mut self, name: &'static str, duration: Duration) {
        self.steps.push((name, duration));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.steps.iter().copied()
    }

    pub fn total(&self) -> Duration {
        self.steps.iter().map(|(_, duration)| *duration).sum()
    }

    /// First of the longest-running steps
    pub fn slowest(&self) -> Option<(&'static str, Duration)> {
        self.iter().reduce(|slowest, step| if step.1 > slowest.1 { step } else { slowest })
    }

    pub fn log_summary(&self) {
        for (name, duration) in self.iter() {
            info!("  {:<18} {:>9.3}ms", name, millis(duration));
        }
        info!("  {:<18} {:>9.3}ms", "total", millis(self.total()));
        if let Some((name, duration)) = self.slowest() {
            info!("Slowest step: {} ({:.3}ms)", name, millis(duration));
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
