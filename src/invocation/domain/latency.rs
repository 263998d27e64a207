//! Rolling invocation latency.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Number of samples kept per service unless configured otherwise.
pub const DEFAULT_LATENCY_WINDOW: usize = 32;

/// Fixed-size window of the most recent invocation latencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingLatency {
    capacity: usize,
    samples: VecDeque<Duration>,
}

impl RollingLatency {
    /// Creates an empty window holding at most `capacity` samples.
    ///
    /// A zero capacity is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let bounded = capacity.max(1);
        Self {
            capacity: bounded,
            samples: VecDeque::with_capacity(bounded),
        }
    }

    /// Records a sample, discarding the oldest when full.
    pub fn record(&mut self, sample: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Summarizes the window, or `None` before the first sample.
    #[must_use]
    pub fn snapshot(&self) -> Option<LatencySnapshot> {
        let last = *self.samples.back()?;
        let total: Duration = self.samples.iter().sum();
        let count = u32::try_from(self.samples.len()).ok()?;

        let mut sorted: Vec<Duration> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        let median_index = sorted.len().div_ceil(2).saturating_sub(1);

        Some(LatencySnapshot {
            samples: self.samples.len(),
            last,
            mean: total.checked_div(count).unwrap_or_default(),
            median: sorted.get(median_index).copied().unwrap_or_default(),
            max: sorted.last().copied().unwrap_or_default(),
        })
    }
}

impl Default for RollingLatency {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY_WINDOW)
    }
}

/// Summary of a latency window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencySnapshot {
    /// Number of samples in the window.
    pub samples: usize,
    /// Most recent sample.
    pub last: Duration,
    /// Arithmetic mean.
    pub mean: Duration,
    /// Lower median.
    pub median: Duration,
    /// Slowest sample.
    pub max: Duration,
}
