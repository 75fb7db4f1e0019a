//! Comparison and swap counters for a single sort execution

use serde::{Deserialize, Serialize};

/// Final counters of one sort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    /// Pairwise comparisons performed
    pub comparisons: u64,
    /// Exchanges or write-backs performed
    pub swaps: u64,
}

/// Counts operations while one algorithm runs.
///
/// A recorder belongs to exactly one sort invocation and is passed around by
/// `&mut`; it is never shared between sorts or requests.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    comparisons: u64,
    swaps: u64,
}

impl MetricsRecorder {
    /// Create a recorder with both counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one comparison, whatever its outcome
    pub fn record_comparison(&mut self) {
        self.comparisons += 1;
    }

    /// Count one exchange or write-back
    pub fn record_swap(&mut self) {
        self.swaps += 1;
    }

    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    /// Current counter values
    pub fn snapshot(&self) -> Metrics {
        Metrics {
            comparisons: self.comparisons,
            swaps: self.swaps,
        }
    }

    /// Consume the recorder and return the final counters
    pub fn finish(self) -> Metrics {
        self.snapshot()
    }
}
