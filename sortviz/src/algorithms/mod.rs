//! Instrumented sorting algorithms
//!
//! Every algorithm in this module works on a whole `&mut [f64]` and routes
//! each comparison and each exchange through a [`Probe`]:
//!
//! | Id | Name | Stable | Swaps counted as |
//! |----|------|--------|------------------|
//! | bubble | Bubble Sort | yes | adjacent exchanges |
//! | selection | Selection Sort | no | one exchange per pass, unless already in place |
//! | insertion | Insertion Sort | yes | adjacent exchanges while sinking |
//! | merge | Merge Sort | yes | write-backs into the array |
//! | quick | Quick Sort | no | exchanges of distinct positions |
//! | heap | Heap Sort | no | exchanges during sift-down and extraction |
//!
//! The probe emits one snapshot of the full array after each counted swap
//! that actually changed it, so a listener sees every structural change in
//! order and never the same state twice in a row. A merge write-back of the
//! value already in place, or an exchange of two equal values, is counted but
//! not shown.

mod bubble;
mod heap;
mod insertion;
mod merge;
mod quick;
mod selection;


use crate::metrics::{Metrics, MetricsRecorder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Receives intermediate array states while a sort runs
pub trait SnapshotSink {
    /// Called with the full array right after a counted swap or write changed it
    fn snapshot(&mut self, array: &[f64]);
}

/// Sink that discards every snapshot
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnapshots;

impl SnapshotSink for NoSnapshots {
    fn snapshot(&mut self, _array: &[f64]) {}
}

/// Sink that keeps every snapshot in memory
#[derive(Debug, Default, Clone)]
pub struct RecordedSnapshots {
    pub states: Vec<Vec<f64>>,
}

impl SnapshotSink for RecordedSnapshots {
    fn snapshot(&mut self, array: &[f64]) {
        self.states.push(array.to_vec());
    }
}

/// Instrumentation handle passed to an algorithm for one run
pub struct Probe<'a> {
    recorder: MetricsRecorder,
    sink: &'a mut dyn SnapshotSink,
}

impl<'a> Probe<'a> {
    /// Create a probe with a fresh recorder
    pub fn new(sink: &'a mut dyn SnapshotSink) -> Self {
        Self {
            recorder: MetricsRecorder::new(),
            sink,
        }
    }

    /// Compare two elements, counting one comparison
    pub fn compare(&mut self, a: f64, b: f64) -> Ordering {
        self.recorder.record_comparison();
        a.total_cmp(&b)
    }

    /// Exchange two positions, counting one swap
    pub fn swap(&mut self, array: &mut [f64], i: usize, j: usize) {
        let changed = array[i].to_bits() != array[j].to_bits();
        array.swap(i, j);
        self.recorder.record_swap();
        if changed {
            self.sink.snapshot(array);
        }
    }

    /// Write a value back into the array, counting one swap
    pub fn write(&mut self, array: &mut [f64], index: usize, value: f64) {
        let changed = array[index].to_bits() != value.to_bits();
        array[index] = value;
        self.recorder.record_swap();
        if changed {
            self.sink.snapshot(array);
        }
    }

    /// Counters recorded so far
    pub fn metrics(&self) -> Metrics {
        self.recorder.snapshot()
    }

    /// Consume the probe and return the final counters
    pub fn finish(self) -> Metrics {
        self.recorder.finish()
    }
}

/// Error returned when an identifier names no known algorithm
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown algorithm: {0}")]
pub struct ParseAlgorithmError(pub String);

/// The closed set of supported algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Bubble,
    Selection,
    Insertion,
    Merge,
    Quick,
    Heap,
}

impl Algorithm {
    /// All algorithms, in display order
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Bubble,
        Algorithm::Selection,
        Algorithm::Insertion,
        Algorithm::Merge,
        Algorithm::Quick,
        Algorithm::Heap,
    ];

    /// Wire identifier (e.g., "bubble")
    pub fn id(&self) -> &'static str {
        match self {
            Algorithm::Bubble => "bubble",
            Algorithm::Selection => "selection",
            Algorithm::Insertion => "insertion",
            Algorithm::Merge => "merge",
            Algorithm::Quick => "quick",
            Algorithm::Heap => "heap",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Bubble => "Bubble Sort",
            Algorithm::Selection => "Selection Sort",
            Algorithm::Insertion => "Insertion Sort",
            Algorithm::Merge => "Merge Sort",
            Algorithm::Quick => "Quick Sort",
            Algorithm::Heap => "Heap Sort",
        }
    }

    /// Whether equal elements keep their relative order
    pub fn is_stable(&self) -> bool {
        matches!(
            self,
            Algorithm::Bubble | Algorithm::Insertion | Algorithm::Merge
        )
    }

    /// Average-case time complexity
    pub fn complexity(&self) -> &'static str {
        match self {
            Algorithm::Bubble | Algorithm::Selection | Algorithm::Insertion => "O(n^2)",
            Algorithm::Merge | Algorithm::Quick | Algorithm::Heap => "O(n log n)",
        }
    }

    /// Sort `array` in full, reporting every operation to `probe`
    pub fn sort(self, mut array: Vec<f64>, probe: &mut Probe<'_>) -> Vec<f64> {
        match self {
            Algorithm::Bubble => bubble::sort(&mut array, probe),
            Algorithm::Selection => selection::sort(&mut array, probe),
            Algorithm::Insertion => insertion::sort(&mut array, probe),
            Algorithm::Merge => merge::sort(&mut array, probe),
            Algorithm::Quick => quick::sort(&mut array, probe),
            Algorithm::Heap => heap::sort(&mut array, probe),
        }
        array
    }

    /// Describe this algorithm for clients
    pub fn info(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            id: self.id(),
            name: self.name(),
            stable: self.is_stable(),
            complexity: self.complexity(),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Algorithm::ALL
            .into_iter()
            .find(|a| a.id() == wanted)
            .ok_or_else(|| ParseAlgorithmError(s.to_string()))
    }
}

/// Description of an enabled algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlgorithmInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub stable: bool,
    pub complexity: &'static str,
}

/// The algorithms a deployment has enabled
#[derive(Debug, Clone)]
pub struct AlgorithmRegistry {
    enabled: Vec<Algorithm>,
}

impl AlgorithmRegistry {
    /// Build a registry from configured identifiers, rejecting unknown ones
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ParseAlgorithmError> {
        let mut enabled = Vec::with_capacity(names.len());
        for name in names {
            let algorithm: Algorithm = name.as_ref().parse()?;
            if !enabled.contains(&algorithm) {
                enabled.push(algorithm);
            }
        }
        Ok(Self { enabled })
    }

    /// Registry with every algorithm enabled
    pub fn all() -> Self {
        Self {
            enabled: Algorithm::ALL.to_vec(),
        }
    }

    /// Look up an enabled algorithm by identifier
    pub fn resolve(&self, name: &str) -> Result<Algorithm, ParseAlgorithmError> {
        name.parse::<Algorithm>()
            .ok()
            .filter(|a| self.enabled.contains(a))
            .ok_or_else(|| ParseAlgorithmError(name.to_string()))
    }

    pub fn is_enabled(&self, algorithm: Algorithm) -> bool {
        self.enabled.contains(&algorithm)
    }

    /// Enabled algorithms in configured order
    pub fn enabled(&self) -> &[Algorithm] {
        &self.enabled
    }

    pub fn describe(&self) -> Vec<AlgorithmInfo> {
        self.enabled.iter().map(Algorithm::info).collect()
    }
}
