//! Fire-and-forget "array update" events for live visualization

use crate::algorithms::{Algorithm, SnapshotSink};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Name of the event on the wire
pub const ARRAY_UPDATE_EVENT: &str = "array update";

/// One intermediate (or initial) array state.
///
/// Without an `algorithm` the update targets the default panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayUpdate {
    pub array: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

/// Outbound event stream shared by all sorts.
///
/// Publishing never blocks and never fails from the caller's point of view;
/// with no listeners the update is simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ArrayUpdate>,
}

impl EventBus {
    /// Create a bus that buffers up to `capacity` updates per slow listener
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an update to every current listener
    pub fn publish(&self, update: ArrayUpdate) {
        // Err only means nobody is listening
        let _ = self.tx.send(update);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ArrayUpdate> {
        self.tx.subscribe()
    }

    /// Number of connected listeners
    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Snapshot sink publishing the states of one sort, tagged with its algorithm
    pub fn sink(&self, algorithm: Option<Algorithm>, limit: usize) -> BroadcastSink {
        BroadcastSink {
            bus: self.clone(),
            algorithm: algorithm.map(|a| a.id().to_string()),
            remaining: limit,
            dropped: 0,
        }
    }
}

/// Publishes snapshots of a single sort until its limit is spent
#[derive(Debug)]
pub struct BroadcastSink {
    bus: EventBus,
    algorithm: Option<String>,
    remaining: usize,
    dropped: usize,
}

impl BroadcastSink {
    /// Snapshots discarded after the limit was reached
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl SnapshotSink for BroadcastSink {
    fn snapshot(&mut self, array: &[f64]) {
        if self.remaining == 0 {
            self.dropped += 1;
            return;
        }
        self.remaining -= 1;

        // Skip the copy when nobody would receive it
        if self.bus.listeners() == 0 {
            return;
        }
        self.bus.publish(ArrayUpdate {
            array: array.to_vec(),
            algorithm: self.algorithm.clone(),
        });
    }
}

impl Drop for BroadcastSink {
    fn drop(&mut self) {
        if self.dropped > 0 {
            debug!(
                algorithm = ?self.algorithm,
                dropped = self.dropped,
                "Snapshot limit reached, later snapshots not broadcast"
            );
        }
    }
}
