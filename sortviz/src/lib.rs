//! Sortviz - instrumented sorting engine for algorithm visualization
//!
//! This crate provides:
//! - Sorting algorithms that count every comparison and swap
//! - Live intermediate array states over a broadcast event stream
//! - An orchestrator that validates requests and packages results
//! - REST API and Server-Sent Events for external clients

pub mod algorithms;
pub mod api;
pub mod broadcast;
pub mod metrics;
pub mod orchestrator;

pub use algorithms::{Algorithm, AlgorithmRegistry, Probe, SnapshotSink};
pub use broadcast::{ArrayUpdate, EventBus};
pub use metrics::{Metrics, MetricsRecorder};
pub use orchestrator::{OrchestratorError, SortOrchestrator, SortRequest, SortResult};

/// Configuration for the sortviz system
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SortvizConfig {
    /// Log level for the server binary ("trace" ... "error")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Algorithm identifiers this deployment accepts
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<String>,

    /// Longest array a single request may carry
    #[serde(default = "default_max_array_len")]
    pub max_array_len: usize,

    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Live array-update events
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

fn default_log_level() -> String { "info".to_string() }
fn default_algorithms() -> Vec<String> {
    Algorithm::ALL.iter().map(|a| a.id().to_string()).collect()
}
fn default_max_array_len() -> usize { 10_000 }

impl Default for SortvizConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            algorithms: default_algorithms(),
            max_array_len: default_max_array_len(),
            server: ServerConfig::default(),
            broadcast: BroadcastConfig::default(),
        }
    }
}

impl SortvizConfig {
    /// Parse a TOML document; omitted fields take their defaults
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

/// Address the server binds to
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Configuration for intermediate-state broadcasting
#[derive(Debug, Clone, serde::Deserialize)]
pub struct BroadcastConfig {
    /// Publish snapshots while sorting
    #[serde(default = "default_broadcast_enabled")]
    pub enabled: bool,

    /// Updates buffered per listener before it starts lagging
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Snapshots published per sort; later ones are dropped
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots_per_sort: usize,
}

fn default_broadcast_enabled() -> bool { true }
fn default_capacity() -> usize { 1024 }
fn default_max_snapshots() -> usize { 5000 }

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            enabled: default_broadcast_enabled(),
            capacity: default_capacity(),
            max_snapshots_per_sort: default_max_snapshots(),
        }
    }
}
