//! Sort orchestration: request validation, dispatch, and result packaging

use crate::algorithms::{
    Algorithm, AlgorithmInfo, AlgorithmRegistry, NoSnapshots, ParseAlgorithmError, Probe,
    SnapshotSink,
};
use crate::broadcast::{ArrayUpdate, EventBus};
use crate::metrics::Metrics;
use crate::SortvizConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors from sort orchestration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Internal failure: {0}")]
    InternalFailure(String),
}

impl OrchestratorError {
    /// Machine-readable reason for error responses
    pub fn reason(&self) -> &'static str {
        match self {
            OrchestratorError::InvalidInput(_) => "invalid_input",
            OrchestratorError::UnknownAlgorithm(_) => "unknown_algorithm",
            OrchestratorError::InternalFailure(_) => "internal_failure",
        }
    }
}

impl From<ParseAlgorithmError> for OrchestratorError {
    fn from(err: ParseAlgorithmError) -> Self {
        OrchestratorError::UnknownAlgorithm(err.0)
    }
}

/// Request to sort one array with one algorithm.
///
/// Fields stay loosely typed so a malformed array is reported as
/// `InvalidInput` instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortRequest {
    #[serde(default)]
    pub array: Option<Value>,
    #[serde(default)]
    pub algorithm: Option<String>,
}

impl SortRequest {
    pub fn new(array: &[f64], algorithm: impl Into<String>) -> Self {
        Self {
            array: Some(Value::from(array)),
            algorithm: Some(algorithm.into()),
        }
    }
}

/// Sorted array plus the counters of the run that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortResult {
    #[serde(rename = "sortedArray")]
    pub sorted_array: Vec<f64>,
    pub metrics: Metrics,
}

/// Request to run several algorithms on the same input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub array: Option<Value>,
    #[serde(default)]
    pub algorithms: Option<Vec<String>>,
}

impl CompareRequest {
    pub fn new(array: &[f64], algorithms: &[&str]) -> Self {
        Self {
            array: Some(Value::from(array)),
            algorithms: Some(algorithms.iter().map(|a| a.to_string()).collect()),
        }
    }
}

/// Result of one algorithm within a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub algorithm: String,
    #[serde(flatten)]
    pub result: SortResult,
}

/// Algorithm that needed the fewest comparisons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fastest {
    pub algorithm: String,
    pub comparisons: u64,
}

/// Results of a comparison run, in request order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub results: Vec<ComparisonEntry>,
    pub fastest: Fastest,
}

impl ComparisonReport {
    /// Pick the entry with the fewest comparisons, the earliest on ties
    pub fn from_results(results: Vec<ComparisonEntry>) -> Result<Self, OrchestratorError> {
        let fastest = results
            .iter()
            .min_by_key(|entry| entry.result.metrics.comparisons)
            .map(|entry| Fastest {
                algorithm: entry.algorithm.clone(),
                comparisons: entry.result.metrics.comparisons,
            })
            .ok_or_else(|| {
                OrchestratorError::InternalFailure("comparison produced no results".to_string())
            })?;
        Ok(Self { results, fastest })
    }
}

/// Sort orchestrator.
///
/// Holds only immutable configuration and a handle to the event bus; every
/// call works on its own copy of the input with its own recorder.
pub struct SortOrchestrator {
    registry: AlgorithmRegistry,
    max_array_len: usize,
    events: Option<EventBus>,
    max_snapshots: usize,
}

impl SortOrchestrator {
    /// Create an orchestrator from configuration
    pub fn new(config: &SortvizConfig, events: EventBus) -> Result<Self, OrchestratorError> {
        let registry = AlgorithmRegistry::from_names(&config.algorithms)?;
        let orchestrator = Self::with_registry(registry, config.max_array_len);
        Ok(if config.broadcast.enabled {
            orchestrator.with_events(events, config.broadcast.max_snapshots_per_sort)
        } else {
            orchestrator
        })
    }

    /// Create an orchestrator that publishes nothing
    pub fn with_registry(registry: AlgorithmRegistry, max_array_len: usize) -> Self {
        Self {
            registry,
            max_array_len,
            events: None,
            max_snapshots: 0,
        }
    }

    /// Publish up to `max_snapshots` intermediate states per sort on `events`
    pub fn with_events(mut self, events: EventBus, max_snapshots: usize) -> Self {
        self.events = Some(events);
        self.max_snapshots = max_snapshots;
        self
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Describe the enabled algorithms
    pub fn algorithms(&self) -> Vec<AlgorithmInfo> {
        self.registry.describe()
    }

    /// Validate a request and sort its array with the requested algorithm
    pub fn run(&self, request: &SortRequest) -> Result<SortResult, OrchestratorError> {
        let algorithm = self.resolve(request.algorithm.as_deref())?;
        let array = self.parse_array(request.array.as_ref())?;
        self.execute_published(algorithm, array)
    }

    /// Run each requested algorithm on its own copy of the array
    pub fn compare(&self, request: &CompareRequest) -> Result<ComparisonReport, OrchestratorError> {
        let names = request.algorithms.as_deref().unwrap_or_default();
        if names.is_empty() {
            return Err(OrchestratorError::InvalidInput(
                "at least one algorithm is required".to_string(),
            ));
        }
        let algorithms = names
            .iter()
            .map(|name| self.resolve(Some(name.as_str())))
            .collect::<Result<Vec<_>, _>>()?;
        let array = self.parse_array(request.array.as_ref())?;

        if let Some(events) = &self.events {
            events.publish(ArrayUpdate {
                array: array.clone(),
                algorithm: None,
            });
        }

        let mut results = Vec::with_capacity(algorithms.len());
        for algorithm in algorithms {
            let result = self.execute_published(algorithm, array.clone())?;
            results.push(ComparisonEntry {
                algorithm: algorithm.id().to_string(),
                result,
            });
        }

        let report = ComparisonReport::from_results(results)?;
        info!(
            algorithms = report.results.len(),
            fastest = %report.fastest.algorithm,
            comparisons = report.fastest.comparisons,
            "Comparison completed"
        );
        Ok(report)
    }

    /// Sort an already validated array, reporting snapshots to `sink`
    pub fn execute(
        &self,
        algorithm: Algorithm,
        array: Vec<f64>,
        sink: &mut dyn SnapshotSink,
    ) -> Result<SortResult, OrchestratorError> {
        let len = array.len();
        let input = array.clone();

        let mut probe = Probe::new(sink);
        let sorted = algorithm.sort(array, &mut probe);
        let metrics = probe.finish();

        verify_sorted(algorithm, input, &sorted)?;

        info!(
            algorithm = %algorithm,
            len,
            comparisons = metrics.comparisons,
            swaps = metrics.swaps,
            "Sort completed"
        );

        Ok(SortResult {
            sorted_array: sorted,
            metrics,
        })
    }

    fn execute_published(
        &self,
        algorithm: Algorithm,
        array: Vec<f64>,
    ) -> Result<SortResult, OrchestratorError> {
        match &self.events {
            Some(events) => {
                let mut sink = events.sink(Some(algorithm), self.max_snapshots);
                self.execute(algorithm, array, &mut sink)
            }
            None => self.execute(algorithm, array, &mut NoSnapshots),
        }
    }

    fn resolve(&self, name: Option<&str>) -> Result<Algorithm, OrchestratorError> {
        let name = name.ok_or_else(|| {
            OrchestratorError::InvalidInput("missing field `algorithm`".to_string())
        })?;
        Ok(self.registry.resolve(name)?)
    }

    /// Check that `value` is a list of finite numbers within the length limit
    pub fn parse_array(&self, value: Option<&Value>) -> Result<Vec<f64>, OrchestratorError> {
        let value = value
            .ok_or_else(|| OrchestratorError::InvalidInput("missing field `array`".to_string()))?;
        let items = value.as_array().ok_or_else(|| {
            OrchestratorError::InvalidInput(format!(
                "`array` must be a list, got {}",
                json_kind(value)
            ))
        })?;

        if items.len() > self.max_array_len {
            return Err(OrchestratorError::InvalidInput(format!(
                "array has {} elements, limit is {}",
                items.len(),
                self.max_array_len
            )));
        }

        let array = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_f64().filter(|v| v.is_finite()).ok_or_else(|| {
                    OrchestratorError::InvalidInput(format!(
                        "element {index} is not a number: {item}"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(len = array.len(), "Validated input array");
        Ok(array)
    }
}

/// Check `sorted` against a reference ordering of `input`
fn verify_sorted(
    algorithm: Algorithm,
    mut input: Vec<f64>,
    sorted: &[f64],
) -> Result<(), OrchestratorError> {
    input.sort_by(f64::total_cmp);
    if same_bits(sorted, &input) {
        return Ok(());
    }

    error!(
        algorithm = %algorithm,
        len = input.len(),
        output_len = sorted.len(),
        "Algorithm produced an unsorted or altered array"
    );
    Err(OrchestratorError::InternalFailure(format!(
        "{algorithm} sort produced an invalid result"
    )))
}

fn same_bits(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::RecordedSnapshots;
    use serde_json::json;
    use tokio::sync::broadcast::error::TryRecvError;

    fn orchestrator() -> SortOrchestrator {
        SortOrchestrator::with_registry(AlgorithmRegistry::all(), 100)
    }

    fn request(value: Value) -> SortRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_array() {
        let result = orchestrator()
            .run(&request(json!({"array": [], "algorithm": "bubble"})))
            .unwrap();
        assert!(result.sorted_array.is_empty());
        assert_eq!(result.metrics, Metrics::default());
    }

    #[test]
    fn test_bubble_reference_example() {
        let result = orchestrator()
            .run(&request(json!({"array": [5, 3, 1], "algorithm": "bubble"})))
            .unwrap();
        assert_eq!(result.sorted_array, vec![1.0, 3.0, 5.0]);
        assert_eq!(
            result.metrics,
            Metrics {
                comparisons: 3,
                swaps: 3
            }
        );
    }

    #[test]
    fn test_quick_on_sorted_input_still_compares() {
        let result = orchestrator()
            .run(&SortRequest::new(&[1.0, 2.0, 3.0], "quick"))
            .unwrap();
        assert_eq!(result.sorted_array, vec![1.0, 2.0, 3.0]);
        assert!(result.metrics.comparisons > 0);
    }

    #[test]
    fn test_non_numeric_element_is_invalid_input() {
        let err = orchestrator()
            .run(&request(json!({"array": [1, "x"], "algorithm": "merge"})))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidInput(_)));
        assert_eq!(err.reason(), "invalid_input");
        assert!(err.to_string().contains("element 1"));
    }

    #[test]
    fn test_unknown_algorithm() {
        let err = orchestrator()
            .run(&SortRequest::new(&[1.0, 2.0, 3.0], "nonexistent"))
            .unwrap_err();
        assert_eq!(
            err,
            OrchestratorError::UnknownAlgorithm("nonexistent".to_string())
        );
        assert_eq!(err.reason(), "unknown_algorithm");
    }

    #[test]
    fn test_disabled_algorithm_is_unknown() {
        let registry = AlgorithmRegistry::from_names(&["merge"]).unwrap();
        let orchestrator = SortOrchestrator::with_registry(registry, 100);
        let err = orchestrator
            .run(&SortRequest::new(&[2.0, 1.0], "bubble"))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownAlgorithm(_)));
    }

    #[test]
    fn test_array_shape_errors() {
        let orchestrator = orchestrator();
        for body in [
            json!({"algorithm": "bubble"}),
            json!({"array": null, "algorithm": "bubble"}),
            json!({"array": "1,2,3", "algorithm": "bubble"}),
            json!({"array": {"0": 1}, "algorithm": "bubble"}),
            json!({"array": [1, null], "algorithm": "bubble"}),
            json!({"array": [[1], 2], "algorithm": "bubble"}),
            json!({"array": [1, 2]}),
        ] {
            let err = orchestrator.run(&request(body.clone())).unwrap_err();
            assert!(
                matches!(err, OrchestratorError::InvalidInput(_)),
                "{body} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_length_limit() {
        let orchestrator = SortOrchestrator::with_registry(AlgorithmRegistry::all(), 3);
        assert!(orchestrator.run(&SortRequest::new(&[3.0, 2.0, 1.0], "heap")).is_ok());
        let err = orchestrator
            .run(&SortRequest::new(&[4.0, 3.0, 2.0, 1.0], "heap"))
            .unwrap_err();
        assert!(err.to_string().contains("limit is 3"));
    }

    #[test]
    fn test_repeated_runs_do_not_share_state() {
        let orchestrator = orchestrator();
        let req = SortRequest::new(&[9.0, -2.5, 4.0, 4.0, 0.0], "insertion");
        let first = orchestrator.run(&req).unwrap();
        let second = orchestrator.run(&req).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sorted_array, vec![-2.5, 0.0, 4.0, 4.0, 9.0]);
    }

    #[test]
    fn test_verification_rejects_altered_output() {
        let input = vec![3.0, 1.0, 2.0];
        assert!(verify_sorted(Algorithm::Quick, input.clone(), &[1.0, 2.0, 3.0]).is_ok());

        for bad in [
            vec![1.0, 3.0, 2.0],
            vec![1.0, 2.0],
            vec![1.0, 2.0, 3.0, 3.0],
            vec![1.0, 2.0, 4.0],
        ] {
            let err = verify_sorted(Algorithm::Quick, input.clone(), &bad).unwrap_err();
            assert!(matches!(err, OrchestratorError::InternalFailure(_)), "{bad:?}");
            assert_eq!(err.reason(), "internal_failure");
        }
    }

    #[test]
    fn test_verification_distinguishes_signed_zero() {
        let err = verify_sorted(Algorithm::Merge, vec![0.0, -0.0], &[0.0, -0.0]).unwrap_err();
        assert!(matches!(err, OrchestratorError::InternalFailure(_)));
        assert!(verify_sorted(Algorithm::Merge, vec![0.0, -0.0], &[-0.0, 0.0]).is_ok());
    }

    #[test]
    fn test_from_results_without_entries_is_internal_failure() {
        let err = ComparisonReport::from_results(Vec::new()).unwrap_err();
        assert!(matches!(err, OrchestratorError::InternalFailure(_)));
    }

    #[test]
    fn test_new_from_config() {
        let config = SortvizConfig::from_toml(
            r#"
            algorithms = ["merge", "quick"]
            max_array_len = 2
            "#,
        )
        .unwrap();
        let events = EventBus::new(16);
        let mut rx = events.subscribe();
        let orchestrator = SortOrchestrator::new(&config, events).unwrap();

        let ids: Vec<_> = orchestrator.algorithms().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["merge", "quick"]);
        assert!(matches!(
            orchestrator.run(&SortRequest::new(&[2.0, 1.0], "bubble")),
            Err(OrchestratorError::UnknownAlgorithm(_))
        ));
        assert!(matches!(
            orchestrator.run(&SortRequest::new(&[3.0, 2.0, 1.0], "merge")),
            Err(OrchestratorError::InvalidInput(_))
        ));

        orchestrator
            .run(&SortRequest::new(&[2.0, 1.0], "quick"))
            .unwrap();
        let update = rx.try_recv().unwrap();
        assert_eq!(update.array, vec![1.0, 2.0]);
        assert_eq!(update.algorithm.as_deref(), Some("quick"));
    }

    #[test]
    fn test_new_with_broadcast_disabled_publishes_nothing() {
        let config = SortvizConfig::from_toml(
            r#"
            [broadcast]
            enabled = false
            "#,
        )
        .unwrap();
        let events = EventBus::new(16);
        let mut rx = events.subscribe();
        let orchestrator = SortOrchestrator::new(&config, events).unwrap();

        let result = orchestrator
            .run(&SortRequest::new(&[5.0, 3.0, 1.0], "bubble"))
            .unwrap();
        assert_eq!(result.metrics.swaps, 3);
        orchestrator
            .compare(&CompareRequest::new(&[2.0, 1.0], &["merge", "heap"]))
            .unwrap();

        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_new_rejects_unknown_configured_algorithm() {
        let config = SortvizConfig::from_toml(r#"algorithms = ["bubble", "bogo"]"#).unwrap();
        let err = SortOrchestrator::new(&config, EventBus::new(4)).err();
        assert_eq!(
            err,
            Some(OrchestratorError::UnknownAlgorithm("bogo".to_string()))
        );
    }

    #[test]
    fn test_execute_reports_snapshots() {
        let mut sink = RecordedSnapshots::default();
        let result = orchestrator()
            .execute(Algorithm::Selection, vec![3.0, 1.0, 2.0], &mut sink)
            .unwrap();
        assert_eq!(sink.states.len() as u64, result.metrics.swaps);
        assert_eq!(sink.states, vec![vec![1.0, 3.0, 2.0], vec![1.0, 2.0, 3.0]]);
    }

    #[test]
    fn test_run_broadcasts_tagged_snapshots() {
        let events = EventBus::new(64);
        let mut rx = events.subscribe();
        let orchestrator = orchestrator().with_events(events, 100);

        let result = orchestrator
            .run(&SortRequest::new(&[5.0, 3.0, 1.0], "bubble"))
            .unwrap();

        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        assert_eq!(updates.len() as u64, result.metrics.swaps);
        assert!(updates.iter().all(|u| u.algorithm.as_deref() == Some("bubble")));
        assert_eq!(updates.last().map(|u| u.array.clone()), Some(vec![1.0, 3.0, 5.0]));
    }

    #[test]
    fn test_compare_reports_fastest() {
        let report = orchestrator()
            .compare(&CompareRequest::new(
                &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
                &["bubble", "insertion", "merge"],
            ))
            .unwrap();

        let names: Vec<_> = report.results.iter().map(|r| r.algorithm.as_str()).collect();
        assert_eq!(names, vec!["bubble", "insertion", "merge"]);
        assert!(report
            .results
            .iter()
            .all(|r| r.result.sorted_array == vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]));
        // Insertion sort needs n-1 comparisons on sorted input
        assert_eq!(
            report.fastest,
            Fastest {
                algorithm: "insertion".to_string(),
                comparisons: 7
            }
        );
    }

    #[test]
    fn test_compare_tie_goes_to_earliest() {
        let report = orchestrator()
            .compare(&CompareRequest::new(&[3.0, 1.0, 2.0], &["selection", "bubble"]))
            .unwrap();
        assert_eq!(report.fastest.algorithm, "selection");
        assert_eq!(report.fastest.comparisons, 3);
    }

    #[test]
    fn test_compare_rejects_before_sorting() {
        let events = EventBus::new(64);
        let mut rx = events.subscribe();
        let orchestrator = orchestrator().with_events(events, 100);

        let err = orchestrator
            .compare(&CompareRequest::new(&[2.0, 1.0], &["bubble", "bogo"]))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownAlgorithm(_)));
        assert!(rx.try_recv().is_err());

        let err = orchestrator
            .compare(&CompareRequest::new(&[2.0, 1.0], &[]))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidInput(_)));
    }

    #[test]
    fn test_compare_publishes_input_to_default_panel_first() {
        let events = EventBus::new(64);
        let mut rx = events.subscribe();
        let orchestrator = orchestrator().with_events(events, 100);

        orchestrator
            .compare(&CompareRequest::new(&[2.0, 1.0], &["bubble"]))
            .unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.algorithm, None);
        assert_eq!(first.array, vec![2.0, 1.0]);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.algorithm.as_deref(), Some("bubble"));
    }

    #[test]
    fn test_report_wire_format() {
        let report = orchestrator()
            .compare(&CompareRequest::new(&[2.0, 1.0], &["bubble"]))
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["results"][0]["algorithm"], "bubble");
        assert_eq!(json["results"][0]["sortedArray"], json!([1.0, 2.0]));
        assert_eq!(json["results"][0]["metrics"]["comparisons"], 1);
        assert_eq!(json["fastest"]["algorithm"], "bubble");
    }
}
