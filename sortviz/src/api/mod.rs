//! REST API and array-update streams for the sort orchestrator
//!
//! Array updates reach listeners two ways: Socket.IO under `/socket.io/`
//! (event `array update` on the default namespace) and Server-Sent Events
//! on `GET /events`. Both are fed by the same [`EventBus`].

use crate::algorithms::{Algorithm, AlgorithmInfo};
use crate::broadcast::{ARRAY_UPDATE_EVENT, ArrayUpdate, EventBus};
use crate::metrics::Metrics;
use crate::orchestrator::{
    CompareRequest, ComparisonReport, OrchestratorError, SortOrchestrator, SortRequest, SortResult,
};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use dashmap::DashMap;
use futures::Stream;
use serde::Serialize;
use socketioxide::SocketIo;
use socketioxide::extract::SocketRef;
use socketioxide::layer::SocketIoLayer;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, warn};


/// API state
pub struct ApiState {
    pub orchestrator: Arc<SortOrchestrator>,
    pub events: EventBus,
    pub stats: ServedStats,
}

impl ApiState {
    pub fn new(orchestrator: SortOrchestrator, events: EventBus) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            events,
            stats: ServedStats::default(),
        }
    }
}

/// Running totals for one algorithm
#[derive(Debug, Default)]
pub struct AlgorithmStats {
    pub runs: AtomicU64,
    pub comparisons: AtomicU64,
    pub swaps: AtomicU64,
}

/// Totals over every sort this server has answered
#[derive(Debug, Default)]
pub struct ServedStats {
    per_algorithm: DashMap<Algorithm, Arc<AlgorithmStats>>,
    rejected: AtomicU64,
}

impl ServedStats {
    /// Count one successful sort
    pub fn record(&self, algorithm: Algorithm, metrics: &Metrics) {
        let stats = Arc::clone(&self.per_algorithm.entry(algorithm).or_default());
        stats.runs.fetch_add(1, Ordering::Relaxed);
        stats
            .comparisons
            .fetch_add(metrics.comparisons, Ordering::Relaxed);
        stats.swaps.fetch_add(metrics.swaps, Ordering::Relaxed);
    }

    /// Count a failed request and hand its error back
    fn reject(&self, err: ApiError) -> ApiError {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        err
    }

    pub fn snapshot(&self) -> StatsResponse {
        let served = Algorithm::ALL
            .into_iter()
            .filter_map(|algorithm| {
                self.per_algorithm
                    .get(&algorithm)
                    .map(|stats| AlgorithmStatsJson {
                        algorithm: algorithm.id(),
                        runs: stats.runs.load(Ordering::Relaxed),
                        comparisons: stats.comparisons.load(Ordering::Relaxed),
                        swaps: stats.swaps.load(Ordering::Relaxed),
                    })
            })
            .collect();

        StatsResponse {
            served,
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Served totals for one algorithm
#[derive(Debug, Serialize)]
pub struct AlgorithmStatsJson {
    pub algorithm: &'static str,
    pub runs: u64,
    pub comparisons: u64,
    pub swaps: u64,
}

/// Stats endpoint response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub served: Vec<AlgorithmStatsJson>,
    pub rejected: u64,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub algorithms: Vec<&'static str>,
    pub listeners: usize,
}

/// Error body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable reason ("invalid_input", "unknown_algorithm", "internal_failure")
    pub error: &'static str,
    pub message: String,
}

/// Orchestrator failure rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub OrchestratorError);

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(OrchestratorError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            OrchestratorError::InvalidInput(_) | OrchestratorError::UnknownAlgorithm(_) => {
                warn!(reason = self.0.reason(), error = %self.0, "Rejected sort request");
                StatusCode::BAD_REQUEST
            }
            OrchestratorError::InternalFailure(_) => {
                error!(error = %self.0, "Sort request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            error: self.0.reason(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Create the API router.
///
/// Must be called inside a Tokio runtime: it spawns the task that forwards
/// bus updates to Socket.IO listeners.
pub fn create_router(state: Arc<ApiState>) -> Router {
    let socket_io = socket_io_layer(&state.events);

    Router::new()
        .route("/health", get(health_check))
        .route("/algorithms", get(list_algorithms))
        .route("/sort", post(sort_array))
        .route("/compare", post(compare_algorithms))
        .route("/stats", get(served_stats))
        .route("/events", get(array_updates))
        .layer(socket_io)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        algorithms: state
            .orchestrator
            .registry()
            .enabled()
            .iter()
            .map(|a| a.id())
            .collect(),
        listeners: state.events.listeners(),
    })
}

async fn list_algorithms(State(state): State<Arc<ApiState>>) -> Json<Vec<AlgorithmInfo>> {
    Json(state.orchestrator.algorithms())
}

/// Sort one array with one algorithm
async fn sort_array(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<SortRequest>, JsonRejection>,
) -> Result<Json<SortResult>, ApiError> {
    let Json(request) = payload.map_err(|e| state.stats.reject(e.into()))?;
    let algorithm = request
        .algorithm
        .as_deref()
        .and_then(|name| name.parse::<Algorithm>().ok());

    let result = run_blocking(&state, move |orchestrator| orchestrator.run(&request))
        .await
        .map_err(|e| state.stats.reject(e))?;

    if let Some(algorithm) = algorithm {
        state.stats.record(algorithm, &result.metrics);
    }
    Ok(Json(result))
}

/// Run several algorithms on the same array
async fn compare_algorithms(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<ComparisonReport>, ApiError> {
    let Json(request) = payload.map_err(|e| state.stats.reject(e.into()))?;

    let report = run_blocking(&state, move |orchestrator| orchestrator.compare(&request))
        .await
        .map_err(|e| state.stats.reject(e))?;

    for entry in &report.results {
        if let Ok(algorithm) = entry.algorithm.parse::<Algorithm>() {
            state.stats.record(algorithm, &entry.result.metrics);
        }
    }
    Ok(Json(report))
}

async fn served_stats(State(state): State<Arc<ApiState>>) -> Json<StatsResponse> {
    Json(state.stats.snapshot())
}

/// Server-Sent Events stream of "array update" events
async fn array_updates(
    State(state): State<Arc<ApiState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Lagged listeners skip what they missed
    let stream = BroadcastStream::new(state.events.subscribe())
        .filter_map(|update| update.ok())
        .filter_map(|update| {
            Event::default()
                .event(ARRAY_UPDATE_EVENT)
                .json_data(&update)
                .ok()
        })
        .map(Ok::<Event, Infallible>);

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Socket.IO endpoint re-emitting every bus update as "array update"
pub fn socket_io_layer(events: &EventBus) -> SocketIoLayer {
    let (layer, io) = SocketIo::new_layer();
    io.ns("/", on_connect);
    tokio::spawn(forward_updates(io, events.subscribe()));
    layer
}

async fn on_connect(socket: SocketRef) {
    debug!(sid = %socket.id, "Socket.IO listener connected");
}

async fn forward_updates(io: SocketIo, mut rx: tokio::sync::broadcast::Receiver<ArrayUpdate>) {
    loop {
        match rx.recv().await {
            Ok(update) => {
                if let Err(e) = io.emit(ARRAY_UPDATE_EVENT, &update).await {
                    debug!(error = %e, "Array update not delivered to every socket");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Socket.IO forwarder lagged, updates skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Sorting is CPU-bound, so it runs off the async workers
async fn run_blocking<T, F>(state: &ApiState, job: F) -> Result<T, ApiError>
where
    F: FnOnce(&SortOrchestrator) -> Result<T, OrchestratorError> + Send + 'static,
    T: Send + 'static,
{
    let orchestrator = Arc::clone(&state.orchestrator);
    let outcome = tokio::task::spawn_blocking(move || job(&orchestrator))
        .await
        .map_err(|e| {
            error!(error = %e, "Sort task did not complete");
            OrchestratorError::InternalFailure("sort task did not complete".to_string())
        })?;
    Ok(outcome?)
}
