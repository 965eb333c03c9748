//! HTTP API for presentation clients.
//!
//! Exposes the heatmap view model and accepts the filter actions of the
//! controller as JSON endpoints:
//!
//! ```text
//! GET    /health               liveness
//! GET    /heatmap              full view model (cells, legend, labels, filters)
//! GET    /years                year filter options
//! GET    /stats                ingestion counters
//! POST   /filters/year         {"year": 2023}
//! POST   /filters/date-range   {"start": "2023-03-01", "end": "2023-03-31"}
//! DELETE /filters/date-range
//! POST   /filters/intensity    {"band": 2}
//! DELETE /filters/intensity
//! POST   /reset                back to the trailing-year startup view
//! POST   /events               {"timestamps": ["2023-06-15T10:00:00Z", ...]}
//! ```
//!
//! All mutations go through one mutex around the controller. A background
//! task pumps batches from the event source into it.

use crate::controller::{ControllerError, FilterController, HeatmapView};
use crate::core::classify::IntensityBand;
use crate::core::filters::ValidationError;
use crate::core::window::YearFilterOption;
use crate::source::{RawEvent, SyntheticSource};
use crate::stats::IngestSnapshot;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// How often queued event batches are applied
    pub pump_interval: Duration,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            pump_interval: Duration::from_millis(100),
        }
    }
}

/// Controller shared between request handlers and the pump task.
pub type SharedController = Arc<Mutex<FilterController<SyntheticSource>>>;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct YearRequest {
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeRequest {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IntensityRequest {
    pub band: u8,
}

#[derive(Debug, Deserialize)]
pub struct EventsRequest {
    pub timestamps: Vec<String>,
}

/// Response from the events endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct EventsResponse {
    /// Timestamps that parsed and were handed to the bucket store
    pub accepted: usize,
    /// Timestamps that could not be parsed
    pub rejected: usize,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(err: ControllerError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        ControllerError::Validation(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
                code: e.code().to_string(),
            }),
        ),
        ControllerError::Source(e) => {
            tracing::error!("Event source failure: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                    code: "SOURCE_ERROR".to_string(),
                }),
            )
        }
    }
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /heatmap
async fn heatmap(State(controller): State<SharedController>) -> Json<HeatmapView> {
    Json(controller.lock().await.view())
}

/// GET /years
async fn years(State(controller): State<SharedController>) -> Json<Vec<YearFilterOption>> {
    Json(controller.lock().await.year_options().to_vec())
}

/// GET /stats
async fn stats(State(controller): State<SharedController>) -> Json<IngestSnapshot> {
    Json(controller.lock().await.stats().stats())
}

/// POST /filters/year
async fn apply_year(
    State(controller): State<SharedController>,
    Json(request): Json<YearRequest>,
) -> ApiResult<HeatmapView> {
    let mut controller = controller.lock().await;
    controller.select_year(request.year).map_err(api_error)?;
    Ok(Json(controller.view()))
}

/// POST /filters/date-range
async fn apply_date_range(
    State(controller): State<SharedController>,
    Json(request): Json<DateRangeRequest>,
) -> ApiResult<HeatmapView> {
    let mut controller = controller.lock().await;
    controller
        .apply_date_range_str(request.start.as_deref(), request.end.as_deref())
        .map_err(|e| api_error(e.into()))?;
    Ok(Json(controller.view()))
}

/// DELETE /filters/date-range
async fn clear_date_range(State(controller): State<SharedController>) -> Json<HeatmapView> {
    let mut controller = controller.lock().await;
    controller.clear_date_range_filter();
    Json(controller.view())
}

/// POST /filters/intensity
async fn apply_intensity(
    State(controller): State<SharedController>,
    Json(request): Json<IntensityRequest>,
) -> ApiResult<HeatmapView> {
    let band = IntensityBand::from_ordinal(request.band)
        .ok_or_else(|| api_error(ValidationError::UnknownBand(request.band).into()))?;
    let mut controller = controller.lock().await;
    controller.apply_intensity_filter(band);
    Ok(Json(controller.view()))
}

/// DELETE /filters/intensity
async fn clear_intensity(State(controller): State<SharedController>) -> Json<HeatmapView> {
    let mut controller = controller.lock().await;
    controller.clear_intensity_filter();
    Json(controller.view())
}

/// POST /reset
async fn reset(State(controller): State<SharedController>) -> ApiResult<HeatmapView> {
    let mut controller = controller.lock().await;
    controller.full_reset().map_err(api_error)?;
    Ok(Json(controller.view()))
}

/// POST /events
///
/// Feeds externally produced events into the current window. Unparseable
/// timestamps are counted as discarded rather than failing the request.
async fn ingest_events(
    State(controller): State<SharedController>,
    Json(request): Json<EventsRequest>,
) -> Json<EventsResponse> {
    let events: Vec<RawEvent> = request
        .timestamps
        .iter()
        .filter_map(|text| RawEvent::parse_rfc3339(text))
        .collect();
    let accepted = events.len();
    let rejected = request.timestamps.len() - accepted;

    let mut controller = controller.lock().await;
    controller.stats().record_discarded(rejected as u64);
    controller.ingest_external(events);

    Json(EventsResponse { accepted, rejected })
}

/// Build the router over a shared controller.
pub fn router(controller: SharedController) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/heatmap", get(heatmap))
        .route("/years", get(years))
        .route("/stats", get(stats))
        .route("/filters/year", post(apply_year))
        .route(
            "/filters/date-range",
            post(apply_date_range).delete(clear_date_range),
        )
        .route(
            "/filters/intensity",
            post(apply_intensity).delete(clear_intensity),
        )
        .route("/reset", post(reset))
        .route("/events", post(ingest_events))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(controller)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    controller: FilterController<SyntheticSource>,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let controller: SharedController = Arc::new(Mutex::new(controller));
    let app = router(controller.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Heatmap server listening on http://{}", actual_addr);

    let pump_controller = controller.clone();
    let pump_interval = config.pump_interval;
    let pump = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(pump_interval);
        loop {
            ticker.tick().await;
            let applied = pump_controller.lock().await.pump();
            if applied > 0 {
                tracing::debug!(batches = applied, "applied queued batches");
            }
        }
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
        pump.abort();
        controller.lock().await.stop_ingestion();
    });

    Ok((actual_addr, shutdown_tx))
}
