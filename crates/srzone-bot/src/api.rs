//! HTTP query API using axum.
//!
//! Read-only views over the zone store plus Prometheus metrics.

use crate::error::AppResult;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use srzone_core::{NearestZones, Period, Zone};
use srzone_persistence::{PersistenceError, ZoneStore};
use srzone_telemetry::Metrics;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct ApiState {
    store: Arc<dyn ZoneStore>,
}

impl ApiState {
    pub fn new(store: Arc<dyn ZoneStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    pub price: f64,
}

/// Handler failure mapped to an HTTP status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Store(PersistenceError),
    Metrics(String),
}

impl From<PersistenceError> for ApiError {
    fn from(e: PersistenceError) -> Self {
        Self::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Store(e) => {
                warn!(error = %e, "Zone store read failed");
                (StatusCode::SERVICE_UNAVAILABLE, "zone store unavailable".to_string())
            }
            Self::Metrics(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Create the axum router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/zones/{symbol}/{period}", get(get_zones))
        .route("/zones/{symbol}/{period}/nearest", get(get_nearest))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "store": state.store.backend_type() }))
}

async fn metrics() -> Result<Response, ApiError> {
    let body = Metrics::encode().map_err(|e| ApiError::Metrics(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// All live zones for a key, ordered by price.
async fn get_zones(
    State(state): State<ApiState>,
    Path((symbol, period)): Path<(String, String)>,
) -> Result<Json<Vec<Zone>>, ApiError> {
    let period = Period::from(period.as_str());
    let zones = state.store.get_zones(&symbol, &period).await?;
    Ok(Json(zones))
}

/// Nearest support below and resistance above `price`.
async fn get_nearest(
    State(state): State<ApiState>,
    Path((symbol, period)): Path<(String, String)>,
    Query(query): Query<NearestQuery>,
) -> Result<Json<NearestZones>, ApiError> {
    if !(query.price.is_finite() && query.price > 0.0) {
        return Err(ApiError::BadRequest(format!(
            "price must be positive, got {}",
            query.price
        )));
    }
    let period = Period::from(period.as_str());
    let nearest = state
        .store
        .get_nearest_zones(&symbol, &period, query.price)
        .await?;
    Ok(Json(nearest))
}

/// Bind the API listener on all interfaces.
pub async fn bind(port: u16) -> AppResult<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(port, "Zone query API listening");
    Ok(listener)
}

/// Serve until `cancel` fires.
pub async fn serve(listener: TcpListener, state: ApiState, cancel: CancellationToken) -> AppResult<()> {
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    info!("Zone query API stopped");
    Ok(())
}
