use crate::reading::ZoneId;
use crate::report::SafetyReport;
use crate::state::{MonitorEngine, Snapshot, ZoneReport};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for status and report queries
pub struct QueryAppState {
    pub engine: Arc<MonitorEngine>,
}

/// Query parameters for the safety report
#[derive(Deserialize)]
pub struct ReportParams {
    pub zone: Option<String>,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create status/report API router
pub fn create_query_router(state: Arc<QueryAppState>) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/zones", get(list_zones))
        .route("/api/zones/:zone", get(get_zone))
        .route("/api/report", get(get_report))
        .with_state(state)
}

/// GET /api/status - Latest snapshot (fleet, zones, fan speed)
async fn get_status(State(state): State<Arc<QueryAppState>>) -> Json<Snapshot> {
    Json(state.engine.snapshot())
}

/// GET /api/zones - Configured zones, in configuration order
async fn list_zones(State(state): State<Arc<QueryAppState>>) -> Json<Vec<ZoneId>> {
    Json(state.engine.zones())
}

/// GET /api/zones/:zone - One zone report from the latest snapshot
async fn get_zone(
    State(state): State<Arc<QueryAppState>>,
    Path(zone): Path<String>,
) -> Result<Json<ZoneReport>, QueryError> {
    state
        .engine
        .zone_report(&ZoneId::new(zone))
        .map(Json)
        .ok_or(QueryError::ZoneNotFound)
}

/// GET /api/report?zone=Cuisine - Safety report rows built from history
async fn get_report(
    State(state): State<Arc<QueryAppState>>,
    Query(params): Query<ReportParams>,
) -> Result<Json<SafetyReport>, QueryError> {
    let zone = params
        .zone
        .map(ZoneId::new)
        .ok_or(QueryError::MissingParameter("zone"))?;

    if !state.engine.zones().contains(&zone) {
        return Err(QueryError::ZoneNotFound);
    }

    Ok(Json(state.engine.report(&zone)))
}

/// Query error types
#[derive(Debug)]
enum QueryError {
    ZoneNotFound,
    MissingParameter(&'static str),
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            QueryError::ZoneNotFound => (StatusCode::NOT_FOUND, "Zone not found".to_string()),
            QueryError::MissingParameter(name) => (
                StatusCode::BAD_REQUEST,
                format!("{} parameter is required", name),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}
