use crate::history::HistorySample;
use crate::reading::{PollutantKind, ZoneId};
use crate::state::MonitorEngine;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for history API
pub struct HistoryAppState {
    pub engine: Arc<MonitorEngine>,
}

/// Query parameters for history reads
#[derive(Deserialize)]
pub struct HistoryParams {
    /// Zone name (required)
    pub zone: Option<String>,
    /// Pollutant label, e.g. co2, voc, temperature (required)
    pub pollutant: Option<String>,
    /// Scrub position, 0 = oldest (scrub only)
    pub index: Option<usize>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub zone: ZoneId,
    pub pollutant: PollutantKind,
    pub unit: &'static str,
    pub capacity: usize,
    pub samples: Vec<HistorySample>,
}

#[derive(Serialize)]
pub struct ScrubResponse {
    pub zone: ZoneId,
    pub pollutant: PollutantKind,
    pub index: usize,
    pub sample: HistorySample,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create history API router
pub fn create_history_router(state: Arc<HistoryAppState>) -> Router {
    Router::new()
        .route("/api/history", get(get_window))
        .route("/api/history/scrub", get(get_scrub))
        .with_state(state)
}

/// GET /api/history?zone=Cuisine&pollutant=co2
///
/// Returns the rolling window for one (zone, pollutant), oldest first.
async fn get_window(
    State(state): State<Arc<HistoryAppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, HistoryError> {
    let (zone, pollutant) = parse_key(&params)?;

    Ok(Json(HistoryResponse {
        samples: state.engine.history_window(&zone, pollutant),
        capacity: state.engine.history_capacity(),
        unit: pollutant.unit(),
        zone,
        pollutant,
    }))
}

/// GET /api/history/scrub?zone=Cuisine&pollutant=co2&index=4
///
/// Read-only look at one past sample; ingestion keeps running.
async fn get_scrub(
    State(state): State<Arc<HistoryAppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ScrubResponse>, HistoryError> {
    let (zone, pollutant) = parse_key(&params)?;
    let index = params.index.ok_or(HistoryError::MissingParameter("index"))?;

    let sample = state
        .engine
        .history_value_at(&zone, pollutant, index)
        .ok_or(HistoryError::NoSample(index))?;

    Ok(Json(ScrubResponse {
        zone,
        pollutant,
        index,
        sample,
    }))
}

fn parse_key(params: &HistoryParams) -> Result<(ZoneId, PollutantKind), HistoryError> {
    let zone = params
        .zone
        .as_deref()
        .map(ZoneId::from)
        .ok_or(HistoryError::MissingParameter("zone"))?;
    let label = params
        .pollutant
        .as_deref()
        .ok_or(HistoryError::MissingParameter("pollutant"))?;
    let pollutant = PollutantKind::from_label(label)
        .ok_or_else(|| HistoryError::UnknownPollutant(label.to_string()))?;
    Ok((zone, pollutant))
}

#[derive(Debug)]
enum HistoryError {
    MissingParameter(&'static str),
    UnknownPollutant(String),
    NoSample(usize),
}

impl IntoResponse for HistoryError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            HistoryError::MissingParameter(name) => (
                StatusCode::BAD_REQUEST,
                format!("{} parameter is required", name),
            ),
            HistoryError::UnknownPollutant(label) => (
                StatusCode::BAD_REQUEST,
                format!("unknown pollutant '{}'", label),
            ),
            HistoryError::NoSample(index) => (
                StatusCode::NOT_FOUND,
                format!("no sample at index {}", index),
            ),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
