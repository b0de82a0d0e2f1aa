use crate::threshold::{SharedThresholds, ThresholdConfig, ThresholdTable};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// State for the admin API.
#[derive(Clone)]
pub struct AdminAppState {
    pub thresholds: SharedThresholds,
    /// Required bearer token for PUT /api/admin/thresholds. None = PUT unrestricted.
    pub admin_token: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn create_admin_router(state: AdminAppState) -> Router {
    Router::new()
        .route(
            "/api/admin/thresholds",
            get(get_thresholds).put(put_thresholds),
        )
        .with_state(Arc::new(state))
}

/// GET /api/admin/thresholds - returns the active threshold table.
async fn get_thresholds(State(state): State<Arc<AdminAppState>>) -> Json<ThresholdConfig> {
    Json(state.thresholds.current().to_config())
}

/// PUT /api/admin/thresholds - replaces the whole table. Requires AIRGUARD_ADMIN_TOKEN bearer.
///
/// The new table is validated before the swap; an invalid pair leaves the
/// active table untouched. The next tick evaluates against the new one.
async fn put_thresholds(
    State(state): State<Arc<AdminAppState>>,
    headers: HeaderMap,
    Json(config): Json<ThresholdConfig>,
) -> Response {
    // Admin token check
    if !validate_admin_token(&headers, &state.admin_token) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Unauthorized".to_string(),
            }),
        )
            .into_response();
    }

    let table = match ThresholdTable::from_config(&config) {
        Ok(table) => table,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let active = table.to_config();
    state.thresholds.replace(table);
    info!(
        defaults = active.defaults.len(),
        zone_overrides = active.zones.len(),
        "Threshold table replaced"
    );

    Json(active).into_response()
}

/// Returns true if the bearer token in `Authorization` matches the expected admin token.
/// Returns true (no restriction) when `expected` is None.
fn validate_admin_token(headers: &HeaderMap, expected: &Option<String>) -> bool {
    let Some(expected_token) = expected else {
        // No admin token configured → PUT is unrestricted (dev mode)
        return true;
    };

    let Some(auth_header) = headers.get("Authorization") else {
        return false;
    };
    let Ok(value) = auth_header.to_str() else {
        return false;
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        return false;
    };

    token == expected_token
}
