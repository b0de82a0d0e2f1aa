// HTTP and WebSocket APIs

pub mod admin;
pub mod history;
pub mod query;
pub mod websocket;

pub use admin::{create_admin_router, AdminAppState};
pub use history::{create_history_router, HistoryAppState};
pub use query::{create_query_router, QueryAppState};
pub use websocket::{create_ws_router, ws_handler, WsAppState};

use crate::state::MonitorEngine;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Every route the server exposes, with permissive CORS for the dashboard
pub fn build_router(engine: Arc<MonitorEngine>, admin_token: Option<String>) -> Router {
    let admin_state = AdminAppState {
        thresholds: engine.thresholds().clone(),
        admin_token,
    };

    Router::new()
        .merge(create_query_router(Arc::new(QueryAppState {
            engine: Arc::clone(&engine),
        })))
        .merge(create_history_router(Arc::new(HistoryAppState {
            engine: Arc::clone(&engine),
        })))
        .merge(create_ws_router(Arc::new(WsAppState {
            engine: Arc::clone(&engine),
        })))
        .merge(create_admin_router(admin_state))
        .layer(CorsLayer::permissive())
}
