use crate::state::MonitorEngine;
use crate::subscription::ConnectionManager;
use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

/// Shared application state for WebSocket handler
#[derive(Clone)]
pub struct WsAppState {
    pub engine: Arc<MonitorEngine>,
}

/// GET /api/ws - WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsAppState>>) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Create WebSocket router
pub fn create_ws_router(state: Arc<WsAppState>) -> Router {
    Router::new()
        .route("/api/ws", get(ws_handler))
        .with_state(state)
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<WsAppState>) {
    // Subscribe before reading the latest snapshot so no tick falls in between
    let snapshot_rx = state.engine.subscribe();
    let initial = state.engine.snapshot();

    ConnectionManager::new()
        .handle(socket, initial, snapshot_rx)
        .await;
}
