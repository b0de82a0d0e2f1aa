use crate::reading::ZoneId;
use crate::state::Snapshot;
use crate::subscription::protocol::{ClientMessage, ErrorMessage, SnapshotMessage};
use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use std::collections::HashSet;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Manages a single WebSocket connection with zone subscriptions
pub struct ConnectionManager {
    /// Zones this connection follows; empty means every zone
    subscriptions: HashSet<ZoneId>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: HashSet::new(),
        }
    }

    /// Handle WebSocket connection lifecycle.
    ///
    /// `initial` is pushed right away so a fresh client does not wait a
    /// full tick for its first frame.
    pub async fn handle(
        mut self,
        mut socket: WebSocket,
        initial: Snapshot,
        mut snapshot_rx: broadcast::Receiver<Snapshot>,
    ) {
        info!("WebSocket connection established");

        if let Err(e) = self.send_snapshot(&mut socket, &initial).await {
            error!(error = %e, "Failed to send initial snapshot");
            return;
        }

        loop {
            tokio::select! {
                // Handle incoming client messages
                Some(msg) = socket.recv() => {
                    match msg {
                        Ok(Message::Text(text)) => {
                            if let Err(e) = self.handle_client_message(&text) {
                                warn!(error = %e, "Invalid client message");
                                if send_json(&mut socket, &ErrorMessage::new(e.to_string())).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Ok(Message::Close(_)) => {
                            info!("WebSocket client disconnected");
                            break;
                        }
                        Ok(Message::Ping(data)) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                error!(error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Ok(_) => {
                            // Ignore binary, pong messages
                        }
                        Err(e) => {
                            warn!(error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                // Forward every tick
                result = snapshot_rx.recv() => {
                    match result {
                        Ok(snapshot) => {
                            if let Err(e) = self.send_snapshot(&mut socket, &snapshot).await {
                                error!(error = %e, "Failed to send snapshot");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // Snapshots are complete; the next one catches the client up
                            warn!(skipped = skipped, "WebSocket lagged, skipped snapshots");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            error!("Snapshot broadcast channel closed");
                            break;
                        }
                    }
                }

                else => {
                    break;
                }
            }
        }

        info!("WebSocket connection closed");
    }

    /// Handle client message (subscribe/unsubscribe)
    fn handle_client_message(&mut self, text: &str) -> anyhow::Result<()> {
        let msg: ClientMessage = serde_json::from_str(text)?;

        match msg {
            ClientMessage::Subscribe { zone } => {
                info!(zone = %zone, "Client subscribed to zone");
                self.subscriptions.insert(zone);
            }
            ClientMessage::Unsubscribe { zone } => {
                info!(zone = %zone, "Client unsubscribed from zone");
                self.subscriptions.remove(&zone);
            }
        }

        Ok(())
    }

    async fn send_snapshot(&self, socket: &mut WebSocket, snapshot: &Snapshot) -> anyhow::Result<()> {
        send_json(socket, &SnapshotMessage::filtered(snapshot, &self.subscriptions)).await
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn send_json<T: Serialize>(socket: &mut WebSocket, msg: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}
