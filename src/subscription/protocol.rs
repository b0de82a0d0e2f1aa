use crate::reading::ZoneId;
use crate::state::{Snapshot, ZoneReport};
use crate::status::FleetStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Client → Server message types
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "subscribe")]
    Subscribe { zone: ZoneId },
    #[serde(rename = "unsubscribe")]
    Unsubscribe { zone: ZoneId },
}

/// Server → Client: one tick's snapshot.
///
/// The fleet status, headline and fan speed are always sent in full;
/// `zones` is narrowed to the client's subscriptions when it has any.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub tick: u64,
    pub tick_id: String,
    pub timestamp: DateTime<Utc>,
    pub fleet: FleetStatus,
    pub headline: String,
    pub fan_speed: u8,
    pub zones: Vec<ZoneReport>,
}

impl SnapshotMessage {
    pub fn filtered(snapshot: &Snapshot, zones: &HashSet<ZoneId>) -> Self {
        Self {
            msg_type: "snapshot".to_string(),
            tick: snapshot.tick,
            tick_id: snapshot.tick_id.clone(),
            timestamp: snapshot.taken_at,
            fleet: snapshot.fleet.clone(),
            headline: snapshot.headline.clone(),
            fan_speed: snapshot.fan_speed,
            zones: snapshot
                .zones
                .iter()
                .filter(|z| zones.is_empty() || zones.contains(&z.zone))
                .cloned()
                .collect(),
        }
    }
}

/// Server → Client: Error message
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: String) -> Self {
        Self {
            msg_type: "error".to_string(),
            error,
        }
    }
}
