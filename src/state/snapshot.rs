use crate::reading::{PollutantKind, ZoneId};
use crate::status::{FleetStatus, Level, ZoneStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a zone's status was recomputed on the latest tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Recomputed from a complete batch this tick
    Fresh,
    /// Batch missed some expected pollutants; previous status carried forward
    Incomplete,
    /// No data from the source for this zone; previous status carried forward
    Unavailable,
}

/// Latest evaluated value of one pollutant in a zone
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingReport {
    pub pollutant: PollutantKind,
    pub value: f64,
    pub unit: String,
    pub warning: f64,
    pub danger: f64,
    pub level: Level,
    pub captured_at: DateTime<Utc>,
}

/// Per-zone egress view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneReport {
    pub zone: ZoneId,
    /// `None` means unknown: the zone has never been evaluated
    pub status: Option<ZoneStatus>,
    pub freshness: Freshness,
    pub readings: Vec<ReadingReport>,
    /// Pollutants dropped on the last evaluation for lack of a threshold
    pub unconfigured: Vec<PollutantKind>,
    pub last_evaluated: Option<DateTime<Utc>>,
}

impl ZoneReport {
    pub fn level(&self) -> Option<Level> {
        self.status.as_ref().map(|s| s.level)
    }

    pub fn is_stale(&self) -> bool {
        self.freshness != Freshness::Fresh
    }
}

/// Complete, read-only output of one tick. Replaced wholesale every tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    /// UUIDv7, time-ordered
    pub tick_id: String,
    pub taken_at: DateTime<Utc>,
    pub fleet: FleetStatus,
    pub headline: String,
    pub zones: Vec<ZoneReport>,
    /// Ventilation output, percent of full power
    pub fan_speed: u8,
}

impl Snapshot {
    pub fn zone(&self, zone: &ZoneId) -> Option<&ZoneReport> {
        self.zones.iter().find(|z| &z.zone == zone)
    }
}
