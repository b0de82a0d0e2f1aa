// Zone status evaluation and vessel-wide aggregation

mod evaluator;
mod fleet;

pub use evaluator::{classify, evaluate_zone, zone_status, ResolvedReading, ZoneEvaluation};
pub use fleet::aggregate;

use crate::reading::{PollutantKind, ZoneId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};


/// Discrete alert level, totally ordered Normal < Vigilance < Critical
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Normal,
    Vigilance,
    Critical,
}

impl Level {
    /// Label shown on the bridge displays
    pub fn label(&self) -> &'static str {
        match self {
            Level::Normal => "Normal",
            Level::Vigilance => "Vigilance",
            Level::Critical => "Critique",
        }
    }
}

/// Status of a single zone, derived from its latest readings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneStatus {
    pub zone: ZoneId,
    pub level: Level,
    /// Pollutants whose own classification equals `level` (empty when Normal)
    pub breached_pollutants: BTreeSet<PollutantKind>,
}

/// Vessel-wide level. `Unknown` is distinct from `Normal`: it means no
/// zone currently has usable data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FleetLevel {
    Unknown,
    Normal,
    Vigilance,
    Critical,
}

impl From<Level> for FleetLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Normal => FleetLevel::Normal,
            Level::Vigilance => FleetLevel::Vigilance,
            Level::Critical => FleetLevel::Critical,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetStatus {
    pub level: FleetLevel,
    /// Zones per level, each list in configured zone order; empty levels omitted
    pub zones_at_level: BTreeMap<Level, Vec<ZoneId>>,
}

impl FleetStatus {
    pub fn unknown() -> Self {
        Self {
            level: FleetLevel::Unknown,
            zones_at_level: BTreeMap::new(),
        }
    }

    pub fn zones(&self, level: Level) -> &[ZoneId] {
        self.zones_at_level
            .get(&level)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// One-line banner for the presentation layer
    pub fn headline(&self) -> String {
        let names = |level: Level| {
            self.zones(level)
                .iter()
                .map(ZoneId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        match self.level {
            FleetLevel::Critical => {
                format!("Zone(s) en alerte rouge : {}", names(Level::Critical))
            }
            FleetLevel::Vigilance => {
                format!("Zone(s) en vigilance : {}", names(Level::Vigilance))
            }
            FleetLevel::Normal => "Tous les seuils sont sous contrôle".to_string(),
            FleetLevel::Unknown => "Données capteurs indisponibles".to_string(),
        }
    }
}
