use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

mod validation;

pub use validation::{validate_bundle, ReadingError};

/// Named compartment of the vessel (e.g., "Cuisine", "Salle des Machines")
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Measured environmental quantity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollutantKind {
    Co2,
    Voc,
    Temperature,
}

impl PollutantKind {
    pub const ALL: [PollutantKind; 3] = [
        PollutantKind::Co2,
        PollutantKind::Voc,
        PollutantKind::Temperature,
    ];

    /// Descriptive unit, never used for conversion
    pub fn unit(&self) -> &'static str {
        match self {
            PollutantKind::Co2 => "ppm",
            PollutantKind::Voc => "ppb",
            PollutantKind::Temperature => "°C",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PollutantKind::Co2 => "co2",
            PollutantKind::Voc => "voc",
            PollutantKind::Temperature => "temperature",
        }
    }

    /// Resolve a free-form sensor label ("CO2", "COV (ppb)", "Température")
    ///
    /// Matching is a case-insensitive substring test, the same way the
    /// dashboard picked readings out of the pollution feed.
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        if lower.contains("co2") || lower.contains("co₂") {
            Some(PollutantKind::Co2)
        } else if lower.contains("voc") || lower.contains("cov") {
            Some(PollutantKind::Voc)
        } else if lower.contains("temp") {
            Some(PollutantKind::Temperature)
        } else {
            None
        }
    }
}

impl fmt::Display for PollutantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single accepted measurement. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub zone: ZoneId,
    pub pollutant: PollutantKind,
    pub value: f64,
    pub unit: String,
    pub captured_at: DateTime<Utc>,
}

/// Ingress item as delivered by a reading source.
///
/// Field aliases accept the demo pollution feed shape
/// (`nom_station`, `nom_polluant`, `valeur`, `unite`, `seuil_danger`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadingBundle {
    #[serde(alias = "nom_station")]
    pub zone: String,

    /// Pollutant label, resolved with [`PollutantKind::from_label`]
    #[serde(alias = "nom_polluant")]
    pub pollutant: String,

    #[serde(alias = "valeur")]
    pub value: f64,

    #[serde(alias = "unite", default)]
    pub unit: Option<String>,

    /// Inline danger threshold; overrides the table for this tick
    #[serde(alias = "seuil_danger", default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    #[serde(alias = "date_fin", default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

impl ReadingBundle {
    pub fn new(zone: &str, pollutant: PollutantKind, value: f64) -> Self {
        Self {
            zone: zone.to_string(),
            pollutant: pollutant.as_str().to_string(),
            value,
            unit: Some(pollutant.unit().to_string()),
            threshold: None,
            captured_at: None,
        }
    }

    pub fn with_threshold(mut self, danger: f64) -> Self {
        self.threshold = Some(danger);
        self
    }
}

/// A validated bundle: the reading plus its optional inline danger override
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptedReading {
    pub reading: PollutantReading,
    pub inline_danger: Option<f64>,
}
