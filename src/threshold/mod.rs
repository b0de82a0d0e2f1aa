use crate::reading::{PollutantKind, ZoneId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock};


/// Warning ratio applied when an inline danger threshold has no usable
/// warning counterpart (800 / 1000 on the canonical CO2 pair).
pub const INLINE_WARNING_RATIO: f64 = 0.8;

/// Warning/danger limits for one (zone, pollutant). Invariant: warning < danger, danger > 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub warning: f64,
    pub danger: f64,
}

impl ThresholdPair {
    pub fn new(warning: f64, danger: f64) -> Result<Self, ThresholdError> {
        let pair = Self { warning, danger };
        if pair.is_valid() {
            Ok(pair)
        } else {
            Err(ThresholdError::InvalidPair {
                scope: "pair".to_string(),
                warning,
                danger,
            })
        }
    }

    fn is_valid(&self) -> bool {
        self.warning.is_finite()
            && self.danger.is_finite()
            && self.danger > 0.0
            && self.warning < self.danger
    }
}

/// Threshold configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdError {
    /// No entry for this (zone, pollutant); the reading cannot be evaluated
    Unconfigured {
        zone: ZoneId,
        pollutant: PollutantKind,
    },
    InvalidPair {
        scope: String,
        warning: f64,
        danger: f64,
    },
    UnknownPollutant(String),
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdError::Unconfigured { zone, pollutant } => {
                write!(f, "no threshold configured for {} / {}", zone, pollutant)
            }
            ThresholdError::InvalidPair {
                scope,
                warning,
                danger,
            } => write!(
                f,
                "invalid threshold for {}: warning {} must be below danger {}",
                scope, warning, danger
            ),
            ThresholdError::UnknownPollutant(label) => {
                write!(f, "unknown pollutant '{}' in threshold table", label)
            }
        }
    }
}

impl std::error::Error for ThresholdError {}

/// Serializable form of the table, as written in the config file and
/// exchanged through the admin API.
///
/// ```toml
/// [thresholds.defaults]
/// co2 = { warning = 800.0, danger = 1000.0 }
///
/// [thresholds.zones."Salle des Machines"]
/// temperature = { warning = 40.0, danger = 45.0 }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default)]
    pub defaults: BTreeMap<String, ThresholdPair>,
    #[serde(default)]
    pub zones: BTreeMap<String, BTreeMap<String, ThresholdPair>>,
}

/// Static lookup table. Built once, never mutated; reconfiguration builds
/// a new table and swaps it in through [`SharedThresholds`].
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdTable {
    defaults: BTreeMap<PollutantKind, ThresholdPair>,
    zones: HashMap<ZoneId, BTreeMap<PollutantKind, ThresholdPair>>,
}

impl ThresholdTable {
    /// Empty table: every lookup is a configuration error
    pub fn empty() -> Self {
        Self {
            defaults: BTreeMap::new(),
            zones: HashMap::new(),
        }
    }

    /// Canonical vessel-wide limits (CO2 ppm, VOC ppb, temperature °C)
    pub fn canonical() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert(
            PollutantKind::Co2,
            ThresholdPair {
                warning: 800.0,
                danger: 1000.0,
            },
        );
        defaults.insert(
            PollutantKind::Voc,
            ThresholdPair {
                warning: 150.0,
                danger: 250.0,
            },
        );
        defaults.insert(
            PollutantKind::Temperature,
            ThresholdPair {
                warning: 35.0,
                danger: 38.0,
            },
        );
        Self {
            defaults,
            zones: HashMap::new(),
        }
    }

    /// Build and validate a table. Any invalid pair rejects the whole table.
    pub fn from_config(config: &ThresholdConfig) -> Result<Self, ThresholdError> {
        let mut table = Self::empty();

        for (label, pair) in &config.defaults {
            let pollutant = parse_pollutant(label)?;
            check_pair(pair, || format!("default {}", pollutant))?;
            table.defaults.insert(pollutant, *pair);
        }

        for (zone, entries) in &config.zones {
            let zone_id = ZoneId::new(zone.as_str());
            let mut limits = BTreeMap::new();
            for (label, pair) in entries {
                let pollutant = parse_pollutant(label)?;
                check_pair(pair, || format!("{} / {}", zone, pollutant))?;
                limits.insert(pollutant, *pair);
            }
            table.zones.insert(zone_id, limits);
        }

        Ok(table)
    }

    pub fn to_config(&self) -> ThresholdConfig {
        let defaults = self
            .defaults
            .iter()
            .map(|(p, pair)| (p.as_str().to_string(), *pair))
            .collect();
        let zones = self
            .zones
            .iter()
            .map(|(zone, limits)| {
                let entries = limits
                    .iter()
                    .map(|(p, pair)| (p.as_str().to_string(), *pair))
                    .collect();
                (zone.to_string(), entries)
            })
            .collect();
        ThresholdConfig { defaults, zones }
    }

    /// Zone-specific entry first, then the vessel-wide default
    pub fn lookup(
        &self,
        zone: &ZoneId,
        pollutant: PollutantKind,
    ) -> Result<ThresholdPair, ThresholdError> {
        self.zones
            .get(zone)
            .and_then(|limits| limits.get(&pollutant))
            .or_else(|| self.defaults.get(&pollutant))
            .copied()
            .ok_or_else(|| ThresholdError::Unconfigured {
                zone: zone.clone(),
                pollutant,
            })
    }

    /// Resolve the pair used for one reading, honouring an inline danger
    /// threshold supplied by the source for this tick.
    ///
    /// The table's warning is kept while it stays below the inline danger;
    /// otherwise warning becomes `INLINE_WARNING_RATIO * danger`.
    pub fn resolve(
        &self,
        zone: &ZoneId,
        pollutant: PollutantKind,
        inline_danger: Option<f64>,
    ) -> Result<ThresholdPair, ThresholdError> {
        let Some(danger) = inline_danger else {
            return self.lookup(zone, pollutant);
        };

        let warning = match self.lookup(zone, pollutant) {
            Ok(pair) if pair.warning < danger => pair.warning,
            _ => danger * INLINE_WARNING_RATIO,
        };

        Ok(ThresholdPair { warning, danger })
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::canonical()
    }
}

fn parse_pollutant(label: &str) -> Result<PollutantKind, ThresholdError> {
    PollutantKind::from_label(label).ok_or_else(|| ThresholdError::UnknownPollutant(label.to_string()))
}

fn check_pair(pair: &ThresholdPair, scope: impl FnOnce() -> String) -> Result<(), ThresholdError> {
    if pair.is_valid() {
        Ok(())
    } else {
        Err(ThresholdError::InvalidPair {
            scope: scope(),
            warning: pair.warning,
            danger: pair.danger,
        })
    }
}

/// Atomically swappable handle to the active table.
///
/// Readers take one `Arc` per tick, so an evaluation never sees a
/// half-replaced table.
#[derive(Clone, Debug)]
pub struct SharedThresholds {
    inner: Arc<RwLock<Arc<ThresholdTable>>>,
}

impl SharedThresholds {
    pub fn new(table: ThresholdTable) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    pub fn current(&self) -> Arc<ThresholdTable> {
        self.inner
            .read()
            .expect("threshold table lock poisoned")
            .clone()
    }

    /// Swap in a whole new table; returns the previous one
    pub fn replace(&self, table: ThresholdTable) -> Arc<ThresholdTable> {
        let mut guard = self.inner.write().expect("threshold table lock poisoned");
        std::mem::replace(&mut *guard, Arc::new(table))
    }
}

impl Default for SharedThresholds {
    fn default() -> Self {
        Self::new(ThresholdTable::canonical())
    }
}
