use crate::reading::{PollutantKind, ZoneId};
use crate::threshold::{ThresholdConfig, ThresholdTable};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Complete Ship Air Guard configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AirGuardConfig {
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// Monitored zones, in display order
    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneConfig>,
    #[serde(default = "default_thresholds")]
    pub thresholds: ThresholdConfig,
}

/// Sampling tick configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SamplerConfig {
    /// Delay between two evaluation ticks (milliseconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    3000
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Points kept per (zone, pollutant) window
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    crate::history::DEFAULT_CAPACITY
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Synthetic,
    Http,
}

/// Reading source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,
    /// Feed URL (required for `http`)
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Fixed seed for the synthetic generator (random when absent)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_source_kind() -> SourceKind {
    SourceKind::Synthetic
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            url: None,
            timeout_seconds: default_timeout_seconds(),
            seed: None,
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Bearer token required for PUT /api/admin/thresholds. None = unrestricted.
    #[serde(default)]
    pub admin_token: Option<String>,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            admin_token: None,
        }
    }
}

/// One monitored zone and the pollutants it is expected to report each tick
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneConfig {
    pub name: ZoneId,
    #[serde(default = "default_pollutants")]
    pub pollutants: Vec<PollutantKind>,
}

impl ZoneConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: ZoneId::from(name),
            pollutants: default_pollutants(),
        }
    }
}

fn default_pollutants() -> Vec<PollutantKind> {
    PollutantKind::ALL.to_vec()
}

fn default_zones() -> Vec<ZoneConfig> {
    ["Cuisine", "Cabine", "Salle des Machines"]
        .into_iter()
        .map(ZoneConfig::new)
        .collect()
}

fn default_thresholds() -> ThresholdConfig {
    ThresholdTable::canonical().to_config()
}

impl Default for AirGuardConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            history: HistoryConfig::default(),
            source: SourceConfig::default(),
            api: ApiConfig::default(),
            zones: default_zones(),
            thresholds: default_thresholds(),
        }
    }
}

impl AirGuardConfig {
    /// Apply `AIRGUARD_*` environment overrides. Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("AIRGUARD_BIND") {
            self.api.bind = v;
        }
        if let Ok(v) = std::env::var("AIRGUARD_ADMIN_TOKEN") {
            self.api.admin_token = Some(v);
        }
        if let Ok(v) = std::env::var("AIRGUARD_SAMPLE_INTERVAL_MS") {
            if let Ok(n) = v.parse::<u64>() {
                self.sampler.interval_ms = n;
            }
        }
        if let Ok(v) = std::env::var("AIRGUARD_SOURCE_URL") {
            self.source.kind = SourceKind::Http;
            self.source.url = Some(v);
        }
    }

    /// Check the configuration and build the threshold table.
    ///
    /// Any error here is fatal: the service cannot run without a valid
    /// threshold configuration.
    pub fn validate(&self) -> Result<ThresholdTable> {
        if self.zones.is_empty() {
            bail!("at least one zone must be configured");
        }

        let mut seen = HashSet::new();
        for zone in &self.zones {
            if zone.name.as_str().trim().is_empty() {
                bail!("zone names must not be empty");
            }
            if !seen.insert(zone.name.clone()) {
                bail!("zone '{}' is configured twice", zone.name);
            }
            if zone.pollutants.is_empty() {
                bail!("zone '{}' has no pollutants", zone.name);
            }
        }

        if self.sampler.interval_ms == 0 {
            bail!("sampler.interval_ms must be positive");
        }

        if self.history.capacity == 0 {
            bail!("history.capacity must be positive");
        }

        if self.source.kind == SourceKind::Http && self.source.url.is_none() {
            bail!("source.url is required for the http source");
        }

        let table = ThresholdTable::from_config(&self.thresholds)
            .context("invalid threshold table")?;

        // Every expected (zone, pollutant) should be evaluable
        for zone in &self.zones {
            for pollutant in &zone.pollutants {
                if table.lookup(&zone.name, *pollutant).is_err() {
                    warn!(
                        zone = %zone.name,
                        pollutant = %pollutant,
                        "No threshold configured; readings will not be evaluated"
                    );
                }
            }
        }

        Ok(table)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<AirGuardConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: AirGuardConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Load `AIRGUARD_CONFIG` (default `airguard.toml`), falling back to
/// defaults when the file does not exist, then apply env overrides.
pub fn load_from_env() -> Result<AirGuardConfig> {
    let path = std::env::var("AIRGUARD_CONFIG").unwrap_or_else(|_| "airguard.toml".into());

    let mut config = if Path::new(&path).exists() {
        info!(path = %path, "Loading configuration");
        load_config(&path)?
    } else {
        info!(path = %path, "No configuration file, using defaults");
        AirGuardConfig::default()
    };

    config.apply_env();
    Ok(config)
}
