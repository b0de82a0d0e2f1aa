use crate::config::ZoneConfig;
use crate::history::{HistoryBuffer, HistorySample};
use crate::reading::{validate_bundle, AcceptedReading, PollutantKind, ReadingBundle, ZoneId};
use crate::report::{build_report, SafetyReport};
use crate::state::snapshot::{Freshness, ReadingReport, Snapshot, ZoneReport};
use crate::status::{aggregate, evaluate_zone, FleetStatus, ResolvedReading, ZoneStatus};
use crate::threshold::{SharedThresholds, ThresholdError};
use crate::ventilation::fan_speed_for;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What the sampler obtained from the reading source for one tick
#[derive(Clone, Debug)]
pub enum TickInput {
    Batch(Vec<ReadingBundle>),
    /// Source failed (network/database); carries the reason for logs
    Unavailable(String),
}

/// Evaluation state of one configured zone
#[derive(Clone, Debug)]
struct ZoneState {
    zone: ZoneId,
    expected: Vec<PollutantKind>,
    status: Option<ZoneStatus>,
    freshness: Freshness,
    readings: BTreeMap<PollutantKind, (AcceptedReading, ResolvedReading)>,
    unconfigured: Vec<PollutantKind>,
    last_evaluated: Option<DateTime<Utc>>,
}

impl ZoneState {
    fn new(config: &ZoneConfig) -> Self {
        Self {
            zone: config.name.clone(),
            expected: config.pollutants.clone(),
            status: None,
            freshness: Freshness::Unavailable,
            readings: BTreeMap::new(),
            unconfigured: Vec::new(),
            last_evaluated: None,
        }
    }

    fn is_complete(&self, batch: &[AcceptedReading]) -> bool {
        self.expected
            .iter()
            .all(|p| batch.iter().any(|r| r.reading.pollutant == *p))
    }

    fn report(&self) -> ZoneReport {
        ZoneReport {
            zone: self.zone.clone(),
            status: self.status.clone(),
            freshness: self.freshness,
            readings: self
                .readings
                .values()
                .map(|(accepted, resolved)| ReadingReport {
                    pollutant: resolved.pollutant,
                    value: resolved.value,
                    unit: accepted.reading.unit.clone(),
                    warning: resolved.threshold.warning,
                    danger: resolved.threshold.danger,
                    level: resolved.level(),
                    captured_at: accepted.reading.captured_at,
                })
                .collect(),
            unconfigured: self.unconfigured.clone(),
            last_evaluated: self.last_evaluated,
        }
    }
}

/// Everything mutated by a tick. Only ever touched under one lock, so a
/// tick is applied as a whole or not at all from an observer's view.
struct SystemState {
    tick: u64,
    zones: Vec<ZoneState>,
    history: HistoryBuffer,
}

/// Monitoring engine: ingests reading batches, evaluates zones, aggregates
/// the fleet, drives ventilation and keeps history.
pub struct MonitorEngine {
    state: Mutex<SystemState>,

    /// Last published snapshot, for polling consumers
    latest: RwLock<Snapshot>,

    thresholds: SharedThresholds,

    /// Broadcast channel for per-tick snapshots
    snapshot_tx: broadcast::Sender<Snapshot>,
}

impl MonitorEngine {
    pub fn new(zones: &[ZoneConfig], thresholds: SharedThresholds, history_capacity: usize) -> Self {
        let (snapshot_tx, _) = broadcast::channel(64);

        let state = SystemState {
            tick: 0,
            zones: zones.iter().map(ZoneState::new).collect(),
            history: HistoryBuffer::new(history_capacity),
        };

        let initial = Snapshot {
            tick: 0,
            tick_id: Uuid::now_v7().to_string(),
            taken_at: Utc::now(),
            fleet: FleetStatus::unknown(),
            headline: FleetStatus::unknown().headline(),
            zones: state.zones.iter().map(ZoneState::report).collect(),
            fan_speed: 0,
        };

        Self {
            state: Mutex::new(state),
            latest: RwLock::new(initial),
            thresholds,
            snapshot_tx,
        }
    }

    pub fn thresholds(&self) -> &SharedThresholds {
        &self.thresholds
    }

    /// Subscribe to per-tick snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.latest.read().expect("snapshot lock poisoned").clone()
    }

    pub fn zone_report(&self, zone: &ZoneId) -> Option<ZoneReport> {
        self.snapshot().zone(zone).cloned()
    }

    pub fn zones(&self) -> Vec<ZoneId> {
        let state = self.state.lock().expect("system state lock poisoned");
        state.zones.iter().map(|z| z.zone.clone()).collect()
    }

    pub fn history_window(&self, zone: &ZoneId, pollutant: PollutantKind) -> Vec<HistorySample> {
        let state = self.state.lock().expect("system state lock poisoned");
        state.history.window(zone, pollutant)
    }

    /// Scrub read; never pauses or alters ingestion
    pub fn history_value_at(
        &self,
        zone: &ZoneId,
        pollutant: PollutantKind,
        index: usize,
    ) -> Option<HistorySample> {
        let state = self.state.lock().expect("system state lock poisoned");
        state.history.value_at(zone, pollutant, index)
    }

    pub fn history_capacity(&self) -> usize {
        let state = self.state.lock().expect("system state lock poisoned");
        state.history.capacity()
    }

    pub fn report(&self, zone: &ZoneId) -> SafetyReport {
        let state = self.state.lock().expect("system state lock poisoned");
        build_report(&state.history, zone, Utc::now())
    }

    /// Apply one tick synchronously and publish the resulting snapshot.
    ///
    /// The whole evaluation runs under the state lock against a single
    /// threshold table, so no zone can reflect tick N while another still
    /// reflects tick N-1.
    pub fn apply_tick(&self, input: TickInput, now: DateTime<Utc>) -> Snapshot {
        let table = self.thresholds.current();

        let mut state = self.state.lock().expect("system state lock poisoned");
        state.tick += 1;

        match input {
            TickInput::Unavailable(reason) => {
                warn!(tick = state.tick, reason = %reason, "Reading source unavailable, carrying previous state");
                for zone in &mut state.zones {
                    zone.freshness = Freshness::Unavailable;
                }
            }
            TickInput::Batch(bundles) => {
                let mut batches = group_by_zone(&bundles, now);
                let SystemState { zones, history, .. } = &mut *state;

                for zone in zones.iter_mut() {
                    let Some(batch) = batches.remove(&zone.zone) else {
                        debug!(zone = %zone.zone, "No readings for zone this tick");
                        zone.freshness = Freshness::Unavailable;
                        continue;
                    };

                    for accepted in &batch {
                        let r = &accepted.reading;
                        history.append(&r.zone, r.pollutant, r.captured_at, r.value);
                    }

                    if !zone.is_complete(&batch) {
                        warn!(zone = %zone.zone, received = batch.len(), "Incomplete batch, keeping previous status");
                        zone.freshness = Freshness::Incomplete;
                        continue;
                    }

                    let evaluation = evaluate_zone(&zone.zone, &batch, &table);
                    let mut unconfigured = Vec::new();
                    for err in &evaluation.rejected {
                        warn!(error = %err, "Reading not evaluated");
                        if let ThresholdError::Unconfigured { pollutant, .. } = err {
                            unconfigured.push(*pollutant);
                        }
                    }

                    zone.readings = batch
                        .into_iter()
                        .filter_map(|accepted| {
                            let pollutant = accepted.reading.pollutant;
                            evaluation
                                .resolved
                                .iter()
                                .find(|r| r.pollutant == pollutant)
                                .map(|resolved| (pollutant, (accepted, *resolved)))
                        })
                        .collect();
                    zone.status = evaluation.status;
                    zone.unconfigured = unconfigured;
                    zone.freshness = Freshness::Fresh;
                    zone.last_evaluated = Some(now);
                }

                for (zone, readings) in batches {
                    warn!(zone = %zone, count = readings.len(), "Readings for unconfigured zone ignored");
                }
            }
        }

        let fleet = if state
            .zones
            .iter()
            .all(|z| z.freshness == Freshness::Unavailable)
        {
            FleetStatus::unknown()
        } else {
            aggregate(state.zones.iter().filter_map(|z| z.status.as_ref()))
        };

        let fan_speed = fan_speed_for(
            state
                .zones
                .iter()
                .flat_map(|z| z.readings.values().map(|(_, resolved)| resolved)),
        );

        let snapshot = Snapshot {
            tick: state.tick,
            tick_id: Uuid::now_v7().to_string(),
            taken_at: now,
            headline: fleet.headline(),
            fleet,
            zones: state.zones.iter().map(ZoneState::report).collect(),
            fan_speed,
        };

        *self.latest.write().expect("snapshot lock poisoned") = snapshot.clone();
        drop(state);

        info!(
            tick = snapshot.tick,
            fleet = ?snapshot.fleet.level,
            fan_speed = snapshot.fan_speed,
            "Tick evaluated"
        );

        // No subscribers is fine
        let _ = self.snapshot_tx.send(snapshot.clone());

        snapshot
    }
}

/// Validate bundles and group them per zone, keeping the last reading of
/// each pollutant when a zone reports one twice.
fn group_by_zone(
    bundles: &[ReadingBundle],
    now: DateTime<Utc>,
) -> HashMap<ZoneId, Vec<AcceptedReading>> {
    let mut grouped: HashMap<ZoneId, Vec<AcceptedReading>> = HashMap::new();

    for bundle in bundles {
        match validate_bundle(bundle, now) {
            Ok(accepted) => {
                let readings = grouped.entry(accepted.reading.zone.clone()).or_default();
                readings.retain(|r| r.reading.pollutant != accepted.reading.pollutant);
                readings.push(accepted);
            }
            Err(e) => {
                warn!(error = %e, zone = %bundle.zone, "Invalid reading discarded");
            }
        }
    }

    grouped
}
