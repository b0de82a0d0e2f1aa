use super::{Level, ZoneStatus};
use crate::reading::{AcceptedReading, PollutantKind, ZoneId};
use crate::threshold::{ThresholdError, ThresholdPair, ThresholdTable};
use std::collections::BTreeSet;

/// A reading paired with the threshold it is judged against
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedReading {
    pub pollutant: PollutantKind,
    pub value: f64,
    pub threshold: ThresholdPair,
}

impl ResolvedReading {
    pub fn level(&self) -> Level {
        classify(self.value, &self.threshold)
    }
}

/// Result of evaluating one zone's batch
#[derive(Clone, Debug, Default)]
pub struct ZoneEvaluation {
    /// `None` when no reading could be evaluated
    pub status: Option<ZoneStatus>,
    pub resolved: Vec<ResolvedReading>,
    /// Readings dropped because their thresholds are not configured
    pub rejected: Vec<ThresholdError>,
}

/// Boundaries are inclusive: `v == danger` is Critical, `v == warning` is Vigilance.
pub fn classify(value: f64, threshold: &ThresholdPair) -> Level {
    if value >= threshold.danger {
        Level::Critical
    } else if value >= threshold.warning {
        Level::Vigilance
    } else {
        Level::Normal
    }
}

/// Zone level is the max over its readings; breached pollutants are the
/// ones classified exactly at that level.
pub fn zone_status(zone: &ZoneId, readings: &[ResolvedReading]) -> Option<ZoneStatus> {
    let level = readings.iter().map(ResolvedReading::level).max()?;

    let breached_pollutants: BTreeSet<PollutantKind> = if level == Level::Normal {
        BTreeSet::new()
    } else {
        readings
            .iter()
            .filter(|r| r.level() == level)
            .map(|r| r.pollutant)
            .collect()
    };

    Some(ZoneStatus {
        zone: zone.clone(),
        level,
        breached_pollutants,
    })
}

/// Resolve thresholds for a zone's readings and derive its status.
///
/// Readings without a configured threshold are set aside in `rejected`;
/// the status is computed from whatever remains.
pub fn evaluate_zone(
    zone: &ZoneId,
    readings: &[AcceptedReading],
    table: &ThresholdTable,
) -> ZoneEvaluation {
    let mut resolved = Vec::with_capacity(readings.len());
    let mut rejected = Vec::new();

    for accepted in readings {
        let reading = &accepted.reading;
        match table.resolve(zone, reading.pollutant, accepted.inline_danger) {
            Ok(threshold) => resolved.push(ResolvedReading {
                pollutant: reading.pollutant,
                value: reading.value,
                threshold,
            }),
            Err(e) => rejected.push(e),
        }
    }

    ZoneEvaluation {
        status: zone_status(zone, &resolved),
        resolved,
        rejected,
    }
}
