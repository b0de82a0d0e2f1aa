use super::{FleetLevel, FleetStatus, Level, ZoneStatus};
use std::collections::BTreeMap;

/// Combine zone statuses into the vessel-wide status.
///
/// Statuses must be supplied in configured zone order; that order is kept
/// in every `zones_at_level` list. Always recomputed from scratch.
/// No statuses at all yields `FleetLevel::Unknown`.
pub fn aggregate<'a, I>(statuses: I) -> FleetStatus
where
    I: IntoIterator<Item = &'a ZoneStatus>,
{
    let mut zones_at_level: BTreeMap<Level, Vec<_>> = BTreeMap::new();
    let mut top: Option<Level> = None;

    for status in statuses {
        zones_at_level
            .entry(status.level)
            .or_default()
            .push(status.zone.clone());
        top = top.max(Some(status.level));
    }

    match top {
        Some(level) => FleetStatus {
            level: FleetLevel::from(level),
            zones_at_level,
        },
        None => FleetStatus::unknown(),
    }
}
