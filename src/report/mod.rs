use crate::history::HistoryBuffer;
use crate::reading::{PollutantKind, ZoneId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Fixed report limits. Independent of the threshold table; a row is
/// flagged when any value is strictly above its limit.
pub const REPORT_CO2_LIMIT: f64 = 1000.0;
pub const REPORT_VOC_LIMIT: f64 = 250.0;
pub const REPORT_TEMPERATURE_LIMIT: f64 = 40.0;

pub const REPORT_TITLE: &str = "SHIP AIR GUARD - RAPPORT DE SÉCURITÉ";

/// One table row of the safety report: every sample of one zone sharing a
/// capture time. A pollutant absent at that time is `None`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportRow {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub co2: Option<f64>,
    pub voc: Option<f64>,
    pub temperature: Option<f64>,
    pub danger: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SafetyReport {
    pub title: String,
    pub zone: ZoneId,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
    pub danger_rows: usize,
}

/// Per-row OR across pollutants
pub fn is_danger_row(co2: f64, voc: f64, temperature: f64) -> bool {
    co2 > REPORT_CO2_LIMIT || voc > REPORT_VOC_LIMIT || temperature > REPORT_TEMPERATURE_LIMIT
}

/// Build the report for one zone from its three history windows.
///
/// Rows are keyed by sample timestamp (oldest first), never by position in
/// the windows, which drift apart after an incomplete tick. A missing
/// value counts as 0 for the danger test only. CO2 and VOC are rounded to
/// integers, temperature to one decimal, after the danger test.
pub fn build_report(history: &HistoryBuffer, zone: &ZoneId, generated_at: DateTime<Utc>) -> SafetyReport {
    let mut by_time: BTreeMap<DateTime<Utc>, [Option<f64>; 3]> = BTreeMap::new();

    for (slot, pollutant) in PollutantKind::ALL.into_iter().enumerate() {
        for sample in history.window(zone, pollutant) {
            by_time.entry(sample.timestamp).or_default()[slot] = Some(sample.value);
        }
    }

    let rows: Vec<ReportRow> = by_time
        .into_iter()
        .enumerate()
        .map(|(index, (timestamp, [co2, voc, temperature]))| ReportRow {
            index,
            timestamp,
            danger: is_danger_row(
                co2.unwrap_or(0.0),
                voc.unwrap_or(0.0),
                temperature.unwrap_or(0.0),
            ),
            co2: co2.map(f64::round),
            voc: voc.map(f64::round),
            temperature: temperature.map(|t| (t * 10.0).round() / 10.0),
        })
        .collect();

    let danger_rows = rows.iter().filter(|r| r.danger).count();

    SafetyReport {
        title: REPORT_TITLE.to_string(),
        zone: zone.clone(),
        generated_at,
        rows,
        danger_rows,
    }
}
