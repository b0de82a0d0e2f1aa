use super::ReadingSource;
use crate::config::ZoneConfig;
use crate::reading::{PollutantKind, ReadingBundle, ZoneId};
use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Mutex;

/// Random-walk stand-in for real instruments.
///
/// Each (zone, pollutant) starts from a plausible indoor value and drifts
/// by up to ±1.5 % of its range per tick, clamped to the instrument range
/// and rounded to one decimal.
pub struct SyntheticSource {
    zones: Vec<ZoneConfig>,
    state: Mutex<WalkState>,
}

struct WalkState {
    rng: StdRng,
    values: HashMap<(ZoneId, PollutantKind), f64>,
}

/// Instrument range (min, max)
fn range(pollutant: PollutantKind) -> (f64, f64) {
    match pollutant {
        PollutantKind::Co2 | PollutantKind::Voc => (0.0, 2000.0),
        PollutantKind::Temperature => (0.0, 50.0),
    }
}

fn starting_value(pollutant: PollutantKind) -> f64 {
    match pollutant {
        PollutantKind::Co2 => 600.0,
        PollutantKind::Voc => 80.0,
        PollutantKind::Temperature => 24.0,
    }
}

impl SyntheticSource {
    pub fn new(zones: &[ZoneConfig], seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            zones: zones.to_vec(),
            state: Mutex::new(WalkState {
                rng,
                values: HashMap::new(),
            }),
        }
    }

    /// Advance every walk one step and return the new values
    fn step(&self) -> Vec<ReadingBundle> {
        let mut state = self.state.lock().expect("synthetic source lock poisoned");
        let WalkState { rng, values } = &mut *state;

        let mut bundles = Vec::new();
        for zone in &self.zones {
            for &pollutant in &zone.pollutants {
                let (min, max) = range(pollutant);
                let noise = (rng.gen::<f64>() - 0.5) * ((max - min) * 0.03);

                let value = values
                    .entry((zone.name.clone(), pollutant))
                    .or_insert_with(|| starting_value(pollutant));
                *value = (*value + noise).clamp(min, max);
                let rounded = (*value * 10.0).round() / 10.0;

                bundles.push(ReadingBundle::new(zone.name.as_str(), pollutant, rounded));
            }
        }
        bundles
    }
}

#[async_trait]
impl ReadingSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn fetch(&self) -> Result<Vec<ReadingBundle>> {
        Ok(self.step())
    }
}
