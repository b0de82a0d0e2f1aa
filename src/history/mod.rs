//! Rolling per-(zone, pollutant) history.
//!
//! Each key owns a FIFO window of at most `capacity` samples, oldest first.
//! Windows only grow by appending the newest sample; once full, every
//! append evicts the oldest one. Scrub reads (`value_at`) never mutate the
//! buffer, so a consumer paused on an index does not hold back ingestion.

use crate::reading::{PollutantKind, ZoneId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};


/// Points kept per window when nothing else is configured (dashboard chart width)
pub const DEFAULT_CAPACITY: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Fixed-capacity FIFO window
#[derive(Clone, Debug)]
pub struct HistoryWindow {
    capacity: usize,
    samples: VecDeque<HistorySample>,
}

impl HistoryWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: HistorySample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index 0 is the oldest sample
    pub fn get(&self, index: usize) -> Option<HistorySample> {
        self.samples.get(index).copied()
    }

    pub fn latest(&self) -> Option<HistorySample> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<HistorySample> {
        self.samples.iter().copied().collect()
    }
}

/// All history windows, keyed explicitly by (zone, pollutant)
#[derive(Clone, Debug)]
pub struct HistoryBuffer {
    capacity: usize,
    windows: HashMap<(ZoneId, PollutantKind), HistoryWindow>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn append(
        &mut self,
        zone: &ZoneId,
        pollutant: PollutantKind,
        timestamp: DateTime<Utc>,
        value: f64,
    ) {
        let capacity = self.capacity;
        self.windows
            .entry((zone.clone(), pollutant))
            .or_insert_with(|| HistoryWindow::new(capacity))
            .push(HistorySample { timestamp, value });
    }

    /// Oldest → newest; empty for a key that never received a sample
    pub fn window(&self, zone: &ZoneId, pollutant: PollutantKind) -> Vec<HistorySample> {
        self.windows
            .get(&(zone.clone(), pollutant))
            .map(HistoryWindow::to_vec)
            .unwrap_or_default()
    }

    /// Scrub read: the sample at `index` (0 = oldest) as of now
    pub fn value_at(
        &self,
        zone: &ZoneId,
        pollutant: PollutantKind,
        index: usize,
    ) -> Option<HistorySample> {
        self.windows
            .get(&(zone.clone(), pollutant))
            .and_then(|w| w.get(index))
    }

    pub fn latest(&self, zone: &ZoneId, pollutant: PollutantKind) -> Option<HistorySample> {
        self.windows
            .get(&(zone.clone(), pollutant))
            .and_then(HistoryWindow::latest)
    }

    pub fn len(&self, zone: &ZoneId, pollutant: PollutantKind) -> usize {
        self.windows
            .get(&(zone.clone(), pollutant))
            .map_or(0, HistoryWindow::len)
    }

    /// Keys with at least one sample, sorted by zone then pollutant
    pub fn keys(&self) -> Vec<(ZoneId, PollutantKind)> {
        let mut keys: Vec<_> = self.windows.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
