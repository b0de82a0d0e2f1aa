// Monitoring engine, per-tick snapshots and the sampling loop

mod engine;
mod sampler;
mod snapshot;

pub use engine::{MonitorEngine, TickInput};
pub use sampler::run_sampler;
pub use snapshot::{Freshness, ReadingReport, Snapshot, ZoneReport};

#[cfg(test)]
mod tests;
