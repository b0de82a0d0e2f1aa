use crate::source::ReadingSource;
use crate::state::{MonitorEngine, TickInput};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Drive the engine at a fixed cadence until `shutdown` flips to true.
///
/// Each tick first fetches a batch from the source (the only await point),
/// then applies it synchronously. A fetch that outlives the interval simply
/// delays the next tick; ticks never overlap. Shutdown abandons an
/// in-flight fetch.
pub async fn run_sampler(
    engine: Arc<MonitorEngine>,
    source: Arc<dyn ReadingSource>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);

    // Skip missed ticks to prevent backlog when the source is slow
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(source = source.name(), period_ms = period.as_millis() as u64, "Sampler started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A slow fetch must not hold back shutdown
                let fetched = tokio::select! {
                    result = source.fetch() => result,
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                        continue;
                    }
                };

                let input = match fetched {
                    Ok(batch) => TickInput::Batch(batch),
                    Err(e) => {
                        warn!(source = source.name(), error = %e, "Fetch failed");
                        TickInput::Unavailable(e.to_string())
                    }
                };
                engine.apply_tick(input, Utc::now());
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("Sampler stopped");
}
