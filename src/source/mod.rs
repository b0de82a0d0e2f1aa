//! Reading sources.
//!
//! A source delivers one batch of [`ReadingBundle`]s per tick. It is the
//! only component allowed to do I/O; the engine calls it in isolation and
//! hands the resulting value snapshot to the synchronous evaluation.

mod http;
mod synthetic;

pub use http::HttpSource;
pub use synthetic::SyntheticSource;

use crate::config::{AirGuardConfig, SourceKind};
use crate::reading::ReadingBundle;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Per-tick reading provider (sensor feed, third-party API, simulator).
///
/// `fetch` returning `Err` means the source is unavailable for this tick;
/// the engine then skips evaluation instead of fabricating values. A
/// partial batch is returned as `Ok` and detected per zone downstream.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<ReadingBundle>>;
}

/// Build the source selected in configuration
pub fn from_config(config: &AirGuardConfig) -> Result<Arc<dyn ReadingSource>> {
    match config.source.kind {
        SourceKind::Synthetic => Ok(Arc::new(SyntheticSource::new(
            &config.zones,
            config.source.seed,
        ))),
        SourceKind::Http => {
            let url = config
                .source
                .url
                .clone()
                .context("source.url is required for the http source")?;
            let source =
                HttpSource::new(url, Duration::from_secs(config.source.timeout_seconds))?;
            Ok(Arc::new(source))
        }
    }
}
