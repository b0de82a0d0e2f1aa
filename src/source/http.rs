use super::ReadingSource;
use crate::reading::ReadingBundle;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Response body of the pollution feed: either a bare array or wrapped
/// in `{ "data": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeedPayload {
    List(Vec<ReadingBundle>),
    Wrapped { data: Vec<ReadingBundle> },
}

impl FeedPayload {
    fn into_bundles(self) -> Vec<ReadingBundle> {
        match self {
            FeedPayload::List(items) | FeedPayload::Wrapped { data: items } => items,
        }
    }
}

/// Polls a JSON endpoint serving per-sensor readings
pub struct HttpSource {
    url: String,
    http_client: Client,
}

impl HttpSource {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent("airguard/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { url, http_client })
    }
}

#[async_trait]
impl ReadingSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> Result<Vec<ReadingBundle>> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to reach reading feed {}", self.url))?
            .error_for_status()
            .context("Reading feed returned an error status")?;

        let payload: FeedPayload = response
            .json()
            .await
            .context("Failed to parse reading feed")?;

        let bundles = payload.into_bundles();
        debug!(count = bundles.len(), url = %self.url, "Fetched readings");
        Ok(bundles)
    }
}
