use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::Config;

use super::{EventSource, RawEventRecord, RawLocationRecord};

pub const DEFAULT_BASE_URL: &str = "https://data.cityofnewyork.us/resource";

/// NYC Parks events listing.
const EVENTS_DATASET: &str = "fudw-fgrp";
/// NYC Parks event locations, keyed by event id.
const LOCATIONS_DATASET: &str = "cpcm-i88g";

const PAGE_LIMIT: u32 = 100;

/// Socrata client for the NYC Parks datasets.
#[derive(Debug, Clone)]
pub struct NycOpenDataClient {
    base_url: String,
    app_token: Option<String>,
    http: Client,
}

impl NycOpenDataClient {
    pub fn new(base_url: Option<String>, app_token: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            app_token,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.open_data.base_url.clone().filter(|u| !u.is_empty()),
            config.open_data_app_token().map(str::to_owned),
        )
    }

    fn dataset_url(&self, dataset: &str) -> String {
        format!("{}/{dataset}.json", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_dataset<T: DeserializeOwned>(&self, dataset: &str) -> Result<Vec<T>> {
        let url = self.dataset_url(dataset);

        let mut req = self
            .http
            .get(&url)
            .query(&[("$limit", PAGE_LIMIT.to_string())]);
        if let Some(token) = &self.app_token {
            req = req.header("X-App-Token", token);
        }

        let res = req
            .send()
            .await
            .with_context(|| format!("Failed to send request to NYC Open Data ({dataset})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read NYC Open Data response body ({dataset})"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "NYC Open Data request for {dataset} failed with status {status}"
            ));
        }

        let rows = parse_rows(&body, dataset)?;
        debug!(dataset, rows = rows.len(), "NYC Open Data rows fetched");

        Ok(rows)
    }
}

/// Decode a Socrata array row by row. Rows that do not fit `T` are skipped
/// so one bad record cannot sink the whole dataset.
fn parse_rows<T: DeserializeOwned>(body: &str, dataset: &str) -> Result<Vec<T>> {
    let raw: Vec<Value> = serde_json::from_str(body)
        .with_context(|| format!("Failed to parse NYC Open Data JSON ({dataset})"))?;

    let total = raw.len();
    let rows: Vec<T> = raw
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();

    if rows.len() < total {
        warn!(dataset, skipped = total - rows.len(), "skipping malformed NYC Open Data rows");
    }
    Ok(rows)
}

#[async_trait]
impl EventSource for NycOpenDataClient {
    async fn fetch_events(&self) -> Result<Vec<RawEventRecord>> {
        self.fetch_dataset(EVENTS_DATASET).await
    }

    async fn fetch_locations(&self) -> Result<Vec<RawLocationRecord>> {
        self.fetch_dataset(LOCATIONS_DATASET).await
    }
}
