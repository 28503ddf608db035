//! Octopus Agile day-ahead price feed client

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::FeedError;
use crate::tariff::TariffInterval;

/// Standard unit rates for Agile (Feb 2018), region C
pub const DEFAULT_OCTOPUS_URL: &str = "https://api.octopus.energy/v1/products/AGILE-18-02-21/electricity-tariffs/E-1R-AGILE-18-02-21-C/standard-unit-rates/";

/// Source of candidate tariff intervals
#[async_trait]
pub trait PriceFeed {
    /// Fetch every interval the feed currently publishes, in feed order
    async fn fetch_intervals(&self) -> Result<Vec<TariffInterval>, FeedError>;
}

/// Response body of the unit-rates endpoint
#[derive(Debug, Deserialize, PartialEq)]
pub struct UnitRatesResponse {
    pub results: Vec<UnitRate>,
}

/// One published unit rate as it appears on the wire
#[derive(Debug, Deserialize, PartialEq)]
pub struct UnitRate {
    pub valid_from: String,
    #[serde(default)]
    pub valid_to: Option<String>,
    pub value_exc_vat: f64,
    pub value_inc_vat: f64,
}

impl UnitRate {
    /// Validate into a typed interval. `index` is the record's position, for error messages.
    pub fn to_interval(&self, index: usize) -> Result<TariffInterval, FeedError> {
        let invalid = |reason: String| FeedError::InvalidRecord { index, reason };

        let valid_from = parse_timestamp(&self.valid_from)
            .map_err(|e| invalid(format!("valid_from '{}': {}", self.valid_from, e)))?;
        let valid_to_raw = self
            .valid_to
            .as_deref()
            .ok_or_else(|| invalid("valid_to missing".to_string()))?;
        let valid_to = parse_timestamp(valid_to_raw)
            .map_err(|e| invalid(format!("valid_to '{}': {}", valid_to_raw, e)))?;

        TariffInterval::new(valid_from, valid_to, self.value_exc_vat, self.value_inc_vat)
            .ok_or_else(|| invalid(format!("empty range {} .. {}", valid_from, valid_to)))
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

/// Decode a unit-rates response body into intervals, rejecting the whole body on any bad record
pub fn parse_unit_rates(body: &str) -> Result<Vec<TariffInterval>, FeedError> {
    let response: UnitRatesResponse = serde_json::from_str(body)?;
    response
        .results
        .iter()
        .enumerate()
        .map(|(i, rate)| rate.to_interval(i))
        .collect()
}

pub struct OctopusClient {
    client: reqwest::Client,
    url: String,
}

impl OctopusClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl PriceFeed for OctopusClient {
    async fn fetch_intervals(&self) -> Result<Vec<TariffInterval>, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        info!("GET {} {}", self.url, status);
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        let body = response.text().await?;
        let intervals = parse_unit_rates(&body)?;
        debug!("Price feed returned {} intervals", intervals.len());
        Ok(intervals)
    }
}
