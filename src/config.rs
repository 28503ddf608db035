use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::env;

use crate::growatt::DEFAULT_GROWATT_URL;
use crate::octopus::DEFAULT_OCTOPUS_URL;
use crate::schedule::ChargeSettings;

pub const DEFAULT_COST_THRESHOLD_PENCE: u32 = 25;
pub const DEFAULT_RUN_HOUR_UTC: u32 = 17;

#[derive(Debug, Clone)]
pub struct Config {
    // Growatt account
    pub growatt_username: String,
    pub growatt_password: String,
    pub serial_number: String,

    // Windows priced at or above this (pence/kWh inc. VAT) are programmed but disabled
    pub cost_threshold_pence: u32,

    // Endpoints
    pub octopus_url: String,
    pub growatt_url: String,

    // Values written ahead of the first charge slot
    pub charge_power_percent: u8,
    pub charge_stop_percent: u8,

    // Hour of day (UTC) at which the daily scheduler runs.
    // Agile prices for the next day are published around 16:00 UK time.
    pub run_hour_utc: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env if present, ignore if missing
        Self::from_getter(|key| env::var(key).ok())
    }

    /// Parse config from a custom getter function (for testing)
    pub fn from_getter<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            growatt_username: get("GROWATT_USERNAME").context("GROWATT_USERNAME not set")?,
            growatt_password: get("GROWATT_PASSWORD").context("GROWATT_PASSWORD not set")?,
            serial_number: get("SERIAL_NUMBER").context("SERIAL_NUMBER not set")?,

            cost_threshold_pence: get("COST_THRESHOLD")
                .unwrap_or_else(|| DEFAULT_COST_THRESHOLD_PENCE.to_string())
                .trim()
                .parse()
                .context("COST_THRESHOLD must be a whole number of pence")?,

            octopus_url: get("OCTOPUS_URL")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_OCTOPUS_URL.to_string()),
            growatt_url: get("GROWATT_URL")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_GROWATT_URL.to_string()),

            charge_power_percent: get("CHARGE_POWER_PERCENT")
                .unwrap_or_else(|| "100".to_string())
                .parse()
                .context("CHARGE_POWER_PERCENT must be a number between 0 and 100")?,
            charge_stop_percent: get("CHARGE_STOP_PERCENT")
                .unwrap_or_else(|| "100".to_string())
                .parse()
                .context("CHARGE_STOP_PERCENT must be a number between 0 and 100")?,

            run_hour_utc: get("RUN_HOUR_UTC")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RUN_HOUR_UTC),
        })
    }

    /// Create config from a HashMap (convenience for testing)
    pub fn from_map(map: &HashMap<&str, &str>) -> Result<Self> {
        Self::from_getter(|key| map.get(key).map(|v| v.to_string()))
    }

    /// Charge configuration for the primary slot
    pub fn charge_settings(&self) -> ChargeSettings {
        ChargeSettings {
            charge_power_percent: self.charge_power_percent,
            charge_stop_percent: self.charge_stop_percent,
            ac_charge_enabled: true,
        }
    }

    /// Validate configuration values at startup.
    /// Returns Ok(()) if all validations pass, or Err with details of what failed.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.growatt_username.trim().is_empty() {
            errors.push("GROWATT_USERNAME cannot be empty.".to_string());
        }
        if self.growatt_password.is_empty() {
            errors.push("GROWATT_PASSWORD cannot be empty.".to_string());
        }
        if self.serial_number.trim().is_empty() {
            errors.push("SERIAL_NUMBER cannot be empty.".to_string());
        }

        for (key, value) in [
            ("CHARGE_POWER_PERCENT", self.charge_power_percent),
            ("CHARGE_STOP_PERCENT", self.charge_stop_percent),
        ] {
            if value > 100 {
                errors.push(format!("{}={} must be at most 100.", key, value));
            }
        }

        if self.run_hour_utc > 23 {
            errors.push(format!(
                "RUN_HOUR_UTC={} must be between 0 and 23.",
                self.run_hour_utc
            ));
        }

        for (key, url) in [("OCTOPUS_URL", &self.octopus_url), ("GROWATT_URL", &self.growatt_url)] {
            if !Self::is_http_url(url) {
                errors.push(format!("{} '{}' must start with http:// or https://.", key, url));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )
        }
    }

    fn is_http_url(url: &str) -> bool {
        url.starts_with("https://") || url.starts_with("http://")
    }
}
