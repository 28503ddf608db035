//! Daily charge planning
//!
//! Fetches tomorrow's prices, picks the cheapest slots, encodes them and
//! writes both timetable slots to the inverter.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::config::Config;
use crate::daylight::is_daylight_saving;
use crate::growatt::DeviceControl;
use crate::octopus::PriceFeed;
use crate::schedule::{build_primary, build_secondary, partition, ChargeSettings, Schedule};
use crate::tariff::{for_date, rank, tomorrow, TariffInterval, SELECTION_SIZE};
use crate::window::{encode, EncodedWindow};

/// Inputs to a run that come from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSettings {
    pub cost_threshold_pence: f64,
    pub charge: ChargeSettings,
}

impl From<&Config> for RunSettings {
    fn from(config: &Config) -> Self {
        Self {
            cost_threshold_pence: f64::from(config.cost_threshold_pence),
            charge: config.charge_settings(),
        }
    }
}

/// Everything needed to program the inverter for tomorrow
#[derive(Debug, Clone, PartialEq)]
pub struct ChargePlan {
    /// Cheapest intervals, cheapest first
    pub selection: Vec<TariffInterval>,
    pub daylight_saving: bool,
    /// One window per selected interval, same order
    pub windows: Vec<EncodedWindow>,
    pub primary: Schedule,
    pub secondary: Schedule,
}

impl ChargePlan {
    /// Number of windows cheap enough to charge in
    pub fn enabled_windows(&self) -> usize {
        self.windows.iter().filter(|w| w.is_enabled()).count()
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The feed had no prices for tomorrow; the inverter was not contacted
    NoTariffs,
    /// Both slots were written
    Scheduled(ChargePlan),
}

/// Build tomorrow's plan without touching the inverter.
/// Returns `None` when the feed has nothing for tomorrow.
pub async fn plan<F>(now: DateTime<Utc>, feed: &F, settings: &RunSettings) -> Result<Option<ChargePlan>>
where
    F: PriceFeed + ?Sized,
{
    let date = tomorrow(now);
    let candidates = for_date(
        feed.fetch_intervals()
            .await
            .context("Failed to fetch tariffs")?,
        date,
    );
    info!("{} tariffs found for {}", candidates.len(), date);

    let selection = rank(&candidates, SELECTION_SIZE);
    if selection.is_empty() {
        return Ok(None);
    }

    info!("Cheapest {} tariffs", selection.len());
    for tariff in &selection {
        info!(
            "  {} - {}: {}p exc VAT, {}p inc VAT",
            tariff.valid_from.format("%H:%M"),
            tariff.valid_to.format("%H:%M"),
            tariff.price_exc_vat,
            tariff.price_inc_vat
        );
    }

    // Evaluated once at run time, not per window
    let daylight_saving = is_daylight_saving(now);
    let windows: Vec<EncodedWindow> = selection
        .iter()
        .map(|t| encode(t, daylight_saving, settings.cost_threshold_pence))
        .collect();

    let (first, rest) = partition(&windows);
    let primary = build_primary(settings.charge, first);
    let secondary = build_secondary(rest);

    Ok(Some(ChargePlan {
        selection,
        daylight_saving,
        windows,
        primary,
        secondary,
    }))
}

/// Plan tomorrow's charging and write both slots, primary first, over a single session
pub async fn run<F, D>(
    now: DateTime<Utc>,
    feed: &F,
    device: &D,
    settings: &RunSettings,
) -> Result<RunOutcome>
where
    F: PriceFeed + ?Sized,
    D: DeviceControl + ?Sized,
{
    let Some(plan) = plan(now, feed, settings).await? else {
        error!("Failed to get tariffs for tomorrow");
        return Ok(RunOutcome::NoTariffs);
    };

    let session = device.login().await.context("Failed to log in to Growatt")?;
    for schedule in [&plan.primary, &plan.secondary] {
        device
            .submit(&session, schedule)
            .await
            .with_context(|| format!("Failed to write {} charge slot", schedule.slot))?;
    }

    info!("Charge schedule updated ({} windows)", plan.selection.len());
    Ok(RunOutcome::Scheduled(plan))
}
