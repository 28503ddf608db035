//! Conversion of tariff intervals into inverter charge windows

use chrono::Timelike;
use tracing::info;

use crate::tariff::TariffInterval;

/// Flag value that turns a charge window on
pub const ENABLED: &str = "1";
/// Flag value that leaves a charge window programmed but off
pub const DISABLED: &str = "0";

/// A charge window in the inverter's positional form:
/// start hour, start minute, end hour, end minute, enabled flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedWindow {
    pub start_hour: String,
    pub start_minute: String,
    pub end_hour: String,
    pub end_minute: String,
    pub enabled: String,
}

impl EncodedWindow {
    /// The five parameters in the order the inverter expects them
    pub fn to_params(&self) -> [String; 5] {
        [
            self.start_hour.clone(),
            self.start_minute.clone(),
            self.end_hour.clone(),
            self.end_minute.clone(),
            self.enabled.clone(),
        ]
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled == ENABLED
    }
}

/// Encode one interval as a local-time charge window.
///
/// During summer time both hours are shifted forward by one. The shift does
/// not wrap, so a window starting at 23:00 UTC encodes as hour "24".
/// The window is enabled only when the VAT-inclusive price is strictly below
/// `cost_threshold_pence`.
pub fn encode(
    interval: &TariffInterval,
    daylight_saving: bool,
    cost_threshold_pence: f64,
) -> EncodedWindow {
    let offset = u32::from(daylight_saving);
    let turned_on = interval.price_inc_vat < cost_threshold_pence;
    if !turned_on {
        info!("Ignoring tariff at {} pence", interval.price_inc_vat);
    }

    EncodedWindow {
        start_hour: two_digits(interval.valid_from.hour() + offset),
        start_minute: two_digits(interval.valid_from.minute()),
        end_hour: two_digits(interval.valid_to.hour() + offset),
        end_minute: two_digits(interval.valid_to.minute()),
        enabled: if turned_on { ENABLED } else { DISABLED }.to_string(),
    }
}

fn two_digits(value: u32) -> String {
    format!("{:02}", value)
}
