//! Tariff intervals and cheapest-slot ranking

use chrono::{DateTime, Days, NaiveDate, Utc};
use std::cmp::Ordering;

/// Number of slots programmed into the inverter each day (two slots of three windows)
pub const SELECTION_SIZE: usize = 6;

/// One priced slot from the day-ahead feed
#[derive(Debug, Clone, PartialEq)]
pub struct TariffInterval {
    /// Inclusive start
    pub valid_from: DateTime<Utc>,
    /// Exclusive end
    pub valid_to: DateTime<Utc>,
    /// Price in pence/kWh excluding VAT, used for ranking
    pub price_exc_vat: f64,
    /// Price in pence/kWh including VAT, used for the charge threshold
    pub price_inc_vat: f64,
}

impl TariffInterval {
    /// Build an interval, rejecting empty or inverted ranges
    pub fn new(
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
        price_exc_vat: f64,
        price_inc_vat: f64,
    ) -> Option<Self> {
        (valid_from < valid_to).then_some(Self {
            valid_from,
            valid_to,
            price_exc_vat,
            price_inc_vat,
        })
    }
}

/// UTC calendar date of the day after `now`
pub fn tomorrow(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    today.checked_add_days(Days::new(1)).unwrap_or(today)
}

/// Keep the intervals that start on `date` (UTC), in feed order
pub fn for_date(intervals: Vec<TariffInterval>, date: NaiveDate) -> Vec<TariffInterval> {
    intervals
        .into_iter()
        .filter(|t| t.valid_from.date_naive() == date)
        .collect()
}

/// Select the `count` cheapest intervals by price excluding VAT.
///
/// The sort is stable, so equally priced intervals keep their feed order.
/// NaN prices sort after every real price.
pub fn rank(intervals: &[TariffInterval], count: usize) -> Vec<TariffInterval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by(|a, b| compare_price(a.price_exc_vat, b.price_exc_vat));
    sorted.truncate(count);
    sorted
}

fn compare_price(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}
