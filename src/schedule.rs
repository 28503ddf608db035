//! Growatt AC-charge schedule parameter sets
//!
//! The inverter exposes two timetable slots, each holding three charge
//! windows. The first slot also carries the charge configuration, so its
//! parameter list starts with three extra values.

use crate::window::EncodedWindow;

/// Windows held by one timetable slot
pub const WINDOWS_PER_SLOT: usize = 3;

/// Which timetable slot a schedule is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// `mix_ac_charge_time_period`: charge config plus windows 1-3
    Primary,
    /// `mix_ac_charge_time_multi_1`: windows 4-6
    Secondary,
}

impl SlotKind {
    /// Value of the `type` form field for this slot
    pub fn command_type(self) -> &'static str {
        match self {
            SlotKind::Primary => "mix_ac_charge_time_period",
            SlotKind::Secondary => "mix_ac_charge_time_multi_1",
        }
    }
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotKind::Primary => write!(f, "primary"),
            SlotKind::Secondary => write!(f, "secondary"),
        }
    }
}

/// Charge configuration written ahead of the primary slot's windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeSettings {
    /// Charge power as a percentage of inverter maximum
    pub charge_power_percent: u8,
    /// State of charge at which charging stops
    pub charge_stop_percent: u8,
    /// Whether charging from the grid is allowed at all
    pub ac_charge_enabled: bool,
}

impl Default for ChargeSettings {
    fn default() -> Self {
        Self {
            charge_power_percent: 100,
            charge_stop_percent: 100,
            ac_charge_enabled: true,
        }
    }
}

impl ChargeSettings {
    fn to_params(self) -> [String; 3] {
        [
            self.charge_power_percent.to_string(),
            self.charge_stop_percent.to_string(),
            if self.ac_charge_enabled { "1" } else { "0" }.to_string(),
        ]
    }
}

/// One slot's flat positional parameter list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub slot: SlotKind,
    pub params: Vec<String>,
}

impl Schedule {
    /// Positional form fields `param1..paramN`, in order
    pub fn form_params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .enumerate()
            .map(|(i, value)| (format!("param{}", i + 1), value.clone()))
            .collect()
    }
}

/// Build the primary slot: charge settings followed by each window's five values.
/// Slot capacity is not checked; callers pass at most [`WINDOWS_PER_SLOT`] windows.
pub fn build_primary(settings: ChargeSettings, windows: &[EncodedWindow]) -> Schedule {
    let mut params: Vec<String> = settings.to_params().to_vec();
    params.extend(flatten(windows));
    Schedule {
        slot: SlotKind::Primary,
        params,
    }
}

/// Build the secondary slot: windows only, no leading configuration
pub fn build_secondary(windows: &[EncodedWindow]) -> Schedule {
    Schedule {
        slot: SlotKind::Secondary,
        params: flatten(windows).collect(),
    }
}

/// Split ranked windows into the primary (first three) and secondary (rest) groups
pub fn partition<T>(ranked: &[T]) -> (&[T], &[T]) {
    ranked.split_at(ranked.len().min(WINDOWS_PER_SLOT))
}

fn flatten(windows: &[EncodedWindow]) -> impl Iterator<Item = String> + '_ {
    windows.iter().flat_map(|w| w.to_params())
}
