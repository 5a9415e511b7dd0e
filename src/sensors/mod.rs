//! Simulated sensor state.
//!
//! There is no sensor hardware on the test node. Battery drains linearly
//! and wraps back to full so long test sessions never run flat; RSSI is
//! resampled on every tick.
//!
//! Battery is held in tenths of a percent so repeated decrements do not
//! accumulate float error and always render with one decimal.

use log::info;

use crate::app::ports::RandomSource;

/// 100.0 %.
pub const BATTERY_FULL_TENTHS: u16 = 1000;
/// 10.0 %; a tick that would go below this wraps to full.
pub const BATTERY_FLOOR_TENTHS: u16 = 100;
/// 0.1 % per sensor tick.
pub const BATTERY_STEP_TENTHS: u16 = 1;

/// Centre of the simulated RSSI band (dBm).
const RSSI_BASE_DBM: i32 = -50;

/// Outcome of one sensor tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorUpdate {
    /// The battery reached the floor and was reset to full.
    pub battery_wrapped: bool,
}

/// Simulated battery and signal strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedSensors {
    battery_tenths: u16,
    rssi_dbm: i8,
}

impl Default for SimulatedSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSensors {
    pub fn new() -> Self {
        Self {
            battery_tenths: BATTERY_FULL_TENTHS,
            rssi_dbm: RSSI_BASE_DBM as i8,
        }
    }

    /// Start from an arbitrary battery level (clamped into the valid band).
    pub fn with_battery_tenths(tenths: u16) -> Self {
        Self {
            battery_tenths: tenths.clamp(BATTERY_FLOOR_TENTHS, BATTERY_FULL_TENTHS),
            ..Self::new()
        }
    }

    /// Advance one sensor tick: drain the battery, resample RSSI.
    pub fn tick(&mut self, rng: &mut impl RandomSource) -> SensorUpdate {
        let next = self.battery_tenths.saturating_sub(BATTERY_STEP_TENTHS);
        let battery_wrapped = next < BATTERY_FLOOR_TENTHS;
        if battery_wrapped {
            self.battery_tenths = BATTERY_FULL_TENTHS;
            info!("Battery reset to 100%");
        } else {
            self.battery_tenths = next;
        }

        // -80 ..= -31 dBm
        self.rssi_dbm = (RSSI_BASE_DBM + rng.range(-30, 20)) as i8;

        SensorUpdate { battery_wrapped }
    }

    /// Battery level in percent, exact to one decimal.
    pub fn battery_percent(&self) -> f32 {
        f32::from(self.battery_tenths) / 10.0
    }

    pub fn battery_tenths(&self) -> u16 {
        self.battery_tenths
    }

    pub fn rssi_dbm(&self) -> i8 {
        self.rssi_dbm
    }
}
