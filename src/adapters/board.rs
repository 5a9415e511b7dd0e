//! Board adapter — bridges the on-board peripherals to domain port traits.
//!
//! Owns the status LED, the monotonic clock and the RNG, exposing them
//! through [`IndicatorPort`], [`ClockPort`] and [`RandomSource`]. This is
//! the only module besides the BLE adapter that touches actual hardware.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::adapters::rng::HardwareRng;
use crate::adapters::time::MonotonicClock;
use crate::app::ports::{ClockPort, IndicatorPort, RandomSource};
use crate::drivers::status_led::StatusLed;

/// Concrete adapter that combines the board peripherals behind port traits.
pub struct BoardAdapter<P, D> {
    led: StatusLed<P>,
    clock: MonotonicClock<D>,
    rng: HardwareRng,
}

impl<P: OutputPin, D: DelayNs> BoardAdapter<P, D> {
    pub fn new(led: StatusLed<P>, clock: MonotonicClock<D>, rng: HardwareRng) -> Self {
        Self { led, clock, rng }
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<P: OutputPin, D> IndicatorPort for BoardAdapter<P, D> {
    fn set_indicator(&mut self, on: bool) {
        self.led.set(on);
    }
}

// ── ClockPort implementation ──────────────────────────────────

impl<P, D: DelayNs> ClockPort for BoardAdapter<P, D> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }
}

// ── RandomSource implementation ───────────────────────────────

impl<P, D> RandomSource for BoardAdapter<P, D> {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        self.rng.range(low, high)
    }
}
