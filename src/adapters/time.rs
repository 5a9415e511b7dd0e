//! ESP32 clock adapter.
//!
//! Implements [`ClockPort`]: monotonic milliseconds since boot plus
//! blocking delays through any [`DelayNs`] provider.
//!
//! - **`target_os = "espidf"`** — reads `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` for
//!   host-side testing and simulation.

use embedded_hal::delay::DelayNs;

use crate::app::ports::ClockPort;

/// Monotonic clock paired with a blocking delay provider.
///
/// On the device `D` is `esp_idf_hal::delay::FreeRtos`, which yields to
/// the scheduler instead of spinning.
pub struct MonotonicClock<D> {
    delay: D,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl<D: DelayNs> MonotonicClock<D> {
    pub fn new(delay: D) -> Self {
        Self {
            delay,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since the clock was created (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl<D: DelayNs> ClockPort for MonotonicClock<D> {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

/// Thread-sleep delay for host builds.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

#[cfg(not(target_os = "espidf"))]
impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}
