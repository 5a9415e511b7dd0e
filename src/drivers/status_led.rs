//! Single-colour status LED driver.
//!
//! One GPIO, active high. Generic over [`OutputPin`] so the same driver
//! runs against an `esp_idf_hal::gpio::PinDriver` on the device and a
//! recording pin in host tests.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct StatusLed<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Take ownership of `pin` and drive it low.
    pub fn new(pin: P) -> Self {
        let mut led = Self { pin, on: true };
        led.set(false);
        led
    }

    pub fn set(&mut self, on: bool) {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.on = on,
            Err(e) => warn!("LED: pin write failed ({:?})", e),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
