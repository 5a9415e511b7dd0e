//! Node configuration parameters
//!
//! All tunable parameters for the Beacon test node. There is no persistent
//! store: values are compile-time defaults, logged as JSON at boot.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Identity ---
    /// Advertised name, also served by the device-id characteristic
    pub device_name: heapless::String<24>,
    /// `sender` field of generated mesh messages
    pub sender_id: heapless::String<24>,
    /// `senderName` field of generated mesh messages
    pub sender_name: heapless::String<24>,

    // --- Emission intervals ---
    /// Distress (SOS) message interval (milliseconds)
    pub distress_interval_ms: u32,
    /// Text message interval (milliseconds)
    pub text_interval_ms: u32,
    /// Delay of the first text message after a connection (milliseconds)
    pub text_offset_ms: u32,
    /// Auto-notification interval (milliseconds)
    pub auto_notify_interval_ms: u32,

    // --- Housekeeping ---
    /// Simulated sensor update interval (milliseconds)
    pub sensor_update_interval_ms: u32,
    /// Idle LED flash interval while not connected (milliseconds)
    pub idle_blink_interval_ms: u32,
    /// Delay at the end of every main loop pass (milliseconds)
    pub loop_delay_ms: u32,
    /// Pause before advertising is restarted after a disconnect (milliseconds)
    pub readvertise_delay_ms: u32,

    // --- Hardware ---
    /// Status LED GPIO
    pub led_gpio: i32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_name: fixed("BEACON-NODE-001"),
            sender_id: fixed("esp32-test-001"),
            sender_name: fixed("ESP32 Test"),

            distress_interval_ms: 60_000,   // 1/min
            text_interval_ms: 60_000,       // 1/min
            text_offset_ms: 30_000,         // half-way between distress messages
            auto_notify_interval_ms: 10_000,

            sensor_update_interval_ms: 5_000,
            idle_blink_interval_ms: 2_000,
            loop_delay_ms: 10,
            readvertise_delay_ms: 500,

            led_gpio: 2,
        }
    }
}

impl NodeConfig {
    /// Reject configurations the scheduler cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() {
            return Err(ConfigError::Invalid("device_name must not be empty"));
        }
        let intervals = [
            self.distress_interval_ms,
            self.text_interval_ms,
            self.auto_notify_interval_ms,
            self.sensor_update_interval_ms,
            self.idle_blink_interval_ms,
        ];
        if intervals.contains(&0) {
            return Err(ConfigError::Invalid("intervals must be non-zero"));
        }
        if self.text_offset_ms >= self.text_interval_ms {
            return Err(ConfigError::Invalid(
                "text_offset_ms must be below text_interval_ms",
            ));
        }
        Ok(())
    }
}

/// Configuration validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

fn fixed(s: &str) -> heapless::String<24> {
    let mut out = heapless::String::new();
    // Defaults are all well under capacity.
    let _ = out.push_str(s);
    out
}
