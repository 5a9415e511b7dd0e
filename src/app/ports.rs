//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService (domain)
//! ```
//!
//! Driven adapters (BLE link, LED, clock, RNG, event sinks) implement these
//! traits.  The [`NodeService`](super::service::NodeService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::adapters::ble::TransportError;

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: domain → BLE peripheral stack)
// ───────────────────────────────────────────────────────────────

/// Outbound side of the wireless transport.
///
/// Inbound connect / disconnect / write events do not go through this
/// trait; they arrive via the [`events`](crate::events) queue.
pub trait LinkPort {
    /// Set the message characteristic to `payload` and notify the central.
    fn notify(&mut self, payload: &str) -> Result<(), TransportError>;

    /// Start advertising again after the central went away.
    fn restart_advertising(&mut self) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → status LED)
// ───────────────────────────────────────────────────────────────

/// The single status LED.
pub trait IndicatorPort {
    /// Drive the LED on or off.
    fn set_indicator(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain ↔ monotonic timer)
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus blocking delays.
///
/// Blocking is part of the node's observable behaviour (blink patterns,
/// simulated relay hops), so delays go through the port and a test clock
/// can advance virtual time instead of sleeping.
pub trait ClockPort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Random source (driven adapter: domain ← hardware RNG)
// ───────────────────────────────────────────────────────────────

/// Uniform integers for the simulated readings.
pub trait RandomSource {
    /// Uniform integer in the half-open range `[low, high)`.
    /// Returns `low` when the range is empty.
    fn range(&mut self, low: i32, high: i32) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the service)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a timer fires.
pub trait SchedulerDelegate {
    /// Called once per fired timer, in a fixed order within a pass.
    fn on_timer_fired(&mut self, timer: TimerKind);
}

/// The five periodic activities of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Synthetic SOS message (connected only).
    Distress,
    /// Synthetic text message (connected only).
    Text,
    /// Telemetry auto-notification (connected and enabled).
    AutoNotify,
    /// Battery / RSSI simulation step.
    SensorUpdate,
    /// "Alive" flash while waiting for a central.
    IdleBlink,
}

impl TimerKind {
    pub const ALL: [TimerKind; 5] = [
        TimerKind::Distress,
        TimerKind::Text,
        TimerKind::AutoNotify,
        TimerKind::SensorUpdate,
        TimerKind::IdleBlink,
    ];
}
