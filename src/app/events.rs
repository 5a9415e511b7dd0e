//! Outbound application events.
//!
//! The [`NodeService`](super::service::NodeService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::error::Error;

/// Which payload schema was notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Status,
    Distress,
    Text,
    AutoNotification,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the advertised name).
    Started { device: heapless::String<24> },

    /// A central connected (edge, reported once per transition).
    Connected,

    /// The central disconnected and advertising was restarted.
    Disconnected,

    /// A write arrived on the message characteristic.
    CommandReceived { name: &'static str, raw: String },

    /// A payload was generated and handed to the transport.
    PayloadSent { kind: PayloadKind, json: String },

    /// The transport refused a payload. It still counts as sent.
    NotifyFailed { kind: PayloadKind, error: Error },

    /// Advertising could not be restarted after a disconnect.
    AdvertisingFailed(Error),

    /// Relay input was forwarded to fabricated neighbours.
    Relayed { hops: u8, total: u32 },

    /// Counters were zeroed by `RESET_STATS`.
    StatsReset,

    /// `ENABLE_AUTO` / `DISABLE_AUTO` took effect.
    AutoNotifyChanged(bool),

    /// Simulated sensors advanced one tick.
    SensorsUpdated {
        battery_percent: f32,
        rssi_dbm: i8,
        battery_wrapped: bool,
    },
}
