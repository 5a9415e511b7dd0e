//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::{AppEvent, PayloadKind};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn kind_label(kind: PayloadKind) -> &'static str {
    match kind {
        PayloadKind::Status => "status",
        PayloadKind::Distress => "sos",
        PayloadKind::Text => "text",
        PayloadKind::AutoNotification => "auto",
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { device } => {
                info!("START | advertising as {}", device);
            }
            AppEvent::Connected => {
                info!("LINK  | central connected");
            }
            AppEvent::Disconnected => {
                info!("LINK  | central disconnected, advertising restarted");
            }
            AppEvent::CommandReceived { name, raw } => {
                info!("CMD   | {} ({} bytes: {:?})", name, raw.len(), raw);
            }
            AppEvent::PayloadSent { kind, json } => {
                info!("TX    | {:<6} | {}", kind_label(*kind), json);
            }
            AppEvent::NotifyFailed { kind, error } => {
                warn!("TX    | {:<6} | not delivered: {}", kind_label(*kind), error);
            }
            AppEvent::AdvertisingFailed(error) => {
                warn!("LINK  | advertising restart failed: {}", error);
            }
            AppEvent::Relayed { hops, total } => {
                info!("RELAY | forwarded to {} hops, total={}", hops, total);
            }
            AppEvent::StatsReset => {
                info!("STATS | counters reset");
            }
            AppEvent::AutoNotifyChanged(on) => {
                info!("AUTO  | {}", if *on { "enabled" } else { "disabled" });
            }
            AppEvent::SensorsUpdated {
                battery_percent,
                rssi_dbm,
                battery_wrapped,
            } => {
                info!(
                    "SENSOR| battery={:.1}% rssi={}dBm{}",
                    battery_percent,
                    rssi_dbm,
                    if *battery_wrapped { " (recharged)" } else { "" }
                );
            }
        }
    }
}
