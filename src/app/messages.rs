//! Outbound payload encoder.
//!
//! Four fixed-schema JSON documents, serialised with `serde_json`. Field
//! order is struct declaration order and is relied on by the companion
//! app's fixtures, so do not reorder fields.
//!
//! | Kind              | Fields                                                        |
//! |-------------------|---------------------------------------------------------------|
//! | Status            | device, battery, rssi, messages, relays, uptime, autoNotify   |
//! | Distress / Text   | id, sender, senderName, type, priority, ttl, timestamp, payload, seen |
//! | Auto-notification | type, device, battery, rssi, counter, timestamp, temp, humidity |

use serde::Serialize;

use crate::app::ports::RandomSource;
use crate::error::Result;

/// `MessageType.sos` in the companion app.
pub const MESSAGE_TYPE_SOS: u8 = 0;
/// `MessageType.text` in the companion app.
pub const MESSAGE_TYPE_TEXT: u8 = 2;

/// `MessagePriority.critical`.
pub const PRIORITY_CRITICAL: u8 = 10;
/// `MessagePriority.high`.
pub const PRIORITY_HIGH: u8 = 8;

const SOS_TTL: u8 = 10;
const TEXT_TTL: u8 = 6;

/// Fixed distress location (San Francisco).
const SOS_LAT: f64 = 37.7749;
const SOS_LON: f64 = -122.4194;

// ───────────────────────────────────────────────────────────────
// Wire structs
// ───────────────────────────────────────────────────────────────

/// Reply to `GET_STATUS`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport<'a> {
    pub device: &'a str,
    pub battery: f32,
    pub rssi: i8,
    pub messages: u32,
    pub relays: u32,
    pub uptime: u64,
    pub auto_notify: bool,
}

/// Envelope shared by distress and text messages (the app's `MeshMessage`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshMessage<'a> {
    pub id: String,
    pub sender: &'a str,
    pub sender_name: &'a str,
    #[serde(rename = "type")]
    pub kind: u8,
    pub priority: u8,
    pub ttl: u8,
    pub timestamp: u64,
    pub payload: MeshPayload,
    pub seen: [&'a str; 0],
}

/// Body of a [`MeshMessage`].
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MeshPayload {
    Location { lat: f64, lon: f64 },
    Text { content: String },
}

/// Periodic telemetry push.
#[derive(Debug, Clone, Serialize)]
pub struct AutoNotification<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub device: &'a str,
    pub battery: f32,
    pub rssi: i8,
    pub counter: u32,
    pub timestamp: u64,
    pub temp: f32,
    pub humidity: i32,
}

// ───────────────────────────────────────────────────────────────
// Encoder inputs
// ───────────────────────────────────────────────────────────────

/// Node identity strings copied into every payload.
#[derive(Debug, Clone, Copy)]
pub struct Identity<'a> {
    pub device_name: &'a str,
    pub sender_id: &'a str,
    pub sender_name: &'a str,
}

/// Point-in-time values the encoder reads.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    pub battery_percent: f32,
    pub rssi_dbm: i8,
    pub messages_sent: u32,
    pub relays: u32,
    pub auto_notify: bool,
    pub uptime_ms: u64,
}

/// Simulated environment readings for an auto-notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    /// 15.0 ..= 29.9 °C, one decimal.
    pub temp_c: f32,
    /// 30 ..= 69 %.
    pub humidity_pct: i32,
}

impl Environment {
    pub fn sample(rng: &mut impl RandomSource) -> Self {
        let temp_tenths = 200 + rng.range(-50, 100);
        Self {
            temp_c: temp_tenths as f32 / 10.0,
            humidity_pct: 50 + rng.range(-20, 20),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Encoders
// ───────────────────────────────────────────────────────────────

pub fn encode_status(id: &Identity<'_>, snap: &Snapshot) -> Result<String> {
    let report = StatusReport {
        device: id.device_name,
        battery: snap.battery_percent,
        rssi: snap.rssi_dbm,
        messages: snap.messages_sent,
        relays: snap.relays,
        uptime: snap.uptime_ms / 1000,
        auto_notify: snap.auto_notify,
    };
    Ok(serde_json::to_string(&report)?)
}

pub fn encode_distress(id: &Identity<'_>, uptime_ms: u64) -> Result<String> {
    let msg = envelope(
        id,
        uptime_ms,
        MESSAGE_TYPE_SOS,
        PRIORITY_CRITICAL,
        SOS_TTL,
        MeshPayload::Location {
            lat: SOS_LAT,
            lon: SOS_LON,
        },
    );
    Ok(serde_json::to_string(&msg)?)
}

pub fn encode_text(id: &Identity<'_>, uptime_ms: u64, seq: u32) -> Result<String> {
    let msg = envelope(
        id,
        uptime_ms,
        MESSAGE_TYPE_TEXT,
        PRIORITY_HIGH,
        TEXT_TTL,
        MeshPayload::Text {
            content: format!("Test message #{seq} from ESP32"),
        },
    );
    Ok(serde_json::to_string(&msg)?)
}

pub fn encode_auto(id: &Identity<'_>, snap: &Snapshot, env: Environment) -> Result<String> {
    let note = AutoNotification {
        kind: "auto",
        device: id.device_name,
        battery: snap.battery_percent,
        rssi: snap.rssi_dbm,
        counter: snap.messages_sent,
        timestamp: snap.uptime_ms,
        temp: env.temp_c,
        humidity: env.humidity_pct,
    };
    Ok(serde_json::to_string(&note)?)
}

fn envelope<'a>(
    id: &Identity<'a>,
    uptime_ms: u64,
    kind: u8,
    priority: u8,
    ttl: u8,
    payload: MeshPayload,
) -> MeshMessage<'a> {
    MeshMessage {
        id: uptime_ms.to_string(),
        sender: id.sender_id,
        sender_name: id.sender_name,
        kind,
        priority,
        ttl,
        timestamp: uptime_ms,
        payload,
        seen: [],
    }
}
