//! Mock board, link and sink for integration tests.
//!
//! The board keeps a virtual clock that only moves when the service asks
//! for a delay, so timing assertions are exact and tests run instantly.

use beacon_node::adapters::ble::TransportError;
use beacon_node::app::events::{AppEvent, PayloadKind};
use beacon_node::app::ports::{ClockPort, EventSink, IndicatorPort, LinkPort, RandomSource};

// ── Random draws ──────────────────────────────────────────────

/// How the mock board answers `RandomSource::range`.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum Draw {
    /// Always the lower bound.
    Low,
    /// Always `high - 1`.
    High,
    /// Linear congruential sequence from a seed.
    Seeded(u64),
}

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub now: u64,
    pub led: bool,
    /// Every LED write with the virtual time it happened at.
    pub led_writes: Vec<(u64, bool)>,
    pub draw: Draw,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self::with_draw(Draw::Seeded(0x5eed))
    }

    pub fn with_draw(draw: Draw) -> Self {
        Self {
            now: 0,
            led: false,
            led_writes: Vec::new(),
            draw,
        }
    }

    /// Number of off→on transitions since `since_ms`.
    pub fn flashes_since(&self, since_ms: u64) -> usize {
        self.led_writes
            .iter()
            .filter(|(t, on)| *t >= since_ms && *on)
            .count()
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorPort for MockBoard {
    fn set_indicator(&mut self, on: bool) {
        self.led = on;
        self.led_writes.push((self.now, on));
    }
}

impl ClockPort for MockBoard {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now += u64::from(ms);
    }
}

impl RandomSource for MockBoard {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        match &mut self.draw {
            Draw::Low => low,
            Draw::High => high - 1,
            Draw::Seeded(state) => {
                *state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                let span = (i64::from(high) - i64::from(low)) as u64;
                (i64::from(low) + ((*state >> 33) % span) as i64) as i32
            }
        }
    }
}

// ── MockLink ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLink {
    pub connected: bool,
    pub notified: Vec<String>,
    pub advertising_restarts: u32,
}

#[allow(dead_code)]
impl MockLink {
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub fn last_json(&self) -> Option<serde_json::Value> {
        self.notified
            .last()
            .map(|s| serde_json::from_str(s).expect("notified payload must be JSON"))
    }
}

impl LinkPort for MockLink {
    fn notify(&mut self, payload: &str) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.notified.push(payload.to_owned());
        Ok(())
    }

    fn restart_advertising(&mut self) -> Result<(), TransportError> {
        self.advertising_restarts += 1;
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self, kind: PayloadKind) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::PayloadSent { kind: k, json } if *k == kind => Some(json.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
