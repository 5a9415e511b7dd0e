//! Node service — the hexagonal core.
//!
//! [`NodeService`] owns all node state (connection flag, counters,
//! simulated sensors, timers). It exposes a hardware-agnostic API; all I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  TransportEvent ──▶ ┌────────────────────────┐ ──▶ LinkPort (notify)
//!                     │      NodeService       │
//!   Clock · RNG  ───▶ │ Dispatch · Scheduler   │ ──▶ IndicatorPort (LED)
//!                     └────────────────────────┘ ──▶ EventSink
//! ```
//!
//! Everything runs on the main loop thread; BLE callbacks only enqueue
//! [`TransportEvent`]s.

use log::{info, warn};

use crate::config::NodeConfig;
use crate::error::{Error, Result};
use crate::events::TransportEvent;
use crate::scheduler::{Gates, Scheduler};
use crate::sensors::SimulatedSensors;

use super::commands::Command;
use super::events::{AppEvent, PayloadKind};
use super::messages::{self, Environment, Identity, Snapshot};
use super::ports::{
    ClockPort, EventSink, IndicatorPort, LinkPort, RandomSource, SchedulerDelegate, TimerKind,
};

// ── Blink patterns (count, half-period ms) ────────────────────

const BLINK_STARTUP: (u8, u32) = (5, 100);
const BLINK_COMMAND: (u8, u32) = (3, 100);
const BLINK_DISTRESS: (u8, u32) = (5, 200);
const BLINK_TEXT: (u8, u32) = (2, 100);
const IDLE_FLASH_MS: u32 = 50;

// ── Simulated relay hop ───────────────────────────────────────

const RELAY_PRE_DELAY_MS: u32 = 100;
const RELAY_POST_DELAY_MS: u32 = 50;
/// Fabricated neighbour count is drawn from `[1, 5)`.
const RELAY_HOPS: (i32, i32) = (1, 5);

// ───────────────────────────────────────────────────────────────
// State
// ───────────────────────────────────────────────────────────────

/// Process-lifetime node state.
#[derive(Debug, Clone)]
struct NodeState {
    connected: bool,
    /// Connection flag as of the previous pass, for edge detection.
    was_connected: bool,
    /// Level changes applied since the previous pass; each one gets its
    /// own edge handling even if the level is back where it started.
    pending_edges: u32,
    auto_notify: bool,
    messages_sent: u32,
    relays: u32,
    /// Last text message number; not cleared by `RESET_STATS`.
    text_seq: u32,
    sensors: SimulatedSensors,
}

impl NodeState {
    fn new() -> Self {
        Self {
            connected: false,
            was_connected: false,
            pending_edges: 0,
            auto_notify: true,
            messages_sent: 0,
            relays: 0,
            text_seq: 0,
            sensors: SimulatedSensors::new(),
        }
    }
}

/// State plus configuration; the part of the service the timer callbacks
/// need while the scheduler itself is borrowed.
struct NodeCore {
    config: NodeConfig,
    state: NodeState,
}

// ───────────────────────────────────────────────────────────────
// NodeService
// ───────────────────────────────────────────────────────────────

/// The node service orchestrates all domain logic.
pub struct NodeService {
    core: NodeCore,
    scheduler: Scheduler,
}

impl NodeService {
    /// Construct the service. Timers start counting from `now_ms`.
    pub fn new(config: NodeConfig, now_ms: u64) -> Self {
        let scheduler = Scheduler::new(&config, now_ms);
        Self {
            core: NodeCore {
                config,
                state: NodeState::new(),
            },
            scheduler,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce readiness: startup flash, `Started` event.
    pub fn start(
        &mut self,
        board: &mut (impl IndicatorPort + ClockPort),
        sink: &mut impl EventSink,
    ) {
        board.set_indicator(false);
        self.core.blink(board, BLINK_STARTUP);
        sink.emit(&AppEvent::Started {
            device: self.core.config.device_name.clone(),
        });
        info!("NodeService started as '{}'", self.core.config.device_name);
    }

    // ── Transport events ──────────────────────────────────────

    /// Apply one event drained from the transport queue.
    pub fn apply_event(
        &mut self,
        event: TransportEvent,
        board: &mut (impl IndicatorPort + ClockPort + RandomSource),
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        match event {
            TransportEvent::Connected => {
                self.core.set_connected(true);
                info!("Connected");
                board.set_indicator(true);
            }
            TransportEvent::Disconnected => {
                self.core.set_connected(false);
                info!("Disconnected");
                board.set_indicator(false);
            }
            TransportEvent::Write(raw) => {
                let Some(cmd) = Command::parse(&raw) else {
                    return;
                };
                let text = String::from_utf8_lossy(&raw).into_owned();
                info!("MSG: {}", text);
                sink.emit(&AppEvent::CommandReceived {
                    name: cmd.name(),
                    raw: text,
                });
                self.handle_command(cmd, board, link, sink);
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Execute exactly one command, then acknowledge with a short blink.
    pub fn handle_command(
        &mut self,
        cmd: Command,
        board: &mut (impl IndicatorPort + ClockPort + RandomSource),
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        let core = &mut self.core;
        match cmd {
            Command::GetStatus => core.send_status(board, link, sink),
            Command::EnableAuto => core.set_auto_notify(true, sink),
            Command::DisableAuto => core.set_auto_notify(false, sink),
            Command::SendSos => core.send_distress(board, link, sink),
            Command::ResetStats => {
                core.state.messages_sent = 0;
                core.state.relays = 0;
                info!("Stats reset");
                sink.emit(&AppEvent::StatsReset);
            }
            Command::Relay(payload) => core.relay(&payload, board, sink),
        }
        core.blink(board, BLINK_COMMAND);
    }

    // ── Per-pass orchestration ────────────────────────────────

    /// Run one scheduler pass: connection edges, then every timer.
    ///
    /// Call after draining the transport queue.
    pub fn poll(
        &mut self,
        board: &mut (impl IndicatorPort + ClockPort + RandomSource),
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        let now = board.now_ms();

        // Edges alternate, so replaying them from `was_connected` ends at
        // the current level.
        let edges = core::mem::take(&mut self.core.state.pending_edges);
        for _ in 0..edges {
            if self.core.state.was_connected {
                board.delay_ms(self.core.config.readvertise_delay_ms);
                if let Err(e) = link.restart_advertising() {
                    let error = Error::from(e);
                    warn!("Restart advertising failed: {}", error);
                    sink.emit(&AppEvent::AdvertisingFailed(error));
                }
                info!("Restarting advertising...");
                self.core.state.was_connected = false;
                sink.emit(&AppEvent::Disconnected);
            } else {
                self.core.state.was_connected = true;
                self.scheduler.on_connected(now);
                info!("Connection established, ready for testing!");
                sink.emit(&AppEvent::Connected);
            }
        }

        let gates = Gates {
            connected: self.core.state.connected,
            auto_notify: self.core.state.auto_notify,
        };
        let mut dispatch = TimerDispatch {
            core: &mut self.core,
            board,
            link,
            sink,
        };
        self.scheduler.tick(now, gates, &mut dispatch);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.core.state.connected
    }

    pub fn auto_notify(&self) -> bool {
        self.core.state.auto_notify
    }

    pub fn messages_sent(&self) -> u32 {
        self.core.state.messages_sent
    }

    pub fn relays(&self) -> u32 {
        self.core.state.relays
    }

    pub fn text_seq(&self) -> u32 {
        self.core.state.text_seq
    }

    pub fn sensors(&self) -> &SimulatedSensors {
        &self.core.state.sensors
    }

    /// When the given timer is next due (ms since boot).
    pub fn next_due_ms(&self, timer: TimerKind) -> u64 {
        self.scheduler.next_due_ms(timer)
    }
}

// ───────────────────────────────────────────────────────────────
// Actions
// ───────────────────────────────────────────────────────────────

impl NodeCore {
    fn set_connected(&mut self, connected: bool) {
        if self.state.connected != connected {
            self.state.connected = connected;
            self.state.pending_edges = self.state.pending_edges.saturating_add(1);
        }
    }

    fn identity(&self) -> Identity<'_> {
        Identity {
            device_name: &self.config.device_name,
            sender_id: &self.config.sender_id,
            sender_name: &self.config.sender_name,
        }
    }

    fn snapshot(&self, uptime_ms: u64) -> Snapshot {
        Snapshot {
            battery_percent: self.state.sensors.battery_percent(),
            rssi_dbm: self.state.sensors.rssi_dbm(),
            messages_sent: self.state.messages_sent,
            relays: self.state.relays,
            auto_notify: self.state.auto_notify,
            uptime_ms,
        }
    }

    fn send_status(
        &mut self,
        board: &mut impl ClockPort,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        let snap = self.snapshot(board.now_ms());
        let encoded = messages::encode_status(&self.identity(), &snap);
        self.transmit(PayloadKind::Status, encoded, link, sink);
    }

    fn send_distress(
        &mut self,
        board: &mut (impl IndicatorPort + ClockPort),
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        let encoded = messages::encode_distress(&self.identity(), board.now_ms());
        self.transmit(PayloadKind::Distress, encoded, link, sink);
        self.blink(board, BLINK_DISTRESS);
    }

    fn send_text(
        &mut self,
        board: &mut (impl IndicatorPort + ClockPort),
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        self.state.text_seq = self.state.text_seq.wrapping_add(1);
        let encoded = messages::encode_text(&self.identity(), board.now_ms(), self.state.text_seq);
        self.transmit(PayloadKind::Text, encoded, link, sink);
        self.blink(board, BLINK_TEXT);
    }

    fn send_auto(
        &mut self,
        board: &mut (impl ClockPort + RandomSource),
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        let env = Environment::sample(board);
        let snap = self.snapshot(board.now_ms());
        let encoded = messages::encode_auto(&self.identity(), &snap, env);
        self.transmit(PayloadKind::AutoNotification, encoded, link, sink);
    }

    /// Hand a payload to the transport. Best-effort: a failed notify is
    /// reported and still counts as sent.
    fn transmit(
        &mut self,
        kind: PayloadKind,
        encoded: Result<String>,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        let json = match encoded {
            Ok(json) => json,
            Err(e) => {
                warn!("{:?} payload not generated: {}", kind, e);
                return;
            }
        };
        if let Err(e) = link.notify(&json) {
            let error = Error::from(e);
            warn!("{:?} notify failed: {}", kind, error);
            sink.emit(&AppEvent::NotifyFailed { kind, error });
        }
        self.state.messages_sent = self.state.messages_sent.wrapping_add(1);
        sink.emit(&AppEvent::PayloadSent { kind, json });
    }

    fn set_auto_notify(&mut self, enabled: bool, sink: &mut impl EventSink) {
        self.state.auto_notify = enabled;
        info!("Auto-notify {}", if enabled { "enabled" } else { "disabled" });
        sink.emit(&AppEvent::AutoNotifyChanged(enabled));
    }

    fn relay(
        &mut self,
        payload: &str,
        board: &mut (impl ClockPort + RandomSource),
        sink: &mut impl EventSink,
    ) {
        info!("Simulating mesh relay ({} bytes)...", payload.len());
        board.delay_ms(RELAY_PRE_DELAY_MS);

        self.state.relays = self.state.relays.wrapping_add(1);
        let hops = board.range(RELAY_HOPS.0, RELAY_HOPS.1) as u8;
        info!("Message relayed to {} virtual nodes", hops);
        info!("Relay counter: {}", self.state.relays);

        board.delay_ms(RELAY_POST_DELAY_MS);
        info!("Relay complete!");
        sink.emit(&AppEvent::Relayed {
            hops,
            total: self.state.relays,
        });
    }

    fn update_sensors(&mut self, board: &mut impl RandomSource, sink: &mut impl EventSink) {
        let update = self.state.sensors.tick(board);
        sink.emit(&AppEvent::SensorsUpdated {
            battery_percent: self.state.sensors.battery_percent(),
            rssi_dbm: self.state.sensors.rssi_dbm(),
            battery_wrapped: update.battery_wrapped,
        });
    }

    /// Flash `times`, then restore solid-on if a central is connected.
    fn blink(&self, board: &mut (impl IndicatorPort + ClockPort), (times, half_ms): (u8, u32)) {
        for _ in 0..times {
            board.set_indicator(true);
            board.delay_ms(half_ms);
            board.set_indicator(false);
            board.delay_ms(half_ms);
        }
        if self.state.connected {
            board.set_indicator(true);
        }
    }

    fn idle_flash(&self, board: &mut (impl IndicatorPort + ClockPort)) {
        if self.state.connected {
            return;
        }
        board.set_indicator(true);
        board.delay_ms(IDLE_FLASH_MS);
        board.set_indicator(false);
    }
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate
// ───────────────────────────────────────────────────────────────

/// Borrows everything a fired timer needs for the duration of one pass.
struct TimerDispatch<'a, B, L, S> {
    core: &'a mut NodeCore,
    board: &'a mut B,
    link: &'a mut L,
    sink: &'a mut S,
}

impl<B, L, S> SchedulerDelegate for TimerDispatch<'_, B, L, S>
where
    B: IndicatorPort + ClockPort + RandomSource,
    L: LinkPort,
    S: EventSink,
{
    fn on_timer_fired(&mut self, timer: TimerKind) {
        match timer {
            TimerKind::Distress => self.core.send_distress(self.board, self.link, self.sink),
            TimerKind::Text => self.core.send_text(self.board, self.link, self.sink),
            TimerKind::AutoNotify => self.core.send_auto(self.board, self.link, self.sink),
            TimerKind::SensorUpdate => self.core.update_sensors(self.board, self.sink),
            TimerKind::IdleBlink => self.core.idle_flash(self.board),
        }
    }
}
