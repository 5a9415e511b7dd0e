//! Integration tests: transport events → NodeService → link / LED / sink.

use beacon_node::adapters::ble::TransportError;
use beacon_node::app::events::{AppEvent, PayloadKind};
use beacon_node::app::ports::{ClockPort, TimerKind};
use beacon_node::app::service::NodeService;
use beacon_node::config::NodeConfig;
use beacon_node::error::Error;
use beacon_node::events::TransportEvent;

use crate::mock_hw::{Draw, MockBoard, MockLink, RecordingSink};

struct Rig {
    node: NodeService,
    board: MockBoard,
    link: MockLink,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        Self::with_board(MockBoard::new())
    }

    fn with_board(board: MockBoard) -> Self {
        Self {
            node: NodeService::new(NodeConfig::default(), board.now),
            board,
            link: MockLink::default(),
            sink: RecordingSink::new(),
        }
    }

    fn event(&mut self, ev: TransportEvent) {
        self.node
            .apply_event(ev, &mut self.board, &mut self.link, &mut self.sink);
    }

    fn connect(&mut self) {
        self.link.connected = true;
        self.event(TransportEvent::Connected);
        self.poll();
    }

    fn write(&mut self, text: &str) {
        self.event(TransportEvent::write(text.as_bytes()));
    }

    fn poll(&mut self) {
        self.node
            .poll(&mut self.board, &mut self.link, &mut self.sink);
    }

    /// Main loop passes until the virtual clock passes `end_ms`.
    fn run_until(&mut self, end_ms: u64) {
        while self.board.now <= end_ms {
            self.poll();
            self.board.delay_ms(10);
        }
    }
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn get_status_reports_counters_before_increment() {
    let mut rig = Rig::new();
    rig.connect();

    rig.write("GET_STATUS");
    let first = rig.link.last_json().unwrap();
    assert_eq!(first["device"], "BEACON-NODE-001");
    assert_eq!(first["messages"], 0);
    assert_eq!(first["autoNotify"], true);

    rig.write("GET_STATUS");
    let second = rig.link.last_json().unwrap();
    assert_eq!(second["messages"], 1);
    assert_eq!(rig.node.messages_sent(), 2);
}

#[test]
fn command_is_trimmed_but_case_sensitive() {
    let mut rig = Rig::new();
    rig.connect();

    rig.write("  GET_STATUS\r\n");
    assert_eq!(rig.sink.sent(PayloadKind::Status).len(), 1);

    rig.write("get_status");
    assert_eq!(rig.sink.sent(PayloadKind::Status).len(), 1);
    assert_eq!(rig.node.relays(), 1);
}

#[test]
fn empty_write_is_ignored() {
    let mut rig = Rig::new();
    rig.connect();
    let before = rig.sink.events.len();
    let t0 = rig.board.now;

    rig.write("");

    assert_eq!(rig.sink.events.len(), before);
    assert_eq!(rig.board.now, t0, "no acknowledgement blink");
}

#[test]
fn send_sos_notifies_distress_and_blinks() {
    let mut rig = Rig::new();
    rig.connect();
    let t0 = rig.board.now;

    rig.write("SEND_SOS");

    let msg = rig.link.last_json().unwrap();
    assert_eq!(msg["type"], 0);
    assert_eq!(msg["priority"], 10);
    assert_eq!(msg["ttl"], 10);
    assert_eq!(msg["payload"]["lat"], 37.7749);
    assert_eq!(msg["id"], t0.to_string());
    // Distress 5 × 400 ms, then acknowledgement 3 × 200 ms.
    assert_eq!(rig.board.now - t0, 2_600);
    assert!(rig.board.led, "LED back on while connected");
}

#[test]
fn relay_counts_without_notifying() {
    let mut rig = Rig::with_board(MockBoard::with_draw(Draw::High));
    rig.connect();

    rig.write("hello mesh");

    assert!(rig.link.notified.is_empty());
    assert_eq!(rig.node.relays(), 1);
    assert_eq!(rig.node.messages_sent(), 0);
    assert!(rig.sink.events.contains(&AppEvent::Relayed { hops: 4, total: 1 }));
    assert!(rig.sink.events.contains(&AppEvent::CommandReceived {
        name: "RELAY",
        raw: "hello mesh".into(),
    }));
}

#[test]
fn reset_stats_keeps_text_sequence() {
    let mut rig = Rig::new();
    rig.connect();
    rig.run_until(30_000);
    assert_eq!(rig.node.text_seq(), 1);
    rig.write("relay me");
    assert!(rig.node.messages_sent() > 0);

    rig.write("RESET_STATS");

    assert_eq!(rig.node.messages_sent(), 0);
    assert_eq!(rig.node.relays(), 0);
    assert_eq!(rig.node.text_seq(), 1);
    rig.write("GET_STATUS");
    let status = rig.link.last_json().unwrap();
    assert_eq!(status["messages"], 0);
    assert_eq!(status["relays"], 0);
}

#[test]
fn disable_auto_pauses_and_enable_resumes() {
    let mut rig = Rig::new();
    rig.connect();
    rig.write("DISABLE_AUTO");
    rig.run_until(25_000);
    assert!(rig.sink.sent(PayloadKind::AutoNotification).is_empty());

    rig.write("ENABLE_AUTO");
    let resumed_at = rig.board.now;
    rig.poll();
    // Overdue timer fires on the first pass after the gate opens.
    let auto = rig.sink.sent(PayloadKind::AutoNotification);
    assert_eq!(auto.len(), 1);
    let v: serde_json::Value = serde_json::from_str(auto[0]).unwrap();
    assert_eq!(v["type"], "auto");
    assert_eq!(v["timestamp"], resumed_at);
    assert_eq!(
        rig.node.next_due_ms(TimerKind::AutoNotify),
        resumed_at + 10_000
    );
}

#[test]
fn failed_notify_still_counts() {
    let mut rig = Rig::new();
    // Service believes it is connected but the link refuses.
    rig.event(TransportEvent::Connected);
    rig.write("GET_STATUS");
    assert!(rig.link.notified.is_empty());
    assert_eq!(rig.node.messages_sent(), 1);
    assert_eq!(rig.sink.sent(PayloadKind::Status).len(), 1);
    assert_eq!(
        rig.sink.count(|e| *e
            == AppEvent::NotifyFailed {
                kind: PayloadKind::Status,
                error: Error::Transport(TransportError::NotConnected),
            }),
        1
    );
}

// ── Connection edges ──────────────────────────────────────────

#[test]
fn disconnect_restarts_advertising_once() {
    let mut rig = Rig::new();
    rig.connect();
    rig.link.connected = false;
    rig.event(TransportEvent::Disconnected);
    assert!(!rig.board.led);

    let t0 = rig.board.now;
    rig.poll();
    rig.poll();
    rig.poll();

    assert_eq!(rig.link.advertising_restarts, 1);
    assert_eq!(rig.board.now - t0, 500);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::Disconnected), 1);
}

#[test]
fn connect_and_disconnect_before_one_poll() {
    let mut rig = Rig::new();
    rig.event(TransportEvent::Connected);
    rig.event(TransportEvent::Disconnected);
    rig.poll();

    assert!(!rig.node.is_connected());
    assert_eq!(rig.link.advertising_restarts, 1);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::Connected), 1);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::Disconnected), 1);

    // Gates stay closed afterwards.
    rig.run_until(61_000);
    assert!(rig.sink.sent(PayloadKind::Text).is_empty());
    assert_eq!(rig.link.advertising_restarts, 1);
}

#[test]
fn connection_edge_reported_once() {
    let mut rig = Rig::new();
    rig.connect();
    rig.poll();
    rig.poll();
    assert_eq!(rig.sink.count(|e| *e == AppEvent::Connected), 1);
    assert!(rig.board.led);
}

#[test]
fn idle_node_flashes_and_sends_nothing() {
    let mut rig = Rig::new();
    rig.run_until(10_000);
    assert!(rig.link.notified.is_empty());
    assert_eq!(rig.node.messages_sent(), 0);
    // One 50 ms flash every 2 s.
    assert_eq!(rig.board.flashes_since(0), 5);
    assert!(!rig.board.led);
}

#[test]
fn sensors_drain_every_five_seconds() {
    let mut rig = Rig::new();
    rig.run_until(20_000);
    assert_eq!(rig.node.sensors().battery_tenths(), 996);
    let updates = rig
        .sink
        .count(|e| matches!(e, AppEvent::SensorsUpdated { .. }));
    assert_eq!(updates, 4);
}
