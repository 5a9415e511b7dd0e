//! Integration tests for the BLE adapter (simulation path) driving the
//! node service through the link state and the transport event queue.

use beacon_node::adapters::ble::{BleAdapter, BleState, INITIAL_MESSAGE};
use beacon_node::app::events::{AppEvent, PayloadKind};
use beacon_node::app::service::NodeService;
use beacon_node::config::NodeConfig;
use beacon_node::events::{EVENT_QUEUE_DEPTH, EventQueue, LinkState, drain_events, drain_link};

use crate::mock_hw::{MockBoard, RecordingSink};

struct Bench {
    queue: &'static EventQueue,
    link: &'static LinkState,
    ble: BleAdapter,
    node: NodeService,
    board: MockBoard,
    sink: RecordingSink,
}

impl Bench {
    fn new() -> Self {
        let queue: &'static EventQueue = Box::leak(Box::new(EventQueue::new()));
        let link: &'static LinkState = Box::leak(Box::new(LinkState::new()));
        let config = NodeConfig::default();
        let mut ble = BleAdapter::new(config.device_name.clone(), queue, link);
        ble.start().unwrap();
        Self {
            queue,
            link,
            ble,
            node: NodeService::new(config, 0),
            board: MockBoard::new(),
            sink: RecordingSink::new(),
        }
    }

    /// One main-loop pass: link transitions, queued writes, then poll.
    fn pass(&mut self) {
        drain_link(self.link, |ev| {
            self.node
                .apply_event(ev, &mut self.board, &mut self.ble, &mut self.sink);
        });
        drain_events(self.queue, |ev| {
            self.node
                .apply_event(ev, &mut self.board, &mut self.ble, &mut self.sink);
        });
        self.node
            .poll(&mut self.board, &mut self.ble, &mut self.sink);
    }
}

#[test]
fn advertises_with_fixed_characteristics() {
    let bench = Bench::new();
    assert_eq!(bench.ble.state(), BleState::Advertising);
    assert_eq!(bench.ble.device_id_value(), "BEACON-NODE-001");
    assert_eq!(bench.ble.message_value(), INITIAL_MESSAGE.as_bytes());
}

#[test]
fn status_request_round_trip() {
    let mut bench = Bench::new();
    bench.ble.on_central_connected();
    bench.pass();
    assert!(bench.node.is_connected());

    bench.ble.on_message_write(b"GET_STATUS");
    bench.pass();

    let notified = bench.ble.sim_notifications();
    assert_eq!(notified.len(), 1);
    assert!(notified[0].starts_with(r#"{"device":"BEACON-NODE-001","battery":100.0,"#));
    // The characteristic holds the last notified payload.
    assert_eq!(bench.ble.message_value(), notified[0].as_bytes());
}

#[test]
fn events_from_one_pass_apply_in_order() {
    let mut bench = Bench::new();
    bench.ble.on_central_connected();
    bench.ble.on_message_write(b"DISABLE_AUTO");
    bench.ble.on_message_write(b"GET_STATUS");
    bench.pass();

    let status: serde_json::Value =
        serde_json::from_str(&bench.ble.sim_notifications()[0]).unwrap();
    assert_eq!(status["autoNotify"], false);
}

#[test]
fn disconnect_then_reconnect() {
    let mut bench = Bench::new();
    bench.ble.on_central_connected();
    bench.pass();
    bench.ble.on_central_disconnected();
    bench.pass();

    assert_eq!(bench.ble.state(), BleState::Advertising);
    assert_eq!(bench.ble.sim_advertising_restarts(), 1);

    bench.ble.on_central_connected();
    bench.pass();
    assert_eq!(bench.sink.count(|e| *e == AppEvent::Connected), 2);
    assert_eq!(bench.sink.count(|e| *e == AppEvent::Disconnected), 1);
}

#[test]
fn writes_while_disconnected_still_dispatch() {
    let mut bench = Bench::new();
    bench.ble.on_message_write(b"SEND_SOS");
    bench.pass();

    // Nothing pushed, but the payload was generated and counted.
    assert!(bench.ble.sim_notifications().is_empty());
    assert_eq!(bench.node.messages_sent(), 1);
    assert_eq!(bench.sink.sent(PayloadKind::Distress).len(), 1);
    assert!(bench.ble.message_value().starts_with(br#"{"id":"#));
}

#[test]
fn disconnect_is_seen_behind_a_full_write_queue() {
    let mut bench = Bench::new();
    bench.ble.on_central_connected();
    bench.pass();

    for _ in 0..=EVENT_QUEUE_DEPTH {
        bench.ble.on_message_write(b"ENABLE_AUTO");
    }
    bench.ble.on_central_disconnected();
    bench.pass();

    assert!(!bench.node.is_connected());
    assert_eq!(bench.ble.sim_advertising_restarts(), 1);
    assert_eq!(bench.sink.count(|e| *e == AppEvent::Disconnected), 1);
    // Only the writes that fit were dispatched.
    assert_eq!(
        bench.sink.count(|e| matches!(e, AppEvent::AutoNotifyChanged(true))),
        EVENT_QUEUE_DEPTH
    );
}

#[test]
fn connect_and_disconnect_within_one_pass() {
    let mut bench = Bench::new();
    bench.ble.on_central_connected();
    bench.ble.on_central_disconnected();
    bench.pass();

    assert!(!bench.node.is_connected());
    assert_eq!(bench.ble.sim_advertising_restarts(), 1);
    assert_eq!(bench.ble.state(), BleState::Advertising);
    assert_eq!(bench.sink.count(|e| *e == AppEvent::Connected), 1);
    assert_eq!(bench.sink.count(|e| *e == AppEvent::Disconnected), 1);

    // A later reconnect is a fresh edge.
    bench.ble.on_central_connected();
    bench.pass();
    assert!(bench.node.is_connected());
    assert_eq!(bench.sink.count(|e| *e == AppEvent::Connected), 2);
}
