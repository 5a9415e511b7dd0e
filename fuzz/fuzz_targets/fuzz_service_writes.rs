//! Fuzz target: arbitrary write sequences through `NodeService`
//!
//! Splits the input on 0xFF into individual writes, applies them to a
//! connected node on a virtual clock, and checks that every notified
//! payload is a JSON object and the counters stay consistent.
//!
//! cargo fuzz run fuzz_service_writes

#![no_main]

use beacon_node::adapters::ble::TransportError;
use beacon_node::app::events::AppEvent;
use beacon_node::app::ports::{ClockPort, EventSink, IndicatorPort, LinkPort, RandomSource};
use beacon_node::app::service::NodeService;
use beacon_node::config::NodeConfig;
use beacon_node::events::TransportEvent;
use libfuzzer_sys::fuzz_target;

struct Board(u64);

impl IndicatorPort for Board {
    fn set_indicator(&mut self, _on: bool) {}
}

impl ClockPort for Board {
    fn now_ms(&self) -> u64 {
        self.0
    }
    fn delay_ms(&mut self, ms: u32) {
        self.0 += u64::from(ms);
    }
}

impl RandomSource for Board {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            low
        } else {
            low + (self.0 % (high - low) as u64) as i32
        }
    }
}

#[derive(Default)]
struct Link(Vec<String>);

impl LinkPort for Link {
    fn notify(&mut self, payload: &str) -> Result<(), TransportError> {
        self.0.push(payload.to_owned());
        Ok(())
    }
    fn restart_advertising(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let mut board = Board(0);
    let mut link = Link::default();
    let mut sink = Discard;
    let mut node = NodeService::new(NodeConfig::default(), 0);

    node.apply_event(TransportEvent::Connected, &mut board, &mut link, &mut sink);
    for chunk in data.split(|b| *b == 0xFF) {
        node.apply_event(TransportEvent::write(chunk), &mut board, &mut link, &mut sink);
        node.poll(&mut board, &mut link, &mut sink);
    }

    for payload in &link.0 {
        assert!(payload.starts_with('{') && payload.ends_with('}'));
    }
    // RESET_STATS can only lower the counter.
    assert!(node.messages_sent() as usize <= link.0.len());
});
