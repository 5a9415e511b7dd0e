//! Beacon Node Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single cooperative main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BoardAdapter            BleAdapter        LogEventSink        │
//! │  (LED+Clock+RNG)         (LinkPort)        (EventSink)         │
//! │                              │                                 │
//! │               LINK_STATE + TRANSPORT_EVENTS queue              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              NodeService (pure logic)                  │    │
//! │  │  Commands · Encoder · Relay · Sensors                  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven interval timers)                   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
use log::{error, info};

use beacon_node::adapters::ble::{BleAdapter, SERVICE_UUID};
use beacon_node::adapters::board::BoardAdapter;
use beacon_node::adapters::log_sink::LogEventSink;
use beacon_node::adapters::rng::HardwareRng;
use beacon_node::adapters::time::MonotonicClock;
use beacon_node::app::ports::ClockPort;
use beacon_node::app::service::NodeService;
use beacon_node::config::NodeConfig;
use beacon_node::drivers::status_led::StatusLed;
use beacon_node::error::Error;
use beacon_node::events::{self, LINK_STATE, TRANSPORT_EVENTS};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Beacon Node v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!("Service UUID: {:032x}", SERVICE_UUID);

    // ── 2. Configuration ──────────────────────────────────────
    let config = NodeConfig::default();
    config.validate().map_err(Error::from)?;
    info!("Config: {}", serde_json::to_string(&config).map_err(Error::from)?);

    // ── 3. Board peripherals ──────────────────────────────────
    // SAFETY: the LED GPIO is not claimed anywhere else.
    let led_pin = unsafe { AnyOutputPin::new(config.led_gpio) };
    let led = StatusLed::new(PinDriver::output(led_pin)?);
    let mut board = BoardAdapter::new(led, MonotonicClock::new(FreeRtos), HardwareRng::new());

    // ── 4. BLE peripheral ─────────────────────────────────────
    let mut ble = BleAdapter::new(config.device_name.clone(), &TRANSPORT_EVENTS, &LINK_STATE);
    if let Err(e) = ble.start() {
        error!("BLE start failed: {}", e);
        return Err(Error::from(e).into());
    }

    // ── 5. Node service ───────────────────────────────────────
    let mut sink = LogEventSink::new();
    let loop_delay_ms = config.loop_delay_ms;
    let mut node = NodeService::new(config, board.now_ms());
    node.start(&mut board, &mut sink);

    info!("Ready. Entering main loop.");

    // ── 6. Main loop ──────────────────────────────────────────
    loop {
        events::drain_link(&LINK_STATE, |event| {
            node.apply_event(event, &mut board, &mut ble, &mut sink);
        });
        events::drain_events(&TRANSPORT_EVENTS, |event| {
            node.apply_event(event, &mut board, &mut ble, &mut sink);
        });

        node.poll(&mut board, &mut ble, &mut sink);

        board.delay_ms(loop_delay_ms);
    }
}
