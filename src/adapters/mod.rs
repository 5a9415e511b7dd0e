//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                 |
//! |------------|-----------------|-----------------------------|
//! | `ble`      | LinkPort        | Bluedroid GATT server       |
//! | `board`    | IndicatorPort   | Status LED GPIO             |
//! |            | ClockPort       | ESP32 system timer          |
//! |            | RandomSource    | ESP32 hardware RNG          |
//! | `log_sink` | EventSink       | Serial log output           |
//! | `rng`      | RandomSource    | ESP32 hardware RNG          |
//! | `time`     | ClockPort       | ESP32 system timer          |

pub mod ble;
pub mod board;
pub mod log_sink;
pub mod rng;
pub mod time;
