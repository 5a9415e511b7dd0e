//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the node's behaviour: command parsing and
//! dispatch, payload encoding, relay bookkeeping and the reaction to
//! scheduler timers. All interaction with the radio, LED and clock happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod messages;
pub mod ports;
pub mod service;
