//! Beacon mesh-node firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod sensors;

// The platform-specific halves live behind cfg attributes inside.
pub mod adapters;
pub mod drivers;
