//! Unified error types for the Beacon node firmware.
//!
//! Nothing here ever reaches the BLE central: the node is best-effort, so
//! the service reports these through the event sink and carries on. The
//! binary's `main` only aborts when configuration or the BLE stack fails
//! at boot.

use core::fmt;

use crate::adapters::ble::TransportError;
use crate::config::ConfigError;

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The BLE transport rejected or failed an operation.
    Transport(TransportError),
    /// A payload could not be serialised.
    Encode,
    /// Configuration failed validation.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Encode => write!(f, "payload encoding failed"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        log::debug!("serde_json: {}", e);
        Self::Encode
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
