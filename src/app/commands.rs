//! Inbound commands to the node service.
//!
//! A central writes plain text to the message characteristic. The payload
//! is trimmed and matched exactly (case-sensitive) against five literals;
//! anything else is relay input for the simulated mesh hop.

/// Commands the central can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `GET_STATUS`: notify a status report.
    GetStatus,
    /// `ENABLE_AUTO`: resume periodic auto-notifications.
    EnableAuto,
    /// `DISABLE_AUTO`: pause periodic auto-notifications.
    DisableAuto,
    /// `SEND_SOS`: notify a distress message now.
    SendSos,
    /// `RESET_STATS`: zero the message and relay counters.
    ResetStats,
    /// Anything else: forwarded through the simulated mesh.
    /// Carries the payload as received (untrimmed).
    Relay(String),
}

impl Command {
    /// Parse a raw characteristic write.
    ///
    /// Returns `None` for an empty write; every non-empty payload maps to
    /// exactly one command. Invalid UTF-8 is replaced, never rejected.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(raw);
        let cmd = match text.trim() {
            "GET_STATUS" => Self::GetStatus,
            "ENABLE_AUTO" => Self::EnableAuto,
            "DISABLE_AUTO" => Self::DisableAuto,
            "SEND_SOS" => Self::SendSos,
            "RESET_STATS" => Self::ResetStats,
            _ => Self::Relay(text.into_owned()),
        };
        Some(cmd)
    }

    /// Wire name of the command (`RELAY` for relay input).
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetStatus => "GET_STATUS",
            Self::EnableAuto => "ENABLE_AUTO",
            Self::DisableAuto => "DISABLE_AUTO",
            Self::SendSos => "SEND_SOS",
            Self::ResetStats => "RESET_STATS",
            Self::Relay(_) => "RELAY",
        }
    }
}
