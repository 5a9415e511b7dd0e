//! Fuzz target: `Command::parse`
//!
//! Arbitrary characteristic writes must never panic, and every non-empty
//! write must map to exactly one command.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use beacon_node::app::commands::Command;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match Command::parse(data) {
        None => assert!(data.is_empty(), "non-empty write was dropped"),
        Some(Command::Relay(text)) => {
            // Relay input keeps the untrimmed (lossy) text.
            assert_eq!(text, String::from_utf8_lossy(data));
        }
        Some(cmd) => assert_ne!(cmd.name(), "RELAY"),
    }
});
