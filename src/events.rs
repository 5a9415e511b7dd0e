//! Transport events.
//!
//! Produced by the BLE stack callbacks (Bluedroid task on the device, test
//! code on the host) and consumed by the main loop once per pass, before
//! the scheduler runs.
//!
//! Writes go through a bounded queue and may be dropped when it is full.
//! Connection state never does: it is a level flag plus a transition
//! counter ([`LinkState`]), so a burst of writes cannot hide a disconnect
//! and a connect/disconnect pair between two passes is still seen as two
//! transitions.
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐
//! │ GATTS connect   │────▶│  LinkState   │────┐
//! │ GATTS disconnect│────▶│  (atomics)   │    │    ┌──────────────┐
//! │                 │     └──────────────┘    ├───▶│  Main Loop   │
//! │                 │     ┌──────────────┐    │    │  (consumer)  │
//! │ GATTS write     │────▶│  Event Queue │────┘    └──────────────┘
//! └─────────────────┘     │(embassy-sync)│
//!                         └──────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

/// Largest inbound write we keep; longer writes are truncated.
pub const MAX_WRITE_LEN: usize = 512;

/// Channel depth for inbound writes.
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// Something the BLE transport observed between two loop passes.
///
/// Writes arrive through the [`EventQueue`]; connection changes are
/// replayed from a [`LinkState`] by [`drain_link`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A central connected.
    Connected,
    /// The central went away.
    Disconnected,
    /// The central wrote to the message characteristic.
    Write(heapless::Vec<u8, MAX_WRITE_LEN>),
}

impl TransportEvent {
    /// Build a write event, truncating to [`MAX_WRITE_LEN`].
    pub fn write(data: &[u8]) -> Self {
        let len = data.len().min(MAX_WRITE_LEN);
        if len < data.len() {
            warn!("events: write truncated ({} > {})", data.len(), MAX_WRITE_LEN);
        }
        let mut buf = heapless::Vec::new();
        // Cannot fail: len is bounded by capacity.
        let _ = buf.extend_from_slice(&data[..len]);
        Self::Write(buf)
    }
}

/// Bounded MPMC queue carrying writes from the BLE callbacks to the main loop.
pub type EventQueue = Channel<CriticalSectionRawMutex, TransportEvent, EVENT_QUEUE_DEPTH>;

/// Queue fed by the Bluedroid callbacks on the device.
pub static TRANSPORT_EVENTS: EventQueue = Channel::new();

/// Push an event into the queue.
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(queue: &EventQueue, event: TransportEvent) -> bool {
    match queue.try_send(event) {
        Ok(()) => true,
        Err(_) => {
            warn!("events: queue full, event dropped");
            false
        }
    }
}

/// Drain all pending events into a callback, in FIFO order.
pub fn drain_events(queue: &EventQueue, mut handler: impl FnMut(TransportEvent)) {
    while let Ok(event) = queue.try_receive() {
        handler(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

/// Lossless connection state shared between the BLE callbacks and the
/// main loop.
///
/// Bit 0 holds the current level, the remaining bits count transitions
/// since the last drain. Transitions strictly alternate, so the level and
/// the count are enough to replay them in order. Both live in one word so
/// a drain sees a consistent pair.
pub struct LinkState {
    word: AtomicU32,
}

const LEVEL_BIT: u32 = 1;

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkState {
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    /// Record the link level reported by the stack. Repeats are ignored.
    pub fn record(&self, connected: bool) {
        let level = u32::from(connected);
        let _ = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| {
                if w & LEVEL_BIT == level {
                    None
                } else {
                    let count = (w >> 1).wrapping_add(1);
                    Some((count << 1) | level)
                }
            });
    }

    pub fn is_connected(&self) -> bool {
        self.word.load(Ordering::Acquire) & LEVEL_BIT != 0
    }

    /// Current level and pending transition count; clears the count.
    fn take(&self) -> (bool, u32) {
        let w = self.word.fetch_and(LEVEL_BIT, Ordering::AcqRel);
        (w & LEVEL_BIT != 0, w >> 1)
    }
}

/// Connection state fed by the Bluedroid callbacks on the device.
pub static LINK_STATE: LinkState = LinkState::new();

/// Replay every connection transition since the previous call as
/// `Connected` / `Disconnected` events, oldest first.
pub fn drain_link(link: &LinkState, mut handler: impl FnMut(TransportEvent)) {
    let (level, pending) = link.take();
    if pending == 0 {
        return;
    }
    // The last transition ended at `level`; walk back to find the first.
    let mut next = if pending % 2 == 1 { level } else { !level };
    for _ in 0..pending {
        handler(if next {
            TransportEvent::Connected
        } else {
            TransportEvent::Disconnected
        });
        next = !next;
    }
}
