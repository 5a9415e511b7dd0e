//! Interval timer engine.
//!
//! Five independent timers, evaluated once per main-loop pass. The
//! scheduler notifies a [`SchedulerDelegate`] when a timer fires; the
//! node service implements the delegate and does the actual work.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Interval timers                          │
//! │                                                              │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────────┐ ┌───────┐ │
//! │  │ Distress │ │   Text   │ │   Auto   │ │ Sensor │ │ Idle  │ │
//! │  │  60 s    │ │  60 s    │ │  10 s    │ │  5 s   │ │ 2 s   │ │
//! │  └────┬─────┘ └────┬─────┘ └────┬─────┘ └───┬────┘ └───┬───┘ │
//! │       │  connected │  connected │ + auto    │          │     │
//! │       ▼            ▼            ▼           ▼          ▼     │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              SchedulerDelegate                         │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │                NodeService::on_timer_fired()                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A gated timer that is not allowed to run neither fires nor resets.

use log::debug;

use crate::app::ports::{SchedulerDelegate, TimerKind};
use crate::config::NodeConfig;

// ═══════════════════════════════════════════════════════════════
//  Interval timer
// ═══════════════════════════════════════════════════════════════

/// A periodic timer that remembers when it is next due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    interval_ms: u64,
    next_due_ms: u64,
}

impl IntervalTimer {
    /// A timer first due `interval_ms` after `now_ms`.
    pub fn new(interval_ms: u32, now_ms: u64) -> Self {
        Self {
            interval_ms: u64::from(interval_ms),
            next_due_ms: now_ms + u64::from(interval_ms),
        }
    }

    /// Fire if due, and restart the period from `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if now_ms >= self.next_due_ms {
            self.next_due_ms = now_ms + self.interval_ms;
            true
        } else {
            false
        }
    }

    /// Re-arm so the next fire happens `first_delay_ms` after `now_ms`.
    pub fn arm(&mut self, now_ms: u64, first_delay_ms: u32) {
        self.next_due_ms = now_ms + u64::from(first_delay_ms);
    }

    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Conditions the gated timers depend on, sampled once per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gates {
    pub connected: bool,
    pub auto_notify: bool,
}

impl Gates {
    fn allows(self, timer: TimerKind) -> bool {
        match timer {
            TimerKind::Distress | TimerKind::Text => self.connected,
            TimerKind::AutoNotify => self.connected && self.auto_notify,
            TimerKind::SensorUpdate | TimerKind::IdleBlink => true,
        }
    }
}

/// The scheduler engine.
///
/// Decoupled from the service: when a timer fires it invokes the
/// [`SchedulerDelegate`] rather than acting itself.
pub struct Scheduler {
    distress: IntervalTimer,
    text: IntervalTimer,
    auto_notify: IntervalTimer,
    sensor_update: IntervalTimer,
    idle_blink: IntervalTimer,
    text_offset_ms: u32,
}

impl Scheduler {
    /// Build all five timers, first due one interval after `now_ms`
    /// (text: `text_offset_ms`).
    pub fn new(config: &NodeConfig, now_ms: u64) -> Self {
        let mut text = IntervalTimer::new(config.text_interval_ms, now_ms);
        text.arm(now_ms, config.text_offset_ms);
        Self {
            distress: IntervalTimer::new(config.distress_interval_ms, now_ms),
            text,
            auto_notify: IntervalTimer::new(config.auto_notify_interval_ms, now_ms),
            sensor_update: IntervalTimer::new(config.sensor_update_interval_ms, now_ms),
            idle_blink: IntervalTimer::new(config.idle_blink_interval_ms, now_ms),
            text_offset_ms: config.text_offset_ms,
        }
    }

    /// Restart the connection-gated timers from the connection instant.
    pub fn on_connected(&mut self, now_ms: u64) {
        let distress = self.distress.interval_ms() as u32;
        let auto = self.auto_notify.interval_ms() as u32;
        self.distress.arm(now_ms, distress);
        self.text.arm(now_ms, self.text_offset_ms);
        self.auto_notify.arm(now_ms, auto);
        debug!("Scheduler: gated timers re-armed at {} ms", now_ms);
    }

    /// Evaluate every timer once. Fired timers are reported in
    /// [`TimerKind::ALL`] order.
    pub fn tick(&mut self, now_ms: u64, gates: Gates, delegate: &mut dyn SchedulerDelegate) {
        for kind in TimerKind::ALL {
            if !gates.allows(kind) {
                continue;
            }
            if self.timer_mut(kind).poll(now_ms) {
                delegate.on_timer_fired(kind);
            }
        }
    }

    /// When `kind` is next due.
    pub fn next_due_ms(&self, kind: TimerKind) -> u64 {
        self.timer(kind).next_due_ms()
    }

    fn timer(&self, kind: TimerKind) -> &IntervalTimer {
        match kind {
            TimerKind::Distress => &self.distress,
            TimerKind::Text => &self.text,
            TimerKind::AutoNotify => &self.auto_notify,
            TimerKind::SensorUpdate => &self.sensor_update,
            TimerKind::IdleBlink => &self.idle_blink,
        }
    }

    fn timer_mut(&mut self, kind: TimerKind) -> &mut IntervalTimer {
        match kind {
            TimerKind::Distress => &mut self.distress,
            TimerKind::Text => &mut self.text,
            TimerKind::AutoNotify => &mut self.auto_notify,
            TimerKind::SensorUpdate => &mut self.sensor_update,
            TimerKind::IdleBlink => &mut self.idle_blink,
        }
    }
}
