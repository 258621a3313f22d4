//! Countdown clock primitives.
//!
//! Three of these run during a match (match, raid, timeout), each at its
//! own tick period. They are dumb countdown devices: every business rule
//! lives in the coordinator. Remaining time derives from elapsed time on
//! each poll, never from naive per-period decrements, so host scheduling
//! jitter cannot accumulate into drift.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic time source injected into the coordinator.
///
/// Hosts drive the engine by calling `MatchCoordinator::tick()` from
/// their own scheduling primitive; the coordinator reads the current
/// time through this trait.
pub trait TimeSource {
    /// Milliseconds since an arbitrary fixed origin. Must never go
    /// backwards.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time source backed by `std::time::Instant`.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Manually advanced time source for deterministic hosts and tests.
///
/// Clones share the underlying reading, so a driver can keep a handle
/// while the coordinator owns its own copy. Single-threaded, like the
/// rest of the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get() + delta_ms);
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Event reported by a clock poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// At least one full period elapsed since the last report.
    Tick { remaining_ms: u64 },
    /// The countdown reached zero. Reported exactly once per start.
    Expired,
}

/// A single countdown: starts from a duration, reports ticks at a fixed
/// period, expires once, and can be cancelled at any time.
#[derive(Debug, Clone)]
pub struct CountdownClock {
    period_ms: u64,
    duration_ms: u64,
    remaining_ms: u64,
    running: bool,
    started_at_ms: u64,
    last_tick_index: u64,
}

impl CountdownClock {
    /// A stopped clock that will report ticks every `period_ms`.
    pub fn new(period_ms: u64) -> Self {
        debug_assert!(period_ms > 0);
        Self {
            period_ms,
            duration_ms: 0,
            remaining_ms: 0,
            running: false,
            started_at_ms: 0,
            last_tick_index: 0,
        }
    }

    /// Begin counting down from `duration_ms`. Starting while already
    /// running implicitly cancels the previous countdown. A zero
    /// duration leaves the clock stopped.
    pub fn start(&mut self, now_ms: u64, duration_ms: u64) {
        self.duration_ms = duration_ms;
        self.remaining_ms = duration_ms;
        self.started_at_ms = now_ms;
        self.last_tick_index = 0;
        self.running = duration_ms > 0;
    }

    /// Stop the countdown. Idempotent; once this returns, `poll` reports
    /// nothing until the next `start`. Remaining time is preserved so a
    /// paused countdown can resume via `start(now, remaining_ms())`.
    pub fn cancel(&mut self) {
        self.running = false;
    }

    /// Stop and load a fresh duration for display (the raid clock's
    /// "back to default" state between raids).
    pub fn reset(&mut self, duration_ms: u64) {
        self.running = false;
        self.duration_ms = duration_ms;
        self.remaining_ms = duration_ms;
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Advance to `now_ms` and report at most one event: `Expired` once
    /// the countdown is exhausted, otherwise one `Tick` when at least
    /// one new period boundary has passed since the last report.
    pub fn poll(&mut self, now_ms: u64) -> Option<ClockEvent> {
        if !self.running {
            return None;
        }
        let elapsed = now_ms.saturating_sub(self.started_at_ms);
        let remaining = self.duration_ms.saturating_sub(elapsed);
        if remaining == 0 {
            self.remaining_ms = 0;
            self.running = false;
            return Some(ClockEvent::Expired);
        }
        let tick_index = elapsed / self.period_ms;
        if tick_index > self.last_tick_index {
            self.last_tick_index = tick_index;
            self.remaining_ms = remaining;
            return Some(ClockEvent::Tick { remaining_ms: remaining });
        }
        None
    }
}
