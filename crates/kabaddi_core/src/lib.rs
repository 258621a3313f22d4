//! # kabaddi_core - Match Clock Coordination Engine
//!
//! Real-time clock coordination for a two-team kabaddi match: an overall
//! match clock, a per-possession raid clock, and an interrupt-style team
//! timeout clock tick concurrently under one coordinator that owns every
//! precedence rule between them: a timeout suspends everything, a half
//! boundary waits for the raid in progress, and a manually paused match
//! stays held until an official picks the next raider.
//!
//! ## Features
//! - Deterministic single-threaded core, drivable from any host scheduler
//! - Injected time source ([`TimeSource`]) for wall-clock or scripted time
//! - Typed rejection of every ill-timed command; nothing panics
//! - State-change notifications for a presentation layer to render
//!
//! The crate is presentation-free: hosts render clocks and buttons and
//! relay taps; the engine arbitrates.

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod format;
pub mod match_setup;
pub mod possession;
pub mod timeout;

#[cfg(test)]
mod scenarios_test;

pub use clock::{ClockEvent, CountdownClock, ManualClock, MonotonicClock, TimeSource};
pub use coordinator::{
    MatchCoordinator, MatchPhase, MatchSnapshot, Score, MATCH_CLOCK_PERIOD_MS,
    RAID_CLOCK_PERIOD_MS, TIMEOUT_CLOCK_PERIOD_MS,
};
pub use error::{RejectReason, SetupError};
pub use events::{EventType, MatchEvent};
pub use match_setup::{MatchSetup, Team};
pub use possession::{PendingDecision, Possession, RaidDecision};
pub use timeout::TimeoutState;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
