//! Rejection and validation errors.
//!
//! Every command on the coordinator reports misuse as a typed rejection
//! rather than a panic; the worst outcome of an ill-timed call is an
//! `Err` the caller can surface and re-issue once the blocking condition
//! clears.

use thiserror::Error;

use crate::match_setup::Team;

/// Reason a command was refused in the current state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The match, or the thing being acted on, is not currently running.
    #[error("match is not running")]
    NotRunning,

    /// A conflicting activity is already in progress.
    #[error("already active")]
    AlreadyActive,

    /// The team has no timeouts left to spend.
    #[error("{team} has no timeouts remaining")]
    BudgetExhausted { team: Team },

    /// Resuming from a manual pause needs a next-raider decision first.
    #[error("a next-raider decision is required to resume")]
    DecisionRequired,

    /// The match is over; only reset is accepted.
    #[error("match has ended")]
    MatchEnded,
}

impl RejectReason {
    /// Whether clearing the rejection takes an explicit caller choice,
    /// as opposed to the match simply moving on.
    pub fn needs_caller_input(&self) -> bool {
        matches!(self, RejectReason::DecisionRequired)
    }
}

/// Invalid match configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("team name must not be empty: {side}")]
    EmptyTeamName { side: &'static str },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}
