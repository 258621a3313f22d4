//! Team timeout budgets and the active interrupt.

use serde::{Deserialize, Serialize};

use crate::error::RejectReason;
use crate::match_setup::Team;

/// Per-team timeout allowance plus the interrupt currently in progress.
///
/// The budget decrements exactly once, the instant an interrupt becomes
/// active for that side, and never goes below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutState {
    remaining_a: u8,
    remaining_b: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    called_by: Option<Team>,
}

impl TimeoutState {
    pub fn new(per_team: u8) -> Self {
        Self { remaining_a: per_team, remaining_b: per_team, called_by: None }
    }

    pub fn remaining(&self, team: Team) -> u8 {
        match team {
            Team::A => self.remaining_a,
            Team::B => self.remaining_b,
        }
    }

    /// The side whose interrupt is in progress, if any.
    pub fn active(&self) -> Option<Team> {
        self.called_by
    }

    pub fn is_active(&self) -> bool {
        self.called_by.is_some()
    }

    /// Spend one of `team`'s timeouts and mark the interrupt active.
    pub fn begin(&mut self, team: Team) -> Result<(), RejectReason> {
        if self.called_by.is_some() {
            return Err(RejectReason::AlreadyActive);
        }
        let left = match team {
            Team::A => &mut self.remaining_a,
            Team::B => &mut self.remaining_b,
        };
        if *left == 0 {
            return Err(RejectReason::BudgetExhausted { team });
        }
        *left -= 1;
        self.called_by = Some(team);
        Ok(())
    }

    /// Clear the active interrupt, if any, returning who had called it.
    /// Spent budget stays spent.
    pub fn end(&mut self) -> Option<Team> {
        self.called_by.take()
    }
}
