//! Match configuration supplied once before the first whistle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SetupError;

/// Default half length: a 40-minute match split in two.
pub const DEFAULT_HALF_MS: u64 = 20 * 60 * 1000;
/// Default raid window.
pub const DEFAULT_RAID_MS: u64 = 30 * 1000;
/// Fixed interrupt length of a team timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 30 * 1000;
/// Timeouts each team may call per match.
pub const DEFAULT_TIMEOUTS_PER_TEAM: u8 = 2;

/// One of the two sides in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    A,
    B,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::A => write!(f, "team A"),
            Team::B => write!(f, "team B"),
        }
    }
}

/// Everything the coordinator needs to run one match. Validated at
/// coordinator construction; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSetup {
    pub team_a: String,
    pub team_b: String,
    pub half_duration_ms: u64,
    pub raid_duration_ms: u64,
    pub timeout_duration_ms: u64,
    pub timeouts_per_team: u8,
    /// The side that raids first in the first half. The second half
    /// opens with the other side.
    pub starting_team: Team,
}

impl Default for MatchSetup {
    fn default() -> Self {
        Self {
            team_a: "Team A".to_string(),
            team_b: "Team B".to_string(),
            half_duration_ms: DEFAULT_HALF_MS,
            raid_duration_ms: DEFAULT_RAID_MS,
            timeout_duration_ms: DEFAULT_TIMEOUT_MS,
            timeouts_per_team: DEFAULT_TIMEOUTS_PER_TEAM,
            starting_team: Team::A,
        }
    }
}

impl MatchSetup {
    pub fn new(team_a: impl Into<String>, team_b: impl Into<String>) -> Self {
        Self { team_a: team_a.into(), team_b: team_b.into(), ..Self::default() }
    }

    pub fn with_half_duration_ms(mut self, ms: u64) -> Self {
        self.half_duration_ms = ms;
        self
    }

    pub fn with_raid_duration_ms(mut self, ms: u64) -> Self {
        self.raid_duration_ms = ms;
        self
    }

    pub fn with_timeout_duration_ms(mut self, ms: u64) -> Self {
        self.timeout_duration_ms = ms;
        self
    }

    pub fn with_timeouts_per_team(mut self, count: u8) -> Self {
        self.timeouts_per_team = count;
        self
    }

    pub fn with_starting_team(mut self, team: Team) -> Self {
        self.starting_team = team;
        self
    }

    /// Display name of `team`.
    pub fn team_name(&self, team: Team) -> &str {
        match team {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }

    /// Check the same constraints the setup screen enforces: both names
    /// present, all durations non-zero. A zero timeout budget is legal
    /// (every call is then refused for budget).
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.team_a.trim().is_empty() {
            return Err(SetupError::EmptyTeamName { side: "team_a" });
        }
        if self.team_b.trim().is_empty() {
            return Err(SetupError::EmptyTeamName { side: "team_b" });
        }
        if self.half_duration_ms == 0 {
            return Err(SetupError::ZeroDuration { field: "half_duration_ms" });
        }
        if self.raid_duration_ms == 0 {
            return Err(SetupError::ZeroDuration { field: "raid_duration_ms" });
        }
        if self.timeout_duration_ms == 0 {
            return Err(SetupError::ZeroDuration { field: "timeout_duration_ms" });
        }
        Ok(())
    }
}
