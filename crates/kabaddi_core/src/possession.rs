//! Possession turn-taking and the post-pause decision gate.

use serde::{Deserialize, Serialize};

use crate::match_setup::Team;

/// Which side holds the raid turn and whether a raid is underway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Possession {
    pub raiding_team: Team,
    pub raid_active: bool,
}

impl Possession {
    pub fn new(starting_team: Team) -> Self {
        Self { raiding_team: starting_team, raid_active: false }
    }

    /// End the current raid and hand the turn to the other side.
    /// Returns the new raiding team. The next raid is never auto-started.
    pub fn hand_over(&mut self) -> Team {
        self.raid_active = false;
        self.raiding_team = self.raiding_team.opponent();
        self.raiding_team
    }
}

/// The choice solicited from the table official before play resumes
/// after a manual pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaidDecision {
    /// The side that held the turn before the pause raids again.
    SameTeamReraids,
    /// The turn passes to the opponent.
    OpponentRaids,
}

/// Outstanding request for a [`RaidDecision`]. While one is pending,
/// plain resumption is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDecision {
    /// The side that held the raid turn when play stopped.
    pub last_raiding_team: Team,
}

impl PendingDecision {
    /// The raiding team implied by `decision`.
    pub fn resolve(&self, decision: RaidDecision) -> Team {
        match decision {
            RaidDecision::SameTeamReraids => self.last_raiding_team,
            RaidDecision::OpponentRaids => self.last_raiding_team.opponent(),
        }
    }
}
