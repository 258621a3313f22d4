//! State-change notifications for the presentation layer.
//!
//! The coordinator buffers these as transitions happen; hosts drain them
//! from `tick()` (or `drain_events()`) and turn them into whatever the
//! surface needs: panel highlights, cues, dialogs.

use serde::{Deserialize, Serialize};

use crate::match_setup::Team;

/// One state-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    /// Match clock reading (remaining ms) when the event was emitted.
    pub match_ms: u64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// The side the event concerns, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
}

impl MatchEvent {
    pub fn new(event_type: EventType, match_ms: u64) -> Self {
        Self { match_ms, event_type, team: None }
    }

    pub fn for_team(event_type: EventType, match_ms: u64, team: Team) -> Self {
        Self { match_ms, event_type, team: Some(team) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// First whistle; `team` raids first.
    MatchStarted,
    /// A raid window opened for `team`.
    RaidStarted,
    /// The raid clock ran out; possession changes automatically.
    RaidExpired,
    /// The raiding side ended its raid early.
    RaidEnded,
    /// The raid turn moved to `team`. The next raid waits for a tap;
    /// hosts surface this as the short on-screen cue.
    PossessionChanged,
    HalftimeReached,
    /// Second half under way; `team` (the side that did not open the
    /// match) raids first.
    SecondHalfStarted,
    /// `team` spent a timeout; all play clocks are suspended.
    TimeoutStarted,
    TimeoutEnded,
    MatchPaused,
    /// Play continues; `team` holds the raid turn.
    MatchResumed,
    MatchEnded,
    MatchReset,
}
