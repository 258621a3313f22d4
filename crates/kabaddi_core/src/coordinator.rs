//! Match clock coordination state machine.
//!
//! `MatchCoordinator` owns the three countdown clocks and every rule
//! that arbitrates between them: half transitions, the raid turn-taking
//! protocol, team timeouts, and the decision gate that holds a manually
//! paused match until an official picks the next raider. The clocks
//! themselves are dumb countdown devices (see [`crate::clock`]).
//!
//! Hosts drive the machine from any scheduler by calling [`tick`]
//! periodically and draining the returned events. The raid and timeout
//! clocks report at 100ms, so ticking at that rate or faster keeps
//! displays smooth. One `tick` processes each clock's events to
//! completion before the next; nothing here needs locks or atomics.
//!
//! [`tick`]: MatchCoordinator::tick

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::clock::{ClockEvent, CountdownClock, MonotonicClock, TimeSource};
use crate::error::{RejectReason, SetupError};
use crate::events::{EventType, MatchEvent};
use crate::match_setup::{MatchSetup, Team};
use crate::possession::{PendingDecision, Possession, RaidDecision};
use crate::timeout::TimeoutState;

/// Tick period of the match clock.
pub const MATCH_CLOCK_PERIOD_MS: u64 = 1000;
/// Tick period of the raid clock.
pub const RAID_CLOCK_PERIOD_MS: u64 = 100;
/// Tick period of the timeout clock.
pub const TIMEOUT_CLOCK_PERIOD_MS: u64 = 100;

/// Where the match is in its overall lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    NotStarted,
    FirstHalf,
    HalftimeBreak,
    SecondHalf,
    Ended,
}

impl MatchPhase {
    /// A half during which play clocks may run.
    pub fn is_playing_half(self) -> bool {
        matches!(self, MatchPhase::FirstHalf | MatchPhase::SecondHalf)
    }
}

/// Points on the board. Tracked for display only; no scoring rules
/// compute it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub team_a: u16,
    pub team_b: u16,
}

/// Point-in-time view of everything a scoreboard needs.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSnapshot {
    pub phase: MatchPhase,
    pub paused: bool,
    pub match_ms: u64,
    pub raid_ms: u64,
    pub possession: Possession,
    pub timeout_ms: u64,
    pub timeouts: TimeoutState,
    pub pending_decision: Option<PendingDecision>,
    pub halftime_pending: bool,
    pub score: Score,
    pub last_rejection: Option<RejectReason>,
}

/// The one component with business-rule knowledge. Owns the composite
/// match state and all three clocks; created per match (configuration is
/// the constructor) and discarded on teardown.
pub struct MatchCoordinator<C: TimeSource = MonotonicClock> {
    time: C,
    setup: MatchSetup,

    phase: MatchPhase,
    paused: bool,
    halftime_pending: bool,
    pending_decision: Option<PendingDecision>,

    possession: Possession,
    timeouts: TimeoutState,
    score: Score,

    match_clock: CountdownClock,
    raid_clock: CountdownClock,
    timeout_clock: CountdownClock,

    last_rejection: Option<RejectReason>,
    events: Vec<MatchEvent>,
}

impl MatchCoordinator<MonotonicClock> {
    /// Validate `setup` and create a coordinator driven by wall-clock
    /// time.
    pub fn new(setup: MatchSetup) -> Result<Self, SetupError> {
        Self::with_time_source(setup, MonotonicClock::new())
    }
}

impl<C: TimeSource> MatchCoordinator<C> {
    /// Validate `setup` and create a coordinator driven by `time`.
    pub fn with_time_source(setup: MatchSetup, time: C) -> Result<Self, SetupError> {
        setup.validate()?;

        let mut match_clock = CountdownClock::new(MATCH_CLOCK_PERIOD_MS);
        match_clock.reset(setup.half_duration_ms);
        let mut raid_clock = CountdownClock::new(RAID_CLOCK_PERIOD_MS);
        raid_clock.reset(setup.raid_duration_ms);
        let mut timeout_clock = CountdownClock::new(TIMEOUT_CLOCK_PERIOD_MS);
        timeout_clock.reset(setup.timeout_duration_ms);

        Ok(Self {
            time,
            phase: MatchPhase::NotStarted,
            paused: false,
            halftime_pending: false,
            pending_decision: None,
            possession: Possession::new(setup.starting_team),
            timeouts: TimeoutState::new(setup.timeouts_per_team),
            score: Score::default(),
            match_clock,
            raid_clock,
            timeout_clock,
            last_rejection: None,
            events: Vec::new(),
            setup,
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn setup(&self) -> &MatchSetup {
        &self.setup
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn match_remaining_ms(&self) -> u64 {
        self.match_clock.remaining_ms()
    }

    pub fn raid_remaining_ms(&self) -> u64 {
        self.raid_clock.remaining_ms()
    }

    pub fn raiding_team(&self) -> Team {
        self.possession.raiding_team
    }

    pub fn raid_active(&self) -> bool {
        self.possession.raid_active
    }

    pub fn timeout_remaining_ms(&self) -> u64 {
        self.timeout_clock.remaining_ms()
    }

    pub fn active_timeout(&self) -> Option<Team> {
        self.timeouts.active()
    }

    pub fn timeout_budget(&self, team: Team) -> u8 {
        self.timeouts.remaining(team)
    }

    pub fn pending_decision(&self) -> Option<PendingDecision> {
        self.pending_decision
    }

    pub fn halftime_pending(&self) -> bool {
        self.halftime_pending
    }

    pub fn score(&self) -> Score {
        self.score
    }

    /// The reason the most recent rejected command was refused, if any.
    pub fn last_rejection(&self) -> Option<RejectReason> {
        self.last_rejection
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            phase: self.phase,
            paused: self.paused,
            match_ms: self.match_clock.remaining_ms(),
            raid_ms: self.raid_clock.remaining_ms(),
            possession: self.possession,
            timeout_ms: self.timeout_clock.remaining_ms(),
            timeouts: self.timeouts,
            pending_decision: self.pending_decision,
            halftime_pending: self.halftime_pending,
            score: self.score,
            last_rejection: self.last_rejection,
        }
    }

    // ------------------------------------------------------------------
    // Tick dispatch
    // ------------------------------------------------------------------

    /// Advance all clocks to the current time and return the
    /// notifications produced since the last drain.
    ///
    /// Clocks are processed in fixed precedence order: timeout first (it
    /// suspends everything), then the match clock, then the raid clock.
    /// A half boundary observed in the same call as a raid expiry is
    /// thus deferred and then applied, exactly as if the events had
    /// arrived in separate calls.
    pub fn tick(&mut self) -> Vec<MatchEvent> {
        let now = self.time.now_ms();

        if let Some(ClockEvent::Expired) = self.timeout_clock.poll(now) {
            self.finish_timeout(now);
        }
        if let Some(ClockEvent::Expired) = self.match_clock.poll(now) {
            self.on_match_clock_expired();
        }
        if let Some(ClockEvent::Expired) = self.raid_clock.poll(now) {
            self.push(EventType::RaidExpired, Some(self.possession.raiding_team));
            self.finish_raid();
        }

        self.drain_events()
    }

    /// Take any buffered notifications. Commands emit events too, so
    /// hosts reacting synchronously to a command can drain here instead
    /// of waiting for the next tick.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Start the first half. Valid only before the match has begun.
    pub fn start(&mut self) -> Result<(), RejectReason> {
        match self.phase {
            MatchPhase::NotStarted => {}
            MatchPhase::Ended => return self.reject(RejectReason::MatchEnded),
            _ => return self.reject(RejectReason::AlreadyActive),
        }

        let now = self.time.now_ms();
        self.phase = MatchPhase::FirstHalf;
        self.paused = false;
        self.possession = Possession::new(self.setup.starting_team);
        self.match_clock.start(now, self.setup.half_duration_ms);
        self.raid_clock.reset(self.setup.raid_duration_ms);
        debug!("match started, {} raids first", self.setup.team_name(self.possession.raiding_team));
        self.push(EventType::MatchStarted, Some(self.possession.raiding_team));
        Ok(())
    }

    /// Manually pause a running half (or cut short an active timeout).
    /// Resuming will require a next-raider decision, unless the half
    /// boundary was already waiting on the raid this pause kills; in
    /// that case the pause completes the halftime transition instead.
    pub fn pause(&mut self) -> Result<(), RejectReason> {
        match self.phase {
            MatchPhase::Ended => return self.reject(RejectReason::MatchEnded),
            MatchPhase::NotStarted | MatchPhase::HalftimeBreak => {
                return self.reject(RejectReason::NotRunning)
            }
            MatchPhase::FirstHalf | MatchPhase::SecondHalf => {}
        }
        if self.paused {
            return self.reject(RejectReason::AlreadyActive);
        }

        self.match_clock.cancel();
        self.raid_clock.cancel();
        self.timeout_clock.cancel();
        if let Some(team) = self.timeouts.end() {
            // The pause overrides the interrupt; spent budget stays spent.
            self.push(EventType::TimeoutEnded, Some(team));
        }
        self.possession.raid_active = false;

        if self.halftime_pending {
            self.enter_halftime_break();
            return Ok(());
        }

        self.paused = true;
        self.pending_decision =
            Some(PendingDecision { last_raiding_team: self.possession.raiding_team });
        debug!("match paused");
        self.push(EventType::MatchPaused, None);
        Ok(())
    }

    /// Resume from the halftime break. From a manual pause this is
    /// refused: a [`RaidDecision`] must accompany resumption.
    pub fn resume(&mut self) -> Result<(), RejectReason> {
        match self.phase {
            MatchPhase::Ended => return self.reject(RejectReason::MatchEnded),
            MatchPhase::NotStarted => return self.reject(RejectReason::NotRunning),
            MatchPhase::HalftimeBreak => {
                self.begin_second_half();
                return Ok(());
            }
            MatchPhase::FirstHalf | MatchPhase::SecondHalf => {}
        }
        if !self.paused {
            return self.reject(RejectReason::AlreadyActive);
        }
        self.reject(RejectReason::DecisionRequired)
    }

    /// Resume from a manual pause with the official's next-raider
    /// choice. At the halftime break the decision is ignored: possession
    /// at the start of the second half belongs to the side that did not
    /// open the match.
    pub fn resume_with_decision(&mut self, decision: RaidDecision) -> Result<(), RejectReason> {
        match self.phase {
            MatchPhase::Ended => return self.reject(RejectReason::MatchEnded),
            MatchPhase::NotStarted => return self.reject(RejectReason::NotRunning),
            MatchPhase::HalftimeBreak => {
                self.begin_second_half();
                return Ok(());
            }
            MatchPhase::FirstHalf | MatchPhase::SecondHalf => {}
        }
        if !self.paused {
            return self.reject(RejectReason::AlreadyActive);
        }
        let pending = match self.pending_decision.take() {
            Some(pending) => pending,
            None => return self.reject(RejectReason::DecisionRequired),
        };

        let next = pending.resolve(decision);
        let now = self.time.now_ms();
        self.paused = false;
        self.possession = Possession { raiding_team: next, raid_active: false };
        self.raid_clock.reset(self.setup.raid_duration_ms);
        self.match_clock.start(now, self.match_clock.remaining_ms());
        debug!("match resumed, {} to raid", self.setup.team_name(next));
        self.push(EventType::MatchResumed, Some(next));
        Ok(())
    }

    /// Open a raid window for the designated raiding team (the "tap the
    /// active panel" gesture). The raid clock runs from the configured
    /// raid duration; which panel routes here is the host's concern.
    pub fn start_raid(&mut self) -> Result<(), RejectReason> {
        match self.phase {
            MatchPhase::Ended => return self.reject(RejectReason::MatchEnded),
            MatchPhase::NotStarted | MatchPhase::HalftimeBreak => {
                return self.reject(RejectReason::NotRunning)
            }
            MatchPhase::FirstHalf | MatchPhase::SecondHalf => {}
        }
        if self.paused || self.timeouts.is_active() {
            return self.reject(RejectReason::NotRunning);
        }
        if self.possession.raid_active {
            return self.reject(RejectReason::AlreadyActive);
        }

        let now = self.time.now_ms();
        self.possession.raid_active = true;
        self.raid_clock.start(now, self.setup.raid_duration_ms);
        debug!("raid started for {}", self.setup.team_name(self.possession.raiding_team));
        self.push(EventType::RaidStarted, Some(self.possession.raiding_team));
        Ok(())
    }

    /// End the active raid by the raiding side's decision. Possession
    /// flips unless a deferred half boundary takes priority.
    pub fn end_raid_early(&mut self) -> Result<(), RejectReason> {
        if self.phase == MatchPhase::Ended {
            return self.reject(RejectReason::MatchEnded);
        }
        if !self.possession.raid_active {
            return self.reject(RejectReason::NotRunning);
        }

        self.raid_clock.cancel();
        self.push(EventType::RaidEnded, Some(self.possession.raiding_team));
        self.finish_raid();
        Ok(())
    }

    /// Spend one of `team`'s timeouts: play clocks stop for the fixed
    /// interrupt duration, then the match resumes with unchanged
    /// possession. Refused during a raid.
    pub fn call_timeout(&mut self, team: Team) -> Result<(), RejectReason> {
        match self.phase {
            MatchPhase::Ended => return self.reject(RejectReason::MatchEnded),
            MatchPhase::NotStarted | MatchPhase::HalftimeBreak => {
                return self.reject(RejectReason::NotRunning)
            }
            MatchPhase::FirstHalf | MatchPhase::SecondHalf => {}
        }
        if self.paused {
            return self.reject(RejectReason::NotRunning);
        }
        if self.possession.raid_active {
            return self.reject(RejectReason::AlreadyActive);
        }
        if let Err(reason) = self.timeouts.begin(team) {
            return self.reject(reason);
        }

        let now = self.time.now_ms();
        self.match_clock.cancel();
        self.raid_clock.cancel();
        self.timeout_clock.start(now, self.setup.timeout_duration_ms);
        debug!(
            "timeout for {} ({} left)",
            self.setup.team_name(team),
            self.timeouts.remaining(team)
        );
        self.push(EventType::TimeoutStarted, Some(team));
        Ok(())
    }

    /// Cut the active timeout short; the match resumes exactly as on
    /// expiry.
    pub fn end_timeout_early(&mut self) -> Result<(), RejectReason> {
        if self.phase == MatchPhase::Ended {
            return self.reject(RejectReason::MatchEnded);
        }
        if !self.timeouts.is_active() {
            return self.reject(RejectReason::NotRunning);
        }

        self.timeout_clock.cancel();
        let now = self.time.now_ms();
        self.finish_timeout(now);
        Ok(())
    }

    /// Put points on the board. No kabaddi scoring rules apply; the
    /// engine only keeps the tally.
    pub fn award_points(&mut self, team: Team, points: u16) {
        match team {
            Team::A => self.score.team_a = self.score.team_a.saturating_add(points),
            Team::B => self.score.team_b = self.score.team_b.saturating_add(points),
        }
    }

    /// Abandon the current match and return to the configured initial
    /// state. Always accepted. Cancels all three clocks unconditionally,
    /// including a called-but-unresolved timeout.
    pub fn reset(&mut self) {
        self.match_clock.cancel();
        self.raid_clock.cancel();
        self.timeout_clock.cancel();

        self.phase = MatchPhase::NotStarted;
        self.paused = false;
        self.halftime_pending = false;
        self.pending_decision = None;
        self.possession = Possession::new(self.setup.starting_team);
        self.timeouts = TimeoutState::new(self.setup.timeouts_per_team);
        self.score = Score::default();
        self.last_rejection = None;

        self.match_clock.reset(self.setup.half_duration_ms);
        self.raid_clock.reset(self.setup.raid_duration_ms);
        self.timeout_clock.reset(self.setup.timeout_duration_ms);

        debug!("match reset");
        self.push(EventType::MatchReset, None);
    }

    // ------------------------------------------------------------------
    // Transition internals
    // ------------------------------------------------------------------

    fn reject(&mut self, reason: RejectReason) -> Result<(), RejectReason> {
        trace!("command rejected: {}", reason);
        self.last_rejection = Some(reason);
        Err(reason)
    }

    fn push(&mut self, event_type: EventType, team: Option<Team>) {
        let match_ms = self.match_clock.remaining_ms();
        let event = match team {
            Some(team) => MatchEvent::for_team(event_type, match_ms, team),
            None => MatchEvent::new(event_type, match_ms),
        };
        trace!("event: {:?}", event);
        self.events.push(event);
    }

    fn on_match_clock_expired(&mut self) {
        match self.phase {
            MatchPhase::FirstHalf => {
                if self.possession.raid_active {
                    // The half boundary waits for the raid in progress.
                    self.halftime_pending = true;
                    trace!("halftime deferred until the raid ends");
                } else {
                    self.enter_halftime_break();
                }
            }
            MatchPhase::SecondHalf => self.end_match(),
            _ => {}
        }
    }

    /// Shared tail of a raid ending by any means: the deferred half
    /// boundary wins over the possession flip.
    fn finish_raid(&mut self) {
        self.possession.raid_active = false;
        self.raid_clock.reset(self.setup.raid_duration_ms);

        if self.halftime_pending {
            self.enter_halftime_break();
            return;
        }

        let next = self.possession.hand_over();
        debug!("possession to {}", self.setup.team_name(next));
        self.push(EventType::PossessionChanged, Some(next));
    }

    fn enter_halftime_break(&mut self) {
        self.phase = MatchPhase::HalftimeBreak;
        self.paused = false;
        self.halftime_pending = false;
        self.pending_decision = None;
        self.possession.raid_active = false;

        self.match_clock.cancel();
        self.raid_clock.cancel();
        self.timeout_clock.cancel();
        if let Some(team) = self.timeouts.end() {
            self.push(EventType::TimeoutEnded, Some(team));
        }

        debug!("halftime");
        self.push(EventType::HalftimeReached, None);

        // The break displays a fresh half on both clocks.
        self.match_clock.reset(self.setup.half_duration_ms);
        self.raid_clock.reset(self.setup.raid_duration_ms);
    }

    fn begin_second_half(&mut self) {
        let now = self.time.now_ms();
        let next = self.setup.starting_team.opponent();
        self.phase = MatchPhase::SecondHalf;
        self.paused = false;
        self.pending_decision = None;
        self.halftime_pending = false;
        self.possession = Possession { raiding_team: next, raid_active: false };
        self.raid_clock.reset(self.setup.raid_duration_ms);
        self.match_clock.start(now, self.setup.half_duration_ms);
        debug!("second half, {} to raid", self.setup.team_name(next));
        self.push(EventType::SecondHalfStarted, Some(next));
    }

    fn end_match(&mut self) {
        self.phase = MatchPhase::Ended;
        self.paused = false;
        self.halftime_pending = false;
        self.pending_decision = None;
        self.possession.raid_active = false;

        self.match_clock.cancel();
        self.raid_clock.cancel();
        self.timeout_clock.cancel();
        if let Some(team) = self.timeouts.end() {
            self.push(EventType::TimeoutEnded, Some(team));
        }
        self.raid_clock.reset(self.setup.raid_duration_ms);

        debug!("match ended");
        self.push(EventType::MatchEnded, None);
    }

    /// Timeout over: the match resumes with the possession that existed
    /// before the interrupt, a fresh raid window waiting to be tapped.
    fn finish_timeout(&mut self, now_ms: u64) {
        if let Some(team) = self.timeouts.end() {
            self.push(EventType::TimeoutEnded, Some(team));
        }
        self.timeout_clock.reset(self.setup.timeout_duration_ms);
        self.possession.raid_active = false;
        self.raid_clock.reset(self.setup.raid_duration_ms);
        self.match_clock.start(now_ms, self.match_clock.remaining_ms());
        debug!("timeout over, match resumed");
        self.push(EventType::MatchResumed, Some(self.possession.raiding_team));
    }
}
