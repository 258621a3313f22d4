//! End-to-end match flows driven through a scripted time source.
//!
//! These exercise the whole engine the way a host would: advance time,
//! tick, issue commands, watch the notifications come out.

use proptest::prelude::*;

use crate::clock::ManualClock;
use crate::coordinator::{MatchCoordinator, MatchPhase};
use crate::error::RejectReason;
use crate::events::{EventType, MatchEvent};
use crate::match_setup::{MatchSetup, Team};
use crate::possession::RaidDecision;

/// Test-scaled match: 40s halves, 5s raids, 3s timeouts, 2 timeouts per
/// team, team A raids first.
fn coordinator() -> (MatchCoordinator<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let setup = MatchSetup::new("Panthers", "Titans")
        .with_half_duration_ms(40_000)
        .with_raid_duration_ms(5_000)
        .with_timeout_duration_ms(3_000);
    let coord = MatchCoordinator::with_time_source(setup, clock.clone()).unwrap();
    (coord, clock)
}

/// Advance `ms` in 100ms host ticks, collecting every notification.
fn run_ms(
    coord: &mut MatchCoordinator<ManualClock>,
    clock: &ManualClock,
    ms: u64,
) -> Vec<MatchEvent> {
    let mut events = Vec::new();
    let mut left = ms;
    while left > 0 {
        let step = left.min(100);
        clock.advance(step);
        events.extend(coord.tick());
        left -= step;
    }
    events
}

fn kinds(events: &[MatchEvent]) -> Vec<EventType> {
    events.iter().map(|e| e.event_type).collect()
}

#[test]
fn test_scenario_a_raid_expiry_flips_possession() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();
    coord.start_raid().unwrap();
    assert_eq!(coord.raiding_team(), Team::A);

    let events = run_ms(&mut coord, &clock, 5_000);

    assert_eq!(coord.raiding_team(), Team::B);
    assert!(!coord.raid_active());
    assert_eq!(coord.raid_remaining_ms(), 5_000);
    assert!(kinds(&events).contains(&EventType::RaidExpired));
    let cue = events.iter().find(|e| e.event_type == EventType::PossessionChanged).unwrap();
    assert_eq!(cue.team, Some(Team::B));

    // The next raid is never auto-started.
    assert!(!coord.raid_active());
    let later = run_ms(&mut coord, &clock, 2_000);
    assert!(!kinds(&later).contains(&EventType::RaidStarted));
}

#[test]
fn test_scenario_b_halftime_deferred_while_raid_active() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();
    run_ms(&mut coord, &clock, 36_000);
    coord.start_raid().unwrap();

    // Match clock hits zero at 40s with the raid still running until 41s.
    let events = run_ms(&mut coord, &clock, 4_000);
    assert_eq!(coord.phase(), MatchPhase::FirstHalf);
    assert!(coord.halftime_pending());
    assert!(coord.raid_active());
    assert_eq!(coord.match_remaining_ms(), 0);
    assert!(!kinds(&events).contains(&EventType::HalftimeReached));

    // The raid's end applies the boundary instead of flipping possession.
    let events = run_ms(&mut coord, &clock, 1_000);
    assert_eq!(coord.phase(), MatchPhase::HalftimeBreak);
    assert!(!coord.halftime_pending());
    assert!(kinds(&events).contains(&EventType::HalftimeReached));
    assert!(!kinds(&events).contains(&EventType::PossessionChanged));
    // The break displays a fresh half.
    assert_eq!(coord.match_remaining_ms(), 40_000);
}

#[test]
fn test_scenario_b_variant_manual_end_applies_deferred_halftime() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();
    run_ms(&mut coord, &clock, 36_000);
    coord.start_raid().unwrap();
    run_ms(&mut coord, &clock, 4_000);
    assert!(coord.halftime_pending());

    coord.end_raid_early().unwrap();
    assert_eq!(coord.phase(), MatchPhase::HalftimeBreak);
}

#[test]
fn test_scenario_c_budget_exhausted_rejection() {
    let clock = ManualClock::new();
    let setup = MatchSetup::new("Panthers", "Titans")
        .with_half_duration_ms(40_000)
        .with_raid_duration_ms(5_000)
        .with_timeouts_per_team(0);
    let mut coord = MatchCoordinator::with_time_source(setup, clock.clone()).unwrap();
    coord.start().unwrap();
    coord.drain_events();

    let before = coord.snapshot();
    assert_eq!(
        coord.call_timeout(Team::A),
        Err(RejectReason::BudgetExhausted { team: Team::A })
    );
    let mut after = coord.snapshot();
    assert_eq!(after.last_rejection, Some(RejectReason::BudgetExhausted { team: Team::A }));
    after.last_rejection = before.last_rejection;
    assert_eq!(after, before);
}

#[test]
fn test_scenario_d_timeout_suspends_and_auto_resumes() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();

    // A raid first, so possession sits with B when the timeout arrives.
    coord.start_raid().unwrap();
    run_ms(&mut coord, &clock, 5_000);
    assert_eq!(coord.raiding_team(), Team::B);

    run_ms(&mut coord, &clock, 3_000);
    let frozen_match_ms = coord.match_remaining_ms();
    coord.call_timeout(Team::B).unwrap();
    assert_eq!(coord.timeout_budget(Team::B), 1);
    assert_eq!(coord.active_timeout(), Some(Team::B));

    // Clocks hold still during the interrupt.
    let events = run_ms(&mut coord, &clock, 2_900);
    assert_eq!(coord.match_remaining_ms(), frozen_match_ms);
    assert!(coord.active_timeout().is_some());
    assert!(!kinds(&events).contains(&EventType::MatchResumed));

    // Expiry resumes with B's pre-timeout possession and a fresh window.
    let events = run_ms(&mut coord, &clock, 200);
    assert_eq!(coord.active_timeout(), None);
    assert_eq!(coord.raiding_team(), Team::B);
    assert!(!coord.raid_active());
    assert_eq!(coord.raid_remaining_ms(), 5_000);
    let resumed = events.iter().find(|e| e.event_type == EventType::MatchResumed).unwrap();
    assert_eq!(resumed.team, Some(Team::B));

    // The match clock continues from where it stopped.
    run_ms(&mut coord, &clock, 1_000);
    assert!(coord.match_remaining_ms() < frozen_match_ms);
}

#[test]
fn test_scenario_e_second_half_flips_the_opening_side() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();
    assert_eq!(coord.raiding_team(), Team::A);

    run_ms(&mut coord, &clock, 40_000);
    assert_eq!(coord.phase(), MatchPhase::HalftimeBreak);

    coord.resume().unwrap();
    assert_eq!(coord.phase(), MatchPhase::SecondHalf);
    assert_eq!(coord.raiding_team(), Team::B);
    assert_eq!(coord.match_remaining_ms(), 40_000);
    assert!(!coord.raid_active());
}

#[test]
fn test_pause_gate_holds_until_decision() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();
    coord.start_raid().unwrap();
    run_ms(&mut coord, &clock, 2_000);

    coord.pause().unwrap();
    assert!(coord.is_paused());
    assert!(!coord.raid_active());
    assert_eq!(coord.pending_decision().unwrap().last_raiding_team, Team::A);
    let frozen_match_ms = coord.match_remaining_ms();

    // Time passes; nothing moves, resumption stays gated.
    run_ms(&mut coord, &clock, 10_000);
    assert_eq!(coord.match_remaining_ms(), frozen_match_ms);
    assert_eq!(coord.resume(), Err(RejectReason::DecisionRequired));

    coord.resume_with_decision(RaidDecision::OpponentRaids).unwrap();
    assert!(!coord.is_paused());
    assert_eq!(coord.raiding_team(), Team::B);
    assert_eq!(coord.pending_decision(), None);
    // Fresh raid window, match clock resumed from its remaining time.
    assert_eq!(coord.raid_remaining_ms(), 5_000);
    assert!(!coord.raid_active());
    run_ms(&mut coord, &clock, 1_000);
    assert!(coord.match_remaining_ms() < frozen_match_ms);
}

#[test]
fn test_same_team_reraids_decision() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();
    coord.start_raid().unwrap();
    run_ms(&mut coord, &clock, 1_000);
    coord.pause().unwrap();

    coord.resume_with_decision(RaidDecision::SameTeamReraids).unwrap();
    assert_eq!(coord.raiding_team(), Team::A);
}

#[test]
fn test_pause_drops_active_timeout_but_keeps_it_spent() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();
    run_ms(&mut coord, &clock, 2_000);
    coord.call_timeout(Team::A).unwrap();
    coord.drain_events();

    coord.pause().unwrap();
    let events = coord.drain_events();
    assert!(kinds(&events).contains(&EventType::TimeoutEnded));
    assert!(kinds(&events).contains(&EventType::MatchPaused));
    assert_eq!(coord.active_timeout(), None);
    assert_eq!(coord.timeout_budget(Team::A), 1);

    // Waiting past the interrupt's old expiry resumes nothing.
    let events = run_ms(&mut coord, &clock, 10_000);
    assert!(events.is_empty());
    assert!(coord.is_paused());

    coord.resume_with_decision(RaidDecision::SameTeamReraids).unwrap();
    assert_eq!(coord.phase(), MatchPhase::FirstHalf);
}

#[test]
fn test_pause_during_deferred_halftime_completes_the_boundary() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();
    run_ms(&mut coord, &clock, 36_000);
    coord.start_raid().unwrap();
    run_ms(&mut coord, &clock, 4_000);
    assert!(coord.halftime_pending());

    coord.pause().unwrap();
    assert_eq!(coord.phase(), MatchPhase::HalftimeBreak);
    assert_eq!(coord.pending_decision(), None);

    // Halftime resumption needs no decision.
    coord.resume().unwrap();
    assert_eq!(coord.phase(), MatchPhase::SecondHalf);
    assert_eq!(coord.raiding_team(), Team::B);
}

#[test]
fn test_decision_ignored_when_resuming_from_halftime() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();
    run_ms(&mut coord, &clock, 40_000);
    assert_eq!(coord.phase(), MatchPhase::HalftimeBreak);

    // Even "same team re-raids" yields the non-opening side.
    coord.resume_with_decision(RaidDecision::SameTeamReraids).unwrap();
    assert_eq!(coord.raiding_team(), Team::B);
}

#[test]
fn test_early_timeout_end_matches_expiry() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();
    run_ms(&mut coord, &clock, 2_000);
    coord.call_timeout(Team::A).unwrap();
    run_ms(&mut coord, &clock, 1_000);

    coord.end_timeout_early().unwrap();
    let events = coord.drain_events();
    assert!(kinds(&events).contains(&EventType::TimeoutEnded));
    assert!(kinds(&events).contains(&EventType::MatchResumed));
    assert_eq!(coord.active_timeout(), None);
    assert_eq!(coord.raiding_team(), Team::A);
    assert_eq!(coord.raid_remaining_ms(), 5_000);
    assert_eq!(coord.phase(), MatchPhase::FirstHalf);

    // No second resumption when the old expiry time passes.
    let events = run_ms(&mut coord, &clock, 5_000);
    assert!(!kinds(&events).contains(&EventType::MatchResumed));
}

#[test]
fn test_second_half_expiry_ends_match_even_mid_raid() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();
    run_ms(&mut coord, &clock, 40_000);
    coord.resume().unwrap();

    run_ms(&mut coord, &clock, 38_000);
    coord.start_raid().unwrap();
    let events = run_ms(&mut coord, &clock, 2_000);

    assert_eq!(coord.phase(), MatchPhase::Ended);
    assert!(!coord.raid_active());
    assert!(kinds(&events).contains(&EventType::MatchEnded));

    // Fully inert afterwards.
    let events = run_ms(&mut coord, &clock, 10_000);
    assert!(events.is_empty());
}

#[test]
fn test_possession_alternates_across_raid_completions() {
    let (mut coord, clock) = coordinator();
    coord.start().unwrap();

    let mut expected = Team::A;
    for round in 0..4 {
        assert_eq!(coord.raiding_team(), expected);
        coord.start_raid().unwrap();
        if round % 2 == 0 {
            run_ms(&mut coord, &clock, 5_000);
        } else {
            run_ms(&mut coord, &clock, 1_000);
            coord.end_raid_early().unwrap();
        }
        expected = expected.opponent();
    }
    assert_eq!(coord.raiding_team(), Team::A);
}

#[test]
fn test_reset_is_authoritative_from_any_phase() {
    let (mut coord, clock) = coordinator();

    // Mid-timeout, with budget spent and time on the clocks.
    coord.start().unwrap();
    run_ms(&mut coord, &clock, 7_000);
    coord.call_timeout(Team::B).unwrap();
    run_ms(&mut coord, &clock, 1_000);

    coord.reset();
    coord.drain_events();
    assert_eq!(coord.phase(), MatchPhase::NotStarted);
    assert_eq!(coord.active_timeout(), None);
    assert_eq!(coord.timeout_budget(Team::A), 2);
    assert_eq!(coord.timeout_budget(Team::B), 2);
    assert_eq!(coord.match_remaining_ms(), 40_000);
    assert_eq!(coord.raid_remaining_ms(), 5_000);
    assert_eq!(coord.raiding_team(), Team::A);

    // The dropped timeout never fires.
    let events = run_ms(&mut coord, &clock, 10_000);
    assert!(events.is_empty());

    // Mid-pause with a decision outstanding.
    coord.start().unwrap();
    coord.pause().unwrap();
    coord.reset();
    assert_eq!(coord.pending_decision(), None);
    assert!(!coord.is_paused());
    assert!(coord.start().is_ok());
}

/// Commands a host could issue at any moment.
#[derive(Debug, Clone)]
enum HostAction {
    Advance(u64),
    Start,
    Pause,
    Resume,
    ResumeWithDecision(RaidDecision),
    StartRaid,
    EndRaidEarly,
    CallTimeout(Team),
    EndTimeoutEarly,
    Reset,
}

fn host_action() -> impl Strategy<Value = HostAction> {
    prop_oneof![
        (1u64..8_000).prop_map(HostAction::Advance),
        Just(HostAction::Start),
        Just(HostAction::Pause),
        Just(HostAction::Resume),
        any::<bool>().prop_map(|same| {
            HostAction::ResumeWithDecision(if same {
                RaidDecision::SameTeamReraids
            } else {
                RaidDecision::OpponentRaids
            })
        }),
        Just(HostAction::StartRaid),
        Just(HostAction::EndRaidEarly),
        any::<bool>().prop_map(|a| HostAction::CallTimeout(if a { Team::A } else { Team::B })),
        Just(HostAction::EndTimeoutEarly),
        Just(HostAction::Reset),
    ]
}

proptest! {
    /// Whatever a host throws at the engine, in whatever order, the
    /// published invariants hold: clock readings stay within their
    /// configured ranges, budgets never grow except across reset, and a
    /// raid is only ever active during an unpaused, uninterrupted half.
    #[test]
    fn prop_invariants_hold_under_arbitrary_host_behavior(
        actions in proptest::collection::vec(host_action(), 1..120),
    ) {
        let (mut coord, clock) = coordinator();
        let mut budget_a = coord.timeout_budget(Team::A);
        let mut budget_b = coord.timeout_budget(Team::B);

        for action in actions {
            match action {
                HostAction::Advance(ms) => { run_ms(&mut coord, &clock, ms); }
                HostAction::Start => { let _ = coord.start(); }
                HostAction::Pause => { let _ = coord.pause(); }
                HostAction::Resume => { let _ = coord.resume(); }
                HostAction::ResumeWithDecision(d) => { let _ = coord.resume_with_decision(d); }
                HostAction::StartRaid => { let _ = coord.start_raid(); }
                HostAction::EndRaidEarly => { let _ = coord.end_raid_early(); }
                HostAction::CallTimeout(t) => { let _ = coord.call_timeout(t); }
                HostAction::EndTimeoutEarly => { let _ = coord.end_timeout_early(); }
                HostAction::Reset => {
                    coord.reset();
                    budget_a = 2;
                    budget_b = 2;
                }
            }

            let snap = coord.snapshot();
            prop_assert!(snap.match_ms <= 40_000);
            prop_assert!(snap.raid_ms <= 5_000);
            prop_assert!(snap.timeout_ms <= 3_000);

            prop_assert!(snap.timeouts.remaining(Team::A) <= budget_a);
            prop_assert!(snap.timeouts.remaining(Team::B) <= budget_b);
            budget_a = snap.timeouts.remaining(Team::A);
            budget_b = snap.timeouts.remaining(Team::B);

            if snap.possession.raid_active {
                prop_assert!(snap.phase.is_playing_half());
                prop_assert!(!snap.paused);
                prop_assert!(snap.timeouts.active().is_none());
            }
            if snap.pending_decision.is_some() {
                prop_assert!(snap.paused);
            }
            if snap.phase == MatchPhase::Ended {
                prop_assert!(!snap.possession.raid_active);
                prop_assert!(snap.timeouts.active().is_none());
            }
        }
    }
}
