//! Battle resolver integration tests.
//!
//! These tests drive full sessions through the public resolver API:
//! - Damage, defeat, promotion and win conditions
//! - Turn limits, forfeits and cancellation
//! - Pause, resume and phase timers
//! - Status effects and ability cooldowns

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use card_arena::battle::{
    BattleAction, BattleOutcome, BattleResolver, BattleStatus, CancelReason, SessionId, StatusKind,
    TurnPhase,
};
use card_arena::cards::CardId;
use card_arena::config::GameData;
use card_arena::core::{EntityId, FixedClock, PlayerId, ScriptedDraws};
use card_arena::error::{BattleError, InvalidAction};
use card_arena::events::{BattleEventKind, CollectingSink, Event};

const ROSTER: &str = r#"
[rarity.common]
weight = 1.0

[battle]
max_turns = 6
mitigation = 0.5
crit_chance = 0.1
crit_multiplier = 1.5
phase_timeout_secs = 60
active_slots = 1

[[series]]
name = "Arena"

[[series.cards]]
id = "striker"
name = "Striker"
rarity = "common"
attack = 85
defense = 10
health = 120
speed = 20
energy = 1
ability = { id = "heavy-blow", damage = 50, cooldown = 2 }

[[series.cards]]
id = "bulwark"
name = "Bulwark"
rarity = "common"
attack = 10
defense = 20
health = 100
speed = 5
energy = 1
ability = { id = "brace" }

[[series.cards]]
id = "sprite"
name = "Sprite"
rarity = "common"
attack = 5
defense = 0
health = 30
speed = 1
energy = 1
ability = { id = "mend", effect = { kind = "regeneration", potency = 10, duration = 2 } }

[[series.cards]]
id = "viper"
name = "Viper"
rarity = "common"
attack = 20
defense = 5
health = 90
speed = 30
energy = 1
ability = { id = "venom", cooldown = 2, effect = { kind = "poison", potency = 5, duration = 2 } }

[[series.cards]]
id = "stunner"
name = "Stunner"
rarity = "common"
attack = 15
defense = 5
health = 90
speed = 25
energy = 1
ability = { id = "shock", effect = { kind = "stun", duration = 1 } }
"#;

const P0: PlayerId = PlayerId::new(0);
const P1: PlayerId = PlayerId::new(1);

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()))
}

fn resolver_with(clock: Arc<FixedClock>) -> BattleResolver {
    let data = Arc::new(GameData::from_toml_str(ROSTER).unwrap());
    BattleResolver::new(data, clock)
}

fn resolver() -> BattleResolver {
    resolver_with(clock())
}

fn lineup(ids: &[&str]) -> Vec<CardId> {
    ids.iter().map(|id| CardId::from(*id)).collect()
}

fn started(resolver: &mut BattleResolver, first: &[&str], second: &[&str]) -> SessionId {
    let id = resolver.create_session(&lineup(first), &lineup(second)).unwrap();
    resolver.start(id).unwrap();
    id
}

fn no_crit() -> ScriptedDraws {
    ScriptedDraws::constant(0.99)
}

fn end_phase(resolver: &mut BattleResolver, id: SessionId, side: PlayerId) {
    resolver
        .submit_action(id, side, BattleAction::EndPhase, &mut no_crit())
        .unwrap();
}

/// End phases for the active side until it reaches `phase`.
fn advance_to(resolver: &mut BattleResolver, id: SessionId, phase: TurnPhase) {
    while resolver.session(id).unwrap().phase != phase {
        let side = resolver.session(id).unwrap().active_side;
        end_phase(resolver, id, side);
    }
}

/// Finish the active side's turn, handing over to the other side's Draw.
fn pass_turn(resolver: &mut BattleResolver, id: SessionId) {
    let side = resolver.session(id).unwrap().active_side;
    advance_to(resolver, id, TurnPhase::End);
    end_phase(resolver, id, side);
}

fn active(resolver: &BattleResolver, id: SessionId, side: PlayerId) -> EntityId {
    resolver.session(id).unwrap().sides[side].active[0]
}

// =============================================================================
// Damage and Defeat
// =============================================================================

#[test]
fn test_basic_attack_damage() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["striker"], &["bulwark"]);
    assert_eq!(resolver.session(id).unwrap().active_side, P0);

    advance_to(&mut resolver, id, TurnPhase::Attack);
    let attacker = active(&resolver, id, P0);
    let target = active(&resolver, id, P1);

    let events = resolver
        .submit_action(id, P0, BattleAction::Attack { attacker, target }, &mut no_crit())
        .unwrap();

    // 85 * 1.0 - 20 * 0.5
    assert!(events.iter().any(|e| matches!(
        e.kind,
        BattleEventKind::Attacked { damage: 75, critical: false, .. }
    )));
    let session = resolver.session(id).unwrap();
    assert_eq!(session.card(target).unwrap().health, 25);
    assert_eq!(session.status, BattleStatus::InProgress);
}

#[test]
fn test_critical_ability_hit() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["striker"], &["bulwark"]);
    advance_to(&mut resolver, id, TurnPhase::Attack);
    let attacker = active(&resolver, id, P0);
    let target = active(&resolver, id, P1);

    resolver
        .submit_action(
            id,
            P0,
            BattleAction::UseAbility { attacker, target },
            &mut ScriptedDraws::constant(0.01),
        )
        .unwrap();

    // (85 * 1.5 - 10) * 1.5 = 176.25, more than the bulwark's health
    let session = resolver.session(id).unwrap();
    assert!(session.card(target).unwrap().is_defeated());
    assert_eq!(session.card(attacker).unwrap().cooldown, 2);
}

#[test]
fn test_defeat_wins_at_end_phase() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["striker"], &["sprite"]);
    advance_to(&mut resolver, id, TurnPhase::Attack);
    let attacker = active(&resolver, id, P0);
    let target = active(&resolver, id, P1);

    resolver
        .submit_action(id, P0, BattleAction::Attack { attacker, target }, &mut no_crit())
        .unwrap();
    // Terminal check waits for the End phase to close
    assert_eq!(resolver.session(id).unwrap().status, BattleStatus::InProgress);

    pass_turn(&mut resolver, id);

    assert!(resolver.session(id).is_none());
    let record = &resolver.archive()[0];
    assert_eq!(record.outcome, BattleOutcome::Winner(P0));
    assert_eq!(record.turns, 1);
}

#[test]
fn test_bench_card_promoted_after_defeat() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["striker"], &["sprite", "bulwark"]);
    advance_to(&mut resolver, id, TurnPhase::Attack);
    let attacker = active(&resolver, id, P0);
    let sprite = active(&resolver, id, P1);
    let bulwark = resolver.session(id).unwrap().sides[P1].bench[0];

    let events = resolver
        .submit_action(id, P0, BattleAction::Attack { attacker, target: sprite }, &mut no_crit())
        .unwrap();

    assert!(events
        .iter()
        .any(|e| e.kind == BattleEventKind::Defeated { card: sprite }));
    assert!(events
        .iter()
        .any(|e| e.kind == BattleEventKind::Promoted { side: P1, card: bulwark }));

    let side = &resolver.session(id).unwrap().sides[P1];
    assert_eq!(side.active, vec![bulwark]);
    assert!(side.bench.is_empty());
    assert_eq!(side.fallen, vec![sprite]);

    pass_turn(&mut resolver, id);
    assert_eq!(resolver.session(id).unwrap().active_side, P1);
}

// =============================================================================
// Turn Limits, Forfeit and Cancel
// =============================================================================

#[test]
fn test_turn_limit_is_a_draw() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["bulwark"], &["bulwark"]);

    let mut turns = 0;
    while resolver.session(id).is_some() {
        pass_turn(&mut resolver, id);
        turns += 1;
    }

    assert_eq!(turns, 6);
    let record = &resolver.archive()[0];
    assert_eq!(record.outcome, BattleOutcome::Draw);
    assert_eq!(record.outcome.winner(), None);
    assert_eq!(record.turns, 6);
    assert!(record
        .log
        .iter()
        .any(|e| e.kind == BattleEventKind::StatusChanged {
            from: BattleStatus::InProgress,
            to: BattleStatus::Finished
        }));
}

#[test]
fn test_forfeit_out_of_turn() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["striker"], &["bulwark"]);

    let events = resolver
        .submit_action(id, P1, BattleAction::Forfeit, &mut no_crit())
        .unwrap();

    assert!(events
        .iter()
        .any(|e| e.kind == BattleEventKind::Forfeited { side: P1 }));
    assert_eq!(resolver.archive()[0].outcome, BattleOutcome::Winner(P0));
}

#[test]
fn test_cancel_waiting_session() {
    let mut resolver = resolver();
    let id = resolver
        .create_session(&lineup(&["striker"]), &lineup(&["bulwark"]))
        .unwrap();

    resolver.cancel(id, CancelReason::Requested).unwrap();

    assert_eq!(
        resolver.archive()[0].outcome,
        BattleOutcome::Cancelled(CancelReason::Requested)
    );
    assert_eq!(
        resolver.cancel(id, CancelReason::Requested).unwrap_err(),
        BattleError::UnknownSession(id)
    );
}

#[test]
fn test_start_twice_rejected() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["striker"], &["bulwark"]);

    let err = resolver.start(id).unwrap_err();
    assert_eq!(
        err,
        BattleError::InvalidAction(InvalidAction::IllegalTransition {
            action: "start",
            status: BattleStatus::InProgress
        })
    );
}

// =============================================================================
// Invalid Actions
// =============================================================================

#[test]
fn test_invalid_actions_leave_session_unchanged() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["striker"], &["bulwark"]);
    let attacker = active(&resolver, id, P0);
    let target = active(&resolver, id, P1);
    let before = resolver.snapshot(id).unwrap();

    let attempts = [
        (P1, BattleAction::EndPhase),
        (P0, BattleAction::Attack { attacker, target }),
        (P0, BattleAction::Attack { attacker: target, target: attacker }),
        (P0, BattleAction::Deploy { card: attacker, replacing: attacker }),
    ];
    for (side, action) in attempts {
        let result = resolver.submit_action(id, side, action, &mut no_crit());
        assert!(
            matches!(result, Err(BattleError::InvalidAction(_))),
            "{action:?} should be rejected"
        );
    }

    let after = resolver.session(id).unwrap();
    assert_eq!(after.log(), before.log());
    assert_eq!(after.phase, before.phase);
    assert_eq!(after.card(target), before.card(target));
}

#[test]
fn test_one_attack_per_turn() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["striker"], &["bulwark"]);
    advance_to(&mut resolver, id, TurnPhase::Attack);
    let attacker = active(&resolver, id, P0);
    let target = active(&resolver, id, P1);

    resolver
        .submit_action(id, P0, BattleAction::Attack { attacker, target }, &mut no_crit())
        .unwrap();
    let err = resolver
        .submit_action(id, P0, BattleAction::Attack { attacker, target }, &mut no_crit())
        .unwrap_err();

    assert_eq!(err, BattleError::InvalidAction(InvalidAction::AlreadyAttacked));
}

#[test]
fn test_deploy_swaps_bench_card_in() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["bulwark", "striker"], &["sprite"]);
    advance_to(&mut resolver, id, TurnPhase::Main);
    let bulwark = active(&resolver, id, P0);
    let striker = resolver.session(id).unwrap().sides[P0].bench[0];

    resolver
        .submit_action(
            id,
            P0,
            BattleAction::Deploy { card: striker, replacing: bulwark },
            &mut no_crit(),
        )
        .unwrap();

    let side = &resolver.session(id).unwrap().sides[P0];
    assert_eq!(side.active, vec![striker]);
    assert_eq!(side.bench, vec![bulwark]);
}

#[test]
fn test_legal_actions_follow_phase() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["striker"], &["bulwark"]);

    let draw = resolver.legal_actions(id, P0).unwrap();
    assert_eq!(draw, vec![BattleAction::EndPhase, BattleAction::Forfeit]);

    advance_to(&mut resolver, id, TurnPhase::Attack);
    let attack = resolver.legal_actions(id, P0).unwrap();
    assert_eq!(attack.len(), 4);
}

// =============================================================================
// Pause, Resume and Timers
// =============================================================================

#[test]
fn test_pause_blocks_actions() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["striker"], &["bulwark"]);

    resolver.pause(id).unwrap();
    let session = resolver.session(id).unwrap();
    assert_eq!(session.status, BattleStatus::Paused);
    assert!(session.timer().is_none());

    let err = resolver
        .submit_action(id, P0, BattleAction::EndPhase, &mut no_crit())
        .unwrap_err();
    assert_eq!(
        err,
        BattleError::InvalidAction(InvalidAction::NotInProgress(BattleStatus::Paused))
    );
    assert!(resolver.pause(id).is_err());

    resolver.resume(id).unwrap();
    let session = resolver.session(id).unwrap();
    assert_eq!(session.status, BattleStatus::InProgress);
    assert!(session.timer().is_some());
}

#[test]
fn test_expired_phase_ends_itself() {
    let clock = clock();
    let mut resolver = resolver_with(Arc::clone(&clock));
    let id = started(&mut resolver, &["striker"], &["bulwark"]);

    assert!(resolver.expire_timers().is_empty());

    clock.advance(Duration::try_seconds(61).unwrap());
    let events = resolver.expire_timers();

    assert!(events.iter().any(|e| e.kind
        == BattleEventKind::PhaseEntered {
            side: P0,
            phase: TurnPhase::Main,
            timed_out: true
        }));
    assert_eq!(resolver.session(id).unwrap().phase, TurnPhase::Main);
    // The new phase got a fresh deadline
    assert!(resolver.expire_timers().is_empty());
}

#[test]
fn test_paused_session_does_not_time_out() {
    let clock = clock();
    let mut resolver = resolver_with(Arc::clone(&clock));
    let id = started(&mut resolver, &["striker"], &["bulwark"]);
    resolver.pause(id).unwrap();

    clock.advance(Duration::try_seconds(600).unwrap());

    assert!(resolver.expire_timers().is_empty());
    assert_eq!(resolver.session(id).unwrap().phase, TurnPhase::Draw);
}

// =============================================================================
// Status Effects and Cooldowns
// =============================================================================

#[test]
fn test_poison_ticks_on_bearer_turn() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["viper"], &["bulwark"]);
    advance_to(&mut resolver, id, TurnPhase::Attack);
    let viper = active(&resolver, id, P0);
    let bulwark = active(&resolver, id, P1);

    let events = resolver
        .submit_action(
            id,
            P0,
            BattleAction::UseAbility { attacker: viper, target: bulwark },
            &mut no_crit(),
        )
        .unwrap();
    assert!(events.iter().any(|e| e.kind
        == BattleEventKind::StatusApplied {
            card: bulwark,
            kind: StatusKind::Poison,
            potency: 5,
            duration: 2
        }));
    // 20 - 20 * 0.5
    assert_eq!(resolver.session(id).unwrap().card(bulwark).unwrap().health, 90);

    pass_turn(&mut resolver, id);

    let session = resolver.session(id).unwrap();
    assert_eq!(session.active_side, P1);
    assert_eq!(session.card(bulwark).unwrap().health, 85);
    assert!(session.log().iter().any(|e| e.kind
        == BattleEventKind::StatusTicked {
            card: bulwark,
            kind: StatusKind::Poison,
            amount: 5,
            expired: false
        }));
}

#[test]
fn test_ability_cooldown() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["viper"], &["bulwark"]);
    let viper = active(&resolver, id, P0);
    let bulwark = active(&resolver, id, P1);
    let ability = BattleAction::UseAbility { attacker: viper, target: bulwark };

    advance_to(&mut resolver, id, TurnPhase::Attack);
    resolver.submit_action(id, P0, ability, &mut no_crit()).unwrap();
    pass_turn(&mut resolver, id);
    pass_turn(&mut resolver, id);

    advance_to(&mut resolver, id, TurnPhase::Attack);
    let err = resolver.submit_action(id, P0, ability, &mut no_crit()).unwrap_err();
    assert_eq!(
        err,
        BattleError::InvalidAction(InvalidAction::OnCooldown { card: viper, turns: 1 })
    );
    // A basic attack is still allowed
    resolver
        .submit_action(id, P0, BattleAction::Attack { attacker: viper, target: bulwark }, &mut no_crit())
        .unwrap();
}

#[test]
fn test_stun_costs_one_attack() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["stunner"], &["bulwark"]);
    let stunner = active(&resolver, id, P0);
    let bulwark = active(&resolver, id, P1);

    advance_to(&mut resolver, id, TurnPhase::Attack);
    resolver
        .submit_action(
            id,
            P0,
            BattleAction::UseAbility { attacker: stunner, target: bulwark },
            &mut no_crit(),
        )
        .unwrap();
    pass_turn(&mut resolver, id);

    advance_to(&mut resolver, id, TurnPhase::Attack);
    let blocked = BattleAction::Attack { attacker: bulwark, target: stunner };
    let err = resolver.submit_action(id, P1, blocked, &mut no_crit()).unwrap_err();
    assert_eq!(err, BattleError::InvalidAction(InvalidAction::Stunned(bulwark)));

    pass_turn(&mut resolver, id);
    pass_turn(&mut resolver, id);
    advance_to(&mut resolver, id, TurnPhase::Attack);
    resolver.submit_action(id, P1, blocked, &mut no_crit()).unwrap();
}

#[test]
fn test_regeneration_lands_on_user() {
    let mut resolver = resolver();
    let id = started(&mut resolver, &["sprite"], &["sprite"]);
    advance_to(&mut resolver, id, TurnPhase::Attack);
    let user = active(&resolver, id, P0);
    let target = active(&resolver, id, P1);

    resolver
        .submit_action(id, P0, BattleAction::UseAbility { attacker: user, target }, &mut no_crit())
        .unwrap();

    let session = resolver.session(id).unwrap();
    assert!(session.card(user).unwrap().status(StatusKind::Regeneration).is_some());
    assert!(session.card(target).unwrap().statuses.is_empty());
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn test_events_reach_sink_in_order() {
    let sink = Arc::new(CollectingSink::new());
    let mut resolver = resolver().with_sink(sink.clone());
    let id = started(&mut resolver, &["striker"], &["bulwark"]);
    pass_turn(&mut resolver, id);

    let published: Vec<_> = sink
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            Event::Battle(event) => Some(event),
            Event::Roll(_) => None,
        })
        .collect();

    let log: Vec<_> = resolver.session(id).unwrap().log().iter().cloned().collect();
    assert_eq!(published, log);
    for (expected, event) in published.iter().enumerate() {
        assert_eq!(event.sequence, expected as u64);
    }
}
