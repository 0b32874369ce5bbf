//! Battle resolver: owns sessions and advances them.
//!
//! ## Transactions
//!
//! Every request (start, action, pause, resume, cancel, timeout) runs
//! against a working copy of the session. The copy replaces the stored
//! session only when the request succeeds, so a rejected action leaves
//! no trace. Cloning is O(1) thanks to the persistent structures inside
//! [`BattleSession`].
//!
//! ## Turn Flow
//!
//! ```text
//! Draw → Main → Attack → End ─┬→ Finished (a side has no living cards,
//!  ↑                          │            or the turn limit is reached)
//!  └──── other side's turn ←──┘
//! ```
//!
//! At the start of a side's Draw phase its status effects tick, ability
//! cooldowns drop by one and defeated cards on the field are replaced from
//! the bench. The turn counter increases each time the active side
//! changes; the terminal check runs whenever an End phase closes.
//!
//! ## Failure Isolation
//!
//! A missing card instance means the session is corrupted. That session is
//! cancelled and logged at error level; other sessions are unaffected.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use tracing::{debug, error, info, warn};

use super::action::{self, lookup, validate, BattleAction};
use super::damage::resolve_damage;
use super::session::{
    BattleOutcome, BattleRecord, BattleSession, BattleStatus, CancelReason, PhaseTimer, SessionId,
    TurnPhase,
};
use super::status::{clear_spent, tick_statuses};
use crate::cards::{Ability, CardId, CardInstance};
use crate::config::{BattleSettings, GameData};
use crate::core::{Clock, DrawSource, EntityId, PlayerId, Service};
use crate::error::{BattleError, ConfigError, InvalidAction};
use crate::events::{BattleEvent, BattleEventKind, Event, EventSink, NullSink};

/// A live session and the game data it was created with.
///
/// Reloading game data only affects sessions created afterwards.
#[derive(Clone, Debug)]
struct Running {
    session: BattleSession,
    data: Arc<GameData>,
}

/// Creates, advances and archives battle sessions.
pub struct BattleResolver {
    data: Arc<GameData>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    sessions: FxHashMap<SessionId, Running>,
    archive: Vec<BattleRecord>,
    next_id: u64,
}

impl BattleResolver {
    /// Create a resolver that discards events.
    #[must_use]
    pub fn new(data: Arc<GameData>, clock: Arc<dyn Clock>) -> Self {
        Self {
            data,
            clock,
            sink: Arc::new(NullSink),
            sessions: FxHashMap::default(),
            archive: Vec::new(),
            next_id: 1,
        }
    }

    /// Publish committed events to `sink` (builder pattern).
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Settings used for new sessions.
    #[must_use]
    pub fn settings(&self) -> &BattleSettings {
        &self.data.battle
    }

    /// Validate and swap in new game data. Running sessions keep what they
    /// started with.
    ///
    /// On error the current data stays in place.
    pub fn reload(&mut self, data: Arc<GameData>) -> Result<(), ConfigError> {
        data.validate()?;
        info!(
            cards = data.catalog.len(),
            running = self.sessions.len(),
            "battle data reloaded"
        );
        self.data = data;
        Ok(())
    }

    /// Build a session in `Waiting` from two lineups of catalog ids.
    ///
    /// The first `active_slots` cards of each lineup start on the field,
    /// the rest on the bench. Cards with zero base health are refused.
    pub fn create_session(
        &mut self,
        first: &[CardId],
        second: &[CardId],
    ) -> Result<SessionId, BattleError> {
        let data = Arc::clone(&self.data);
        let id = SessionId(self.next_id);
        let mut session = BattleSession::new(id);

        for (side, lineup) in [(PlayerId::new(0), first), (PlayerId::new(1), second)] {
            if lineup.is_empty() {
                return Err(BattleError::EmptyLineup(side));
            }
            for card_id in lineup {
                let definition = data
                    .catalog
                    .get(card_id)
                    .ok_or_else(|| BattleError::UnknownCard(card_id.clone()))?;
                if definition.stats.health == 0 {
                    return Err(BattleError::NoHealth(card_id.clone()));
                }
                session.add_card(side, data.battle.active_slots, |entity| {
                    CardInstance::from_definition(entity, definition, side)
                });
            }
        }

        self.next_id += 1;
        self.sessions.insert(id, Running { session, data });
        info!(session = %id, first = first.len(), second = second.len(), "session created");
        Ok(id)
    }

    /// Move a waiting session through `Starting` into `InProgress`.
    ///
    /// The side with the higher total speed on the field goes first; ties
    /// go to the first side.
    pub fn start(&mut self, id: SessionId) -> Result<Vec<BattleEvent>, BattleError> {
        self.transact(id, |turn| {
            turn.require(BattleStatus::Waiting, "start")?;
            turn.set_status(BattleStatus::Starting);
            let first = turn.first_side()?;
            turn.set_status(BattleStatus::InProgress);
            turn.begin_turn(first, false)
        })
    }

    /// Validate and apply one action.
    ///
    /// On `InvalidAction` the session is unchanged. `draws` is consulted
    /// once per hit for the critical roll.
    pub fn submit_action(
        &mut self,
        id: SessionId,
        side: PlayerId,
        action: BattleAction,
        draws: &mut impl DrawSource,
    ) -> Result<Vec<BattleEvent>, BattleError> {
        self.transact(id, |turn| {
            validate(turn.session, side, &action)?;
            debug!(session = %id, %side, ?action, "applying action");
            match action {
                BattleAction::EndPhase => turn.end_phase(false),
                BattleAction::Deploy { card, replacing } => {
                    turn.deploy(side, card, replacing);
                    Ok(())
                }
                BattleAction::Attack { attacker, target } => {
                    turn.attack(side, attacker, target, false, draws)
                }
                BattleAction::UseAbility { attacker, target } => {
                    turn.attack(side, attacker, target, true, draws)
                }
                BattleAction::Forfeit => {
                    turn.forfeit(side);
                    Ok(())
                }
            }
        })
    }

    /// Suspend an in-progress session and disarm its phase timer.
    pub fn pause(&mut self, id: SessionId) -> Result<Vec<BattleEvent>, BattleError> {
        self.transact(id, |turn| {
            turn.require(BattleStatus::InProgress, "pause")?;
            turn.session.timer = None;
            turn.set_status(BattleStatus::Paused);
            Ok(())
        })
    }

    /// Resume a paused session. The current phase gets a fresh deadline.
    pub fn resume(&mut self, id: SessionId) -> Result<Vec<BattleEvent>, BattleError> {
        self.transact(id, |turn| {
            turn.require(BattleStatus::Paused, "resume")?;
            turn.set_status(BattleStatus::InProgress);
            turn.arm_timer();
            Ok(())
        })
    }

    /// Cancel a session from any non-terminal state.
    pub fn cancel(
        &mut self,
        id: SessionId,
        reason: CancelReason,
    ) -> Result<Vec<BattleEvent>, BattleError> {
        self.transact(id, |turn| {
            let status = turn.session.status;
            if status.is_terminal() {
                return Err(InvalidAction::IllegalTransition {
                    action: "cancel",
                    status,
                }
                .into());
            }
            turn.session.timer = None;
            turn.session.outcome = Some(BattleOutcome::Cancelled(reason.clone()));
            turn.emit(BattleEventKind::Cancelled { reason });
            turn.set_status(BattleStatus::Cancelled);
            Ok(())
        })
    }

    /// Close every phase whose deadline has passed, as if the active side
    /// had submitted `EndPhase`.
    pub fn expire_timers(&mut self) -> Vec<BattleEvent> {
        let now = self.clock.now();
        let mut expired: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|r| r.session.status == BattleStatus::InProgress)
            .filter(|r| r.session.timer.is_some_and(|t| t.is_expired(now)))
            .map(|r| r.session.id)
            .collect();
        expired.sort_unstable();

        let mut events = Vec::new();
        for id in expired {
            debug!(session = %id, "phase timed out");
            match self.transact(id, |turn| turn.end_phase(true)) {
                Ok(mut committed) => events.append(&mut committed),
                Err(err) => warn!(session = %id, error = %err, "timeout not applied"),
            }
        }
        events
    }

    /// Actions `side` may submit right now.
    pub fn legal_actions(
        &self,
        id: SessionId,
        side: PlayerId,
    ) -> Result<Vec<BattleAction>, BattleError> {
        let running = self.sessions.get(&id).ok_or(BattleError::UnknownSession(id))?;
        Ok(action::legal_actions(&running.session, side))
    }

    /// Borrow a live session.
    #[must_use]
    pub fn session(&self, id: SessionId) -> Option<&BattleSession> {
        self.sessions.get(&id).map(|r| &r.session)
    }

    /// Independent copy of a live session's current state.
    #[must_use]
    pub fn snapshot(&self, id: SessionId) -> Option<BattleSession> {
        self.session(id).cloned()
    }

    /// Ids of live sessions in ascending order.
    #[must_use]
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of live (non-archived) sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions that reached a terminal state, oldest first.
    #[must_use]
    pub fn archive(&self) -> &[BattleRecord] {
        &self.archive
    }

    /// Hand the archive to the caller, leaving it empty.
    pub fn take_archive(&mut self) -> Vec<BattleRecord> {
        std::mem::take(&mut self.archive)
    }

    // === Internals ===

    fn transact<F>(&mut self, id: SessionId, op: F) -> Result<Vec<BattleEvent>, BattleError>
    where
        F: FnOnce(&mut Turn<'_>) -> Result<(), BattleError>,
    {
        let now = self.clock.now();
        let running = self.sessions.get(&id).ok_or(BattleError::UnknownSession(id))?;
        let data = Arc::clone(&running.data);
        let mut working = running.session.clone();

        let mut turn = Turn {
            session: &mut working,
            data: &data,
            now,
            events: Vec::new(),
        };
        match op(&mut turn) {
            Ok(()) => {
                let events = turn.events;
                self.commit(working, now);
                for event in &events {
                    self.sink.publish(Event::Battle(event.clone()));
                }
                Ok(events)
            }
            Err(BattleError::SessionCorrupted { session, detail }) => {
                error!(%session, %detail, "session corrupted, cancelling");
                if let Err(err) = self.cancel(id, CancelReason::Corrupted(detail.clone())) {
                    error!(%session, error = %err, "failed to cancel corrupted session");
                }
                Err(BattleError::SessionCorrupted { session, detail })
            }
            Err(err) => {
                warn!(session = %id, error = %err, "request rejected");
                Err(err)
            }
        }
    }

    fn commit(&mut self, session: BattleSession, now: DateTime<Utc>) {
        let id = session.id;
        match session.outcome.clone() {
            Some(outcome) if session.status.is_terminal() => {
                info!(session = %id, ?outcome, turns = session.turn, "session ended");
                self.sessions.remove(&id);
                self.archive.push(BattleRecord {
                    session: id,
                    outcome,
                    turns: session.turn,
                    ended_at: now,
                    log: session.log().clone(),
                });
            }
            _ => {
                if let Some(running) = self.sessions.get_mut(&id) {
                    running.session = session;
                }
            }
        }
    }
}

impl Service for BattleResolver {
    fn name(&self) -> &'static str {
        "battle-resolver"
    }

    fn initialize(&mut self) -> Result<(), ConfigError> {
        self.data.validate()
    }

    /// Cancel every live session.
    fn stop(&mut self) {
        for id in self.session_ids() {
            if let Err(err) = self.cancel(id, CancelReason::Shutdown) {
                warn!(session = %id, error = %err, "cancel on shutdown failed");
            }
        }
    }
}

/// Mutable view of a working copy for the duration of one request.
struct Turn<'a> {
    session: &'a mut BattleSession,
    data: &'a GameData,
    now: DateTime<Utc>,
    events: Vec<BattleEvent>,
}

impl Turn<'_> {
    fn emit(&mut self, kind: BattleEventKind) {
        let event = self.session.record(self.now, kind);
        self.events.push(event);
    }

    fn require(&self, expected: BattleStatus, action: &'static str) -> Result<(), BattleError> {
        let status = self.session.status;
        if status != expected {
            return Err(InvalidAction::IllegalTransition { action, status }.into());
        }
        Ok(())
    }

    fn set_status(&mut self, to: BattleStatus) {
        let from = self.session.status;
        self.session.status = to;
        self.emit(BattleEventKind::StatusChanged { from, to });
    }

    fn arm_timer(&mut self) {
        self.session.timer = self.data.battle.phase_timeout().map(|timeout| PhaseTimer {
            side: self.session.active_side,
            phase: self.session.phase,
            deadline: self.now + timeout,
        });
    }

    fn card(&self, id: EntityId) -> Result<&CardInstance, BattleError> {
        lookup(&*self.session, id)
    }

    fn card_mut(&mut self, id: EntityId) -> Result<&mut CardInstance, BattleError> {
        let session = self.session.id;
        self.session
            .card_mut(id)
            .ok_or_else(|| BattleError::SessionCorrupted {
                session,
                detail: format!("{} has no card instance", id),
            })
    }

    fn first_side(&self) -> Result<PlayerId, BattleError> {
        let mut speed = [0u64; PlayerId::SIDES];
        for side in PlayerId::both() {
            for &id in &self.session.sides[side].active {
                speed[side.index()] += u64::from(self.card(id)?.speed);
            }
        }
        Ok(if speed[1] > speed[0] {
            PlayerId::new(1)
        } else {
            PlayerId::new(0)
        })
    }

    fn begin_turn(&mut self, side: PlayerId, timed_out: bool) -> Result<(), BattleError> {
        self.session.active_side = side;
        self.session.phase = TurnPhase::Draw;
        self.session.sides[side].attacked = false;
        self.emit(BattleEventKind::TurnStarted { side });
        self.emit(BattleEventKind::PhaseEntered {
            side,
            phase: TurnPhase::Draw,
            timed_out,
        });

        let lineup = &self.session.sides[side];
        let members: Vec<EntityId> = lineup.active.iter().chain(lineup.bench.iter()).copied().collect();
        for id in members {
            let on_field = self.session.is_active(side, id);
            let card = self.card_mut(id)?;
            let was_alive = !card.is_defeated();
            let ticks = tick_statuses(card);
            card.cooldown = card.cooldown.saturating_sub(1);
            if on_field && !card.is_defeated() {
                card.turns_on_field += 1;
            }
            let defeated = was_alive && card.is_defeated();

            for tick in ticks {
                self.emit(BattleEventKind::StatusTicked {
                    card: tick.card,
                    kind: tick.kind,
                    amount: tick.amount,
                    expired: tick.expired,
                });
            }
            if defeated {
                debug!(session = %self.session.id, card = %id, "defeated by status effect");
                self.emit(BattleEventKind::Defeated { card: id });
            }
        }

        self.promote(side)?;
        self.arm_timer();
        Ok(())
    }

    /// Move defeated cards to the fallen pile and refill empty field slots
    /// from the bench, in lineup order.
    fn promote(&mut self, side: PlayerId) -> Result<(), BattleError> {
        let bench = self.session.sides[side].bench.clone();
        let active = self.session.sides[side].active.clone();

        let mut fallen = Vec::new();
        let mut reserve = Vec::with_capacity(bench.len());
        for id in bench {
            if self.card(id)?.is_defeated() {
                fallen.push(id);
            } else {
                reserve.push(id);
            }
        }

        let mut field = Vec::with_capacity(active.len());
        let mut promoted = Vec::new();
        for id in active {
            if !self.card(id)?.is_defeated() {
                field.push(id);
                continue;
            }
            fallen.push(id);
            if !reserve.is_empty() {
                let next = reserve.remove(0);
                field.push(next);
                promoted.push(next);
            }
        }

        let lineup = &mut self.session.sides[side];
        lineup.active = field;
        lineup.bench = reserve;
        lineup.fallen.extend(fallen);

        for card in promoted {
            self.emit(BattleEventKind::Promoted { side, card });
        }
        Ok(())
    }

    fn end_phase(&mut self, timed_out: bool) -> Result<(), BattleError> {
        let side = self.session.active_side;
        if let Some(next) = self.session.phase.next() {
            self.session.phase = next;
            self.emit(BattleEventKind::PhaseEntered {
                side,
                phase: next,
                timed_out,
            });
            self.arm_timer();
            return Ok(());
        }
        self.end_turn(timed_out)
    }

    fn end_turn(&mut self, timed_out: bool) -> Result<(), BattleError> {
        let side = self.session.active_side;
        let members: Vec<EntityId> = self.session.sides[side].all().collect();
        for id in members {
            clear_spent(self.card_mut(id)?);
        }

        if let Some(outcome) = self.terminal_outcome() {
            self.finish(outcome);
            return Ok(());
        }

        self.session.turn += 1;
        self.begin_turn(side.opponent(), timed_out)
    }

    fn terminal_outcome(&self) -> Option<BattleOutcome> {
        let first = self.session.living(PlayerId::new(0));
        let second = self.session.living(PlayerId::new(1));
        match (first, second) {
            (0, 0) => Some(BattleOutcome::Draw),
            (0, _) => Some(BattleOutcome::Winner(PlayerId::new(1))),
            (_, 0) => Some(BattleOutcome::Winner(PlayerId::new(0))),
            _ if self.session.turn >= self.data.battle.max_turns => Some(BattleOutcome::Draw),
            _ => None,
        }
    }

    fn finish(&mut self, outcome: BattleOutcome) {
        self.session.timer = None;
        self.session.outcome = Some(outcome.clone());
        self.emit(BattleEventKind::Finished { outcome });
        self.set_status(BattleStatus::Finished);
    }

    fn forfeit(&mut self, side: PlayerId) {
        self.emit(BattleEventKind::Forfeited { side });
        self.finish(BattleOutcome::Winner(side.opponent()));
    }

    fn deploy(&mut self, side: PlayerId, card: EntityId, replacing: EntityId) {
        let lineup = &mut self.session.sides[side];
        let slot = lineup.active.iter().position(|&e| e == replacing);
        let spot = lineup.bench.iter().position(|&e| e == card);
        if let (Some(slot), Some(spot)) = (slot, spot) {
            lineup.active[slot] = card;
            lineup.bench[spot] = replacing;
            self.emit(BattleEventKind::Deployed {
                side,
                card,
                replaced: replacing,
            });
        }
    }

    fn attack(
        &mut self,
        side: PlayerId,
        attacker: EntityId,
        target: EntityId,
        use_ability: bool,
        draws: &mut impl DrawSource,
    ) -> Result<(), BattleError> {
        let (attack, card_id) = {
            let card = self.card(attacker)?;
            (card.attack, card.card_id.clone())
        };
        let defense = self.card(target)?.defense;

        let ability = if use_ability {
            let definition =
                self.data
                    .catalog
                    .get(&card_id)
                    .ok_or_else(|| BattleError::SessionCorrupted {
                        session: self.session.id,
                        detail: format!("card {} has no catalog entry", card_id),
                    })?;
            Some(definition.ability.clone())
        } else {
            None
        };

        let multiplier = ability.as_ref().map_or(1.0, Ability::multiplier);
        let hit = resolve_damage(attack, multiplier, defense, &self.data.battle, draws);

        let victim = self.card_mut(target)?;
        victim.take_damage(hit.amount);
        let defeated = victim.is_defeated();
        self.session.sides[side].attacked = true;

        self.emit(BattleEventKind::Attacked {
            attacker,
            target,
            ability: ability.as_ref().map(|a| a.id.clone()),
            damage: hit.amount,
            critical: hit.critical,
        });

        if let Some(ability) = ability {
            self.card_mut(attacker)?.cooldown = ability.cooldown;
            if let Some(spec) = ability.effect {
                let bearer = if spec.kind.is_harmful() { target } else { attacker };
                if !self.card(bearer)?.is_defeated() {
                    let effect = self.card_mut(bearer)?.apply_status(spec);
                    self.emit(BattleEventKind::StatusApplied {
                        card: bearer,
                        kind: effect.kind,
                        potency: effect.potency,
                        duration: effect.remaining,
                    });
                }
            }
        }

        if defeated {
            debug!(session = %self.session.id, card = %target, "card defeated");
            self.emit(BattleEventKind::Defeated { card: target });
            self.promote(side.opponent())?;
        }
        Ok(())
    }
}
