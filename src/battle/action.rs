//! Player actions and their legality rules.
//!
//! | Action       | Phase  | Requirements                                        |
//! |--------------|--------|-----------------------------------------------------|
//! | `EndPhase`   | any    | acting side is active                               |
//! | `Deploy`     | Main   | bench card alive, replaced card on the field        |
//! | `Attack`     | Attack | attacker on the field, alive, not stunned; target   |
//! |              |        | an opposing card on the field and alive; one attack |
//! |              |        | per turn                                            |
//! | `UseAbility` | Attack | as `Attack`, plus the ability is off cooldown       |
//! | `Forfeit`    | any    | either side, any time the battle is in progress     |

use serde::{Deserialize, Serialize};

use super::session::{BattleSession, BattleStatus, TurnPhase};
use crate::cards::CardInstance;
use crate::core::{EntityId, PlayerId};
use crate::error::{BattleError, InvalidAction};

/// Something a side asks to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleAction {
    /// Close the current phase.
    EndPhase,
    /// Swap a bench card onto the field in place of an active card.
    Deploy { card: EntityId, replacing: EntityId },
    /// Basic attack.
    Attack { attacker: EntityId, target: EntityId },
    /// Attack using the attacker's special ability.
    UseAbility { attacker: EntityId, target: EntityId },
    /// Concede the battle.
    Forfeit,
}

impl BattleAction {
    /// Phase the action is restricted to, if any.
    #[must_use]
    pub const fn required_phase(&self) -> Option<TurnPhase> {
        match self {
            BattleAction::Deploy { .. } => Some(TurnPhase::Main),
            BattleAction::Attack { .. } | BattleAction::UseAbility { .. } => Some(TurnPhase::Attack),
            BattleAction::EndPhase | BattleAction::Forfeit => None,
        }
    }
}

/// Find a card referenced by an action.
///
/// A card listed in a lineup but missing from the card table means the
/// session itself is broken, which is reported as corruption rather than
/// a bad request.
pub(crate) fn lookup(session: &BattleSession, id: EntityId) -> Result<&CardInstance, BattleError> {
    match session.card(id) {
        Some(card) => Ok(card),
        None if session.side_of(id).is_some() => Err(BattleError::SessionCorrupted {
            session: session.id,
            detail: format!("{} is in a lineup but has no card instance", id),
        }),
        None => Err(InvalidAction::UnknownCard(id).into()),
    }
}

/// Check an action against the session without changing anything.
pub fn validate(
    session: &BattleSession,
    side: PlayerId,
    action: &BattleAction,
) -> Result<(), BattleError> {
    if session.status != BattleStatus::InProgress {
        return Err(InvalidAction::NotInProgress(session.status).into());
    }
    if matches!(action, BattleAction::Forfeit) {
        return Ok(());
    }
    if side != session.active_side {
        return Err(InvalidAction::NotYourTurn(side).into());
    }
    if let Some(phase) = action.required_phase() {
        if phase != session.phase {
            return Err(InvalidAction::WrongPhase(session.phase).into());
        }
    }

    match *action {
        BattleAction::EndPhase | BattleAction::Forfeit => Ok(()),
        BattleAction::Deploy { card, replacing } => validate_deploy(session, side, card, replacing),
        BattleAction::Attack { attacker, target } => {
            validate_attack(session, side, attacker, target, false)
        }
        BattleAction::UseAbility { attacker, target } => {
            validate_attack(session, side, attacker, target, true)
        }
    }
}

fn validate_deploy(
    session: &BattleSession,
    side: PlayerId,
    card: EntityId,
    replacing: EntityId,
) -> Result<(), BattleError> {
    let incoming = owned(session, side, card)?;
    owned(session, side, replacing)?;

    if session.is_active(side, card) {
        return Err(InvalidAction::AlreadyActive(card).into());
    }
    if !session.sides[side].bench.contains(&card) || incoming.is_defeated() {
        return Err(InvalidAction::Defeated(card).into());
    }
    if !session.is_active(side, replacing) {
        return Err(InvalidAction::NotActive(replacing).into());
    }
    Ok(())
}

fn validate_attack(
    session: &BattleSession,
    side: PlayerId,
    attacker: EntityId,
    target: EntityId,
    ability: bool,
) -> Result<(), BattleError> {
    let source = owned(session, side, attacker)?;
    if !session.is_active(side, attacker) {
        return Err(InvalidAction::NotActive(attacker).into());
    }
    if source.is_defeated() {
        return Err(InvalidAction::Defeated(attacker).into());
    }
    if source.is_stunned() {
        return Err(InvalidAction::Stunned(attacker).into());
    }
    if ability && source.cooldown > 0 {
        return Err(InvalidAction::OnCooldown {
            card: attacker,
            turns: source.cooldown,
        }
        .into());
    }
    if session.sides[side].attacked {
        return Err(InvalidAction::AlreadyAttacked.into());
    }

    let victim = lookup(session, target)?;
    if victim.owner == side {
        return Err(InvalidAction::FriendlyTarget(target).into());
    }
    if !session.is_active(side.opponent(), target) {
        return Err(InvalidAction::NotActive(target).into());
    }
    if victim.is_defeated() {
        return Err(InvalidAction::Defeated(target).into());
    }
    Ok(())
}

/// Every action `side` could legally submit right now.
///
/// Candidates are built from the current lineups and filtered through
/// [`validate`], so the list never disagrees with what the resolver accepts.
#[must_use]
pub fn legal_actions(session: &BattleSession, side: PlayerId) -> Vec<BattleAction> {
    let own = &session.sides[side];
    let theirs = &session.sides[side.opponent()];

    let mut candidates = vec![BattleAction::EndPhase, BattleAction::Forfeit];
    for &card in &own.bench {
        for &replacing in &own.active {
            candidates.push(BattleAction::Deploy { card, replacing });
        }
    }
    for &attacker in &own.active {
        for &target in &theirs.active {
            candidates.push(BattleAction::Attack { attacker, target });
            candidates.push(BattleAction::UseAbility { attacker, target });
        }
    }

    candidates
        .into_iter()
        .filter(|action| validate(session, side, action).is_ok())
        .collect()
}

fn owned(session: &BattleSession, side: PlayerId, id: EntityId) -> Result<&CardInstance, BattleError> {
    let card = lookup(session, id)?;
    if card.owner != side {
        return Err(InvalidAction::NotYourCard(id).into());
    }
    Ok(card)
}
