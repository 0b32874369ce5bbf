//! Status effects and their per-turn ticks.
//!
//! Effects tick at the start of the bearer side's Draw phase, before that
//! side may act:
//!
//! 1. `Burn` and `Poison` deal their potency as damage.
//! 2. `Regeneration` heals its potency, capped at max health.
//! 3. Every effect's remaining duration drops by one; effects reaching zero
//!    are removed.
//!
//! `Stun` deals nothing but blocks attacks while present. A spent stun
//! stays for the rest of the bearer's turn and is removed by
//! [`clear_spent`] when that turn ends, so a one-turn stun costs the
//! bearer exactly one attack.

use serde::{Deserialize, Serialize};

use crate::cards::CardInstance;
use crate::core::EntityId;

/// Kind of status effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Burn,
    Poison,
    Stun,
    Regeneration,
}

impl StatusKind {
    /// Harmful effects land on the ability's target; the rest on its user.
    #[must_use]
    pub const fn is_harmful(self) -> bool {
        !matches!(self, StatusKind::Regeneration)
    }
}

/// An active effect on a card instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub potency: u32,
    /// Ticks left before the effect expires.
    pub remaining: u32,
}

/// What one effect did during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusTick {
    pub card: EntityId,
    pub kind: StatusKind,
    /// Health lost (damage effects) or gained (regeneration).
    pub amount: u32,
    pub expired: bool,
}

/// Tick every status effect on `card`.
///
/// Defeated cards do not tick; their effects are simply cleared.
pub fn tick_statuses(card: &mut CardInstance) -> Vec<StatusTick> {
    if card.is_defeated() {
        card.statuses.clear();
        return Vec::new();
    }

    let mut ticks = Vec::with_capacity(card.statuses.len());
    let effects: Vec<StatusEffect> = card.statuses.iter().copied().collect();

    for effect in effects {
        let amount = match effect.kind {
            StatusKind::Burn | StatusKind::Poison => card.take_damage(effect.potency),
            StatusKind::Regeneration => card.heal(effect.potency),
            StatusKind::Stun => 0,
        };
        ticks.push(StatusTick {
            card: card.entity_id,
            kind: effect.kind,
            amount,
            expired: effect.remaining <= 1,
        });
    }

    for effect in card.statuses.iter_mut() {
        effect.remaining = effect.remaining.saturating_sub(1);
    }
    card.statuses.retain(|e| e.remaining > 0 || e.kind == StatusKind::Stun);

    ticks
}

/// Drop spent stuns at the end of the bearer's turn.
pub fn clear_spent(card: &mut CardInstance) {
    card.statuses.retain(|e| e.remaining > 0);
}
