//! Card instances - battle-scoped card state.
//!
//! `CardInstance` is a mutable copy of a `CardDefinition` placed into one
//! battle. It tracks current health, active status effects, ability
//! cooldown and how long it has been on the field. The catalog entry it
//! was copied from is never touched.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::definition::{CardDefinition, CardId, StatusEffectSpec};
use crate::battle::{StatusEffect, StatusKind};
use crate::core::{EntityId, PlayerId};

/// A card in a battle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardInstance {
    /// Unique id within the session.
    pub entity_id: EntityId,

    /// Reference to the card definition.
    pub card_id: CardId,

    /// Side this card fights for.
    pub owner: PlayerId,

    pub health: u32,
    pub max_health: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub energy: u32,

    /// Active status effects, at most one per kind.
    pub statuses: SmallVec<[StatusEffect; 2]>,

    /// Turns this card has spent in an active slot.
    pub turns_on_field: u32,

    /// Turns until the ability can be used again.
    pub cooldown: u32,
}

impl CardInstance {
    /// Copy a definition into a fresh instance at full health.
    #[must_use]
    pub fn from_definition(entity_id: EntityId, definition: &CardDefinition, owner: PlayerId) -> Self {
        let stats = definition.stats;
        Self {
            entity_id,
            card_id: definition.id.clone(),
            owner,
            health: stats.health,
            max_health: stats.health,
            attack: stats.attack,
            defense: stats.defense,
            speed: stats.speed,
            energy: stats.energy,
            statuses: SmallVec::new(),
            turns_on_field: 0,
            cooldown: 0,
        }
    }

    /// Health has reached zero.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }

    /// Is a stun currently active?
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.status(StatusKind::Stun).is_some()
    }

    /// Active effect of a kind, if any.
    #[must_use]
    pub fn status(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.statuses.iter().find(|s| s.kind == kind)
    }

    /// Subtract health, saturating at zero. Returns the health actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.health);
        self.health -= lost;
        lost
    }

    /// Restore health up to the maximum. Returns the health actually gained.
    /// Defeated cards cannot be healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if self.is_defeated() {
            return 0;
        }
        let gained = amount.min(self.max_health - self.health);
        self.health += gained;
        gained
    }

    /// Apply a status effect.
    ///
    /// Reapplying a kind already present refreshes its duration and keeps
    /// the higher potency.
    pub fn apply_status(&mut self, spec: StatusEffectSpec) -> StatusEffect {
        if let Some(existing) = self.statuses.iter_mut().find(|s| s.kind == spec.kind) {
            existing.remaining = existing.remaining.max(spec.duration);
            existing.potency = existing.potency.max(spec.potency);
            return *existing;
        }
        let effect = StatusEffect {
            kind: spec.kind,
            potency: spec.potency,
            remaining: spec.duration,
        };
        self.statuses.push(effect);
        effect
    }
}
