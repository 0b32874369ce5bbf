//! Card definitions - static card data.
//!
//! `CardDefinition` holds the immutable properties of a card: its rarity,
//! base stats and special ability. Battle-scoped mutable data (current
//! health, status effects, cooldowns) lives in `CardInstance`.

use serde::{Deserialize, Serialize};

use super::rarity::Rarity;
use crate::battle::StatusKind;

/// Unique identifier for a card definition.
///
/// Unique across the whole catalog, not just within a series.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Base combat stats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseStats {
    pub attack: u32,
    pub defense: u32,
    pub health: u32,
    pub speed: u32,
    pub energy: u32,
}

/// Status effect an ability inflicts on its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusEffectSpec {
    pub kind: StatusKind,
    /// Damage or healing per tick. Unused by `Stun`.
    #[serde(default)]
    pub potency: u32,
    /// Number of the bearer's turns the effect lasts.
    pub duration: u32,
}

/// A card's special ability.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ability {
    pub id: String,

    /// Bonus damage in percent over a basic attack.
    #[serde(default)]
    pub damage: u32,

    /// Turns before the ability can be used again.
    #[serde(default)]
    pub cooldown: u32,

    #[serde(default)]
    pub effect: Option<StatusEffectSpec>,
}

impl Ability {
    /// Create an ability with no bonus damage, cooldown or effect.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            damage: 0,
            cooldown: 0,
            effect: None,
        }
    }

    /// Attack multiplier when this ability is used.
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        1.0 + f64::from(self.damage) / 100.0
    }
}

/// Static card definition.
///
/// ```
/// use card_arena::cards::{Ability, BaseStats, CardDefinition, Rarity};
///
/// let card = CardDefinition::new("ember-fox", "Ember Fox", Rarity::Rare)
///     .with_stats(BaseStats { attack: 40, defense: 10, health: 90, speed: 12, energy: 2 })
///     .with_ability(Ability::new("fox-fire"));
///
/// assert_eq!(card.stats.attack, 40);
/// assert!(card.rarity.is_rare_or_better());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Unique identifier for this card definition.
    pub id: CardId,

    /// Display name.
    pub name: String,

    pub rarity: Rarity,

    /// Series the card belongs to. Filled in by the catalog loader.
    #[serde(default)]
    pub series: String,

    #[serde(flatten)]
    pub stats: BaseStats,

    pub ability: Ability,
}

impl CardDefinition {
    /// Create a card with zero stats and a no-op ability.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, rarity: Rarity) -> Self {
        let id = CardId::new(id);
        let ability = Ability::new(format!("{}-ability", id));
        Self {
            id,
            name: name.into(),
            rarity,
            series: String::new(),
            stats: BaseStats::default(),
            ability,
        }
    }

    /// Set base stats (builder pattern).
    #[must_use]
    pub fn with_stats(mut self, stats: BaseStats) -> Self {
        self.stats = stats;
        self
    }

    /// Set the ability (builder pattern).
    #[must_use]
    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.ability = ability;
        self
    }

    /// Set the series (builder pattern).
    #[must_use]
    pub fn in_series(mut self, series: impl Into<String>) -> Self {
        self.series = series.into();
        self
    }
}
