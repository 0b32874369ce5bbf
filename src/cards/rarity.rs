//! Rarity tiers, drop weights and the pity curve.
//!
//! ## Effective Weights
//!
//! The weight used for a roll is `base_weight * multiplier(tier, pity)`:
//!
//! - Common and Uncommon always use multiplier 1.
//! - Rare-or-better tiers use 1 below `soft_pity_start`, then ramp up by
//!   `soft_pity_step` per roll.
//! - On the `hard_pity`-th roll since the last rare-or-better result (pity
//!   counter `hard_pity - 1`) and beyond, Common and Uncommon drop to
//!   weight 0, so a rare-or-better tier is selected with probability 1.
//!
//! Weights do not need to sum to anything; they are normalized per roll.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Card rarity tier, in ascending order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Ultimate,
}

impl Rarity {
    /// Every tier in declaration order.
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Ultimate,
    ];

    /// Number of tiers.
    pub const COUNT: usize = Self::ALL.len();

    /// Position in declaration order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Does this tier reset the pity counter?
    #[must_use]
    pub const fn is_rare_or_better(self) -> bool {
        matches!(
            self,
            Rarity::Rare | Rarity::Epic | Rarity::Legendary | Rarity::Ultimate
        )
    }

    /// Lowercase name, matching the config keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Ultimate => "ultimate",
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drop weight and presentation hints for one tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierWeight {
    /// Relative drop weight. Must be finite and non-negative.
    pub weight: f64,

    /// Reveal glow intensity for the presentation layer.
    #[serde(default = "default_glow")]
    pub glow: f32,

    /// Reveal colour (RGB) for the presentation layer.
    #[serde(default = "default_color")]
    pub color: [u8; 3],
}

impl TierWeight {
    /// A weight with default presentation hints.
    #[must_use]
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            glow: default_glow(),
            color: default_color(),
        }
    }
}

fn default_glow() -> f32 {
    0.0
}

fn default_color() -> [u8; 3] {
    [255, 255, 255]
}

/// Pity escalation curve shared by every rare-or-better tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PityCurve {
    /// Counter value at which soft pity begins.
    #[serde(default = "default_soft_pity_start")]
    pub soft_pity_start: u32,

    /// Counter value at which a rare-or-better result is guaranteed.
    #[serde(default = "default_hard_pity")]
    pub hard_pity: u32,

    /// Multiplier increase per roll past `soft_pity_start`.
    #[serde(default = "default_soft_pity_step")]
    pub soft_pity_step: f64,
}

impl Default for PityCurve {
    fn default() -> Self {
        Self {
            soft_pity_start: default_soft_pity_start(),
            hard_pity: default_hard_pity(),
            soft_pity_step: default_soft_pity_step(),
        }
    }
}

fn default_soft_pity_start() -> u32 {
    75
}
fn default_hard_pity() -> u32 {
    90
}
fn default_soft_pity_step() -> f64 {
    0.6
}

impl PityCurve {
    /// Is the hard-pity guarantee active for a roll made at this counter
    /// value? The counter counts earlier misses, so the roll made at
    /// `hard_pity - 1` is the `hard_pity`-th.
    #[must_use]
    pub fn is_hard_pity(&self, counter: u32) -> bool {
        counter.saturating_add(1) >= self.hard_pity
    }

    /// Weight multiplier for `tier` at pity counter `counter`.
    ///
    /// Non-decreasing in `counter` for rare-or-better tiers, 1 otherwise.
    #[must_use]
    pub fn multiplier(&self, tier: Rarity, counter: u32) -> f64 {
        if !tier.is_rare_or_better() || counter < self.soft_pity_start {
            return 1.0;
        }
        let steps = f64::from(counter - self.soft_pity_start + 1);
        1.0 + self.soft_pity_step * steps
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hard_pity == 0 {
            return Err(ConfigError::Validation("pity.hard_pity must be at least 1".into()));
        }
        if self.soft_pity_start > self.hard_pity {
            return Err(ConfigError::Validation(format!(
                "pity.soft_pity_start ({}) exceeds pity.hard_pity ({})",
                self.soft_pity_start, self.hard_pity
            )));
        }
        if !self.soft_pity_step.is_finite() || self.soft_pity_step < 0.0 {
            return Err(ConfigError::Validation(
                "pity.soft_pity_step must be finite and non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Per-tier drop weights plus the pity curve.
#[derive(Clone, Debug, PartialEq)]
pub struct RarityTable {
    weights: [Option<TierWeight>; Rarity::COUNT],
    pity: PityCurve,
}

impl Default for RarityTable {
    fn default() -> Self {
        let mut table = Self::empty(PityCurve::default());
        let defaults = [
            (Rarity::Common, 60.0, 0.0, [200, 200, 200]),
            (Rarity::Uncommon, 25.0, 0.2, [90, 200, 90]),
            (Rarity::Rare, 10.0, 0.4, [70, 130, 255]),
            (Rarity::Epic, 4.0, 0.6, [170, 80, 255]),
            (Rarity::Legendary, 0.9, 0.8, [255, 190, 40]),
            (Rarity::Ultimate, 0.1, 1.0, [255, 60, 60]),
        ];
        for (tier, weight, glow, color) in defaults {
            table.set(tier, TierWeight { weight, glow, color });
        }
        table
    }
}

impl RarityTable {
    /// A table with no weights configured.
    #[must_use]
    pub fn empty(pity: PityCurve) -> Self {
        Self {
            weights: Default::default(),
            pity,
        }
    }

    /// Set a tier's weight (builder pattern).
    #[must_use]
    pub fn with(mut self, tier: Rarity, weight: f64) -> Self {
        self.set(tier, TierWeight::new(weight));
        self
    }

    /// Set a tier's weight entry.
    pub fn set(&mut self, tier: Rarity, weight: TierWeight) {
        self.weights[tier.index()] = Some(weight);
    }

    /// Weight entry for a tier, if configured.
    #[must_use]
    pub fn get(&self, tier: Rarity) -> Option<&TierWeight> {
        self.weights[tier.index()].as_ref()
    }

    /// Base weight for a tier (0 if unconfigured).
    #[must_use]
    pub fn base_weight(&self, tier: Rarity) -> f64 {
        self.get(tier).map_or(0.0, |w| w.weight)
    }

    /// The pity curve.
    #[must_use]
    pub fn pity(&self) -> &PityCurve {
        &self.pity
    }

    /// Effective weight for every tier at pity counter `counter`,
    /// in declaration order.
    #[must_use]
    pub fn effective_weights(&self, counter: u32) -> [f64; Rarity::COUNT] {
        let hard = self.pity.is_hard_pity(counter);
        Rarity::ALL.map(|tier| {
            if hard && !tier.is_rare_or_better() {
                0.0
            } else {
                self.base_weight(tier) * self.pity.multiplier(tier, counter)
            }
        })
    }

    /// Normalized tier probabilities at pity counter `counter`.
    ///
    /// All zeros if every effective weight is zero.
    #[must_use]
    pub fn probabilities(&self, counter: u32) -> [f64; Rarity::COUNT] {
        let weights = self.effective_weights(counter);
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return [0.0; Rarity::COUNT];
        }
        weights.map(|w| w / total)
    }

    /// Check weights and the pity curve.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pity.validate()?;
        for tier in Rarity::ALL {
            if let Some(entry) = self.get(tier) {
                if !entry.weight.is_finite() || entry.weight < 0.0 {
                    return Err(ConfigError::Validation(format!(
                        "weight for {} must be finite and non-negative, got {}",
                        tier, entry.weight
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Select a tier from `weights` with one uniform draw `u ∈ [0, 1)`.
///
/// The unit interval is split into half-open segments `[start, end)`
/// proportional to each weight, in declaration order. Zero-weight tiers
/// own no segment, so when several tiers share a boundary the
/// earlier-declared positive tier wins. Returns `None` if the weights sum
/// to zero.
#[must_use]
pub fn select_tier(weights: &[f64; Rarity::COUNT], u: f64) -> Option<Rarity> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }

    let mut cumulative = 0.0;
    let mut last_positive = None;
    for tier in Rarity::ALL {
        let weight = weights[tier.index()];
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight / total;
        last_positive = Some(tier);
        if u < cumulative {
            return Some(tier);
        }
    }

    // Rounding left a sliver at the top of the interval
    last_positive
}
