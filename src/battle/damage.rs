//! Damage resolution.
//!
//! `damage = max(0, attack * multiplier - defense * mitigation)`, multiplied
//! by `crit_multiplier` when the crit draw falls below `crit_chance`, then
//! floored to a whole number. Exactly one draw is consumed per hit whether
//! or not crits are possible, so draw sequences stay aligned.

use crate::config::BattleSettings;
use crate::core::DrawSource;

/// Outcome of one hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageRoll {
    /// Damage before flooring.
    pub raw: f64,
    /// Damage to subtract from the target's health.
    pub amount: u32,
    pub critical: bool,
}

/// Compute the damage of one hit.
pub fn resolve_damage(
    attack: u32,
    multiplier: f64,
    defense: u32,
    settings: &BattleSettings,
    draws: &mut impl DrawSource,
) -> DamageRoll {
    let critical = draws.next_unit() < settings.crit_chance;

    let mitigated = f64::from(attack) * multiplier - f64::from(defense) * settings.mitigation;
    let mut raw = mitigated.max(0.0);
    if critical {
        raw *= settings.crit_multiplier;
    }

    DamageRoll {
        raw,
        amount: to_whole(raw),
        critical,
    }
}

fn to_whole(raw: f64) -> u32 {
    if raw >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        raw.floor() as u32
    }
}
