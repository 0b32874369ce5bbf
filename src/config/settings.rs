//! Battle tuning constants.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunable battle rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSettings {
    /// Turn at whose end a battle with survivors on both sides is a draw.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Fraction of the target's defense subtracted from raw damage.
    #[serde(default = "default_mitigation")]
    pub mitigation: f64,

    /// Probability in `[0, 1]` that an attack is critical.
    #[serde(default = "default_crit_chance")]
    pub crit_chance: f64,

    /// Damage multiplier applied to critical hits.
    #[serde(default = "default_crit_multiplier")]
    pub crit_multiplier: f64,

    /// Seconds a phase may stay open before it is ended automatically.
    /// Zero disables phase timers.
    #[serde(default = "default_phase_timeout_secs")]
    pub phase_timeout_secs: u64,

    /// Cards each side fields at once; the rest wait on the bench.
    #[serde(default = "default_active_slots")]
    pub active_slots: usize,
}

impl Default for BattleSettings {
    fn default() -> Self {
        BattleSettings {
            max_turns: default_max_turns(),
            mitigation: default_mitigation(),
            crit_chance: default_crit_chance(),
            crit_multiplier: default_crit_multiplier(),
            phase_timeout_secs: default_phase_timeout_secs(),
            active_slots: default_active_slots(),
        }
    }
}

fn default_max_turns() -> u32 {
    30
}
fn default_mitigation() -> f64 {
    0.5
}
fn default_crit_chance() -> f64 {
    0.1
}
fn default_crit_multiplier() -> f64 {
    1.5
}
fn default_phase_timeout_secs() -> u64 {
    60
}
fn default_active_slots() -> usize {
    1
}

impl BattleSettings {
    /// Phase timeout, if timers are enabled.
    #[must_use]
    pub fn phase_timeout(&self) -> Option<Duration> {
        if self.phase_timeout_secs == 0 {
            return None;
        }
        i64::try_from(self.phase_timeout_secs)
            .ok()
            .and_then(Duration::try_seconds)
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns == 0 {
            return Err(ConfigError::Validation("battle.max_turns must be at least 1".into()));
        }
        if !self.mitigation.is_finite() || self.mitigation < 0.0 {
            return Err(ConfigError::Validation(
                "battle.mitigation must be finite and non-negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crit_chance) {
            return Err(ConfigError::Validation(format!(
                "battle.crit_chance must be within [0, 1], got {}",
                self.crit_chance
            )));
        }
        if !self.crit_multiplier.is_finite() || self.crit_multiplier < 1.0 {
            return Err(ConfigError::Validation(
                "battle.crit_multiplier must be at least 1".into(),
            ));
        }
        if self.active_slots == 0 {
            return Err(ConfigError::Validation("battle.active_slots must be at least 1".into()));
        }
        if self.phase_timeout_secs > 0 && self.phase_timeout().is_none() {
            return Err(ConfigError::Validation("battle.phase_timeout_secs is too large".into()));
        }
        Ok(())
    }
}
