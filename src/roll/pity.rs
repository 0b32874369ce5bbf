//! Per-account pity state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::Rarity;

/// Rolls since the last rare-or-better result, plus bookkeeping.
///
/// A missing state is the same as `PityState::default()`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PityState {
    /// Consecutive rolls without a rare-or-better card.
    pub counter: u32,
    /// Every roll ever made.
    pub lifetime_rolls: u64,
    pub last_roll_at: Option<DateTime<Utc>>,
}

impl PityState {
    /// Fresh state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one roll that awarded `rarity`.
    pub fn record(&mut self, rarity: Rarity, at: DateTime<Utc>) {
        if rarity.is_rare_or_better() {
            self.counter = 0;
        } else {
            self.counter = self.counter.saturating_add(1);
        }
        self.lifetime_rolls = self.lifetime_rolls.saturating_add(1);
        self.last_roll_at = Some(at);
    }

    /// Lower the counter, stopping at zero.
    pub fn decrement(&mut self, by: u32) {
        self.counter = self.counter.saturating_sub(by);
    }

    /// Clear the counter. Lifetime statistics are kept.
    pub fn reset(&mut self) {
        self.counter = 0;
    }
}
