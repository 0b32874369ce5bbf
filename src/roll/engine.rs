//! Weighted, pity-adjusted card rolls.
//!
//! ## Algorithm
//!
//! 1. Effective tier weights come from [`RarityTable::effective_weights`]
//!    at the current pity counter.
//! 2. One draw selects a tier from the normalized weights.
//! 3. A second draw picks a card uniformly within the tier, in catalog
//!    declaration order (`index = floor(u * len)`).
//! 4. The pity state is advanced from the rarity actually awarded.
//!
//! ## Fallback
//!
//! If the selected tier has no cards the nearest lower populated tier is
//! used, down to a floor (Common, or Rare while hard pity is active), then
//! the nearest higher populated tier. Fallbacks are logged as data
//! warnings and flagged on the [`RollOutcome`].
//!
//! The engine is stateless apart from its game data: it never persists
//! anything and can be shared freely between threads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::pity::PityState;
use crate::cards::{select_tier, CardCatalog, CardId, Rarity, RarityTable};
use crate::config::GameData;
use crate::core::{DrawSource, Service};
use crate::error::{ConfigError, GachaError};

/// Largest batch a single `roll_many` call accepts by default.
pub const DEFAULT_MAX_BATCH: usize = 100_000;

/// What a single roll produced.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RollOutcome {
    pub card: CardId,
    /// Rarity of the awarded card.
    pub rarity: Rarity,
    /// Tier picked by the weighted draw, before any fallback.
    pub drawn_rarity: Rarity,
    pub fell_back: bool,
    /// Pity counter the roll was made at.
    pub pity_before: u32,
    /// The roll was covered by the hard-pity guarantee.
    pub hard_pity: bool,
}

/// Rolls cards from a validated catalog and rarity table.
#[derive(Clone, Debug)]
pub struct RollEngine {
    data: Arc<GameData>,
    max_batch: usize,
}

impl RollEngine {
    /// Create an engine, rejecting data that cannot honor every roll.
    pub fn new(data: Arc<GameData>) -> Result<Self, ConfigError> {
        check_rollable(&data)?;
        Ok(Self {
            data,
            max_batch: DEFAULT_MAX_BATCH,
        })
    }

    /// Cap the number of rolls one batch may request (builder pattern).
    #[must_use]
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    #[must_use]
    pub fn max_batch(&self) -> usize {
        self.max_batch
    }

    /// Game data in use.
    #[must_use]
    pub fn data(&self) -> &Arc<GameData> {
        &self.data
    }

    /// Validate and swap in new game data.
    ///
    /// On error the current data stays in place.
    pub fn reload(&mut self, data: Arc<GameData>) -> Result<(), ConfigError> {
        check_rollable(&data)?;
        info!(cards = data.catalog.len(), "roll data reloaded");
        self.data = data;
        Ok(())
    }

    /// Tier probabilities for the next roll of `pity`.
    #[must_use]
    pub fn odds(&self, pity: &PityState) -> [f64; Rarity::COUNT] {
        self.data.rarity.probabilities(pity.counter)
    }

    /// Roll one card.
    ///
    /// Consumes exactly two draws. Returns the outcome and the advanced
    /// pity state; `pity` itself is not modified.
    pub fn roll(
        &self,
        pity: &PityState,
        draws: &mut impl DrawSource,
        at: DateTime<Utc>,
    ) -> Result<(RollOutcome, PityState), ConfigError> {
        let catalog = &self.data.catalog;
        let table = &self.data.rarity;
        if catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let counter = pity.counter;
        let hard_pity = table.pity().is_hard_pity(counter);
        let weights = table.effective_weights(counter);
        let drawn_rarity = select_tier(&weights, draws.next_unit()).ok_or_else(|| {
            ConfigError::Validation(format!("effective weights sum to zero at pity {}", counter))
        })?;

        let floor = if hard_pity { Rarity::Rare } else { Rarity::Common };
        let rarity = resolve_tier(catalog, drawn_rarity, floor).ok_or(ConfigError::EmptyCatalog)?;
        let fell_back = rarity != drawn_rarity;
        if fell_back {
            warn!(
                drawn = %drawn_rarity,
                awarded = %rarity,
                "rarity tier has no cards, falling back"
            );
        }

        let index = draws.next_index(catalog.tier_len(rarity));
        let card = catalog
            .nth_in_tier(rarity, index)
            .ok_or(ConfigError::EmptyCatalog)?;

        let mut next = pity.clone();
        next.record(rarity, at);
        debug!(card = %card.id, %rarity, pity = counter, hard_pity, "rolled");

        Ok((
            RollOutcome {
                card: card.id.clone(),
                rarity,
                drawn_rarity,
                fell_back,
                pity_before: counter,
                hard_pity,
            },
            next,
        ))
    }

    /// Roll `count` cards in sequence, each roll seeing the pity state left
    /// by the previous one.
    ///
    /// Identical to calling [`roll`](Self::roll) `count` times and threading
    /// the state through. `count == 0` returns the state unchanged; a count
    /// above [`max_batch`](Self::max_batch) is refused before any draw.
    pub fn roll_many(
        &self,
        pity: &PityState,
        count: usize,
        draws: &mut impl DrawSource,
        at: DateTime<Utc>,
    ) -> Result<(Vec<RollOutcome>, PityState), GachaError> {
        if count > self.max_batch {
            return Err(GachaError::BatchTooLarge {
                requested: count,
                limit: self.max_batch,
            });
        }
        let mut state = pity.clone();
        let mut outcomes = Vec::with_capacity(count);
        for _ in 0..count {
            let (outcome, next) = self.roll(&state, draws, at)?;
            outcomes.push(outcome);
            state = next;
        }
        Ok((outcomes, state))
    }
}

impl Service for RollEngine {
    fn name(&self) -> &'static str {
        "roll-engine"
    }

    fn initialize(&mut self) -> Result<(), ConfigError> {
        check_rollable(&self.data)
    }
}

/// Tier that actually supplies the card when `drawn` was selected.
fn resolve_tier(catalog: &CardCatalog, drawn: Rarity, floor: Rarity) -> Option<Rarity> {
    let populated = |tier: Rarity| catalog.tier_len(tier) > 0;
    if populated(drawn) {
        return Some(drawn);
    }
    let below = Rarity::ALL
        .into_iter()
        .rev()
        .filter(|&tier| tier < drawn && tier >= floor)
        .find(|&tier| populated(tier));
    below.or_else(|| {
        Rarity::ALL
            .into_iter()
            .filter(|&tier| tier > drawn)
            .find(|&tier| populated(tier))
    })
}

/// Reject data where some roll could fail or some card could never drop.
fn check_rollable(data: &GameData) -> Result<(), ConfigError> {
    data.validate()?;
    let catalog = &data.catalog;
    let table = &data.rarity;

    let rare_populated = Rarity::ALL
        .iter()
        .any(|t| t.is_rare_or_better() && catalog.tier_len(*t) > 0);
    let rare_weighted = Rarity::ALL
        .iter()
        .any(|t| t.is_rare_or_better() && table.base_weight(*t) > 0.0);
    if !rare_populated || !rare_weighted {
        return Err(ConfigError::Validation(
            "hard pity needs at least one rare-or-better tier with cards and a positive weight"
                .into(),
        ));
    }

    for tier in Rarity::ALL {
        if catalog.tier_len(tier) > 0 && !is_reachable(catalog, table, tier) {
            return Err(ConfigError::UnreachableTier(tier));
        }
    }
    Ok(())
}

/// Can any roll award a card of `tier`?
fn is_reachable(catalog: &CardCatalog, table: &RarityTable, tier: Rarity) -> bool {
    if table.base_weight(tier) > 0.0 {
        return true;
    }
    // Otherwise only through fallback from an empty tier that can be drawn
    Rarity::ALL
        .into_iter()
        .filter(|&drawn| table.base_weight(drawn) > 0.0 && catalog.tier_len(drawn) == 0)
        .any(|drawn| {
            let normal = resolve_tier(catalog, drawn, Rarity::Common) == Some(tier);
            let hard = drawn.is_rare_or_better()
                && resolve_tier(catalog, drawn, Rarity::Rare) == Some(tier);
            normal || hard
        })
}
