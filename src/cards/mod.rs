//! Card system: rarity, definitions, catalog and battle instances.
//!
//! ## Key Types
//!
//! - `Rarity`: the six drop tiers, Common through Ultimate
//! - `RarityTable`: base drop weights plus the pity curve
//! - `CardDefinition`: immutable card data (stats, ability, series)
//! - `CardCatalog`: definitions indexed by id, rarity and series
//! - `CardInstance`: mutable battle-scoped copy of a definition

pub mod catalog;
pub mod definition;
pub mod instance;
pub mod rarity;

pub use catalog::{CardCatalog, Series};
pub use definition::{Ability, BaseStats, CardDefinition, CardId, StatusEffectSpec};
pub use instance::CardInstance;
pub use rarity::{select_tier, PityCurve, Rarity, RarityTable, TierWeight};
