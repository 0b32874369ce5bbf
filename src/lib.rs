//! # card-arena
//!
//! Host-independent core for a card collection and battle game.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: every random choice goes through a `DrawSource`.
//!    The same draws always give the same rolls and the same battles.
//!
//! 2. **Stateless Rolls**: the roll engine never stores pity. It receives a
//!    `PityState` and returns the next one; callers own persistence.
//!
//! 3. **Transactional Battles**: actions run on an O(1) copy of the session
//!    (`im-rs`) and are committed only if they succeed.
//!
//! ## Modules
//!
//! - `core`: ids, sides, RNG, clock and component lifecycle
//! - `cards`: rarity tiers, card definitions, catalog and instances
//! - `config`: TOML loading and validated `GameData`
//! - `roll`: roll engine, pity state, pity store and per-account service
//! - `battle`: sessions, actions, damage, status effects and the resolver
//! - `events`: records handed to the presentation layer
//! - `error`: error types
//!
//! ```
//! use std::sync::Arc;
//! use card_arena::{GameData, GameRng, PityState, RollEngine, SystemClock, Clock};
//!
//! let data = Arc::new(GameData::builtin().unwrap());
//! let engine = RollEngine::new(data).unwrap();
//! let mut rng = GameRng::new(42);
//!
//! let (cards, pity) = engine
//!     .roll_many(&PityState::default(), 10, &mut rng, SystemClock.now())
//!     .unwrap();
//! assert_eq!(cards.len(), 10);
//! assert_eq!(pity.lifetime_rolls, 10);
//! ```

pub mod battle;
pub mod cards;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod roll;

// Re-export commonly used types
pub use crate::core::{
    AccountId, Clock, DrawSource, EntityId, FixedClock, GameRng, GameRngState, PlayerId,
    PlayerMap, ScriptedDraws, Service, ServiceHost, SystemClock,
};

pub use crate::cards::{
    Ability, BaseStats, CardCatalog, CardDefinition, CardId, CardInstance, PityCurve, Rarity,
    RarityTable, StatusEffectSpec, TierWeight,
};

pub use crate::config::{BattleSettings, GameData, GameDataConfig};

pub use crate::roll::{Gacha, InMemoryPityStore, PityState, PityStore, RollEngine, RollOutcome};

pub use crate::battle::{
    BattleAction, BattleOutcome, BattleRecord, BattleResolver, BattleSession, BattleStatus,
    CancelReason, SessionId, StatusKind, TurnPhase,
};

pub use crate::events::{
    BattleEvent, BattleEventKind, CollectingSink, Event, EventSink, NullSink, RollResult,
};

pub use crate::error::{BattleError, ConfigError, GachaError, InvalidAction, StoreError};
