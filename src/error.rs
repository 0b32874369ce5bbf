//! Error types.
//!
//! - `ConfigError`: bad catalog, weights or settings. Fatal at load time.
//! - `BattleError`: per-request battle failures. `InvalidAction` leaves the
//!   session untouched; `SessionCorrupted` cancels that one session.
//! - `StoreError`: pity persistence failures.
//! - `GachaError`: everything a roll transaction can fail with.

use thiserror::Error;

use crate::battle::{BattleStatus, SessionId, TurnPhase};
use crate::cards::{CardId, Rarity};
use crate::core::{AccountId, EntityId, PlayerId};

/// Configuration loading and validation error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration validation error: {0}")]
    Validation(String),
    #[error("Card {0} is defined more than once")]
    DuplicateCard(CardId),
    #[error("No weight configured for rarity {0}")]
    MissingWeight(Rarity),
    #[error("Rarity {0} has cards but can never be rolled")]
    UnreachableTier(Rarity),
    #[error("Card catalog is empty")]
    EmptyCatalog,
}

/// Reason an action was rejected. The session is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidAction {
    #[error("battle is {0:?}, not in progress")]
    NotInProgress(BattleStatus),
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),
    #[error("action not allowed during {0:?} phase")]
    WrongPhase(TurnPhase),
    #[error("{0} is not in this battle")]
    UnknownCard(EntityId),
    #[error("{0} does not belong to the acting side")]
    NotYourCard(EntityId),
    #[error("{0} is not on the field")]
    NotActive(EntityId),
    #[error("{0} is already on the field")]
    AlreadyActive(EntityId),
    #[error("{0} has been defeated")]
    Defeated(EntityId),
    #[error("{0} is stunned")]
    Stunned(EntityId),
    #[error("{0} cannot target its own side")]
    FriendlyTarget(EntityId),
    #[error("ability of {card} is on cooldown for {turns} more turn(s)")]
    OnCooldown { card: EntityId, turns: u32 },
    #[error("side has already attacked this turn")]
    AlreadyAttacked,
    #[error("cannot {action} while battle is {status:?}")]
    IllegalTransition {
        action: &'static str,
        status: BattleStatus,
    },
}

/// Battle request error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BattleError {
    #[error("invalid action: {0}")]
    InvalidAction(#[from] InvalidAction),
    #[error("session {session} corrupted and cancelled: {detail}")]
    SessionCorrupted { session: SessionId, detail: String },
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
    #[error("card {0} is not in the catalog")]
    UnknownCard(CardId),
    #[error("{0} has an empty lineup")]
    EmptyLineup(PlayerId),
    #[error("card {0} has no health and cannot be fielded")]
    NoHealth(CardId),
}

/// Pity persistence error.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to encode pity state for {account}: {source}")]
    Encode {
        account: AccountId,
        #[source]
        source: bincode::Error,
    },
    #[error("failed to decode pity state for {account}: {source}")]
    Decode {
        account: AccountId,
        #[source]
        source: bincode::Error,
    },
    #[error("pity store lock poisoned")]
    Poisoned,
}

/// Roll transaction error.
#[derive(Error, Debug)]
pub enum GachaError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("batch of {requested} rolls exceeds the limit of {limit}")]
    BatchTooLarge { requested: usize, limit: usize },
}
