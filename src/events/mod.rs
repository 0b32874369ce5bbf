//! Records emitted to the presentation layer.
//!
//! Every roll transaction produces one [`RollResult`]; every battle
//! transaction produces zero or more [`BattleEvent`]s. Records are
//! immutable and timestamped. They are handed to an [`EventSink`] once,
//! after the transaction commits; the core never retries delivery.

mod sink;

pub use sink::{CollectingSink, EventSink, NullSink};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::{BattleOutcome, BattleStatus, CancelReason, SessionId, StatusKind, TurnPhase};
use crate::cards::{CardId, Rarity};
use crate::core::{AccountId, EntityId, PlayerId};
use crate::roll::{PityState, RollOutcome};

/// Any record the core emits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Roll(RollResult),
    Battle(BattleEvent),
}

/// Result of one roll transaction (a single roll or a batch).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RollResult {
    pub account: AccountId,
    pub outcomes: Vec<RollOutcome>,
    /// Pity state after the last roll of the transaction.
    pub pity: PityState,
    pub at: DateTime<Utc>,
}

impl RollResult {
    /// Cards awarded, in roll order.
    pub fn cards(&self) -> impl Iterator<Item = &CardId> {
        self.outcomes.iter().map(|o| &o.card)
    }

    /// Highest rarity awarded in the transaction.
    #[must_use]
    pub fn best_rarity(&self) -> Option<Rarity> {
        self.outcomes.iter().map(|o| o.rarity).max()
    }
}

/// One thing that happened in a battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub session: SessionId,
    /// Position in the session's event stream, starting at 0.
    pub sequence: u64,
    pub turn: u32,
    pub at: DateTime<Utc>,
    pub kind: BattleEventKind,
}

/// What happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BattleEventKind {
    StatusChanged {
        from: BattleStatus,
        to: BattleStatus,
    },
    TurnStarted {
        side: PlayerId,
    },
    PhaseEntered {
        side: PlayerId,
        phase: TurnPhase,
        /// Entered because the previous phase timed out.
        timed_out: bool,
    },
    Deployed {
        side: PlayerId,
        card: EntityId,
        replaced: EntityId,
    },
    Attacked {
        attacker: EntityId,
        target: EntityId,
        /// Ability used, `None` for a basic attack.
        ability: Option<String>,
        damage: u32,
        critical: bool,
    },
    StatusApplied {
        card: EntityId,
        kind: StatusKind,
        potency: u32,
        duration: u32,
    },
    StatusTicked {
        card: EntityId,
        kind: StatusKind,
        amount: u32,
        expired: bool,
    },
    Defeated {
        card: EntityId,
    },
    Promoted {
        side: PlayerId,
        card: EntityId,
    },
    Forfeited {
        side: PlayerId,
    },
    Finished {
        outcome: BattleOutcome,
    },
    Cancelled {
        reason: CancelReason,
    },
}
