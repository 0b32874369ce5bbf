//! Battle session state.
//!
//! A `BattleSession` is owned by exactly one `BattleResolver`. Card
//! instances and the event log use `im` persistent structures, so cloning a
//! session for a read-only snapshot or a transactional working copy is
//! O(1).
//!
//! ## Lifecycle
//!
//! ```text
//! Waiting → Starting → InProgress ⇄ Paused
//!                          │
//!                          └→ Finished | Cancelled
//! ```
//!
//! Cancellation is accepted from any non-terminal state.

use chrono::{DateTime, Utc};
use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};

use crate::cards::CardInstance;
use crate::core::{EntityAllocator, EntityId, PlayerId, PlayerMap};
use crate::events::{BattleEvent, BattleEventKind};

/// Session identifier, unique per resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

/// Session lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleStatus {
    Waiting,
    Starting,
    InProgress,
    Paused,
    Finished,
    Cancelled,
}

impl BattleStatus {
    /// No further turns happen from this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, BattleStatus::Finished | BattleStatus::Cancelled)
    }
}

/// Phase within one side's turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    Draw,
    Main,
    Attack,
    End,
}

impl TurnPhase {
    /// Following phase within the same turn. `End` has none.
    #[must_use]
    pub const fn next(self) -> Option<TurnPhase> {
        match self {
            TurnPhase::Draw => Some(TurnPhase::Main),
            TurnPhase::Main => Some(TurnPhase::Attack),
            TurnPhase::Attack => Some(TurnPhase::End),
            TurnPhase::End => None,
        }
    }
}

/// Why a session was cancelled.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancelReason {
    /// A player left.
    Disconnected(PlayerId),
    /// The resolver is shutting down.
    Shutdown,
    /// Internal state was inconsistent.
    Corrupted(String),
    /// Cancelled by an operator or matchmaking.
    Requested,
}

/// How a session ended.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// Single winner.
    Winner(PlayerId),
    /// Draw (no winner).
    Draw,
    /// Abandoned before a result.
    Cancelled(CancelReason),
}

impl BattleOutcome {
    /// The winning side, if any.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            BattleOutcome::Winner(p) => Some(*p),
            BattleOutcome::Draw | BattleOutcome::Cancelled(_) => None,
        }
    }
}

/// One side's lineup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideState {
    /// Cards on the field.
    pub active: Vec<EntityId>,
    /// Cards waiting to be deployed, in lineup order.
    pub bench: Vec<EntityId>,
    /// Defeated cards, in order of defeat.
    pub fallen: Vec<EntityId>,
    /// An attack has been made this turn.
    pub attacked: bool,
}

impl SideState {
    /// Every card of this side, active first.
    pub fn all(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.active
            .iter()
            .chain(self.bench.iter())
            .chain(self.fallen.iter())
            .copied()
    }
}

/// Deadline for the current phase.
///
/// Owned by the session and dropped on pause and on every terminal
/// transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimer {
    pub side: PlayerId,
    pub phase: TurnPhase,
    pub deadline: DateTime<Utc>,
}

impl PhaseTimer {
    /// Has the deadline passed?
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }
}

/// A running or pending battle.
#[derive(Clone, Debug)]
pub struct BattleSession {
    pub id: SessionId,
    pub status: BattleStatus,
    pub phase: TurnPhase,
    /// Starts at 1 and increases each time the active side changes.
    pub turn: u32,
    pub active_side: PlayerId,
    pub sides: PlayerMap<SideState>,
    pub outcome: Option<BattleOutcome>,
    pub(crate) timer: Option<PhaseTimer>,
    cards: OrdMap<EntityId, CardInstance>,
    log: Vector<BattleEvent>,
    ids: EntityAllocator,
}

impl BattleSession {
    /// Create a session in `Waiting` with no cards.
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            status: BattleStatus::Waiting,
            phase: TurnPhase::Draw,
            turn: 1,
            active_side: PlayerId::new(0),
            sides: PlayerMap::new(|_| SideState::default()),
            outcome: None,
            timer: None,
            cards: OrdMap::new(),
            log: Vector::new(),
            ids: EntityAllocator::default(),
        }
    }

    /// Add a card to a side. The first `active_slots` cards of a side go on
    /// the field, the rest to the bench.
    pub fn add_card(
        &mut self,
        side: PlayerId,
        active_slots: usize,
        build: impl FnOnce(EntityId) -> CardInstance,
    ) -> EntityId {
        let id = self.ids.alloc();
        let card = build(id);
        let lineup = &mut self.sides[side];
        if lineup.active.len() < active_slots {
            lineup.active.push(id);
        } else {
            lineup.bench.push(id);
        }
        self.cards.insert(id, card);
        id
    }

    /// Look up a card instance.
    #[must_use]
    pub fn card(&self, id: EntityId) -> Option<&CardInstance> {
        self.cards.get(&id)
    }

    /// Look up a card instance mutably.
    pub fn card_mut(&mut self, id: EntityId) -> Option<&mut CardInstance> {
        self.cards.get_mut(&id)
    }

    /// Every card instance in entity order.
    pub fn cards(&self) -> impl Iterator<Item = &CardInstance> {
        self.cards.values()
    }

    #[cfg(test)]
    pub(crate) fn remove_card(&mut self, id: EntityId) -> Option<CardInstance> {
        self.cards.remove(&id)
    }

    /// Which side fields this card, by lineup membership.
    #[must_use]
    pub fn side_of(&self, id: EntityId) -> Option<PlayerId> {
        PlayerId::both().find(|&p| self.sides[p].all().any(|e| e == id))
    }

    /// Is this card in one of the side's active slots?
    #[must_use]
    pub fn is_active(&self, side: PlayerId, id: EntityId) -> bool {
        self.sides[side].active.contains(&id)
    }

    /// Number of the side's cards with health left.
    #[must_use]
    pub fn living(&self, side: PlayerId) -> usize {
        self.sides[side]
            .all()
            .filter(|id| self.card(*id).is_some_and(|c| !c.is_defeated()))
            .count()
    }

    /// Recorded events, oldest first.
    #[must_use]
    pub fn log(&self) -> &Vector<BattleEvent> {
        &self.log
    }

    /// Current phase deadline, if armed.
    #[must_use]
    pub fn timer(&self) -> Option<&PhaseTimer> {
        self.timer.as_ref()
    }

    /// Append an event to the log and return it.
    pub(crate) fn record(&mut self, at: DateTime<Utc>, kind: BattleEventKind) -> BattleEvent {
        let event = BattleEvent {
            session: self.id,
            sequence: self.log.len() as u64,
            turn: self.turn,
            at,
            kind,
        };
        self.log.push_back(event.clone());
        event
    }
}

/// Archived summary of a session that reached Finished or Cancelled.
#[derive(Clone, Debug)]
pub struct BattleRecord {
    pub session: SessionId,
    pub outcome: BattleOutcome,
    pub turns: u32,
    pub ended_at: DateTime<Utc>,
    pub log: Vector<BattleEvent>,
}
