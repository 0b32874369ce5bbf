//! Turn-based battles between two sides of card instances.
//!
//! ## Key Types
//!
//! - `BattleResolver`: owns sessions, validates and applies actions
//! - `BattleSession`: one battle's state, cheap to snapshot
//! - `BattleAction`: what a side may ask to do
//! - `StatusEffect`: timed effects that tick each turn

pub mod action;
pub mod damage;
pub mod resolver;
pub mod session;
pub mod status;

pub use action::{legal_actions, validate, BattleAction};
pub use damage::{resolve_damage, DamageRoll};
pub use resolver::BattleResolver;
pub use session::{
    BattleOutcome, BattleRecord, BattleSession, BattleStatus, CancelReason, PhaseTimer, SessionId,
    SideState, TurnPhase,
};
pub use status::{clear_spent, tick_statuses, StatusEffect, StatusKind, StatusTick};
