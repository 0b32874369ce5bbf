//! Core types: ids, sides, randomness, time and component lifecycle.
//!
//! Nothing in here knows about cards, rolls or battles; the domain modules
//! build on these.

pub mod clock;
pub mod entity;
pub mod lifecycle;
pub mod player;
pub mod rng;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::{EntityAllocator, EntityId};
pub use lifecycle::{Service, ServiceHost};
pub use player::{AccountId, PlayerId, PlayerMap};
pub use rng::{DrawSource, GameRng, GameRngState, ScriptedDraws};
