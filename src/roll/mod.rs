//! Card rolls with pity.
//!
//! ## Key Types
//!
//! - `RollEngine`: stateless weighted sampling over the catalog
//! - `PityState`: per-account counter threaded through every roll
//! - `PityStore`: where pity lives between transactions
//! - `Gacha`: per-account transactions tying the above together

pub mod engine;
pub mod pity;
pub mod service;
pub mod store;

pub use engine::{RollEngine, RollOutcome};
pub use pity::PityState;
pub use service::Gacha;
pub use store::{InMemoryPityStore, PityStore};
