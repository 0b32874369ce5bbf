//! Entity identification for battle-scoped card instances.
//!
//! Every card instance placed into a battle gets an `EntityId` that is
//! unique within its session. Ids are allocated sequentially in lineup
//! order (side 0 first), so the same lineups always produce the same ids.
//!
//! ```
//! use card_arena::core::{EntityAllocator, EntityId};
//!
//! let mut ids = EntityAllocator::default();
//! assert_eq!(ids.alloc(), EntityId(0));
//! assert_eq!(ids.alloc(), EntityId(1));
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a card instance within one battle session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Sequential `EntityId` allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAllocator {
    next: u32,
}

impl EntityAllocator {
    /// Allocate the next id.
    pub fn alloc(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub fn allocated(&self) -> u32 {
        self.next
    }
}
