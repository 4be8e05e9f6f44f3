pub mod bits;
pub mod ghost_list;
pub mod hash;
pub mod intrusive_list;
pub mod padding;
pub mod slot_arena;

pub use ghost_list::GhostList;
pub use hash::{CacheKey, ShardSelector};
pub use intrusive_list::IntrusiveList;
pub use padding::CachePadded;
pub use slot_arena::{SlotArena, SlotId};
