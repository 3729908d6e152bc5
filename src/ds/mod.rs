pub mod frequency_map;
pub mod intrusive_list;
pub mod slot_arena;

pub use frequency_map::FrequencyMap;
pub use intrusive_list::IntrusiveList;
pub use slot_arena::{SlotArena, SlotId};
