pub mod lfu;
pub mod lru;
