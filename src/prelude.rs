pub use crate::builder::{Cache, CacheBuilder, CacheConfig, CachePolicy};
pub use crate::ds::{FrequencyMap, IntrusiveList, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError, SnapshotError};
pub use crate::policy::lfu::{CacheNode, LfuCache, LfuInfo};
#[cfg(feature = "concurrency")]
pub use crate::policy::lfu::ConcurrentLfuCache;
pub use crate::policy::lru::{LruCache, LruInfo};
#[cfg(feature = "concurrency")]
pub use crate::policy::lru::ConcurrentLruCache;
pub use crate::snapshot::{LfuEntry, LfuSnapshot, LruSnapshot};
pub use crate::traits::{CoreCache, HitCounters, LfuCacheTrait, LruCacheTrait, ResizableCache};
