// Pipeline storage: cache persistence for materialized tables

pub mod cache_fs;
pub mod in_memory;
pub mod traits;

pub use cache_fs::FsCacheStore;
pub use in_memory::InMemoryCacheStore;
pub use traits::{CacheId, CacheStore};
