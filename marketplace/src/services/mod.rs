// marketplace/src/services/mod.rs

pub mod cache;
pub mod order_reader;

pub use cache::{CacheError, CacheStore, MemoryCache};
pub use order_reader::{order_cache_key, OrderReader};
