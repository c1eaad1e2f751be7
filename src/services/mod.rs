// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use memory::MemoryStore;
pub use postgres::PostgresClient;
pub use store::{LikeStore, MatchStore, ProfileStore, Store, StoreError};
