// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod profile_api;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager, CachedProfileStore};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use profile_api::ProfileApiClient;
pub use store::{DecisionStore, MatchStore, ProfileStore, StoreError};
