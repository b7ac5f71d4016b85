//! PricePulse Storage
//!
//! In-memory implementations of the storage and cache traits, backed by
//! DashMap. The store is the development/test backend; production swaps in a
//! relational implementation behind the same traits.

pub mod memory_cache;
pub mod memory_store;

pub mod traits {
	//! Re-export of the storage and cache traits from the types crate
	pub use pricepulse_types::cache::{CacheError, CacheResult, CacheStore};
	pub use pricepulse_types::storage::{
		HistoryStorage, ProductStorage, QuoteStorage, RetailerStorage, Storage, StorageError,
		StorageResult, StorageStats,
	};
}

pub use memory_cache::MemoryCache;
pub use memory_store::MemoryStore;
pub use traits::{CacheStore, Storage};
