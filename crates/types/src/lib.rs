//! PricePulse Types
//!
//! Domain models, adapter/storage/cache traits and the error taxonomy shared
//! by every crate in the workspace.

pub mod adapters;
pub mod cache;
pub mod products;
pub mod quotes;
pub mod retailers;
pub mod storage;

// Re-export external dependencies used in public signatures
pub use chrono;
pub use serde_json;

pub use adapters::{
	AdapterDescriptor, AdapterError, AdapterResult, PriceResult, RetailerContext, SelectorConfig,
	SourceAdapter, SourceKind,
};
pub use cache::{comparison_key, CacheError, CacheResult, CacheStore};
pub use products::Product;
pub use quotes::{
	ComparisonResult, DataQuality, PriceHistoryEntry, PriceQuote, QuoteSource, StockStatus,
};
pub use retailers::{Retailer, RetailerError, RetailerMetrics, RetailerStatus};
pub use storage::{
	HistoryStorage, ProductStorage, QuoteStorage, RetailerStorage, Storage, StorageError,
	StorageResult, StorageStats,
};
