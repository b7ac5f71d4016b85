//! Storage traits for pluggable persistence implementations
//!
//! The aggregation core reads products, reads and updates retailers, upserts
//! quotes and appends history. History is append-only by construction: the
//! trait exposes no update or delete.

use async_trait::async_trait;
use thiserror::Error;

use crate::products::Product;
use crate::quotes::{PriceHistoryEntry, PriceQuote};
use crate::retailers::Retailer;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("item not found: {id}")]
	NotFound { id: String },

	#[error("connection error: {message}")]
	Connection { message: String },

	#[error("storage operation failed: {message}")]
	Operation { message: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Counters describing current storage contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
	pub total_products: usize,
	pub total_retailers: usize,
	pub active_retailers: usize,
	pub total_quotes: usize,
	pub total_history_entries: usize,
}

/// Product reads (plus seeding for the catalog collaborator)
#[async_trait]
pub trait ProductStorage: Send + Sync {
	/// Seed a product; the catalog owns creation in production
	async fn create_product(&self, product: Product) -> StorageResult<()>;

	async fn get_product(&self, product_id: &str) -> StorageResult<Option<Product>>;

	async fn list_products(&self) -> StorageResult<Vec<Product>>;
}

/// Retailer reads and health-counter updates
#[async_trait]
pub trait RetailerStorage: Send + Sync {
	async fn create_retailer(&self, retailer: Retailer) -> StorageResult<()>;

	async fn get_retailer(&self, retailer_id: &str) -> StorageResult<Option<Retailer>>;

	/// Overwrite a retailer record, used for status updates
	async fn update_retailer(&self, retailer: Retailer) -> StorageResult<()>;

	/// Fold a successful source call into the stored retailer's counters
	///
	/// Mutates the stored record in place so concurrent recorders never
	/// overwrite each other's counts.
	async fn record_retailer_success(
		&self,
		retailer_id: &str,
		latency_ms: u64,
	) -> StorageResult<()>;

	/// Fold a failed source call into the stored retailer's counters
	async fn record_retailer_failure(&self, retailer_id: &str) -> StorageResult<()>;

	async fn list_retailers(&self) -> StorageResult<Vec<Retailer>>;

	/// Retailers participating in aggregation
	async fn list_active_retailers(&self) -> StorageResult<Vec<Retailer>>;

	async fn retailer_count(&self) -> StorageResult<usize>;
}

/// Live quote snapshots, one per (product, retailer) pair
#[async_trait]
pub trait QuoteStorage: Send + Sync {
	/// Atomically write the live quote for its (product, retailer) pair,
	/// replacing any previous snapshot
	async fn upsert_quote(&self, quote: PriceQuote) -> StorageResult<()>;

	async fn get_quote(
		&self,
		product_id: &str,
		retailer_id: &str,
	) -> StorageResult<Option<PriceQuote>>;

	async fn get_quotes_by_product(&self, product_id: &str) -> StorageResult<Vec<PriceQuote>>;

	async fn quote_count(&self) -> StorageResult<usize>;
}

/// Append-only price history
#[async_trait]
pub trait HistoryStorage: Send + Sync {
	async fn append_entry(&self, entry: PriceHistoryEntry) -> StorageResult<()>;

	/// Entries for one pair, ordered by recording time
	async fn entries_for(
		&self,
		product_id: &str,
		retailer_id: &str,
	) -> StorageResult<Vec<PriceHistoryEntry>>;

	async fn history_count(&self) -> StorageResult<usize>;
}

/// Combined storage interface the services depend on
#[async_trait]
pub trait Storage:
	ProductStorage + RetailerStorage + QuoteStorage + HistoryStorage + Send + Sync
{
	/// Whether the backend is reachable
	async fn health_check(&self) -> StorageResult<bool>;

	async fn stats(&self) -> StorageResult<StorageStats>;
}
