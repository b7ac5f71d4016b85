//! In-memory storage implementation using DashMap

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

use pricepulse_types::storage::{
	HistoryStorage, ProductStorage, QuoteStorage, RetailerStorage, Storage, StorageError,
	StorageResult, StorageStats,
};
use pricepulse_types::{PriceHistoryEntry, PriceQuote, Product, Retailer};

/// Composite key for the one-live-quote-per-pair invariant
fn pair_key(product_id: &str, retailer_id: &str) -> String {
	format!("{}:{}", product_id, retailer_id)
}

/// In-memory store for products, retailers, quotes and history
///
/// Quote upsert is a single `insert` on the (product, retailer) composite
/// key, so concurrent writers for the same pair settle last-writer-wins
/// without a find-then-write window.
#[derive(Clone, Default)]
pub struct MemoryStore {
	products: Arc<DashMap<String, Product>>,
	retailers: Arc<DashMap<String, Retailer>>,
	quotes: Arc<DashMap<String, PriceQuote>>,
	history: Arc<DashMap<String, Vec<PriceHistoryEntry>>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl ProductStorage for MemoryStore {
	async fn create_product(&self, product: Product) -> StorageResult<()> {
		self.products.insert(product.product_id.clone(), product);
		Ok(())
	}

	async fn get_product(&self, product_id: &str) -> StorageResult<Option<Product>> {
		Ok(self.products.get(product_id).map(|p| p.clone()))
	}

	async fn list_products(&self) -> StorageResult<Vec<Product>> {
		Ok(self.products.iter().map(|entry| entry.value().clone()).collect())
	}
}

#[async_trait]
impl RetailerStorage for MemoryStore {
	async fn create_retailer(&self, retailer: Retailer) -> StorageResult<()> {
		self.retailers.insert(retailer.retailer_id.clone(), retailer);
		Ok(())
	}

	async fn get_retailer(&self, retailer_id: &str) -> StorageResult<Option<Retailer>> {
		Ok(self.retailers.get(retailer_id).map(|r| r.clone()))
	}

	async fn update_retailer(&self, retailer: Retailer) -> StorageResult<()> {
		self.retailers.insert(retailer.retailer_id.clone(), retailer);
		Ok(())
	}

	async fn record_retailer_success(
		&self,
		retailer_id: &str,
		latency_ms: u64,
	) -> StorageResult<()> {
		match self.retailers.get_mut(retailer_id) {
			Some(mut entry) => {
				entry.metrics.record_success(latency_ms);
				entry.last_seen = Some(Utc::now());
				Ok(())
			},
			None => Err(StorageError::NotFound {
				id: retailer_id.to_string(),
			}),
		}
	}

	async fn record_retailer_failure(&self, retailer_id: &str) -> StorageResult<()> {
		match self.retailers.get_mut(retailer_id) {
			Some(mut entry) => {
				entry.metrics.record_failure();
				Ok(())
			},
			None => Err(StorageError::NotFound {
				id: retailer_id.to_string(),
			}),
		}
	}

	async fn list_retailers(&self) -> StorageResult<Vec<Retailer>> {
		Ok(self.retailers.iter().map(|entry| entry.value().clone()).collect())
	}

	async fn list_active_retailers(&self) -> StorageResult<Vec<Retailer>> {
		Ok(self
			.retailers
			.iter()
			.filter(|entry| entry.value().is_active())
			.map(|entry| entry.value().clone())
			.collect())
	}

	async fn retailer_count(&self) -> StorageResult<usize> {
		Ok(self.retailers.len())
	}
}

#[async_trait]
impl QuoteStorage for MemoryStore {
	async fn upsert_quote(&self, quote: PriceQuote) -> StorageResult<()> {
		let key = pair_key(&quote.product_id, &quote.retailer_id);
		self.quotes.insert(key, quote);
		Ok(())
	}

	async fn get_quote(
		&self,
		product_id: &str,
		retailer_id: &str,
	) -> StorageResult<Option<PriceQuote>> {
		Ok(self
			.quotes
			.get(&pair_key(product_id, retailer_id))
			.map(|q| q.clone()))
	}

	async fn get_quotes_by_product(&self, product_id: &str) -> StorageResult<Vec<PriceQuote>> {
		Ok(self
			.quotes
			.iter()
			.filter(|entry| entry.value().product_id == product_id)
			.map(|entry| entry.value().clone())
			.collect())
	}

	async fn quote_count(&self) -> StorageResult<usize> {
		Ok(self.quotes.len())
	}
}

#[async_trait]
impl HistoryStorage for MemoryStore {
	async fn append_entry(&self, entry: PriceHistoryEntry) -> StorageResult<()> {
		let key = pair_key(&entry.product_id, &entry.retailer_id);
		self.history.entry(key).or_default().push(entry);
		Ok(())
	}

	async fn entries_for(
		&self,
		product_id: &str,
		retailer_id: &str,
	) -> StorageResult<Vec<PriceHistoryEntry>> {
		Ok(self
			.history
			.get(&pair_key(product_id, retailer_id))
			.map(|entries| entries.clone())
			.unwrap_or_default())
	}

	async fn history_count(&self) -> StorageResult<usize> {
		Ok(self.history.iter().map(|entry| entry.value().len()).sum())
	}
}

#[async_trait]
impl Storage for MemoryStore {
	async fn health_check(&self) -> StorageResult<bool> {
		Ok(true)
	}

	async fn stats(&self) -> StorageResult<StorageStats> {
		let active_retailers = self
			.retailers
			.iter()
			.filter(|entry| entry.value().is_active())
			.count();

		Ok(StorageStats {
			total_products: self.products.len(),
			total_retailers: self.retailers.len(),
			active_retailers,
			total_quotes: self.quotes.len(),
			total_history_entries: self.history_count().await?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pricepulse_types::QuoteSource;

	fn quote(price: f64) -> PriceQuote {
		PriceQuote::new("p1", "amazon", price, "USD", QuoteSource::Api)
	}

	#[tokio::test]
	async fn upsert_keeps_one_live_quote_per_pair() {
		let store = MemoryStore::new();
		store.upsert_quote(quote(79.99)).await.unwrap();
		store.upsert_quote(quote(74.99)).await.unwrap();

		assert_eq!(store.quote_count().await.unwrap(), 1);
		let live = store.get_quote("p1", "amazon").await.unwrap().unwrap();
		assert_eq!(live.price, 74.99);
	}

	#[tokio::test]
	async fn history_only_grows() {
		let store = MemoryStore::new();
		for price in [79.99, 74.99, 82.00] {
			let q = quote(price);
			store.append_entry(PriceHistoryEntry::from(&q)).await.unwrap();
		}

		let entries = store.entries_for("p1", "amazon").await.unwrap();
		assert_eq!(entries.len(), 3);
		assert_eq!(entries[0].price, 79.99);
		assert_eq!(entries[2].price, 82.00);
	}

	#[tokio::test]
	async fn outcome_recording_mutates_the_stored_retailer() {
		let store = MemoryStore::new();
		store
			.create_retailer(Retailer::new("amazon", "Amazon"))
			.await
			.unwrap();

		store.record_retailer_failure("amazon").await.unwrap();
		store.record_retailer_success("amazon", 120).await.unwrap();

		let stored = store.get_retailer("amazon").await.unwrap().unwrap();
		assert_eq!(stored.metrics.error_count, 1);
		assert_eq!(stored.metrics.success_count, 1);
		assert_eq!(stored.metrics.consecutive_failures, 0);
		assert!(stored.last_seen.is_some());

		let err = store.record_retailer_failure("missing").await.unwrap_err();
		assert!(matches!(err, StorageError::NotFound { .. }));
	}

	#[tokio::test]
	async fn active_retailer_listing_filters_status() {
		use pricepulse_types::RetailerStatus;

		let store = MemoryStore::new();
		let mut active = Retailer::new("amazon", "Amazon");
		active.has_api = true;
		let mut disabled = Retailer::new("walmart", "Walmart");
		disabled.status = RetailerStatus::Maintenance;

		store.create_retailer(active).await.unwrap();
		store.create_retailer(disabled).await.unwrap();

		let listed = store.list_active_retailers().await.unwrap();
		assert_eq!(listed.len(), 1);
		assert_eq!(listed[0].retailer_id, "amazon");
	}
}
