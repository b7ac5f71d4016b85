//! Price aggregation across all active retailers
//!
//! One comparison call fans out to every active retailer under a concurrency
//! bound, tolerates any subset of sources failing, persists what resolved and
//! caches the aggregate. Reads are cache-aside with a TTL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use pricepulse_types::{
	comparison_key, CacheStore, ComparisonResult, HistoryStorage, PriceHistoryEntry, PriceQuote,
	Product, ProductStorage, QuoteStorage, Retailer, RetailerStorage, Storage, StorageError,
};

use crate::resolver::SourceResolver;

/// Tuning for the aggregation engine
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
	/// Whether the comparison cache participates in reads
	pub cache_enabled: bool,

	/// Comparison result TTL in seconds
	pub cache_ttl_secs: u64,

	/// Concurrent source calls per aggregation pass
	pub max_concurrent_fetches: usize,

	/// Upper bound on one whole aggregation pass in milliseconds
	pub global_timeout_ms: u64,
}

impl Default for AggregatorConfig {
	fn default() -> Self {
		Self {
			cache_enabled: true,
			cache_ttl_secs: 600,
			max_concurrent_fetches: 12,
			global_timeout_ms: 15_000,
		}
	}
}

/// Errors surfaced to aggregation callers
#[derive(Debug, Error)]
pub enum AggregatorServiceError {
	#[error("product not found: {0}")]
	ProductNotFound(String),

	#[error("retailer not found: {0}")]
	RetailerNotFound(String),

	#[error("no source produced a quote for product '{product_id}' at retailer '{retailer_id}'")]
	NoQuote {
		product_id: String,
		retailer_id: String,
	},

	#[error("storage error: {0}")]
	Storage(#[from] StorageError),
}

/// Counters describing aggregator activity since startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationStats {
	pub comparisons: u64,
	pub cache_hits: u64,
	pub cache_misses: u64,
	pub quotes_persisted: u64,
}

/// Aggregation operations exposed to callers
#[async_trait]
pub trait AggregatorTrait: Send + Sync {
	/// Compare prices for one product across all active retailers
	async fn get_comparison(
		&self,
		product_id: &str,
	) -> Result<ComparisonResult, AggregatorServiceError>;

	/// Refresh one (product, retailer) pair through the full source chain
	async fn refresh_pair(
		&self,
		product_id: &str,
		retailer_id: &str,
	) -> Result<PriceQuote, AggregatorServiceError>;

	/// Re-scrape one pair, skipping the API, optionally at an explicit URL
	async fn scrape_one(
		&self,
		product_id: &str,
		retailer_id: &str,
		url_override: Option<&str>,
	) -> Result<PriceQuote, AggregatorServiceError>;

	fn stats(&self) -> AggregationStats;
}

/// The aggregation engine
pub struct AggregatorService {
	storage: Arc<dyn Storage>,
	cache: Arc<dyn CacheStore>,
	resolver: Arc<SourceResolver>,
	config: AggregatorConfig,
	comparisons: AtomicU64,
	cache_hits: AtomicU64,
	cache_misses: AtomicU64,
	quotes_persisted: AtomicU64,
}

impl AggregatorService {
	pub fn new(
		storage: Arc<dyn Storage>,
		cache: Arc<dyn CacheStore>,
		resolver: Arc<SourceResolver>,
		config: AggregatorConfig,
	) -> Self {
		Self {
			storage,
			cache,
			resolver,
			config,
			comparisons: AtomicU64::new(0),
			cache_hits: AtomicU64::new(0),
			cache_misses: AtomicU64::new(0),
			quotes_persisted: AtomicU64::new(0),
		}
	}

	async fn cached_comparison(&self, product_id: &str) -> Option<ComparisonResult> {
		if !self.config.cache_enabled {
			return None;
		}
		let key = comparison_key(product_id);
		match self.cache.get(&key).await {
			Ok(Some(raw)) => match serde_json::from_str(&raw) {
				Ok(result) => Some(result),
				Err(e) => {
					warn!(%key, "discarding undecodable cache entry: {e}");
					let _ = self.cache.invalidate(&key).await;
					None
				},
			},
			Ok(None) => None,
			Err(e) => {
				warn!(%key, "cache read failed, treating as miss: {e}");
				None
			},
		}
	}

	async fn cache_comparison(&self, result: &ComparisonResult) {
		if !self.config.cache_enabled {
			return;
		}
		let key = comparison_key(&result.product_id);
		match serde_json::to_string(result) {
			Ok(raw) => {
				if let Err(e) = self.cache.set(&key, raw, self.config.cache_ttl_secs).await {
					warn!(%key, "cache write failed: {e}");
				}
			},
			Err(e) => warn!(%key, "failed to serialize comparison for cache: {e}"),
		}
	}

	async fn invalidate_comparison(&self, product_id: &str) {
		let key = comparison_key(product_id);
		if let Err(e) = self.cache.invalidate(&key).await {
			warn!(%key, "cache invalidation failed: {e}");
		}
	}

	/// Fan out to every retailer under the concurrency bound
	///
	/// Quotes land in a shared vector as they resolve, so a global timeout
	/// keeps whatever arrived in time.
	async fn fan_out(&self, product: &Product, retailers: Vec<Retailer>) -> Vec<PriceQuote> {
		let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches.max(1)));
		let collected: Arc<Mutex<Vec<PriceQuote>>> = Arc::new(Mutex::new(Vec::new()));

		let fetches = retailers.into_iter().map(|retailer| {
			let semaphore = Arc::clone(&semaphore);
			let collected = Arc::clone(&collected);
			let resolver = Arc::clone(&self.resolver);
			let product = product.clone();
			async move {
				// Closed only on semaphore drop, which outlives the call
				let Ok(_permit) = semaphore.acquire().await else {
					return;
				};
				if let Some(quote) = resolver.resolve(&product, &retailer).await {
					collected.lock().await.push(quote);
				}
			}
		});

		let deadline = Duration::from_millis(self.config.global_timeout_ms);
		if tokio::time::timeout(deadline, join_all(fetches)).await.is_err() {
			warn!(
				product_id = %product.product_id,
				timeout_ms = self.config.global_timeout_ms,
				"aggregation pass hit the global timeout, keeping partial results"
			);
		}

		let mut guard = collected.lock().await;
		std::mem::take(&mut *guard)
	}

	/// Write a resolved quote and its immutable history entry
	async fn persist_quote(&self, quote: &PriceQuote) -> Result<(), StorageError> {
		self.storage.upsert_quote(quote.clone()).await?;
		self.storage
			.append_entry(PriceHistoryEntry::from(quote))
			.await?;
		self.quotes_persisted.fetch_add(1, Ordering::Relaxed);
		Ok(())
	}

	async fn require_product(&self, product_id: &str) -> Result<Product, AggregatorServiceError> {
		self.storage
			.get_product(product_id)
			.await?
			.ok_or_else(|| AggregatorServiceError::ProductNotFound(product_id.to_string()))
	}

	async fn require_retailer(
		&self,
		retailer_id: &str,
	) -> Result<Retailer, AggregatorServiceError> {
		self.storage
			.get_retailer(retailer_id)
			.await?
			.ok_or_else(|| AggregatorServiceError::RetailerNotFound(retailer_id.to_string()))
	}

	async fn persist_and_invalidate(
		&self,
		quote: &PriceQuote,
	) -> Result<(), AggregatorServiceError> {
		self.persist_quote(quote).await?;
		self.invalidate_comparison(&quote.product_id).await;
		Ok(())
	}
}

#[async_trait]
impl AggregatorTrait for AggregatorService {
	async fn get_comparison(
		&self,
		product_id: &str,
	) -> Result<ComparisonResult, AggregatorServiceError> {
		self.comparisons.fetch_add(1, Ordering::Relaxed);

		// Cache first: a hit costs no storage round trip at all
		if let Some(cached) = self.cached_comparison(product_id).await {
			self.cache_hits.fetch_add(1, Ordering::Relaxed);
			debug!(%product_id, "serving comparison from cache");
			return Ok(cached);
		}
		self.cache_misses.fetch_add(1, Ordering::Relaxed);

		let product = self.require_product(product_id).await?;
		let retailers = self.storage.list_active_retailers().await?;
		let retailer_count = retailers.len();
		let quotes = self.fan_out(&product, retailers).await;

		for quote in &quotes {
			if let Err(e) = self.persist_quote(quote).await {
				warn!(
					product_id = %quote.product_id,
					retailer_id = %quote.retailer_id,
					"failed to persist quote: {e}"
				);
			}
		}

		let result = ComparisonResult::from_quotes(product_id, quotes);
		info!(
			%product_id,
			resolved = result.quotes.len(),
			queried = retailer_count,
			"aggregation pass finished"
		);

		if !result.is_empty() {
			self.cache_comparison(&result).await;
		}
		Ok(result)
	}

	async fn refresh_pair(
		&self,
		product_id: &str,
		retailer_id: &str,
	) -> Result<PriceQuote, AggregatorServiceError> {
		let product = self.require_product(product_id).await?;
		let retailer = self.require_retailer(retailer_id).await?;

		let quote = self
			.resolver
			.resolve(&product, &retailer)
			.await
			.ok_or_else(|| AggregatorServiceError::NoQuote {
				product_id: product_id.to_string(),
				retailer_id: retailer_id.to_string(),
			})?;

		self.persist_and_invalidate(&quote).await?;
		Ok(quote)
	}

	async fn scrape_one(
		&self,
		product_id: &str,
		retailer_id: &str,
		url_override: Option<&str>,
	) -> Result<PriceQuote, AggregatorServiceError> {
		let product = self.require_product(product_id).await?;
		let retailer = self.require_retailer(retailer_id).await?;

		let quote = self
			.resolver
			.resolve_scrape(&product, &retailer, url_override)
			.await
			.ok_or_else(|| AggregatorServiceError::NoQuote {
				product_id: product_id.to_string(),
				retailer_id: retailer_id.to_string(),
			})?;

		self.persist_and_invalidate(&quote).await?;
		Ok(quote)
	}

	fn stats(&self) -> AggregationStats {
		AggregationStats {
			comparisons: self.comparisons.load(Ordering::Relaxed),
			cache_hits: self.cache_hits.load(Ordering::Relaxed),
			cache_misses: self.cache_misses.load(Ordering::Relaxed),
			quotes_persisted: self.quotes_persisted.load(Ordering::Relaxed),
		}
	}
}
