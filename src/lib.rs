//! PricePulse Aggregator
//!
//! Price aggregation and asynchronous job orchestration engine. One builder
//! wires storage, cache, adapters and the four background queues into a
//! running engine:
//!
//! ```no_run
//! use pricepulse_aggregator::AggregatorBuilder;
//!
//! #[tokio::main]
//! async fn main() {
//!     let handle = AggregatorBuilder::new()
//!         .start()
//!         .await
//!         .expect("engine starts");
//!     let _ = handle.get_comparison("some-product").await;
//!     handle.shutdown().await;
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub mod mocks;

pub use pricepulse_adapters::{
	AdapterRegistry, HeadlessBrowserAdapter, HtmlScraperAdapter, ManagedCrawlerAdapter,
	RetailerApiAdapter,
};
pub use pricepulse_config::{load_config, LogFormat, Settings};
pub use pricepulse_service::{
	AggregationStats, AggregatorConfig, AggregatorService, AggregatorServiceError, AggregatorTrait,
	BackgroundJob, BackgroundJobHandler, BrokerOptions, JobBroker, JobError, JobRecord, JobResult,
	JobState, LogNotifier, NoopRecognition, NotificationSender, QueueName, QueueOptions,
	QueueStats, RecognitionPipeline, RetailerService, SourceResolver, UpdatePriority,
};
pub use pricepulse_storage::{MemoryCache, MemoryStore};
pub use pricepulse_types::{
	CacheStore, ComparisonResult, HistoryStorage, PriceQuote, Product, ProductStorage, QuoteStorage,
	Retailer, RetailerStatus, RetailerStorage, SourceAdapter, Storage, StorageError, StorageStats,
};

use pricepulse_config::QueueTuning;

/// Errors surfaced while assembling and starting the engine
#[derive(Debug, Error)]
pub enum StartupError {
	#[error("configuration validation failed: {}", .errors.join("; "))]
	Validation { errors: Vec<String> },

	#[error("storage error during startup: {0}")]
	Storage(#[from] StorageError),
}

fn queue_options(tuning: &QueueTuning) -> QueueOptions {
	QueueOptions {
		workers: tuning.workers,
		capacity: tuning.capacity,
		retention: Duration::from_secs(tuning.retention_secs),
		max_records: tuning.max_records,
	}
}

/// Builder wiring every component of the engine
pub struct AggregatorBuilder {
	settings: Settings,
	storage: Option<Arc<dyn Storage>>,
	cache: Option<Arc<dyn CacheStore>>,
	registry: Option<AdapterRegistry>,
	retailers: Vec<Retailer>,
	products: Vec<Product>,
	recognition: Option<Arc<dyn RecognitionPipeline>>,
	notifier: Option<Arc<dyn NotificationSender>>,
}

impl AggregatorBuilder {
	pub fn new() -> Self {
		Self {
			settings: Settings::default(),
			storage: None,
			cache: None,
			registry: None,
			retailers: Vec::new(),
			products: Vec::new(),
			recognition: None,
			notifier: None,
		}
	}

	/// Use loaded settings instead of the defaults
	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = settings;
		self
	}

	/// Swap in a storage backend; defaults to the in-memory store
	pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
		self.storage = Some(storage);
		self
	}

	/// Swap in a cache backend; defaults to the in-memory TTL cache
	pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
		self.cache = Some(cache);
		self
	}

	/// Register a custom adapter, creating the registry on first use
	///
	/// Once any adapter is registered this way, the default adapters are NOT
	/// added; register everything the retailers reference.
	pub fn with_adapter(mut self, adapter: Box<dyn SourceAdapter>) -> Self {
		self.registry
			.get_or_insert_with(AdapterRegistry::new)
			.register(adapter);
		self
	}

	/// Register the default instance of each source strategy
	pub fn with_default_adapters(mut self) -> Self {
		let registry = self.registry.get_or_insert_with(AdapterRegistry::new);
		registry.register(Box::new(RetailerApiAdapter::new()));
		registry.register(Box::new(ManagedCrawlerAdapter::with_default_config()));
		registry.register(Box::new(HeadlessBrowserAdapter::with_default_config()));
		registry.register(Box::new(HtmlScraperAdapter::new()));
		self
	}

	/// Seed a retailer in addition to the configured ones
	pub fn with_retailer(mut self, retailer: Retailer) -> Self {
		self.retailers.push(retailer);
		self
	}

	/// Seed a catalog product
	pub fn with_product(mut self, product: Product) -> Self {
		self.products.push(product);
		self
	}

	pub fn with_recognition(mut self, pipeline: Arc<dyn RecognitionPipeline>) -> Self {
		self.recognition = Some(pipeline);
		self
	}

	pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSender>) -> Self {
		self.notifier = Some(notifier);
		self
	}

	/// Validate, seed and start the whole engine
	pub async fn start(self) -> Result<AggregatorHandle, StartupError> {
		let settings = self.settings;
		let registry = Arc::new(self.registry.unwrap_or_else(AdapterRegistry::with_defaults));

		// Configured retailers first, programmatic ones after
		let mut retailers: Vec<Retailer> = settings
			.retailers
			.values()
			.cloned()
			.map(Retailer::from)
			.collect();
		retailers.extend(self.retailers);

		let mut errors = Vec::new();
		for retailer in &retailers {
			if let Err(e) = retailer.validate() {
				errors.push(e.to_string());
			}
			if retailer.adapter_ids.is_empty() {
				errors.push(format!(
					"retailer '{}' references no adapters",
					retailer.retailer_id
				));
			}
			for adapter_id in &retailer.adapter_ids {
				if registry.get(adapter_id).is_none() {
					errors.push(format!(
						"retailer '{}' references unregistered adapter '{}'",
						retailer.retailer_id, adapter_id
					));
				}
			}
		}
		if !errors.is_empty() {
			return Err(StartupError::Validation { errors });
		}

		let storage = self
			.storage
			.unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn Storage>);

		let mut background: Vec<JoinHandle<()>> = Vec::new();
		let cache: Arc<dyn CacheStore> = match self.cache {
			Some(cache) => cache,
			None => {
				let memory = MemoryCache::new();
				if settings.cache.enabled {
					background.push(memory.start_ttl_cleanup(Duration::from_secs(
						settings.cache.sweep_interval_secs.max(1),
					)));
				}
				Arc::new(memory)
			},
		};

		let retailer_count = retailers.len();
		for retailer in retailers {
			storage.create_retailer(retailer).await?;
		}
		for product in self.products {
			storage.create_product(product).await?;
		}

		let resolver = Arc::new(SourceResolver::new(
			Arc::clone(&registry),
			Arc::clone(&storage),
		));
		let aggregator = Arc::new(AggregatorService::new(
			Arc::clone(&storage),
			Arc::clone(&cache),
			resolver,
			AggregatorConfig {
				cache_enabled: settings.cache.enabled,
				cache_ttl_secs: settings.cache.ttl_secs,
				max_concurrent_fetches: settings.aggregation.max_concurrent_fetches,
				global_timeout_ms: settings.aggregation.global_timeout_ms,
			},
		));
		let retailer_service = Arc::new(RetailerService::new(
			Arc::clone(&registry),
			Arc::clone(&storage),
		));

		let handler = Arc::new(BackgroundJobHandler::new(
			Arc::clone(&aggregator) as Arc<dyn AggregatorTrait>,
			self.recognition.unwrap_or_else(|| Arc::new(NoopRecognition)),
			self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
		));
		let broker = Arc::new(JobBroker::start(
			BrokerOptions {
				price_updates: queue_options(&settings.queues.price_updates),
				image_recognition: queue_options(&settings.queues.image_recognition),
				scraping: queue_options(&settings.queues.scraping),
				notifications: queue_options(&settings.queues.notifications),
			},
			handler,
		));

		if let Some(secs) = settings.queues.refresh_interval_secs {
			background.push(pricepulse_service::scheduler::start_price_refresh(
				Arc::clone(&storage),
				Arc::clone(&broker),
				Duration::from_secs(secs.max(1)),
			));
		}
		if let Some(secs) = settings.queues.health_interval_secs {
			background.push(pricepulse_service::scheduler::start_health_sweep(
				Arc::clone(&retailer_service),
				Duration::from_secs(secs.max(1)),
			));
		}

		pricepulse_config::log_startup_complete(&settings, retailer_count, registry.len());

		Ok(AggregatorHandle {
			aggregator,
			retailer_service,
			broker,
			storage,
			background,
		})
	}
}

impl Default for AggregatorBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Running engine with every component wired
pub struct AggregatorHandle {
	aggregator: Arc<AggregatorService>,
	retailer_service: Arc<RetailerService>,
	broker: Arc<JobBroker>,
	storage: Arc<dyn Storage>,
	background: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for AggregatorHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AggregatorHandle")
			.field("background_tasks", &self.background.len())
			.finish_non_exhaustive()
	}
}

impl AggregatorHandle {
	/// Compare prices for one product across all active retailers
	pub async fn get_comparison(
		&self,
		product_id: &str,
	) -> Result<ComparisonResult, AggregatorServiceError> {
		self.aggregator.get_comparison(product_id).await
	}

	/// Refresh one (product, retailer) pair through the full source chain
	pub async fn refresh_pair(
		&self,
		product_id: &str,
		retailer_id: &str,
	) -> Result<PriceQuote, AggregatorServiceError> {
		self.aggregator.refresh_pair(product_id, retailer_id).await
	}

	/// Re-scrape one pair, skipping the API
	pub async fn scrape_one(
		&self,
		product_id: &str,
		retailer_id: &str,
		url_override: Option<&str>,
	) -> Result<PriceQuote, AggregatorServiceError> {
		self.aggregator
			.scrape_one(product_id, retailer_id, url_override)
			.await
	}

	pub fn aggregation_stats(&self) -> AggregationStats {
		self.aggregator.stats()
	}

	/// Enqueue a price update job
	pub async fn enqueue_price_update(
		&self,
		product_id: &str,
		retailer_id: &str,
		priority: UpdatePriority,
	) -> JobResult<String> {
		self.broker
			.enqueue_price_update(product_id, retailer_id, priority)
			.await
	}

	/// Enqueue an image recognition job
	pub async fn enqueue_image_recognition(&self, scan_id: &str) -> JobResult<String> {
		self.broker.enqueue_image_recognition(scan_id).await
	}

	/// Enqueue a scraping job
	pub async fn enqueue_scraping(
		&self,
		retailer_id: &str,
		product_id: &str,
		product_url: Option<String>,
	) -> JobResult<String> {
		self.broker
			.enqueue_scraping(retailer_id, product_id, product_url)
			.await
	}

	/// Enqueue a notification job
	pub async fn enqueue_notification(
		&self,
		user_id: &str,
		title: &str,
		body: &str,
	) -> JobResult<String> {
		self.broker.enqueue_notification(user_id, title, body).await
	}

	/// Look up the record of one enqueued job
	pub async fn job(&self, job_id: &str) -> Option<JobRecord> {
		self.broker.job(job_id).await
	}

	/// Stats for the four queues
	pub async fn queue_stats(&self) -> Vec<QueueStats> {
		self.broker.stats().await
	}

	/// Run one retailer health sweep immediately
	pub async fn run_health_sweep(&self) -> Result<(), StorageError> {
		self.retailer_service.run_health_sweep().await
	}

	pub async fn storage_stats(&self) -> Result<StorageStats, StorageError> {
		self.storage.stats().await
	}

	/// Direct storage access, mainly for inspection in tests and tools
	pub fn storage(&self) -> Arc<dyn Storage> {
		Arc::clone(&self.storage)
	}

	/// Drain the queues and stop every background task
	pub async fn shutdown(self) {
		info!("shutting down aggregation engine");
		self.broker.shutdown().await;
		for task in self.background {
			task.abort();
		}
		if let Err(e) = self.storage.health_check().await {
			warn!("storage unhealthy at shutdown: {e}");
		}
		info!("aggregation engine stopped");
	}
}
