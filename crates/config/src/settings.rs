//! Configuration settings structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use pricepulse_types::{Retailer, RetailerStatus, SelectorConfig};

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
	#[serde(default)]
	pub cache: CacheSettings,

	#[serde(default)]
	pub aggregation: AggregationSettings,

	#[serde(default)]
	pub queues: QueuesSettings,

	#[serde(default)]
	pub retailers: HashMap<String, RetailerConfig>,

	#[serde(default)]
	pub logging: LoggingSettings,
}

/// Cache layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
	/// Whether the comparison cache participates in reads
	#[serde(default = "default_true")]
	pub enabled: bool,

	/// Comparison result TTL in seconds
	#[serde(default = "default_cache_ttl")]
	pub ttl_secs: u64,

	/// Interval of the expired-entry sweep
	#[serde(default = "default_sweep_interval")]
	pub sweep_interval_secs: u64,
}

impl Default for CacheSettings {
	fn default() -> Self {
		Self {
			enabled: true,
			ttl_secs: default_cache_ttl(),
			sweep_interval_secs: default_sweep_interval(),
		}
	}
}

/// Fan-out configuration for the aggregation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationSettings {
	/// Concurrent adapter calls per aggregation (8-16 recommended)
	#[serde(default = "default_max_concurrent")]
	pub max_concurrent_fetches: usize,

	/// Upper bound on one whole aggregation pass in milliseconds
	#[serde(default = "default_global_timeout")]
	pub global_timeout_ms: u64,
}

impl Default for AggregationSettings {
	fn default() -> Self {
		Self {
			max_concurrent_fetches: default_max_concurrent(),
			global_timeout_ms: default_global_timeout(),
		}
	}
}

/// Worker/capacity tuning for one queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueTuning {
	#[serde(default = "default_workers")]
	pub workers: usize,

	#[serde(default = "default_capacity")]
	pub capacity: usize,

	/// How long completed/exhausted job records are kept, in seconds
	#[serde(default = "default_retention")]
	pub retention_secs: u64,

	/// Tracked job records before oldest-first eviction kicks in
	#[serde(default = "default_max_records")]
	pub max_records: usize,
}

impl Default for QueueTuning {
	fn default() -> Self {
		Self {
			workers: default_workers(),
			capacity: default_capacity(),
			retention_secs: default_retention(),
			max_records: default_max_records(),
		}
	}
}

/// Per-queue tuning plus the recurring background schedules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueuesSettings {
	#[serde(default)]
	pub price_updates: QueueTuning,

	#[serde(default)]
	pub image_recognition: QueueTuning,

	#[serde(default)]
	pub scraping: QueueTuning,

	#[serde(default)]
	pub notifications: QueueTuning,

	/// Interval of the scheduled full-catalog price refresh; absent disables
	pub refresh_interval_secs: Option<u64>,

	/// Interval of the retailer health sweep; absent disables
	pub health_interval_secs: Option<u64>,
}

/// Individual retailer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailerConfig {
	pub retailer_id: String,

	pub name: String,

	#[serde(default = "default_currency")]
	pub currency: String,

	#[serde(default)]
	pub has_api: bool,

	#[serde(default)]
	pub has_scraper: bool,

	/// Registered adapter ids, any capability
	#[serde(default)]
	pub adapter_ids: Vec<String>,

	pub endpoint: Option<String>,

	pub product_url_template: Option<String>,

	pub selectors: Option<SelectorSettings>,

	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,

	pub headers: Option<HashMap<String, String>>,

	#[serde(default = "default_trust")]
	pub trust_score: f64,

	#[serde(default = "default_true")]
	pub enabled: bool,
}

/// Minimal selector shape for config, converted into the domain type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorSettings {
	pub price: String,
	pub availability: Option<String>,
	pub original_price: Option<String>,
}

impl From<SelectorSettings> for SelectorConfig {
	fn from(settings: SelectorSettings) -> Self {
		Self {
			price: settings.price,
			availability: settings.availability,
			original_price: settings.original_price,
		}
	}
}

impl From<RetailerConfig> for Retailer {
	fn from(config: RetailerConfig) -> Self {
		let mut retailer = Retailer::new(config.retailer_id, config.name);
		retailer.currency = config.currency;
		retailer.has_api = config.has_api;
		retailer.has_scraper = config.has_scraper;
		retailer.adapter_ids = config.adapter_ids;
		retailer.endpoint = config.endpoint;
		retailer.product_url_template = config.product_url_template;
		retailer.selectors = config.selectors.map(SelectorConfig::from);
		retailer.timeout_ms = config.timeout_ms;
		retailer.headers = config.headers;
		retailer.trust_score = config.trust_score;
		retailer.status = if config.enabled {
			RetailerStatus::Active
		} else {
			RetailerStatus::Inactive
		};
		retailer
	}
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
	#[serde(default = "default_log_level")]
	pub level: String,

	#[serde(default)]
	pub format: LogFormat,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: default_log_level(),
			format: LogFormat::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
}

fn default_true() -> bool {
	true
}

fn default_cache_ttl() -> u64 {
	600
}

fn default_sweep_interval() -> u64 {
	60
}

fn default_max_concurrent() -> usize {
	12
}

fn default_global_timeout() -> u64 {
	15_000
}

fn default_workers() -> usize {
	2
}

fn default_capacity() -> usize {
	1_000
}

fn default_retention() -> u64 {
	3_600
}

fn default_max_records() -> usize {
	10_000
}

fn default_currency() -> String {
	"USD".to_string()
}

fn default_timeout_ms() -> u64 {
	5_000
}

fn default_trust() -> f64 {
	0.5
}

fn default_log_level() -> String {
	"info".to_string()
}
