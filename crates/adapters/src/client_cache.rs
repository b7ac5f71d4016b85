//! HTTP client cache for optimized connection management
//!
//! Provides per-retailer client instances with connection pooling and
//! keep-alive, rotated on a TTL so stale pools don't linger.

use dashmap::DashMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use pricepulse_types::{AdapterResult, RetailerContext};

/// Configuration for creating one pooled HTTP client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientConfig {
	/// Retailer identifier for cache differentiation
	pub retailer_id: String,
	/// Per-request timeout in milliseconds
	pub timeout_ms: u64,
	/// Maximum idle connections kept per host
	pub max_idle_per_host: usize,
	/// Keep-alive timeout in milliseconds
	pub keep_alive_timeout_ms: u64,
	/// Default headers, custom retailer headers included
	pub headers: Vec<(String, String)>,
}

impl From<&RetailerContext> for ClientConfig {
	fn from(ctx: &RetailerContext) -> Self {
		let mut headers = vec![(
			"User-Agent".to_string(),
			"PricePulse-Aggregator/0.3".to_string(),
		)];

		if let Some(custom) = &ctx.headers {
			for (key, value) in custom {
				headers.push((key.clone(), value.clone()));
			}
		}
		// Stable ordering so equal configs hash equally
		headers.sort();

		Self {
			retailer_id: ctx.retailer_id.clone(),
			timeout_ms: ctx.timeout_ms,
			max_idle_per_host: 10,
			keep_alive_timeout_ms: 90_000,
			headers,
		}
	}
}

#[derive(Debug, Clone)]
struct CachedClient {
	client: Arc<Client>,
	created_at: Instant,
}

impl CachedClient {
	fn is_expired(&self, ttl: Duration) -> bool {
		self.created_at.elapsed() > ttl
	}
}

/// Thread-safe cache of pooled HTTP clients, one per retailer configuration
#[derive(Debug, Clone)]
pub struct ClientCache {
	clients: Arc<DashMap<ClientConfig, CachedClient>>,
	ttl: Duration,
}

impl ClientCache {
	/// Cache with the default 30-minute client TTL
	pub fn new() -> Self {
		Self::with_ttl(Duration::from_secs(30 * 60))
	}

	pub fn with_ttl(ttl: Duration) -> Self {
		Self {
			clients: Arc::new(DashMap::new()),
			ttl,
		}
	}

	/// Recommended cache for adapter instances
	pub fn for_adapter() -> Self {
		Self::new()
	}

	/// Get or build the pooled client for a configuration
	pub fn get_client(&self, config: &ClientConfig) -> AdapterResult<Arc<Client>> {
		if let Some(cached) = self.clients.get(config) {
			if !cached.is_expired(self.ttl) {
				return Ok(Arc::clone(&cached.client));
			}
			drop(cached);
			self.clients.remove(config);
			debug!(
				"rotating expired HTTP client for retailer '{}'",
				config.retailer_id
			);
		}

		let client = Self::build_client(config)?;
		let cached = CachedClient {
			client: Arc::new(client),
			created_at: Instant::now(),
		};
		let arc = Arc::clone(&cached.client);
		self.clients.insert(config.clone(), cached);
		Ok(arc)
	}

	fn build_client(config: &ClientConfig) -> AdapterResult<Client> {
		let mut headers = HeaderMap::new();
		for (key, value) in &config.headers {
			if let (Ok(name), Ok(value)) =
				(HeaderName::from_str(key), HeaderValue::from_str(value))
			{
				headers.insert(name, value);
			}
		}

		let client = Client::builder()
			.default_headers(headers)
			.timeout(Duration::from_millis(config.timeout_ms))
			.pool_max_idle_per_host(config.max_idle_per_host)
			.pool_idle_timeout(Duration::from_millis(config.keep_alive_timeout_ms))
			.build()?;

		Ok(client)
	}

	pub fn len(&self) -> usize {
		self.clients.len()
	}

	pub fn is_empty(&self) -> bool {
		self.clients.is_empty()
	}
}

impl Default for ClientCache {
	fn default() -> Self {
		Self::new()
	}
}
