//! In-memory cache store with per-entry TTL
//!
//! Entries expire passively on read; a periodic sweep task reclaims the rest.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant};
use tracing::debug;

use pricepulse_types::cache::{CacheResult, CacheStore};

#[derive(Debug, Clone)]
struct CacheEntry {
	value: String,
	expires_at: Instant,
}

impl CacheEntry {
	fn is_expired(&self) -> bool {
		Instant::now() >= self.expires_at
	}
}

/// DashMap-backed key/value cache with TTL
#[derive(Clone, Default)]
pub struct MemoryCache {
	entries: Arc<DashMap<String, CacheEntry>>,
}

impl MemoryCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Start the periodic sweep of expired entries
	pub fn start_ttl_cleanup(&self, sweep_interval: Duration) -> tokio::task::JoinHandle<()> {
		let entries = Arc::clone(&self.entries);
		tokio::spawn(async move {
			let mut sweep = interval(sweep_interval);
			loop {
				sweep.tick().await;

				let before = entries.len();
				entries.retain(|_, entry| !entry.is_expired());
				let removed = before - entries.len();
				if removed > 0 {
					debug!("cache sweep removed {} expired entries", removed);
				}
			}
		})
	}

	/// Number of entries currently held, expired included
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[async_trait]
impl CacheStore for MemoryCache {
	async fn get(&self, key: &str) -> CacheResult<Option<String>> {
		if let Some(entry) = self.entries.get(key) {
			if entry.is_expired() {
				drop(entry);
				self.entries.remove(key);
				return Ok(None);
			}
			return Ok(Some(entry.value.clone()));
		}
		Ok(None)
	}

	async fn set(&self, key: &str, value: String, ttl_secs: u64) -> CacheResult<()> {
		self.entries.insert(
			key.to_string(),
			CacheEntry {
				value,
				expires_at: Instant::now() + Duration::from_secs(ttl_secs),
			},
		);
		Ok(())
	}

	async fn invalidate(&self, key: &str) -> CacheResult<bool> {
		Ok(self.entries.remove(key).is_some())
	}
}
