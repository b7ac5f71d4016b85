//! Cache store trait
//!
//! The cache is an optimization layer only, never the system of record: every
//! error is recoverable by recomputing.

use async_trait::async_trait;
use thiserror::Error;

/// Cache errors; always non-fatal to callers
#[derive(Debug, Error)]
pub enum CacheError {
	#[error("cache backend unavailable: {0}")]
	Backend(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Key/value store with per-key expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
	/// Fetch a live value; expired entries read as absent
	async fn get(&self, key: &str) -> CacheResult<Option<String>>;

	/// Write a value with a TTL, overwriting any previous entry
	async fn set(&self, key: &str, value: String, ttl_secs: u64) -> CacheResult<()>;

	/// Drop a key; returns whether it existed
	async fn invalidate(&self, key: &str) -> CacheResult<bool>;
}

/// Cache key for a product's comparison result
pub fn comparison_key(product_id: &str) -> String {
	format!("prices:{}", product_id)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn comparison_key_is_namespaced() {
		assert_eq!(comparison_key("p1"), "prices:p1");
	}
}
