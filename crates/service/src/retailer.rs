//! Retailer health checks
//!
//! Probes each retailer's preferred source and flips its status between
//! `Active` and `Error`. Operator-driven states are never overridden.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use pricepulse_adapters::AdapterRegistry;
use pricepulse_types::{
	Retailer, RetailerContext, RetailerStatus, RetailerStorage, SourceKind, Storage, StorageResult,
};

/// Health probing over the registered retailers
pub struct RetailerService {
	registry: Arc<AdapterRegistry>,
	storage: Arc<dyn Storage>,
}

impl RetailerService {
	pub fn new(registry: Arc<AdapterRegistry>, storage: Arc<dyn Storage>) -> Self {
		Self { registry, storage }
	}

	/// Probe one retailer through its preferred source
	pub async fn check_retailer(&self, retailer: &Retailer) -> bool {
		let ctx = RetailerContext {
			retailer_id: retailer.retailer_id.clone(),
			endpoint: retailer.endpoint.clone(),
			// Probe the storefront root rather than a product page
			product_url: retailer.product_url("", None),
			selectors: retailer.selectors.clone(),
			timeout_ms: retailer.timeout_ms,
			headers: retailer.headers.clone(),
		};

		let kinds: &[SourceKind] = if retailer.has_api {
			&[SourceKind::Api]
		} else {
			&SourceKind::SCRAPING_CHAIN
		};

		for kind in kinds {
			let Some(adapter) = self.registry.find_for(&retailer.adapter_ids, *kind) else {
				continue;
			};
			match adapter.health_check(&ctx).await {
				Ok(healthy) => return healthy,
				Err(e) => {
					debug!(
						retailer_id = %retailer.retailer_id,
						adapter_id = %adapter.id(),
						"health probe failed: {e}"
					);
				},
			}
		}
		false
	}

	/// Probe every checkable retailer and persist the outcome
	///
	/// `Inactive` and `Maintenance` retailers are operator decisions and are
	/// skipped entirely.
	pub async fn run_health_sweep(&self) -> StorageResult<()> {
		let retailers = self.storage.list_retailers().await?;
		let mut healthy = 0usize;
		let mut unhealthy = 0usize;

		for retailer in retailers {
			if matches!(
				retailer.status,
				RetailerStatus::Inactive | RetailerStatus::Maintenance
			) {
				continue;
			}

			let ok = self.check_retailer(&retailer).await;
			let mut updated = retailer.clone();
			updated.metrics.last_health_check = Some(Utc::now());
			if ok {
				healthy += 1;
				updated.status = RetailerStatus::Active;
				updated.last_seen = Some(Utc::now());
			} else {
				unhealthy += 1;
				updated.status = RetailerStatus::Error;
				updated.metrics.record_failure();
				warn!(retailer_id = %retailer.retailer_id, "retailer failed its health check");
			}
			self.storage.update_retailer(updated).await?;
		}

		info!(healthy, unhealthy, "retailer health sweep finished");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use pricepulse_storage::MemoryStore;
	use pricepulse_types::{
		AdapterDescriptor, AdapterResult, PriceResult, Product, RetailerStorage, SourceAdapter,
	};

	#[derive(Debug)]
	struct ProbeAdapter {
		descriptor: AdapterDescriptor,
		healthy: bool,
	}

	#[async_trait]
	impl SourceAdapter for ProbeAdapter {
		fn descriptor(&self) -> &AdapterDescriptor {
			&self.descriptor
		}

		async fn fetch_price(
			&self,
			_product: &Product,
			_ctx: &RetailerContext,
		) -> AdapterResult<PriceResult> {
			Ok(PriceResult::new(1.0))
		}

		async fn health_check(&self, _ctx: &RetailerContext) -> AdapterResult<bool> {
			Ok(self.healthy)
		}
	}

	async fn sweep_with(healthy: bool) -> Retailer {
		let mut registry = AdapterRegistry::new();
		registry.register(Box::new(ProbeAdapter {
			descriptor: AdapterDescriptor::new("api", "Probe", "v1", SourceKind::Api),
			healthy,
		}));

		let mut retailer = Retailer::new("shop", "Shop");
		retailer.has_api = true;
		retailer.endpoint = Some("https://api.shop.example".to_string());
		retailer.adapter_ids = vec!["api".to_string()];

		let store = Arc::new(MemoryStore::new());
		store.create_retailer(retailer).await.unwrap();

		let service = RetailerService::new(Arc::new(registry), Arc::clone(&store) as _);
		service.run_health_sweep().await.unwrap();

		store.get_retailer("shop").await.unwrap().unwrap()
	}

	#[tokio::test]
	async fn healthy_probe_keeps_retailer_active() {
		let retailer = sweep_with(true).await;
		assert_eq!(retailer.status, RetailerStatus::Active);
		assert!(retailer.metrics.last_health_check.is_some());
		assert!(retailer.last_seen.is_some());
	}

	#[tokio::test]
	async fn failed_probe_marks_retailer_error() {
		let retailer = sweep_with(false).await;
		assert_eq!(retailer.status, RetailerStatus::Error);
		assert_eq!(retailer.metrics.consecutive_failures, 1);
	}

	#[tokio::test]
	async fn maintenance_retailers_are_left_alone() {
		let registry = AdapterRegistry::new();
		let mut retailer = Retailer::new("shop", "Shop");
		retailer.status = RetailerStatus::Maintenance;

		let store = Arc::new(MemoryStore::new());
		store.create_retailer(retailer).await.unwrap();

		let service = RetailerService::new(Arc::new(registry), Arc::clone(&store) as _);
		service.run_health_sweep().await.unwrap();

		let stored = store.get_retailer("shop").await.unwrap().unwrap();
		assert_eq!(stored.status, RetailerStatus::Maintenance);
		assert!(stored.metrics.last_health_check.is_none());
	}
}
