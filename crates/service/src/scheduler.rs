//! Recurring background schedules
//!
//! The catalog-wide price refresh and the retailer health sweep run on plain
//! intervals; the refresh feeds the price-updates queue rather than fetching
//! inline, so backpressure and dedup apply to scheduled work too.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{info, warn};

use pricepulse_types::{ProductStorage, RetailerStorage, Storage};

use crate::jobs::{JobBroker, UpdatePriority};
use crate::retailer::RetailerService;

/// Periodically enqueue a medium-priority update for every (product, active
/// retailer) pair
pub fn start_price_refresh(
	storage: Arc<dyn Storage>,
	broker: Arc<JobBroker>,
	every: Duration,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut tick = interval(every);
		// The immediate first tick would refresh at startup
		tick.tick().await;
		loop {
			tick.tick().await;

			let (products, retailers) = match (
				storage.list_products().await,
				storage.list_active_retailers().await,
			) {
				(Ok(products), Ok(retailers)) => (products, retailers),
				(Err(e), _) | (_, Err(e)) => {
					warn!("scheduled price refresh skipped: {e}");
					continue;
				},
			};

			let mut enqueued = 0usize;
			for product in &products {
				for retailer in &retailers {
					match broker
						.enqueue_price_update(
							product.product_id.as_str(),
							retailer.retailer_id.as_str(),
							UpdatePriority::Medium,
						)
						.await
					{
						Ok(_) => enqueued += 1,
						Err(e) => warn!(
							product_id = %product.product_id,
							retailer_id = %retailer.retailer_id,
							"refresh enqueue failed: {e}"
						),
					}
				}
			}
			info!(enqueued, "scheduled price refresh pass enqueued");
		}
	})
}

/// Periodically run the retailer health sweep
pub fn start_health_sweep(service: Arc<RetailerService>, every: Duration) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut tick = interval(every);
		tick.tick().await;
		loop {
			tick.tick().await;
			if let Err(e) = service.run_health_sweep().await {
				warn!("health sweep failed: {e}");
			}
		}
	})
}
