//! Managed crawler adapter
//!
//! First scraping strategy in the fallback chain. Delegates fetching and
//! extraction to a managed crawl service; the service handles rotation,
//! throttling and anti-bot measures and returns structured fields.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pricepulse_types::{
	AdapterDescriptor, AdapterError, AdapterResult, PriceResult, Product, RetailerContext,
	SelectorConfig, SourceAdapter, SourceKind, StockStatus,
};

use crate::client_cache::{ClientCache, ClientConfig};

pub const DEFAULT_ID: &str = "managed-crawler-v1";

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:9310/crawl";

const CONFIDENCE: f64 = 0.8;

#[derive(Debug, Serialize)]
struct CrawlRequest<'a> {
	url: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	selectors: Option<&'a SelectorConfig>,
}

#[derive(Debug, Deserialize)]
struct CrawlExtraction {
	price: Option<f64>,
	original_price: Option<f64>,
	in_stock: Option<bool>,
	currency: Option<String>,
}

/// Adapter backed by a managed crawl service
#[derive(Debug)]
pub struct ManagedCrawlerAdapter {
	descriptor: AdapterDescriptor,
	service_url: String,
	client_cache: ClientCache,
}

impl ManagedCrawlerAdapter {
	pub fn new(service_url: impl Into<String>) -> Self {
		Self {
			descriptor: AdapterDescriptor::new(
				DEFAULT_ID,
				"Managed Crawl Service",
				"v1",
				SourceKind::ManagedCrawler,
			),
			service_url: service_url.into(),
			client_cache: ClientCache::for_adapter(),
		}
	}

	/// Instance pointed at the conventional local service address
	pub fn with_default_config() -> Self {
		Self::new(DEFAULT_SERVICE_URL)
	}

	fn product_url<'a>(&self, ctx: &'a RetailerContext) -> AdapterResult<&'a str> {
		ctx.product_url
			.as_deref()
			.ok_or_else(|| AdapterError::NotConfigured {
				adapter_id: self.id().to_string(),
				retailer_id: ctx.retailer_id.clone(),
				reason: "no product URL to crawl".to_string(),
			})
	}
}

#[async_trait]
impl SourceAdapter for ManagedCrawlerAdapter {
	fn descriptor(&self) -> &AdapterDescriptor {
		&self.descriptor
	}

	async fn fetch_price(
		&self,
		product: &Product,
		ctx: &RetailerContext,
	) -> AdapterResult<PriceResult> {
		let product_url = self.product_url(ctx)?;
		debug!(
			retailer_id = %ctx.retailer_id,
			product_id = %product.product_id,
			url = %product_url,
			"submitting crawl request"
		);

		let request = CrawlRequest {
			url: product_url,
			selectors: ctx.selectors.as_ref(),
		};

		let client = self.client_cache.get_client(&ClientConfig::from(ctx))?;
		let response = client
			.post(&self.service_url)
			.json(&request)
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					AdapterError::Timeout {
						url: self.service_url.clone(),
						timeout_ms: ctx.timeout_ms,
					}
				} else {
					AdapterError::Http(e)
				}
			})?;

		let status = response.status();
		if !status.is_success() {
			return Err(AdapterError::HttpStatus {
				status: status.as_u16(),
				url: self.service_url.clone(),
			});
		}

		let extraction: CrawlExtraction =
			response.json().await.map_err(|e| AdapterError::Parse {
				url: self.service_url.clone(),
				reason: e.to_string(),
			})?;

		let price = extraction.price.ok_or_else(|| AdapterError::MissingPrice {
			url: product_url.to_string(),
		})?;

		let stock = match extraction.in_stock {
			Some(true) => StockStatus::InStock,
			Some(false) => StockStatus::OutOfStock,
			None => StockStatus::Unknown,
		};

		Ok(PriceResult {
			price,
			currency: extraction.currency,
			original_price: extraction.original_price,
			stock,
			shipping_cost: None,
			confidence: CONFIDENCE,
		})
	}

	async fn health_check(&self, ctx: &RetailerContext) -> AdapterResult<bool> {
		let client = self.client_cache.get_client(&ClientConfig::from(ctx))?;
		let response = client.get(&self.service_url).send().await?;
		Ok(!response.status().is_server_error())
	}
}
