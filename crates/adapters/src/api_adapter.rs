//! Vendor API adapter
//!
//! Queries a retailer's structured offer API. This is the preferred source:
//! structured responses carry the highest extraction confidence.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use pricepulse_types::{
	AdapterDescriptor, AdapterError, AdapterResult, PriceResult, Product, RetailerContext,
	SourceAdapter, SourceKind, StockStatus,
};

use crate::client_cache::{ClientCache, ClientConfig};

pub const DEFAULT_ID: &str = "retail-api-v1";

const CONFIDENCE: f64 = 0.95;

/// Offer payload returned by retailer APIs
#[derive(Debug, Deserialize)]
struct ApiOffer {
	price: f64,
	currency: Option<String>,
	original_price: Option<f64>,
	in_stock: Option<bool>,
	shipping_cost: Option<f64>,
}

/// Adapter for retailers exposing a structured offer API
#[derive(Debug)]
pub struct RetailerApiAdapter {
	descriptor: AdapterDescriptor,
	client_cache: ClientCache,
}

impl RetailerApiAdapter {
	pub fn new() -> Self {
		Self::with_id(DEFAULT_ID)
	}

	/// Instance registered under a custom id, for retailers that need a
	/// dedicated configuration
	pub fn with_id(adapter_id: impl Into<String>) -> Self {
		Self {
			descriptor: AdapterDescriptor::new(
				adapter_id,
				"Retailer Offer API",
				"v1",
				SourceKind::Api,
			),
			client_cache: ClientCache::for_adapter(),
		}
	}

	/// Resolve the offer URL for one product
	///
	/// Endpoints may embed `{product_id}` or `{barcode}` placeholders; plain
	/// endpoints get the conventional `/offers/{product_id}` suffix.
	fn offer_url(endpoint: &str, product: &Product) -> String {
		if endpoint.contains("{product_id}") || endpoint.contains("{barcode}") {
			let mut url = endpoint.replace("{product_id}", &product.product_id);
			if let Some(barcode) = &product.barcode {
				url = url.replace("{barcode}", barcode);
			}
			return url;
		}
		format!(
			"{}/offers/{}",
			endpoint.trim_end_matches('/'),
			product.product_id
		)
	}

	fn endpoint<'a>(&self, ctx: &'a RetailerContext) -> AdapterResult<&'a str> {
		ctx.endpoint
			.as_deref()
			.ok_or_else(|| AdapterError::NotConfigured {
				adapter_id: self.id().to_string(),
				retailer_id: ctx.retailer_id.clone(),
				reason: "no API endpoint configured".to_string(),
			})
	}
}

impl Default for RetailerApiAdapter {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl SourceAdapter for RetailerApiAdapter {
	fn descriptor(&self) -> &AdapterDescriptor {
		&self.descriptor
	}

	async fn fetch_price(
		&self,
		product: &Product,
		ctx: &RetailerContext,
	) -> AdapterResult<PriceResult> {
		let endpoint = self.endpoint(ctx)?;
		let url = Self::offer_url(endpoint, product);
		debug!(
			retailer_id = %ctx.retailer_id,
			product_id = %product.product_id,
			%url,
			"fetching offer from vendor API"
		);

		let client = self.client_cache.get_client(&ClientConfig::from(ctx))?;
		let response = client.get(&url).send().await.map_err(|e| {
			if e.is_timeout() {
				AdapterError::Timeout {
					url: url.clone(),
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
				url,
			});
		}

		let offer: ApiOffer = response.json().await.map_err(|e| AdapterError::Parse {
			url: url.clone(),
			reason: e.to_string(),
		})?;

		let stock = match offer.in_stock {
			Some(true) => StockStatus::InStock,
			Some(false) => StockStatus::OutOfStock,
			None => StockStatus::Unknown,
		};

		Ok(PriceResult {
			price: offer.price,
			currency: offer.currency,
			original_price: offer.original_price,
			stock,
			shipping_cost: offer.shipping_cost,
			confidence: CONFIDENCE,
		})
	}

	async fn health_check(&self, ctx: &RetailerContext) -> AdapterResult<bool> {
		let endpoint = self.endpoint(ctx)?;
		let client = self.client_cache.get_client(&ClientConfig::from(ctx))?;
		let response = client.get(endpoint).send().await?;
		Ok(!response.status().is_server_error())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn product() -> Product {
		let mut product = Product::new("p42", "Wireless Headphones");
		product.barcode = Some("0012345678905".to_string());
		product
	}

	#[test]
	fn descriptor_reports_api_kind() {
		let adapter = RetailerApiAdapter::new();
		assert_eq!(adapter.id(), DEFAULT_ID);
		assert_eq!(adapter.kind(), SourceKind::Api);
	}

	#[test]
	fn offer_url_substitutes_placeholders() {
		assert_eq!(
			RetailerApiAdapter::offer_url("https://api.shop.example/items/{product_id}", &product()),
			"https://api.shop.example/items/p42"
		);
		assert_eq!(
			RetailerApiAdapter::offer_url("https://api.shop.example/upc/{barcode}", &product()),
			"https://api.shop.example/upc/0012345678905"
		);
	}

	#[test]
	fn plain_endpoint_gets_offers_suffix() {
		assert_eq!(
			RetailerApiAdapter::offer_url("https://api.shop.example/", &product()),
			"https://api.shop.example/offers/p42"
		);
	}

	#[tokio::test]
	async fn missing_endpoint_is_not_configured() {
		let adapter = RetailerApiAdapter::new();
		let ctx = RetailerContext {
			retailer_id: "walmart".to_string(),
			endpoint: None,
			product_url: None,
			selectors: None,
			timeout_ms: 3_000,
			headers: None,
		};

		let err = adapter
			.fetch_price(&product(), &ctx)
			.await
			.expect_err("no endpoint");
		assert!(err.is_unconfigured());
	}
}
