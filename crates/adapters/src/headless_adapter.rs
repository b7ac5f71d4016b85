//! Headless browser adapter
//!
//! Second scraping strategy. Asks a rendering service to load the page with a
//! real browser engine, then applies the retailer's selectors to the rendered
//! HTML locally. Needed for storefronts that assemble prices client-side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pricepulse_types::{
	AdapterDescriptor, AdapterError, AdapterResult, PriceResult, Product, RetailerContext,
	SelectorConfig, SourceAdapter, SourceKind,
};

use crate::client_cache::{ClientCache, ClientConfig};
use crate::extract::extract_offer;

pub const DEFAULT_ID: &str = "headless-browser-v1";

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:9222/render";

const CONFIDENCE: f64 = 0.7;

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
	url: &'a str,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
	html: String,
}

/// Adapter backed by a headless rendering service
#[derive(Debug)]
pub struct HeadlessBrowserAdapter {
	descriptor: AdapterDescriptor,
	service_url: String,
	client_cache: ClientCache,
}

impl HeadlessBrowserAdapter {
	pub fn new(service_url: impl Into<String>) -> Self {
		Self {
			descriptor: AdapterDescriptor::new(
				DEFAULT_ID,
				"Headless Browser Renderer",
				"v1",
				SourceKind::HeadlessBrowser,
			),
			service_url: service_url.into(),
			client_cache: ClientCache::for_adapter(),
		}
	}

	/// Instance pointed at the conventional local rendering service
	pub fn with_default_config() -> Self {
		Self::new(DEFAULT_SERVICE_URL)
	}

	fn requirements<'a>(
		&self,
		ctx: &'a RetailerContext,
	) -> AdapterResult<(&'a str, &'a SelectorConfig)> {
		let url = ctx
			.product_url
			.as_deref()
			.ok_or_else(|| self.not_configured(ctx, "no product URL to render"))?;
		let selectors = ctx
			.selectors
			.as_ref()
			.ok_or_else(|| self.not_configured(ctx, "no selectors configured"))?;
		Ok((url, selectors))
	}

	fn not_configured(&self, ctx: &RetailerContext, reason: &str) -> AdapterError {
		AdapterError::NotConfigured {
			adapter_id: self.id().to_string(),
			retailer_id: ctx.retailer_id.clone(),
			reason: reason.to_string(),
		}
	}
}

#[async_trait]
impl SourceAdapter for HeadlessBrowserAdapter {
	fn descriptor(&self) -> &AdapterDescriptor {
		&self.descriptor
	}

	async fn fetch_price(
		&self,
		product: &Product,
		ctx: &RetailerContext,
	) -> AdapterResult<PriceResult> {
		let (product_url, selectors) = self.requirements(ctx)?;
		debug!(
			retailer_id = %ctx.retailer_id,
			product_id = %product.product_id,
			url = %product_url,
			"rendering page in headless browser"
		);

		let client = self.client_cache.get_client(&ClientConfig::from(ctx))?;
		let response = client
			.post(&self.service_url)
			.json(&RenderRequest { url: product_url })
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

		let rendered: RenderResponse = response.json().await.map_err(|e| AdapterError::Parse {
			url: self.service_url.clone(),
			reason: e.to_string(),
		})?;

		let offer = extract_offer(&rendered.html, selectors, product_url)?;

		Ok(PriceResult {
			price: offer.price,
			currency: None,
			original_price: offer.original_price,
			stock: offer.stock,
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

#[cfg(test)]
mod tests {
	use super::*;

	fn ctx(url: Option<&str>, selectors: Option<SelectorConfig>) -> RetailerContext {
		RetailerContext {
			retailer_id: "bestbuy".to_string(),
			endpoint: None,
			product_url: url.map(String::from),
			selectors,
			timeout_ms: 3_000,
			headers: None,
		}
	}

	#[test]
	fn descriptor_reports_headless_kind() {
		let adapter = HeadlessBrowserAdapter::with_default_config();
		assert_eq!(adapter.id(), DEFAULT_ID);
		assert_eq!(adapter.kind(), SourceKind::HeadlessBrowser);
	}

	#[tokio::test]
	async fn missing_url_or_selectors_is_not_configured() {
		let adapter = HeadlessBrowserAdapter::with_default_config();
		let product = Product::new("p1", "Thing");

		let no_url = ctx(
			None,
			Some(SelectorConfig {
				price: ".price".to_string(),
				availability: None,
				original_price: None,
			}),
		);
		assert!(adapter
			.fetch_price(&product, &no_url)
			.await
			.expect_err("no url")
			.is_unconfigured());

		let no_selectors = ctx(Some("https://shop.example/p1"), None);
		assert!(adapter
			.fetch_price(&product, &no_selectors)
			.await
			.expect_err("no selectors")
			.is_unconfigured());
	}
}
