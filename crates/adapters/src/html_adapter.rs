//! Direct HTML scraper adapter
//!
//! Last resort in the scraping chain: a plain HTTP GET of the storefront page
//! plus CSS selector extraction. Cheapest strategy, lowest confidence, useless
//! against client-side rendered storefronts.

use async_trait::async_trait;
use tracing::debug;

use pricepulse_types::{
	AdapterDescriptor, AdapterError, AdapterResult, PriceResult, Product, RetailerContext,
	SelectorConfig, SourceAdapter, SourceKind,
};

use crate::client_cache::{ClientCache, ClientConfig};
use crate::extract::extract_offer;

pub const DEFAULT_ID: &str = "html-scraper-v1";

const CONFIDENCE: f64 = 0.6;

/// Adapter that fetches storefront pages directly and applies selectors
#[derive(Debug)]
pub struct HtmlScraperAdapter {
	descriptor: AdapterDescriptor,
	client_cache: ClientCache,
}

impl HtmlScraperAdapter {
	pub fn new() -> Self {
		Self {
			descriptor: AdapterDescriptor::new(
				DEFAULT_ID,
				"Direct HTML Scraper",
				"v1",
				SourceKind::HtmlScrape,
			),
			client_cache: ClientCache::for_adapter(),
		}
	}

	fn requirements<'a>(
		&self,
		ctx: &'a RetailerContext,
	) -> AdapterResult<(&'a str, &'a SelectorConfig)> {
		let url = ctx
			.product_url
			.as_deref()
			.ok_or_else(|| self.not_configured(ctx, "no product URL to scrape"))?;
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

impl Default for HtmlScraperAdapter {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl SourceAdapter for HtmlScraperAdapter {
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
			"scraping storefront page"
		);

		let client = self.client_cache.get_client(&ClientConfig::from(ctx))?;
		let response = client.get(product_url).send().await.map_err(|e| {
			if e.is_timeout() {
				AdapterError::Timeout {
					url: product_url.to_string(),
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
				url: product_url.to_string(),
			});
		}

		let html = response.text().await.map_err(AdapterError::Http)?;
		let offer = extract_offer(&html, selectors, product_url)?;

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
		let url = ctx
			.product_url
			.as_deref()
			.ok_or_else(|| self.not_configured(ctx, "no URL to probe"))?;
		let client = self.client_cache.get_client(&ClientConfig::from(ctx))?;
		let response = client.head(url).send().await?;
		Ok(!response.status().is_server_error())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn descriptor_reports_html_kind() {
		let adapter = HtmlScraperAdapter::new();
		assert_eq!(adapter.id(), DEFAULT_ID);
		assert_eq!(adapter.kind(), SourceKind::HtmlScrape);
	}

	#[tokio::test]
	async fn missing_selectors_is_not_configured() {
		let adapter = HtmlScraperAdapter::new();
		let ctx = RetailerContext {
			retailer_id: "ebay".to_string(),
			endpoint: None,
			product_url: Some("https://shop.example/p1".to_string()),
			selectors: None,
			timeout_ms: 3_000,
			headers: None,
		};

		let err = adapter
			.fetch_price(&Product::new("p1", "Thing"), &ctx)
			.await
			.expect_err("no selectors");
		assert!(err.is_unconfigured());
	}
}
