//! Mock adapters and fixtures for tests and demos
//!
//! Deterministic adapters that never touch the network, plus helpers for
//! building the product/retailer fixtures the integration tests share.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use pricepulse_types::{
	AdapterDescriptor, AdapterError, AdapterResult, PriceResult, Product, Retailer,
	RetailerContext, SourceAdapter, SourceKind, StockStatus,
};

/// API adapter answering with a fixed price
#[derive(Debug)]
pub struct MockApiAdapter {
	descriptor: AdapterDescriptor,
	price: f64,
	fail: bool,
	calls: Arc<AtomicUsize>,
}

impl MockApiAdapter {
	pub fn new(adapter_id: &str, price: f64) -> Self {
		Self {
			descriptor: AdapterDescriptor::new(adapter_id, "Mock API", "test", SourceKind::Api),
			price,
			fail: false,
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Adapter whose every call fails with a server error
	pub fn failing(adapter_id: &str) -> Self {
		let mut adapter = Self::new(adapter_id, 0.0);
		adapter.fail = true;
		adapter
	}

	/// Shared call counter, for asserting on adapter traffic
	pub fn call_counter(&self) -> Arc<AtomicUsize> {
		Arc::clone(&self.calls)
	}
}

#[async_trait]
impl SourceAdapter for MockApiAdapter {
	fn descriptor(&self) -> &AdapterDescriptor {
		&self.descriptor
	}

	async fn fetch_price(
		&self,
		_product: &Product,
		ctx: &RetailerContext,
	) -> AdapterResult<PriceResult> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if self.fail {
			return Err(AdapterError::HttpStatus {
				status: 500,
				url: format!("https://api.{}.example", ctx.retailer_id),
			});
		}
		let mut result = PriceResult::new(self.price);
		result.stock = StockStatus::InStock;
		result.confidence = 0.95;
		Ok(result)
	}

	async fn health_check(&self, _ctx: &RetailerContext) -> AdapterResult<bool> {
		Ok(!self.fail)
	}
}

/// Scraper adapter answering with a fixed price
#[derive(Debug)]
pub struct MockScraperAdapter {
	descriptor: AdapterDescriptor,
	price: f64,
	calls: Arc<AtomicUsize>,
}

impl MockScraperAdapter {
	pub fn new(adapter_id: &str, price: f64) -> Self {
		Self {
			descriptor: AdapterDescriptor::new(
				adapter_id,
				"Mock Scraper",
				"test",
				SourceKind::HtmlScrape,
			),
			price,
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn call_counter(&self) -> Arc<AtomicUsize> {
		Arc::clone(&self.calls)
	}
}

#[async_trait]
impl SourceAdapter for MockScraperAdapter {
	fn descriptor(&self) -> &AdapterDescriptor {
		&self.descriptor
	}

	async fn fetch_price(
		&self,
		_product: &Product,
		_ctx: &RetailerContext,
	) -> AdapterResult<PriceResult> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		let mut result = PriceResult::new(self.price);
		result.stock = StockStatus::InStock;
		result.confidence = 0.6;
		Ok(result)
	}

	async fn health_check(&self, _ctx: &RetailerContext) -> AdapterResult<bool> {
		Ok(true)
	}
}

/// Standard test product
pub fn mock_product(product_id: &str) -> Product {
	let mut product = Product::new(product_id, "Wireless Headphones");
	product.brand = Some("Acme".to_string());
	product.barcode = Some("0012345678905".to_string());
	product
}

/// API-capable retailer wired to one adapter id
pub fn mock_api_retailer(retailer_id: &str, adapter_id: &str) -> Retailer {
	let mut retailer = Retailer::new(retailer_id, retailer_id);
	retailer.has_api = true;
	retailer.endpoint = Some(format!("https://api.{retailer_id}.example"));
	retailer.adapter_ids = vec![adapter_id.to_string()];
	retailer.trust_score = 0.9;
	retailer
}

/// Scraper-capable retailer wired to one adapter id
pub fn mock_scrape_retailer(retailer_id: &str, adapter_id: &str) -> Retailer {
	let mut retailer = Retailer::new(retailer_id, retailer_id);
	retailer.has_scraper = true;
	retailer.product_url_template =
		Some(format!("https://{retailer_id}.example/p/{{product_id}}"));
	retailer.adapter_ids = vec![adapter_id.to_string()];
	retailer
}
