//! Source adapter models and traits
//!
//! An adapter is one strategy for obtaining a price from a retailer: the
//! vendor API or one of three scraping strategies. The resolver dispatches on
//! retailer capability flags and adapter kind, never on concrete types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::quotes::StockStatus;
use crate::retailers::Retailer;

pub mod errors;
pub mod traits;

pub use errors::{AdapterError, AdapterResult};
pub use traits::SourceAdapter;

/// The fixed capability set of source strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
	/// Structured vendor API
	Api,
	/// Managed crawl service that fetches and extracts remotely
	ManagedCrawler,
	/// Headless browser rendering service
	HeadlessBrowser,
	/// Direct HTTP GET plus CSS selector extraction
	HtmlScrape,
}

impl SourceKind {
	/// The scraping fallback chain, in invocation order
	pub const SCRAPING_CHAIN: [SourceKind; 3] = [
		SourceKind::ManagedCrawler,
		SourceKind::HeadlessBrowser,
		SourceKind::HtmlScrape,
	];

	pub fn is_scraper(&self) -> bool {
		!matches!(self, SourceKind::Api)
	}
}

/// Static information about one registered adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterDescriptor {
	pub adapter_id: String,
	pub name: String,
	pub version: String,
	pub kind: SourceKind,
}

impl AdapterDescriptor {
	pub fn new(
		adapter_id: impl Into<String>,
		name: impl Into<String>,
		version: impl Into<String>,
		kind: SourceKind,
	) -> Self {
		Self {
			adapter_id: adapter_id.into(),
			name: name.into(),
			version: version.into(),
			kind,
		}
	}
}

/// CSS selectors used by the page-extraction strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
	/// Selector for the element holding the price text
	pub price: String,

	/// Selector whose presence marks the product as in stock
	pub availability: Option<String>,

	/// Selector for the pre-discount price
	pub original_price: Option<String>,
}

/// Per-call context handed to an adapter, derived from the retailer
#[derive(Debug, Clone, PartialEq)]
pub struct RetailerContext {
	pub retailer_id: String,

	/// Vendor API endpoint, for `Api` adapters
	pub endpoint: Option<String>,

	/// Fully resolved storefront URL, for scraping adapters
	pub product_url: Option<String>,

	pub selectors: Option<SelectorConfig>,

	pub timeout_ms: u64,

	pub headers: Option<HashMap<String, String>>,
}

impl RetailerContext {
	/// Build the context for one (product, retailer) call
	pub fn for_product(retailer: &Retailer, product_id: &str, barcode: Option<&str>) -> Self {
		Self {
			retailer_id: retailer.retailer_id.clone(),
			endpoint: retailer.endpoint.clone(),
			product_url: retailer.product_url(product_id, barcode),
			selectors: retailer.selectors.clone(),
			timeout_ms: retailer.timeout_ms,
			headers: retailer.headers.clone(),
		}
	}

	/// Override the storefront URL, used by manual re-scrapes
	pub fn with_product_url(mut self, url: impl Into<String>) -> Self {
		self.product_url = Some(url.into());
		self
	}
}

/// What an adapter extracted for one product at one retailer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceResult {
	pub price: f64,

	/// Currency reported by the source; the retailer default applies when
	/// absent
	pub currency: Option<String>,

	pub original_price: Option<f64>,

	pub stock: StockStatus,

	pub shipping_cost: Option<f64>,

	/// Adapter confidence in the extraction, 0.0 to 1.0
	pub confidence: f64,
}

impl PriceResult {
	pub fn new(price: f64) -> Self {
		Self {
			price,
			currency: None,
			original_price: None,
			stock: StockStatus::Unknown,
			shipping_cost: None,
			confidence: 1.0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scraping_chain_order_is_fixed() {
		assert_eq!(
			SourceKind::SCRAPING_CHAIN,
			[
				SourceKind::ManagedCrawler,
				SourceKind::HeadlessBrowser,
				SourceKind::HtmlScrape
			]
		);
		assert!(!SourceKind::Api.is_scraper());
		assert!(SourceKind::HtmlScrape.is_scraper());
	}

	#[test]
	fn context_resolves_product_url_from_template() {
		let mut retailer = Retailer::new("ebay", "eBay");
		retailer.product_url_template = Some("https://ebay.example/itm/{product_id}".to_string());

		let ctx = RetailerContext::for_product(&retailer, "p42", None);
		assert_eq!(ctx.product_url.as_deref(), Some("https://ebay.example/itm/p42"));

		let overridden = ctx.with_product_url("https://ebay.example/custom");
		assert_eq!(
			overridden.product_url.as_deref(),
			Some("https://ebay.example/custom")
		);
	}
}
