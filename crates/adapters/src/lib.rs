//! PricePulse Adapters
//!
//! One adapter per source strategy: the vendor API plus the three scraping
//! strategies (managed crawler, headless browser, direct selector scrape).
//! The resolver never touches concrete types; it looks adapters up in the
//! registry by id and dispatches on their kind.

pub mod api_adapter;
pub mod client_cache;
pub mod crawler_adapter;
pub mod extract;
pub mod headless_adapter;
pub mod html_adapter;

pub use api_adapter::RetailerApiAdapter;
pub use client_cache::{ClientCache, ClientConfig};
pub use crawler_adapter::ManagedCrawlerAdapter;
pub use headless_adapter::HeadlessBrowserAdapter;
pub use html_adapter::HtmlScraperAdapter;
pub use pricepulse_types::{AdapterError, AdapterResult, SourceAdapter, SourceKind};

use std::collections::HashMap;

/// Registry of source adapters, keyed by adapter id
pub struct AdapterRegistry {
	adapters: HashMap<String, Box<dyn SourceAdapter>>,
}

impl AdapterRegistry {
	/// Create an empty registry
	pub fn new() -> Self {
		Self {
			adapters: HashMap::new(),
		}
	}

	/// Registry with one default instance of each strategy
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		registry.register(Box::new(RetailerApiAdapter::new()));
		registry.register(Box::new(ManagedCrawlerAdapter::with_default_config()));
		registry.register(Box::new(HeadlessBrowserAdapter::with_default_config()));
		registry.register(Box::new(HtmlScraperAdapter::new()));
		registry
	}

	/// Register an adapter under its own id, replacing any previous one
	pub fn register(&mut self, adapter: Box<dyn SourceAdapter>) {
		self.adapters.insert(adapter.id().to_string(), adapter);
	}

	pub fn get(&self, adapter_id: &str) -> Option<&dyn SourceAdapter> {
		self.adapters.get(adapter_id).map(|a| a.as_ref())
	}

	/// First adapter among `adapter_ids` (in order) with the given kind
	pub fn find_for<'a>(
		&'a self,
		adapter_ids: &[String],
		kind: SourceKind,
	) -> Option<&'a dyn SourceAdapter> {
		adapter_ids
			.iter()
			.filter_map(|id| self.get(id))
			.find(|adapter| adapter.kind() == kind)
	}

	pub fn len(&self) -> usize {
		self.adapters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.adapters.is_empty()
	}

	pub fn ids(&self) -> Vec<&str> {
		self.adapters.keys().map(|id| id.as_str()).collect()
	}
}

impl Default for AdapterRegistry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn registry_starts_empty() {
		assert!(AdapterRegistry::new().is_empty());
	}

	#[test]
	fn defaults_cover_every_strategy() {
		let registry = AdapterRegistry::with_defaults();
		assert_eq!(registry.len(), 4);

		let ids: Vec<String> = registry.ids().iter().map(|s| s.to_string()).collect();
		for kind in [
			SourceKind::Api,
			SourceKind::ManagedCrawler,
			SourceKind::HeadlessBrowser,
			SourceKind::HtmlScrape,
		] {
			assert!(registry.find_for(&ids, kind).is_some(), "missing {:?}", kind);
		}
	}

	#[test]
	fn find_for_respects_id_order_and_kind() {
		let registry = AdapterRegistry::with_defaults();
		let ids = vec![
			api_adapter::DEFAULT_ID.to_string(),
			html_adapter::DEFAULT_ID.to_string(),
		];

		let found = registry
			.find_for(&ids, SourceKind::HtmlScrape)
			.expect("html adapter registered");
		assert_eq!(found.id(), html_adapter::DEFAULT_ID);
		assert!(registry.find_for(&ids, SourceKind::HeadlessBrowser).is_none());
	}
}
