//! Per-retailer source resolution
//!
//! The resolver turns one (product, retailer) pair into at most one quote.
//! The vendor API is tried first when the retailer has one; otherwise the
//! scraping chain runs in fixed order and the first strategy that yields a
//! price wins. Every failure is recorded in the retailer's health counters
//! and excludes only this retailer from the current aggregate.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use pricepulse_adapters::AdapterRegistry;
use pricepulse_types::{
	DataQuality, PriceQuote, PriceResult, Product, QuoteSource, Retailer, RetailerContext,
	RetailerStorage, SourceAdapter, SourceKind, Storage,
};

/// Resolves prices through the adapter registry and tracks retailer health
pub struct SourceResolver {
	registry: Arc<AdapterRegistry>,
	storage: Arc<dyn Storage>,
}

fn quality_for(kind: SourceKind) -> DataQuality {
	match kind {
		SourceKind::Api => DataQuality::Verified,
		SourceKind::ManagedCrawler | SourceKind::HeadlessBrowser => DataQuality::Standard,
		SourceKind::HtmlScrape => DataQuality::Unverified,
	}
}

impl SourceResolver {
	pub fn new(registry: Arc<AdapterRegistry>, storage: Arc<dyn Storage>) -> Self {
		Self { registry, storage }
	}

	/// Resolve the current price for one product at one retailer
	///
	/// Returns `None` when every configured source failed; the failure is
	/// already logged and counted by then.
	pub async fn resolve(&self, product: &Product, retailer: &Retailer) -> Option<PriceQuote> {
		let ctx = RetailerContext::for_product(
			retailer,
			&product.product_id,
			product.barcode.as_deref(),
		);

		if retailer.has_api {
			if let Some(quote) = self
				.try_kind(product, retailer, &ctx, SourceKind::Api)
				.await
			{
				return Some(quote);
			}
		}

		if retailer.has_scraper {
			return self.resolve_via_chain(product, retailer, &ctx).await;
		}

		None
	}

	/// Resolve through the scraping chain only, skipping the API
	///
	/// Used by manual re-scrapes, which may also override the storefront URL.
	pub async fn resolve_scrape(
		&self,
		product: &Product,
		retailer: &Retailer,
		url_override: Option<&str>,
	) -> Option<PriceQuote> {
		let mut ctx = RetailerContext::for_product(
			retailer,
			&product.product_id,
			product.barcode.as_deref(),
		);
		if let Some(url) = url_override {
			ctx = ctx.with_product_url(url);
		}
		self.resolve_via_chain(product, retailer, &ctx).await
	}

	async fn resolve_via_chain(
		&self,
		product: &Product,
		retailer: &Retailer,
		ctx: &RetailerContext,
	) -> Option<PriceQuote> {
		for kind in SourceKind::SCRAPING_CHAIN {
			if let Some(quote) = self.try_kind(product, retailer, ctx, kind).await {
				return Some(quote);
			}
		}
		None
	}

	async fn try_kind(
		&self,
		product: &Product,
		retailer: &Retailer,
		ctx: &RetailerContext,
		kind: SourceKind,
	) -> Option<PriceQuote> {
		let adapter = match self.registry.find_for(&retailer.adapter_ids, kind) {
			Some(adapter) => adapter,
			None => {
				debug!(
					retailer_id = %retailer.retailer_id,
					?kind,
					"no adapter of this kind registered for retailer"
				);
				return None;
			},
		};

		let started = Instant::now();
		match adapter.fetch_price(product, ctx).await {
			Ok(result) => {
				let latency_ms = started.elapsed().as_millis() as u64;
				self.record_success(retailer, latency_ms).await;
				Some(self.build_quote(product, retailer, adapter, result))
			},
			Err(e) if e.is_unconfigured() => {
				// Not a failure, this source just isn't set up
				debug!(
					retailer_id = %retailer.retailer_id,
					adapter_id = %adapter.id(),
					"skipping unconfigured source: {e}"
				);
				None
			},
			Err(e) => {
				warn!(
					retailer_id = %retailer.retailer_id,
					adapter_id = %adapter.id(),
					product_id = %product.product_id,
					"source call failed: {e}"
				);
				self.record_failure(retailer).await;
				None
			},
		}
	}

	fn build_quote(
		&self,
		product: &Product,
		retailer: &Retailer,
		adapter: &dyn SourceAdapter,
		result: PriceResult,
	) -> PriceQuote {
		let kind = adapter.kind();
		let source = if kind == SourceKind::Api {
			QuoteSource::Api
		} else {
			QuoteSource::Scraper
		};
		let currency = result
			.currency
			.unwrap_or_else(|| retailer.currency.clone());

		let mut quote = PriceQuote::new(
			&product.product_id,
			&retailer.retailer_id,
			result.price,
			currency,
			source,
		);
		quote.stock = result.stock;
		quote.shipping_cost = result.shipping_cost;
		quote.confidence = result.confidence;
		quote.quality = quality_for(kind);
		if let Some(original) = result.original_price {
			quote = quote.with_original_price(original);
		}
		quote
	}

	async fn record_success(&self, retailer: &Retailer, latency_ms: u64) {
		if let Err(e) = self
			.storage
			.record_retailer_success(&retailer.retailer_id, latency_ms)
			.await
		{
			warn!(retailer_id = %retailer.retailer_id, "failed to persist retailer metrics: {e}");
		}
	}

	async fn record_failure(&self, retailer: &Retailer) {
		if let Err(e) = self
			.storage
			.record_retailer_failure(&retailer.retailer_id)
			.await
		{
			warn!(retailer_id = %retailer.retailer_id, "failed to persist retailer metrics: {e}");
		}
	}
}
