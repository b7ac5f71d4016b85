//! Price quotes, history entries and the comparison aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stock availability reported by a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
	InStock,
	OutOfStock,
	/// Source did not report availability
	Unknown,
}

/// How a quote was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
	Api,
	Scraper,
	Manual,
}

/// Data-quality tier assigned from the strategy that produced the quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
	/// Structured vendor API response
	Verified,
	/// Managed crawler or rendered-page extraction
	Standard,
	/// Raw selector scrape
	Unverified,
}

/// The current price snapshot for one (product, retailer) pair
///
/// At most one live quote exists per pair; writes are upserts and the last
/// successful fetch wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
	/// Unique id of this snapshot
	pub quote_id: String,

	pub product_id: String,
	pub retailer_id: String,

	/// Current purchase price
	pub price: f64,

	/// ISO currency code
	pub currency: String,

	/// Pre-discount price, when the source reports one
	pub original_price: Option<f64>,

	/// Discount relative to the original price, percent
	pub discount_percent: Option<f64>,

	pub stock: StockStatus,

	/// Shipping cost, when reported
	pub shipping_cost: Option<f64>,

	pub source: QuoteSource,

	/// Source confidence in the extracted price, 0.0 to 1.0
	pub confidence: f64,

	pub quality: DataQuality,

	/// When the source produced this price
	pub fetched_at: DateTime<Utc>,

	/// When the snapshot was last written
	pub updated_at: DateTime<Utc>,
}

impl PriceQuote {
	pub fn new(
		product_id: impl Into<String>,
		retailer_id: impl Into<String>,
		price: f64,
		currency: impl Into<String>,
		source: QuoteSource,
	) -> Self {
		let now = Utc::now();
		Self {
			quote_id: Uuid::new_v4().to_string(),
			product_id: product_id.into(),
			retailer_id: retailer_id.into(),
			price,
			currency: currency.into(),
			original_price: None,
			discount_percent: None,
			stock: StockStatus::Unknown,
			shipping_cost: None,
			source,
			confidence: 1.0,
			quality: DataQuality::Verified,
			fetched_at: now,
			updated_at: now,
		}
	}

	/// Derive the discount percentage from the original price, if higher
	pub fn with_original_price(mut self, original: f64) -> Self {
		if original > self.price && original > 0.0 {
			self.original_price = Some(original);
			self.discount_percent = Some((1.0 - self.price / original) * 100.0);
		}
		self
	}
}

/// Immutable record of one successful quote write
///
/// History only grows; nothing in the aggregation path mutates or deletes
/// existing entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
	pub entry_id: String,
	pub product_id: String,
	pub retailer_id: String,
	pub price: f64,
	pub currency: String,
	pub stock: StockStatus,
	pub source: QuoteSource,
	pub recorded_at: DateTime<Utc>,
}

impl From<&PriceQuote> for PriceHistoryEntry {
	fn from(quote: &PriceQuote) -> Self {
		Self {
			entry_id: Uuid::new_v4().to_string(),
			product_id: quote.product_id.clone(),
			retailer_id: quote.retailer_id.clone(),
			price: quote.price,
			currency: quote.currency.clone(),
			stock: quote.stock,
			source: quote.source,
			recorded_at: Utc::now(),
		}
	}
}

/// Ephemeral aggregate computed per comparison call
///
/// Only its constituent quotes and history entries are persisted; the result
/// itself lives in the cache at most.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
	pub product_id: String,

	/// Every quote that resolved in this call, no ordering guarantee
	pub quotes: Vec<PriceQuote>,

	pub lowest: Option<PriceQuote>,
	pub highest: Option<PriceQuote>,

	/// Arithmetic mean over all resolved quotes, stock status included
	pub average_price: Option<f64>,

	pub fetched_at: DateTime<Utc>,
}

impl ComparisonResult {
	/// Build the aggregate from resolved quotes by linear scan
	pub fn from_quotes(product_id: impl Into<String>, quotes: Vec<PriceQuote>) -> Self {
		let mut lowest: Option<&PriceQuote> = None;
		let mut highest: Option<&PriceQuote> = None;
		let mut sum = 0.0;

		for quote in &quotes {
			sum += quote.price;
			if lowest.map_or(true, |low| quote.price < low.price) {
				lowest = Some(quote);
			}
			if highest.map_or(true, |high| quote.price > high.price) {
				highest = Some(quote);
			}
		}

		let average_price = if quotes.is_empty() {
			None
		} else {
			Some(sum / quotes.len() as f64)
		};

		Self {
			product_id: product_id.into(),
			lowest: lowest.cloned(),
			highest: highest.cloned(),
			average_price,
			quotes,
			fetched_at: Utc::now(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.quotes.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn quote(retailer: &str, price: f64) -> PriceQuote {
		PriceQuote::new("p1", retailer, price, "USD", QuoteSource::Api)
	}

	#[test]
	fn comparison_computes_bounds_and_mean() {
		let result = ComparisonResult::from_quotes(
			"p1",
			vec![quote("a", 79.99), quote("b", 84.50), quote("c", 81.00)],
		);

		assert_eq!(result.lowest.as_ref().map(|q| q.retailer_id.as_str()), Some("a"));
		assert_eq!(result.highest.as_ref().map(|q| q.retailer_id.as_str()), Some("b"));
		let mean = result.average_price.expect("mean of non-empty set");
		assert!((mean - (79.99 + 84.50 + 81.00) / 3.0).abs() < 1e-6);
	}

	#[test]
	fn empty_comparison_has_no_bounds() {
		let result = ComparisonResult::from_quotes("p1", Vec::new());
		assert!(result.is_empty());
		assert!(result.lowest.is_none());
		assert!(result.highest.is_none());
		assert!(result.average_price.is_none());
	}

	#[test]
	fn discount_derived_only_when_original_is_higher() {
		let discounted = quote("a", 80.0).with_original_price(100.0);
		assert_eq!(discounted.original_price, Some(100.0));
		let pct = discounted.discount_percent.expect("discount set");
		assert!((pct - 20.0).abs() < 1e-9);

		let not_discounted = quote("a", 80.0).with_original_price(50.0);
		assert!(not_discounted.original_price.is_none());
		assert!(not_discounted.discount_percent.is_none());
	}

	#[test]
	fn comparison_round_trips_through_json() {
		let result = ComparisonResult::from_quotes("p1", vec![quote("a", 12.5)]);
		let raw = serde_json::to_string(&result).expect("serialize");
		let back: ComparisonResult = serde_json::from_str(&raw).expect("deserialize");
		assert_eq!(back, result);
	}
}
