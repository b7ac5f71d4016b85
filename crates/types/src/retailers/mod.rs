//! Core Retailer domain model
//!
//! A retailer is one independent vendor the engine can obtain prices from,
//! through its API, its storefront pages, or both. Health counters live here
//! and are updated by the resolver and the health service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::adapters::SelectorConfig;

pub mod errors;

pub use errors::{RetailerError, RetailerResult};

/// One retailer the engine aggregates prices from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retailer {
	/// Unique identifier for the retailer
	pub retailer_id: String,

	/// Human-readable name
	pub name: String,

	/// ISO currency code quotes from this retailer are denominated in
	pub currency: String,

	/// Whether a vendor API is available
	pub has_api: bool,

	/// Whether storefront scraping is allowed/possible
	pub has_scraper: bool,

	/// Adapter ids registered for this retailer, any capability
	pub adapter_ids: Vec<String>,

	/// Vendor API endpoint; `{product_id}` is substituted when present
	pub endpoint: Option<String>,

	/// Storefront URL template for scraping; `{product_id}` and `{barcode}`
	/// are substituted
	pub product_url_template: Option<String>,

	/// CSS selectors for page extraction
	pub selectors: Option<SelectorConfig>,

	/// Per-request timeout for this retailer in milliseconds
	pub timeout_ms: u64,

	/// Custom HTTP headers (API keys etc.)
	pub headers: Option<HashMap<String, String>>,

	/// How much the comparison trusts this retailer, 0.0 to 1.0
	pub trust_score: f64,

	/// Current operational status
	pub status: RetailerStatus,

	/// Health and performance counters
	pub metrics: RetailerMetrics,

	/// When the retailer was registered
	pub created_at: DateTime<Utc>,

	/// Last time any source call for this retailer succeeded
	pub last_seen: Option<DateTime<Utc>>,
}

/// Retailer operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetailerStatus {
	/// Retailer participates in aggregation
	Active,
	/// Retailer is switched off
	Inactive,
	/// Last health check failed
	Error,
	/// Temporarily excluded by an operator
	Maintenance,
}

/// Health counters for one retailer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailerMetrics {
	/// Successful source calls
	pub success_count: u64,

	/// Failed source calls
	pub error_count: u64,

	/// Failures since the last success
	pub consecutive_failures: u32,

	/// Exponential moving average of call latency in milliseconds
	pub avg_latency_ms: f64,

	/// Last health check outcome
	pub last_health_check: Option<DateTime<Utc>>,

	/// Last time the counters changed
	pub last_updated: DateTime<Utc>,
}

impl RetailerMetrics {
	pub fn new() -> Self {
		Self {
			success_count: 0,
			error_count: 0,
			consecutive_failures: 0,
			avg_latency_ms: 0.0,
			last_health_check: None,
			last_updated: Utc::now(),
		}
	}

	/// Record a successful source call and fold its latency into the average
	pub fn record_success(&mut self, latency_ms: u64) {
		self.success_count += 1;
		self.consecutive_failures = 0;
		if self.avg_latency_ms == 0.0 {
			self.avg_latency_ms = latency_ms as f64;
		} else {
			// Smoothing factor chosen so a few slow calls don't dominate
			self.avg_latency_ms = self.avg_latency_ms * 0.8 + latency_ms as f64 * 0.2;
		}
		self.last_updated = Utc::now();
	}

	/// Record a failed source call
	pub fn record_failure(&mut self) {
		self.error_count += 1;
		self.consecutive_failures += 1;
		self.last_updated = Utc::now();
	}
}

impl Default for RetailerMetrics {
	fn default() -> Self {
		Self::new()
	}
}

impl Retailer {
	/// Create a retailer with defaults for everything beyond identity
	pub fn new(retailer_id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			retailer_id: retailer_id.into(),
			name: name.into(),
			currency: "USD".to_string(),
			has_api: false,
			has_scraper: false,
			adapter_ids: Vec::new(),
			endpoint: None,
			product_url_template: None,
			selectors: None,
			timeout_ms: 5_000,
			headers: None,
			trust_score: 0.5,
			status: RetailerStatus::Active,
			metrics: RetailerMetrics::new(),
			created_at: Utc::now(),
			last_seen: None,
		}
	}

	/// Whether the retailer participates in aggregation
	pub fn is_active(&self) -> bool {
		self.status == RetailerStatus::Active
	}

	/// Validate capability flags against the configured sources
	pub fn validate(&self) -> RetailerResult<()> {
		if self.retailer_id.is_empty() {
			return Err(RetailerError::Validation(
				"retailer_id must not be empty".to_string(),
			));
		}
		if !self.has_api && !self.has_scraper {
			return Err(RetailerError::Validation(format!(
				"retailer '{}' has neither API nor scraper capability",
				self.retailer_id
			)));
		}
		if self.has_api && self.endpoint.is_none() {
			return Err(RetailerError::Validation(format!(
				"retailer '{}' declares an API but no endpoint",
				self.retailer_id
			)));
		}
		if self.has_scraper && self.product_url_template.is_none() {
			return Err(RetailerError::Validation(format!(
				"retailer '{}' declares a scraper but no product URL template",
				self.retailer_id
			)));
		}
		if !(0.0..=1.0).contains(&self.trust_score) {
			return Err(RetailerError::Validation(format!(
				"retailer '{}' trust score {} is outside 0.0..=1.0",
				self.retailer_id, self.trust_score
			)));
		}
		Ok(())
	}

	/// Resolve the storefront URL for a product from the template
	pub fn product_url(&self, product_id: &str, barcode: Option<&str>) -> Option<String> {
		self.product_url_template.as_ref().map(|template| {
			template
				.replace("{product_id}", product_id)
				.replace("{barcode}", barcode.unwrap_or_default())
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scraping_retailer() -> Retailer {
		let mut retailer = Retailer::new("ebay", "eBay");
		retailer.has_scraper = true;
		retailer.product_url_template = Some("https://ebay.example/itm/{product_id}".to_string());
		retailer
	}

	#[test]
	fn validate_rejects_capability_without_source() {
		let retailer = Retailer::new("r1", "No Source");
		assert!(retailer.validate().is_err());

		let mut api_only = Retailer::new("r2", "Api Without Endpoint");
		api_only.has_api = true;
		assert!(api_only.validate().is_err());

		assert!(scraping_retailer().validate().is_ok());
	}

	#[test]
	fn product_url_substitutes_placeholders() {
		let retailer = scraping_retailer();
		assert_eq!(
			retailer.product_url("p1", None).as_deref(),
			Some("https://ebay.example/itm/p1")
		);
	}

	#[test]
	fn metrics_track_consecutive_failures() {
		let mut metrics = RetailerMetrics::new();
		metrics.record_failure();
		metrics.record_failure();
		assert_eq!(metrics.consecutive_failures, 2);

		metrics.record_success(120);
		assert_eq!(metrics.consecutive_failures, 0);
		assert_eq!(metrics.success_count, 1);
		assert!(metrics.avg_latency_ms > 0.0);
	}
}
