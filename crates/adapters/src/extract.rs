//! Shared extraction helpers for the scraping strategies
//!
//! Price text in the wild comes as "$1,299.99", "1.299,99 €", "79.99" and
//! worse; `parse_price` normalizes the common shapes. `extract_offer` applies
//! a retailer's CSS selectors to an HTML document.

use scraper::{Html, Selector};

use pricepulse_types::{AdapterError, AdapterResult, SelectorConfig, StockStatus};

/// What selector extraction recovered from one document
#[derive(Debug, Clone, PartialEq)]
pub struct RawOffer {
	pub price: f64,
	pub original_price: Option<f64>,
	pub stock: StockStatus,
}

/// Parse a price out of free-form text
///
/// Handles currency symbols, thousands separators and both decimal-comma and
/// decimal-point locales. Returns `None` when no digits survive.
pub fn parse_price(text: &str) -> Option<f64> {
	let cleaned: String = text
		.chars()
		.filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
		.collect();
	if cleaned.is_empty() {
		return None;
	}

	let last_dot = cleaned.rfind('.');
	let last_comma = cleaned.rfind(',');

	let normalized = match (last_dot, last_comma) {
		// Both present: the rightmost is the decimal separator
		(Some(dot), Some(comma)) => {
			if dot > comma {
				cleaned.replace(',', "")
			} else {
				cleaned.replace('.', "").replace(',', ".")
			}
		},
		// Comma only: decimal when it looks like one, thousands otherwise
		(None, Some(comma)) => {
			let decimals = cleaned.len() - comma - 1;
			if cleaned.matches(',').count() == 1 && decimals <= 2 {
				cleaned.replace(',', ".")
			} else {
				cleaned.replace(',', "")
			}
		},
		// Dot only: same heuristic
		(Some(dot), None) => {
			let decimals = cleaned.len() - dot - 1;
			if cleaned.matches('.').count() == 1 && decimals <= 2 {
				cleaned
			} else {
				cleaned.replace('.', "")
			}
		},
		(None, None) => cleaned,
	};

	normalized.parse::<f64>().ok().filter(|p| *p >= 0.0)
}

fn selector(raw: &str, url: &str) -> AdapterResult<Selector> {
	Selector::parse(raw).map_err(|e| AdapterError::Parse {
		url: url.to_string(),
		reason: format!("invalid selector '{}': {}", raw, e),
	})
}

/// Apply a retailer's selectors to an HTML document
pub fn extract_offer(html: &str, selectors: &SelectorConfig, url: &str) -> AdapterResult<RawOffer> {
	let document = Html::parse_document(html);

	let price_selector = selector(&selectors.price, url)?;
	let price_text = document
		.select(&price_selector)
		.next()
		.map(|el| el.text().collect::<String>())
		.ok_or_else(|| AdapterError::MissingPrice {
			url: url.to_string(),
		})?;
	let price = parse_price(&price_text).ok_or_else(|| AdapterError::Parse {
		url: url.to_string(),
		reason: format!("unparseable price text '{}'", price_text.trim()),
	})?;

	let original_price = match &selectors.original_price {
		Some(raw) => document
			.select(&selector(raw, url)?)
			.next()
			.map(|el| el.text().collect::<String>())
			.and_then(|text| parse_price(&text)),
		None => None,
	};

	// Availability selector present in the document means in stock; a
	// configured selector that matches nothing means out of stock
	let stock = match &selectors.availability {
		Some(raw) => {
			if document.select(&selector(raw, url)?).next().is_some() {
				StockStatus::InStock
			} else {
				StockStatus::OutOfStock
			}
		},
		None => StockStatus::Unknown,
	};

	Ok(RawOffer {
		price,
		original_price,
		stock,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_common_price_shapes() {
		assert_eq!(parse_price("$79.99"), Some(79.99));
		assert_eq!(parse_price("1,299.99"), Some(1299.99));
		assert_eq!(parse_price("1.299,99 €"), Some(1299.99));
		assert_eq!(parse_price("84,50"), Some(84.50));
		assert_eq!(parse_price("12.345"), Some(12345.0));
		assert_eq!(parse_price("129"), Some(129.0));
		assert_eq!(parse_price("free shipping"), None);
	}

	#[test]
	fn extracts_offer_with_availability() {
		let html = r#"
			<html><body>
				<span class="price">$84.50</span>
				<span class="was-price">$99.00</span>
				<div class="in-stock">In stock</div>
			</body></html>
		"#;
		let selectors = SelectorConfig {
			price: ".price".to_string(),
			availability: Some(".in-stock".to_string()),
			original_price: Some(".was-price".to_string()),
		};

		let offer = extract_offer(html, &selectors, "https://shop.example/p1").unwrap();
		assert_eq!(offer.price, 84.50);
		assert_eq!(offer.original_price, Some(99.00));
		assert_eq!(offer.stock, StockStatus::InStock);
	}

	#[test]
	fn missing_price_element_is_an_error() {
		let selectors = SelectorConfig {
			price: ".price".to_string(),
			availability: None,
			original_price: None,
		};
		let err = extract_offer("<html></html>", &selectors, "https://shop.example/p1")
			.expect_err("no price element");
		assert!(matches!(err, AdapterError::MissingPrice { .. }));
	}

	#[test]
	fn configured_availability_without_match_is_out_of_stock() {
		let html = r#"<span class="price">12.00</span>"#;
		let selectors = SelectorConfig {
			price: ".price".to_string(),
			availability: Some(".in-stock".to_string()),
			original_price: None,
		};
		let offer = extract_offer(html, &selectors, "https://shop.example/p1").unwrap();
		assert_eq!(offer.stock, StockStatus::OutOfStock);
	}
}
