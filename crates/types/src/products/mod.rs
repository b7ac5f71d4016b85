//! Catalogued product model
//!
//! Products are owned by the catalog collaborator and read-only to the
//! aggregation core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalogued product the engine aggregates prices for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
	/// Unique identifier assigned by the catalog
	pub product_id: String,

	/// Canonical display name
	pub name: String,

	/// Brand, when known
	pub brand: Option<String>,

	/// Catalog category
	pub category: Option<String>,

	/// EAN/UPC barcode, when the product was registered from a scan
	pub barcode: Option<String>,

	/// Canonical product image
	pub image_url: Option<String>,

	/// When the product entered the catalog
	pub created_at: DateTime<Utc>,
}

impl Product {
	/// Create a product with just the required identity fields
	pub fn new(product_id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			product_id: product_id.into(),
			name: name.into(),
			brand: None,
			category: None,
			barcode: None,
			image_url: None,
			created_at: Utc::now(),
		}
	}
}
