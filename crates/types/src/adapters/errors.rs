//! Error types for source adapters
//!
//! `NotConfigured` is the "source unavailable" case and is skipped quietly by
//! the resolver; everything else is a source error that excludes the retailer
//! from the current aggregate without propagating.

use thiserror::Error;

/// Errors a source adapter can produce
#[derive(Debug, Error)]
pub enum AdapterError {
	#[error("adapter '{adapter_id}' is not configured for retailer '{retailer_id}': {reason}")]
	NotConfigured {
		adapter_id: String,
		retailer_id: String,
		reason: String,
	},

	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("request to '{url}' timed out after {timeout_ms}ms")]
	Timeout { url: String, timeout_ms: u64 },

	#[error("'{url}' answered with status {status}")]
	HttpStatus { status: u16, url: String },

	#[error("failed to parse response from '{url}': {reason}")]
	Parse { url: String, reason: String },

	#[error("no price found in document from '{url}'")]
	MissingPrice { url: String },

	#[error("unsupported adapter type: {0}")]
	UnsupportedAdapter(String),
}

impl AdapterError {
	/// Whether the resolver should treat this as "source unavailable" rather
	/// than a real failure
	pub fn is_unconfigured(&self) -> bool {
		matches!(self, AdapterError::NotConfigured { .. })
	}
}

pub type AdapterResult<T> = Result<T, AdapterError>;
