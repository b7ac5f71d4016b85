//! Error types for retailer operations

use thiserror::Error;

/// Retailer-related errors
#[derive(Debug, Error)]
pub enum RetailerError {
	#[error("retailer not found: {retailer_id}")]
	NotFound { retailer_id: String },

	#[error("retailer validation failed: {0}")]
	Validation(String),

	#[error("storage error: {0}")]
	Storage(String),
}

pub type RetailerResult<T> = Result<T, RetailerError>;
