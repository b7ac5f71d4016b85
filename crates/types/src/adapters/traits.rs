//! Core adapter trait for source implementations

use async_trait::async_trait;
use std::fmt::Debug;

use super::{AdapterDescriptor, AdapterResult, PriceResult, RetailerContext, SourceKind};
use crate::products::Product;

/// One strategy for obtaining a price from a retailer
///
/// Implementations exist per vendor API and per scraping strategy. Custom
/// adapters implement this trait and register under their own id.
#[async_trait]
pub trait SourceAdapter: Send + Sync + Debug {
	/// Static adapter information; the only required accessor
	fn descriptor(&self) -> &AdapterDescriptor;

	/// Adapter id used for registration and retailer matching
	fn id(&self) -> &str {
		&self.descriptor().adapter_id
	}

	/// Which capability this adapter provides
	fn kind(&self) -> SourceKind {
		self.descriptor().kind
	}

	/// Fetch the current price for one product at one retailer
	async fn fetch_price(
		&self,
		product: &Product,
		ctx: &RetailerContext,
	) -> AdapterResult<PriceResult>;

	/// Probe whether the source answers at all
	async fn health_check(&self, ctx: &RetailerContext) -> AdapterResult<bool>;
}
