//! Image recognition pipeline seam
//!
//! Barcode scans are processed by an external pipeline; the job system only
//! needs the seam. The default implementation acknowledges and logs.

use async_trait::async_trait;
use tracing::info;

use crate::jobs::types::JobResult;

/// Processes one submitted barcode/label scan
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecognitionPipeline: Send + Sync {
	async fn process(&self, scan_id: &str) -> JobResult<()>;
}

/// Pipeline stand-in that only logs the scan
#[derive(Debug, Default)]
pub struct NoopRecognition;

#[async_trait]
impl RecognitionPipeline for NoopRecognition {
	async fn process(&self, scan_id: &str) -> JobResult<()> {
		info!(%scan_id, "no recognition pipeline configured, scan acknowledged");
		Ok(())
	}
}
