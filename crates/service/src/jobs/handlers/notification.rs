//! Notification delivery seam
//!
//! Deliveries go out through whatever channel the deployment wires in; the
//! default implementation logs instead of sending.

use async_trait::async_trait;
use tracing::info;

use crate::jobs::types::JobResult;

/// Delivers one user-facing notification
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSender: Send + Sync {
	async fn send(&self, user_id: &str, title: &str, body: &str) -> JobResult<()>;
}

/// Sender stand-in that logs the delivery
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
	async fn send(&self, user_id: &str, title: &str, body: &str) -> JobResult<()> {
		info!(%user_id, %title, %body, "notification delivered to log");
		Ok(())
	}
}
