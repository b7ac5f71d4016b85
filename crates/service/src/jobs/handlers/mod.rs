//! Job dispatch into the domain services

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::aggregator::AggregatorTrait;
use crate::jobs::queue::JobHandler;
use crate::jobs::types::{BackgroundJob, JobError, JobResult};

pub mod notification;
pub mod recognition;

pub use notification::{LogNotifier, NotificationSender};
pub use recognition::{NoopRecognition, RecognitionPipeline};

/// The one handler shared by all four queues
///
/// Price updates and scrapes go through the aggregator; recognition and
/// notification delegate to their pluggable seams.
pub struct BackgroundJobHandler {
	aggregator: Arc<dyn AggregatorTrait>,
	recognition: Arc<dyn RecognitionPipeline>,
	notifier: Arc<dyn NotificationSender>,
}

impl BackgroundJobHandler {
	pub fn new(
		aggregator: Arc<dyn AggregatorTrait>,
		recognition: Arc<dyn RecognitionPipeline>,
		notifier: Arc<dyn NotificationSender>,
	) -> Self {
		Self {
			aggregator,
			recognition,
			notifier,
		}
	}
}

#[async_trait]
impl JobHandler for BackgroundJobHandler {
	async fn handle(&self, job: BackgroundJob) -> JobResult<()> {
		match job {
			BackgroundJob::PriceUpdate {
				product_id,
				retailer_id,
				..
			} => {
				let quote = self
					.aggregator
					.refresh_pair(&product_id, &retailer_id)
					.await
					.map_err(|e| JobError::Failed(e.to_string()))?;
				debug!(
					%product_id,
					%retailer_id,
					price = quote.price,
					"price update job refreshed the pair"
				);
				Ok(())
			},
			BackgroundJob::Scrape {
				retailer_id,
				product_id,
				product_url,
			} => {
				let quote = self
					.aggregator
					.scrape_one(&product_id, &retailer_id, product_url.as_deref())
					.await
					.map_err(|e| JobError::Failed(e.to_string()))?;
				debug!(
					%product_id,
					%retailer_id,
					price = quote.price,
					"scraping job stored a fresh quote"
				);
				Ok(())
			},
			BackgroundJob::ImageRecognition { scan_id } => {
				self.recognition.process(&scan_id).await
			},
			BackgroundJob::Notification {
				user_id,
				title,
				body,
			} => self.notifier.send(&user_id, &title, &body).await,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::aggregator::{AggregationStats, AggregatorServiceError};
	use crate::jobs::types::UpdatePriority;
	use notification::MockNotificationSender;
	use pricepulse_types::{ComparisonResult, PriceQuote, QuoteSource};
	use recognition::MockRecognitionPipeline;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct StubAggregator {
		refreshes: AtomicUsize,
		scrapes: AtomicUsize,
		fail: bool,
	}

	impl StubAggregator {
		fn new(fail: bool) -> Arc<Self> {
			Arc::new(Self {
				refreshes: AtomicUsize::new(0),
				scrapes: AtomicUsize::new(0),
				fail,
			})
		}

		fn quote() -> PriceQuote {
			PriceQuote::new("p1", "amazon", 79.99, "USD", QuoteSource::Api)
		}
	}

	#[async_trait]
	impl AggregatorTrait for StubAggregator {
		async fn get_comparison(
			&self,
			product_id: &str,
		) -> Result<ComparisonResult, AggregatorServiceError> {
			Ok(ComparisonResult::from_quotes(product_id, Vec::new()))
		}

		async fn refresh_pair(
			&self,
			product_id: &str,
			retailer_id: &str,
		) -> Result<PriceQuote, AggregatorServiceError> {
			self.refreshes.fetch_add(1, Ordering::SeqCst);
			if self.fail {
				return Err(AggregatorServiceError::NoQuote {
					product_id: product_id.to_string(),
					retailer_id: retailer_id.to_string(),
				});
			}
			Ok(Self::quote())
		}

		async fn scrape_one(
			&self,
			_product_id: &str,
			_retailer_id: &str,
			_url_override: Option<&str>,
		) -> Result<PriceQuote, AggregatorServiceError> {
			self.scrapes.fetch_add(1, Ordering::SeqCst);
			Ok(Self::quote())
		}

		fn stats(&self) -> AggregationStats {
			AggregationStats::default()
		}
	}

	fn handler(aggregator: Arc<StubAggregator>) -> BackgroundJobHandler {
		BackgroundJobHandler::new(
			aggregator,
			Arc::new(NoopRecognition),
			Arc::new(LogNotifier),
		)
	}

	#[tokio::test]
	async fn price_update_jobs_refresh_through_the_aggregator() {
		let aggregator = StubAggregator::new(false);
		let handler = handler(Arc::clone(&aggregator));

		handler
			.handle(BackgroundJob::PriceUpdate {
				product_id: "p1".to_string(),
				retailer_id: "amazon".to_string(),
				priority: UpdatePriority::High,
			})
			.await
			.unwrap();
		assert_eq!(aggregator.refreshes.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn aggregator_failures_surface_as_job_failures() {
		let aggregator = StubAggregator::new(true);
		let handler = handler(aggregator);

		let err = handler
			.handle(BackgroundJob::PriceUpdate {
				product_id: "p1".to_string(),
				retailer_id: "amazon".to_string(),
				priority: UpdatePriority::High,
			})
			.await
			.unwrap_err();
		assert!(matches!(err, JobError::Failed(_)));
	}

	#[tokio::test]
	async fn scrape_jobs_use_the_scrape_path() {
		let aggregator = StubAggregator::new(false);
		let handler = handler(Arc::clone(&aggregator));

		handler
			.handle(BackgroundJob::Scrape {
				retailer_id: "ebay".to_string(),
				product_id: "p1".to_string(),
				product_url: Some("https://ebay.example/itm/p1".to_string()),
			})
			.await
			.unwrap();
		assert_eq!(aggregator.scrapes.load(Ordering::SeqCst), 1);
		assert_eq!(aggregator.refreshes.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn recognition_jobs_reach_the_pipeline() {
		let mut pipeline = MockRecognitionPipeline::new();
		pipeline
			.expect_process()
			.withf(|scan_id| scan_id == "scan-7")
			.times(1)
			.returning(|_| Ok(()));

		let handler = BackgroundJobHandler::new(
			StubAggregator::new(false),
			Arc::new(pipeline),
			Arc::new(LogNotifier),
		);
		handler
			.handle(BackgroundJob::ImageRecognition {
				scan_id: "scan-7".to_string(),
			})
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn notification_jobs_reach_the_sender() {
		let mut sender = MockNotificationSender::new();
		sender
			.expect_send()
			.withf(|user, title, _| user == "u1" && title == "Price drop")
			.times(1)
			.returning(|_, _, _| Ok(()));

		let handler = BackgroundJobHandler::new(
			StubAggregator::new(false),
			Arc::new(NoopRecognition),
			Arc::new(sender),
		);
		handler
			.handle(BackgroundJob::Notification {
				user_id: "u1".to_string(),
				title: "Price drop".to_string(),
				body: "Now 79.99".to_string(),
			})
			.await
			.unwrap();
	}
}
