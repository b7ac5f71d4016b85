//! The four background queues behind one facade
//!
//! Each queue gets its own worker pool and retry policy; the broker routes
//! jobs by their variant and fans observability out over all four.

use std::sync::Arc;
use std::time::Duration;

use super::queue::{JobHandler, JobQueue, QueuePolicy, QueueStats};
use super::types::{BackgroundJob, JobRecord, JobResult, QueueName, UpdatePriority};

/// Worker and capacity tuning for one queue, supplied by configuration
#[derive(Debug, Clone)]
pub struct QueueOptions {
	pub workers: usize,
	pub capacity: usize,
	pub retention: Duration,
	pub max_records: usize,
}

impl Default for QueueOptions {
	fn default() -> Self {
		Self {
			workers: 2,
			capacity: 1_000,
			retention: Duration::from_secs(3_600),
			max_records: 10_000,
		}
	}
}

/// Tuning for all four queues
#[derive(Debug, Clone, Default)]
pub struct BrokerOptions {
	pub price_updates: QueueOptions,
	pub image_recognition: QueueOptions,
	pub scraping: QueueOptions,
	pub notifications: QueueOptions,
}

fn policy(name: QueueName, options: QueueOptions) -> QueuePolicy {
	// Retry posture is fixed per queue: scrapes are flaky and get patient
	// retries, recognition is expensive and gives up early
	let (max_attempts, backoff_base) = match name {
		QueueName::PriceUpdates => (3, Duration::from_secs(2)),
		QueueName::ImageRecognition => (2, Duration::from_secs(1)),
		QueueName::Scraping => (5, Duration::from_secs(5)),
		QueueName::Notifications => (3, Duration::from_secs(1)),
	};
	QueuePolicy {
		name,
		workers: options.workers,
		capacity: options.capacity,
		max_attempts,
		backoff_base,
		retention: options.retention,
		max_records: options.max_records,
	}
}

/// Routes background jobs to their queue
pub struct JobBroker {
	price_updates: JobQueue,
	image_recognition: JobQueue,
	scraping: JobQueue,
	notifications: JobQueue,
}

impl JobBroker {
	/// Start all four queues against one shared handler
	pub fn start(options: BrokerOptions, handler: Arc<dyn JobHandler>) -> Self {
		Self {
			price_updates: JobQueue::start(
				policy(QueueName::PriceUpdates, options.price_updates),
				Arc::clone(&handler),
			),
			image_recognition: JobQueue::start(
				policy(QueueName::ImageRecognition, options.image_recognition),
				Arc::clone(&handler),
			),
			scraping: JobQueue::start(
				policy(QueueName::Scraping, options.scraping),
				Arc::clone(&handler),
			),
			notifications: JobQueue::start(
				policy(QueueName::Notifications, options.notifications),
				handler,
			),
		}
	}

	fn queue_for(&self, name: QueueName) -> &JobQueue {
		match name {
			QueueName::PriceUpdates => &self.price_updates,
			QueueName::ImageRecognition => &self.image_recognition,
			QueueName::Scraping => &self.scraping,
			QueueName::Notifications => &self.notifications,
		}
	}

	/// Enqueue any job on its queue
	pub async fn enqueue(&self, job: BackgroundJob) -> JobResult<String> {
		self.queue_for(job.queue()).enqueue(job).await
	}

	pub async fn enqueue_price_update(
		&self,
		product_id: impl Into<String>,
		retailer_id: impl Into<String>,
		priority: UpdatePriority,
	) -> JobResult<String> {
		self.enqueue(BackgroundJob::PriceUpdate {
			product_id: product_id.into(),
			retailer_id: retailer_id.into(),
			priority,
		})
		.await
	}

	pub async fn enqueue_image_recognition(
		&self,
		scan_id: impl Into<String>,
	) -> JobResult<String> {
		self.enqueue(BackgroundJob::ImageRecognition {
			scan_id: scan_id.into(),
		})
		.await
	}

	pub async fn enqueue_scraping(
		&self,
		retailer_id: impl Into<String>,
		product_id: impl Into<String>,
		product_url: Option<String>,
	) -> JobResult<String> {
		self.enqueue(BackgroundJob::Scrape {
			retailer_id: retailer_id.into(),
			product_id: product_id.into(),
			product_url,
		})
		.await
	}

	pub async fn enqueue_notification(
		&self,
		user_id: impl Into<String>,
		title: impl Into<String>,
		body: impl Into<String>,
	) -> JobResult<String> {
		self.enqueue(BackgroundJob::Notification {
			user_id: user_id.into(),
			title: title.into(),
			body: body.into(),
		})
		.await
	}

	/// Look a job up across all queues
	pub async fn job(&self, job_id: &str) -> Option<JobRecord> {
		for name in QueueName::ALL {
			if let Some(record) = self.queue_for(name).job(job_id).await {
				return Some(record);
			}
		}
		None
	}

	/// Stats for all four queues, in `QueueName::ALL` order
	pub async fn stats(&self) -> Vec<QueueStats> {
		let mut stats = Vec::with_capacity(QueueName::ALL.len());
		for name in QueueName::ALL {
			stats.push(self.queue_for(name).stats().await);
		}
		stats
	}

	/// Shut every queue down and join their workers
	pub async fn shutdown(&self) {
		for name in QueueName::ALL {
			self.queue_for(name).shutdown().await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::jobs::types::JobState;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct CountingHandler {
		calls: AtomicUsize,
	}

	#[async_trait]
	impl JobHandler for CountingHandler {
		async fn handle(&self, _job: BackgroundJob) -> JobResult<()> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}
	}

	#[tokio::test]
	async fn jobs_land_on_their_own_queue() {
		let handler = Arc::new(CountingHandler {
			calls: AtomicUsize::new(0),
		});
		let broker = JobBroker::start(BrokerOptions::default(), handler);

		let scrape_id = broker
			.enqueue_scraping("ebay", "p1", None)
			.await
			.unwrap();
		let recognition_id = broker.enqueue_image_recognition("scan-1").await.unwrap();

		let scrape = broker.job(&scrape_id).await.expect("scrape record");
		assert_eq!(scrape.queue, QueueName::Scraping);
		let recognition = broker.job(&recognition_id).await.expect("recognition record");
		assert_eq!(recognition.queue, QueueName::ImageRecognition);

		broker.shutdown().await;
	}

	#[tokio::test]
	async fn stats_cover_all_queues() {
		let handler = Arc::new(CountingHandler {
			calls: AtomicUsize::new(0),
		});
		let broker = JobBroker::start(BrokerOptions::default(), handler.clone());

		let job_id = broker
			.enqueue_price_update("p1", "amazon", UpdatePriority::High)
			.await
			.unwrap();
		for _ in 0..200 {
			if handler.calls.load(Ordering::SeqCst) == 1 {
				break;
			}
			tokio::time::sleep(std::time::Duration::from_millis(10)).await;
		}
		broker.shutdown().await;

		let record = broker.job(&job_id).await.expect("record kept");
		assert_eq!(record.state, JobState::Completed);

		let stats = broker.stats().await;
		assert_eq!(stats.len(), 4);
		assert_eq!(stats[0].queue, QueueName::PriceUpdates);
		assert_eq!(stats[0].completed, 1);
	}
}
