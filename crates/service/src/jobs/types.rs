//! Background job definitions and per-job policies
//!
//! Each job variant belongs to exactly one queue and carries its own
//! priority, initial delay and deduplication key. The queue machinery is
//! policy-free; everything job-specific lives here.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four background queues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueName {
	PriceUpdates,
	ImageRecognition,
	Scraping,
	Notifications,
}

impl QueueName {
	pub fn as_str(&self) -> &'static str {
		match self {
			QueueName::PriceUpdates => "price-updates",
			QueueName::ImageRecognition => "image-recognition",
			QueueName::Scraping => "scraping",
			QueueName::Notifications => "notifications",
		}
	}

	pub const ALL: [QueueName; 4] = [
		QueueName::PriceUpdates,
		QueueName::ImageRecognition,
		QueueName::Scraping,
		QueueName::Notifications,
	];
}

impl std::fmt::Display for QueueName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Urgency of a price update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePriority {
	/// User is looking at the product right now
	High,
	/// Scheduled refresh
	Medium,
	/// Backfill
	Low,
}

/// One unit of background work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BackgroundJob {
	PriceUpdate {
		product_id: String,
		retailer_id: String,
		priority: UpdatePriority,
	},
	ImageRecognition {
		scan_id: String,
	},
	Scrape {
		retailer_id: String,
		product_id: String,
		product_url: Option<String>,
	},
	Notification {
		user_id: String,
		title: String,
		body: String,
	},
}

impl BackgroundJob {
	/// Which queue this job belongs to
	pub fn queue(&self) -> QueueName {
		match self {
			BackgroundJob::PriceUpdate { .. } => QueueName::PriceUpdates,
			BackgroundJob::ImageRecognition { .. } => QueueName::ImageRecognition,
			BackgroundJob::Scrape { .. } => QueueName::Scraping,
			BackgroundJob::Notification { .. } => QueueName::Notifications,
		}
	}

	/// Scheduling priority; higher runs first among ready jobs
	pub fn priority(&self) -> u8 {
		match self {
			BackgroundJob::PriceUpdate { priority, .. } => match priority {
				UpdatePriority::High => 10,
				UpdatePriority::Medium => 5,
				UpdatePriority::Low => 1,
			},
			BackgroundJob::ImageRecognition { .. } => 10,
			BackgroundJob::Scrape { .. } => 5,
			BackgroundJob::Notification { .. } => 3,
		}
	}

	/// Delay before the job becomes ready to run
	///
	/// Scrapes get a random jitter so bursts against one retailer spread out.
	pub fn initial_delay(&self) -> Duration {
		match self {
			BackgroundJob::PriceUpdate { priority, .. } => match priority {
				UpdatePriority::High => Duration::ZERO,
				UpdatePriority::Medium => Duration::from_secs(5),
				UpdatePriority::Low => Duration::from_secs(30),
			},
			BackgroundJob::ImageRecognition { .. } => Duration::ZERO,
			BackgroundJob::Scrape { .. } => {
				Duration::from_millis(rand::thread_rng().gen_range(0..10_000))
			},
			BackgroundJob::Notification { .. } => Duration::from_secs(1),
		}
	}

	/// Key under which concurrent duplicates coalesce
	///
	/// Notifications are never coalesced; their key embeds the enqueue
	/// instant.
	pub fn dedup_key(&self) -> String {
		match self {
			BackgroundJob::PriceUpdate {
				product_id,
				retailer_id,
				..
			} => format!("price-update:{product_id}:{retailer_id}"),
			BackgroundJob::ImageRecognition { scan_id } => {
				format!("image-recognition:{scan_id}")
			},
			BackgroundJob::Scrape {
				retailer_id,
				product_id,
				..
			} => format!("scraping:{retailer_id}:{product_id}"),
			BackgroundJob::Notification { user_id, .. } => {
				format!("notification:{user_id}:{}", Utc::now().timestamp_millis())
			},
		}
	}

	/// Short human description for logs and job records
	pub fn description(&self) -> String {
		match self {
			BackgroundJob::PriceUpdate {
				product_id,
				retailer_id,
				..
			} => format!("price update for {product_id} at {retailer_id}"),
			BackgroundJob::ImageRecognition { scan_id } => {
				format!("image recognition for scan {scan_id}")
			},
			BackgroundJob::Scrape {
				retailer_id,
				product_id,
				..
			} => format!("scrape of {product_id} at {retailer_id}"),
			BackgroundJob::Notification { user_id, .. } => {
				format!("notification to {user_id}")
			},
		}
	}
}

/// Errors from the queue machinery and job handlers
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobError {
	#[error("queue '{0}' is at capacity")]
	QueueFull(QueueName),

	#[error("queue '{0}' is shut down")]
	QueueClosed(QueueName),

	#[error("job failed: {0}")]
	Failed(String),

	#[error("job panicked: {0}")]
	Panicked(String),
}

pub type JobResult<T> = Result<T, JobError>;

/// Lifecycle of one enqueued job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum JobState {
	Queued,
	Active,
	Completed,
	Retrying { attempt: u32, last_error: String },
	Exhausted { error: String },
}

impl JobState {
	/// Whether the job can still run
	pub fn is_live(&self) -> bool {
		matches!(
			self,
			JobState::Queued | JobState::Active | JobState::Retrying { .. }
		)
	}
}

/// Observable record of one enqueued job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
	pub job_id: String,
	pub queue: QueueName,
	pub description: String,
	pub state: JobState,
	pub attempts: u32,
	pub enqueued_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn jobs_route_to_their_queue() {
		let update = BackgroundJob::PriceUpdate {
			product_id: "p1".to_string(),
			retailer_id: "amazon".to_string(),
			priority: UpdatePriority::High,
		};
		assert_eq!(update.queue(), QueueName::PriceUpdates);
		assert_eq!(update.priority(), 10);
		assert_eq!(update.initial_delay(), Duration::ZERO);
		assert_eq!(update.dedup_key(), "price-update:p1:amazon");
	}

	#[test]
	fn low_priority_updates_are_delayed() {
		let job = BackgroundJob::PriceUpdate {
			product_id: "p1".to_string(),
			retailer_id: "amazon".to_string(),
			priority: UpdatePriority::Low,
		};
		assert_eq!(job.priority(), 1);
		assert_eq!(job.initial_delay(), Duration::from_secs(30));
	}

	#[test]
	fn scrape_delay_is_jittered_within_bounds() {
		let job = BackgroundJob::Scrape {
			retailer_id: "ebay".to_string(),
			product_id: "p1".to_string(),
			product_url: None,
		};
		for _ in 0..32 {
			assert!(job.initial_delay() < Duration::from_secs(10));
		}
	}

	#[test]
	fn notification_keys_never_coalesce() {
		let job = BackgroundJob::Notification {
			user_id: "u1".to_string(),
			title: "Price drop".to_string(),
			body: "Now 79.99".to_string(),
		};
		// Keys taken across an elapsed millisecond differ
		let first = job.dedup_key();
		std::thread::sleep(Duration::from_millis(2));
		assert_ne!(first, job.dedup_key());
	}

	#[test]
	fn terminal_states_are_not_live() {
		assert!(JobState::Queued.is_live());
		assert!(JobState::Retrying {
			attempt: 1,
			last_error: "boom".to_string()
		}
		.is_live());
		assert!(!JobState::Completed.is_live());
		assert!(!JobState::Exhausted {
			error: "boom".to_string()
		}
		.is_live());
	}
}
