//! Asynchronous background job orchestration
//!
//! Four queues with distinct priority, delay, dedup and retry policies:
//! price updates, image recognition, scraping and notifications.

pub mod broker;
pub mod handlers;
pub mod queue;
pub mod types;

pub use broker::{BrokerOptions, JobBroker, QueueOptions};
pub use handlers::{
	BackgroundJobHandler, LogNotifier, NoopRecognition, NotificationSender, RecognitionPipeline,
};
pub use queue::{JobHandler, JobQueue, QueuePolicy, QueueStats};
pub use types::{
	BackgroundJob, JobError, JobRecord, JobResult, JobState, QueueName, UpdatePriority,
};
