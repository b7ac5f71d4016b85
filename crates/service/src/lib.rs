//! PricePulse Service
//!
//! The aggregation engine: per-retailer source resolution, concurrent price
//! fan-out with cache-aside reads, retailer health probing and the four
//! background job queues.

pub mod aggregator;
pub mod jobs;
pub mod resolver;
pub mod retailer;
pub mod scheduler;

pub use aggregator::{
	AggregationStats, AggregatorConfig, AggregatorService, AggregatorServiceError, AggregatorTrait,
};
pub use jobs::{
	BackgroundJob, BackgroundJobHandler, BrokerOptions, JobBroker, JobError, JobHandler, JobRecord,
	JobResult, JobState, LogNotifier, NoopRecognition, NotificationSender, QueueName, QueueOptions,
	QueueStats, RecognitionPipeline, UpdatePriority,
};
pub use resolver::SourceResolver;
pub use retailer::RetailerService;
