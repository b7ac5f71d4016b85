//! Priority queue with delayed readiness, retries and deduplication
//!
//! One `JobQueue` owns a pool of workers draining a shared pending list.
//! Ready jobs run highest-priority first, ties broken by enqueue order.
//! Failures retry with exponential backoff up to the queue's attempt limit;
//! panics inside handlers are caught and treated as failures so one bad job
//! never takes a worker down.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::types::{BackgroundJob, JobError, JobRecord, JobResult, JobState, QueueName};

/// Handles jobs pulled off a queue
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
	async fn handle(&self, job: BackgroundJob) -> JobResult<()>;
}

/// Fixed policy of one queue
#[derive(Debug, Clone)]
pub struct QueuePolicy {
	pub name: QueueName,

	/// Concurrent workers draining the queue
	pub workers: usize,

	/// Maximum pending jobs before enqueues are rejected
	pub capacity: usize,

	/// Total attempts per job, first run included
	pub max_attempts: u32,

	/// Base retry delay; doubles per attempt
	pub backoff_base: Duration,

	/// How long terminal job records stay observable
	pub retention: Duration,

	/// Upper bound on tracked job records; terminal records are evicted
	/// oldest-first once it is exceeded
	pub max_records: usize,
}

/// Point-in-time counters for one queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
	pub queue: QueueName,
	pub pending: usize,
	pub active: u64,
	pub completed: u64,
	pub retried: u64,
	pub exhausted: u64,
	pub coalesced: u64,
	pub tracked_records: usize,
}

struct PendingJob {
	seq: u64,
	job_id: String,
	job: BackgroundJob,
	dedup_key: String,
	priority: u8,
	ready_at: Instant,
	attempt: u32,
}

struct Shared {
	policy: QueuePolicy,
	pending: Mutex<Vec<PendingJob>>,
	dedup: Mutex<HashMap<String, String>>,
	records: RwLock<HashMap<String, JobRecord>>,
	notify: Notify,
	seq: AtomicU64,
	shutdown: AtomicBool,
	active: AtomicU64,
	completed: AtomicU64,
	retried: AtomicU64,
	exhausted: AtomicU64,
	coalesced: AtomicU64,
}

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One background queue with its worker pool
pub struct JobQueue {
	shared: Arc<Shared>,
	workers: Mutex<Vec<JoinHandle<()>>>,
	sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl JobQueue {
	/// Start the queue's workers and retention sweeper
	pub fn start(policy: QueuePolicy, handler: Arc<dyn JobHandler>) -> Self {
		let shared = Arc::new(Shared {
			policy,
			pending: Mutex::new(Vec::new()),
			dedup: Mutex::new(HashMap::new()),
			records: RwLock::new(HashMap::new()),
			notify: Notify::new(),
			seq: AtomicU64::new(0),
			shutdown: AtomicBool::new(false),
			active: AtomicU64::new(0),
			completed: AtomicU64::new(0),
			retried: AtomicU64::new(0),
			exhausted: AtomicU64::new(0),
			coalesced: AtomicU64::new(0),
		});

		let worker_count = shared.policy.workers.max(1);
		let mut workers = Vec::with_capacity(worker_count);
		for worker_id in 0..worker_count {
			let shared = Arc::clone(&shared);
			let handler = Arc::clone(&handler);
			workers.push(tokio::spawn(worker_loop(shared, handler, worker_id)));
		}

		let sweeper = tokio::spawn(retention_loop(Arc::clone(&shared)));

		info!(
			queue = %shared.policy.name,
			workers = worker_count,
			"queue started"
		);

		Self {
			shared,
			workers: Mutex::new(workers),
			sweeper: Mutex::new(Some(sweeper)),
		}
	}

	/// Enqueue a job, coalescing onto a live duplicate when one exists
	///
	/// Returns the job id to watch, which is the existing job's id in the
	/// coalesced case.
	pub async fn enqueue(&self, job: BackgroundJob) -> JobResult<String> {
		let shared = &self.shared;
		if shared.shutdown.load(Ordering::SeqCst) {
			return Err(JobError::QueueClosed(shared.policy.name));
		}

		let dedup_key = job.dedup_key();
		let mut dedup = shared.dedup.lock().await;
		if let Some(existing) = dedup.get(&dedup_key) {
			let live = shared
				.records
				.read()
				.await
				.get(existing)
				.map(|record| record.state.is_live())
				.unwrap_or(false);
			if live {
				shared.coalesced.fetch_add(1, Ordering::Relaxed);
				debug!(
					queue = %shared.policy.name,
					job_id = %existing,
					%dedup_key,
					"coalesced duplicate job"
				);
				return Ok(existing.clone());
			}
		}

		let mut pending = shared.pending.lock().await;
		if pending.len() >= shared.policy.capacity {
			warn!(
				queue = %shared.policy.name,
				capacity = shared.policy.capacity,
				"rejecting enqueue, queue at capacity"
			);
			return Err(JobError::QueueFull(shared.policy.name));
		}

		let job_id = Uuid::new_v4().to_string();
		let now = Utc::now();
		let record = JobRecord {
			job_id: job_id.clone(),
			queue: shared.policy.name,
			description: job.description(),
			state: JobState::Queued,
			attempts: 0,
			enqueued_at: now,
			updated_at: now,
		};
		{
			let mut records = shared.records.write().await;
			records.insert(job_id.clone(), record);
			evict_over_bound(&mut records, shared.policy.max_records, shared.policy.name);
		}
		dedup.insert(dedup_key.clone(), job_id.clone());

		let delay = job.initial_delay();
		pending.push(PendingJob {
			seq: shared.seq.fetch_add(1, Ordering::Relaxed),
			job_id: job_id.clone(),
			priority: job.priority(),
			ready_at: Instant::now() + delay,
			attempt: 0,
			dedup_key,
			job,
		});
		drop(pending);
		drop(dedup);

		shared.notify.notify_one();
		Ok(job_id)
	}

	/// Look up the observable record of one job
	pub async fn job(&self, job_id: &str) -> Option<JobRecord> {
		self.shared.records.read().await.get(job_id).cloned()
	}

	pub async fn stats(&self) -> QueueStats {
		let shared = &self.shared;
		QueueStats {
			queue: shared.policy.name,
			pending: shared.pending.lock().await.len(),
			active: shared.active.load(Ordering::Relaxed),
			completed: shared.completed.load(Ordering::Relaxed),
			retried: shared.retried.load(Ordering::Relaxed),
			exhausted: shared.exhausted.load(Ordering::Relaxed),
			coalesced: shared.coalesced.load(Ordering::Relaxed),
			tracked_records: shared.records.read().await.len(),
		}
	}

	/// Stop accepting jobs, drain what is ready and join the workers
	pub async fn shutdown(&self) {
		self.shared.shutdown.store(true, Ordering::SeqCst);
		self.shared.notify.notify_waiters();

		if let Some(sweeper) = self.sweeper.lock().await.take() {
			sweeper.abort();
		}

		let workers: Vec<JoinHandle<()>> = self.workers.lock().await.drain(..).collect();
		for worker in workers {
			let _ = worker.await;
		}
		info!(queue = %self.shared.policy.name, "queue shut down");
	}
}

enum Next {
	Job(PendingJob),
	Wait(Option<Instant>),
}

async fn worker_loop(shared: Arc<Shared>, handler: Arc<dyn JobHandler>, worker_id: usize) {
	loop {
		let next = {
			let mut pending = shared.pending.lock().await;
			let now = Instant::now();
			let mut best: Option<usize> = None;
			for (index, candidate) in pending.iter().enumerate() {
				if candidate.ready_at > now {
					continue;
				}
				best = match best {
					None => Some(index),
					Some(current) => {
						let cur = &pending[current];
						let better = candidate.priority > cur.priority
							|| (candidate.priority == cur.priority && candidate.seq < cur.seq);
						if better {
							Some(index)
						} else {
							Some(current)
						}
					},
				};
			}
			match best {
				Some(index) => Next::Job(pending.swap_remove(index)),
				None => Next::Wait(pending.iter().map(|p| p.ready_at).min()),
			}
		};

		match next {
			Next::Job(pending_job) => run_job(&shared, handler.as_ref(), pending_job).await,
			Next::Wait(deadline) => {
				if shared.shutdown.load(Ordering::SeqCst) {
					break;
				}
				// Bounded fallback sleep covers the enqueue/notify race
				let until = deadline
					.unwrap_or_else(|| Instant::now() + Duration::from_secs(1));
				tokio::select! {
					_ = shared.notify.notified() => {},
					_ = tokio::time::sleep_until(until) => {},
				}
			},
		}
	}
	debug!(queue = %shared.policy.name, worker_id, "worker stopped");
}

async fn run_job(shared: &Arc<Shared>, handler: &dyn JobHandler, pending: PendingJob) {
	let attempt = pending.attempt + 1;
	update_record(shared, &pending.job_id, |record| {
		record.state = JobState::Active;
		record.attempts = attempt;
	})
	.await;
	shared.active.fetch_add(1, Ordering::Relaxed);
	debug!(
		queue = %shared.policy.name,
		job_id = %pending.job_id,
		attempt,
		"executing {}",
		pending.job.description()
	);

	let outcome = AssertUnwindSafe(handler.handle(pending.job.clone()))
		.catch_unwind()
		.await;
	shared.active.fetch_sub(1, Ordering::Relaxed);

	let failure = match outcome {
		Ok(Ok(())) => None,
		Ok(Err(e)) => Some(e.to_string()),
		Err(panic) => {
			let message = panic
				.downcast_ref::<&str>()
				.map(|s| s.to_string())
				.or_else(|| panic.downcast_ref::<String>().cloned())
				.unwrap_or_else(|| "unknown panic".to_string());
			error!(
				queue = %shared.policy.name,
				job_id = %pending.job_id,
				"job handler panicked: {message}"
			);
			Some(format!("panic: {message}"))
		},
	};

	match failure {
		None => {
			update_record(shared, &pending.job_id, |record| {
				record.state = JobState::Completed;
			})
			.await;
			shared.completed.fetch_add(1, Ordering::Relaxed);
			release_dedup(shared, &pending).await;
			debug!(
				queue = %shared.policy.name,
				job_id = %pending.job_id,
				"job completed"
			);
		},
		Some(error) if attempt < shared.policy.max_attempts => {
			let backoff = shared.policy.backoff_base * 2u32.pow(pending.attempt);
			warn!(
				queue = %shared.policy.name,
				job_id = %pending.job_id,
				attempt,
				backoff_ms = backoff.as_millis() as u64,
				"job failed, will retry: {error}"
			);
			update_record(shared, &pending.job_id, |record| {
				record.state = JobState::Retrying {
					attempt,
					last_error: error.clone(),
				};
			})
			.await;
			shared.retried.fetch_add(1, Ordering::Relaxed);

			let mut queue = shared.pending.lock().await;
			queue.push(PendingJob {
				seq: shared.seq.fetch_add(1, Ordering::Relaxed),
				job_id: pending.job_id,
				job: pending.job,
				dedup_key: pending.dedup_key,
				priority: pending.priority,
				ready_at: Instant::now() + backoff,
				attempt,
			});
			drop(queue);
			shared.notify.notify_one();
		},
		Some(error) => {
			warn!(
				queue = %shared.policy.name,
				job_id = %pending.job_id,
				attempts = attempt,
				"job exhausted its attempts: {error}"
			);
			update_record(shared, &pending.job_id, |record| {
				record.state = JobState::Exhausted { error: error.clone() };
			})
			.await;
			shared.exhausted.fetch_add(1, Ordering::Relaxed);
			release_dedup(shared, &pending).await;
		},
	}
}

async fn update_record(shared: &Arc<Shared>, job_id: &str, apply: impl FnOnce(&mut JobRecord)) {
	let mut records = shared.records.write().await;
	if let Some(record) = records.get_mut(job_id) {
		apply(record);
		record.updated_at = Utc::now();
	}
}

async fn release_dedup(shared: &Arc<Shared>, pending: &PendingJob) {
	let mut dedup = shared.dedup.lock().await;
	let owned = dedup
		.get(&pending.dedup_key)
		.map(|id| *id == pending.job_id)
		.unwrap_or(false);
	if owned {
		dedup.remove(&pending.dedup_key);
	}
}

/// Oldest-first eviction of terminal records; live records are never evicted
fn evict_over_bound(records: &mut HashMap<String, JobRecord>, max_records: usize, queue: QueueName) {
	while records.len() > max_records {
		let oldest = records
			.values()
			.filter(|record| !record.state.is_live())
			.min_by_key(|record| record.updated_at)
			.map(|record| record.job_id.clone());
		match oldest {
			Some(job_id) => {
				records.remove(&job_id);
				debug!(%queue, %job_id, "evicted oldest terminal job record");
			},
			None => break,
		}
	}
}

async fn retention_loop(shared: Arc<Shared>) {
	// Sweep at least as often as the retention window itself
	let period = SWEEP_INTERVAL
		.min(shared.policy.retention)
		.max(Duration::from_millis(10));
	let mut tick = tokio::time::interval(period);
	// Skip the immediate first tick
	tick.tick().await;
	loop {
		tick.tick().await;

		let cutoff = Utc::now()
			- chrono::Duration::from_std(shared.policy.retention)
				.unwrap_or_else(|_| chrono::Duration::seconds(3_600));
		// The records guard is released before dedup is touched; enqueue
		// locks dedup first, then records
		let removed = {
			let mut records = shared.records.write().await;
			let before = records.len();
			records.retain(|_, record| record.state.is_live() || record.updated_at > cutoff);
			evict_over_bound(&mut records, shared.policy.max_records, shared.policy.name);
			before - records.len()
		};
		if removed > 0 {
			debug!(
				queue = %shared.policy.name,
				removed,
				"swept expired job records"
			);
		}

		// Drop dedup entries whose record is gone, in enqueue's lock order
		let mut dedup = shared.dedup.lock().await;
		let records = shared.records.read().await;
		dedup.retain(|_, job_id| records.contains_key(job_id));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::jobs::types::UpdatePriority;
	use std::sync::atomic::AtomicUsize;

	fn policy(name: QueueName) -> QueuePolicy {
		QueuePolicy {
			name,
			workers: 2,
			capacity: 16,
			max_attempts: 3,
			backoff_base: Duration::from_millis(20),
			retention: Duration::from_secs(3_600),
			max_records: 1_000,
		}
	}

	fn update_job(product: &str, priority: UpdatePriority) -> BackgroundJob {
		BackgroundJob::PriceUpdate {
			product_id: product.to_string(),
			retailer_id: "amazon".to_string(),
			priority,
		}
	}

	struct RecordingHandler {
		calls: AtomicUsize,
		fail_times: usize,
		panic: bool,
	}

	impl RecordingHandler {
		fn ok() -> Arc<Self> {
			Arc::new(Self {
				calls: AtomicUsize::new(0),
				fail_times: 0,
				panic: false,
			})
		}

		fn failing(times: usize) -> Arc<Self> {
			Arc::new(Self {
				calls: AtomicUsize::new(0),
				fail_times: times,
				panic: false,
			})
		}

		fn panicking() -> Arc<Self> {
			Arc::new(Self {
				calls: AtomicUsize::new(0),
				fail_times: 0,
				panic: true,
			})
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl JobHandler for RecordingHandler {
		async fn handle(&self, _job: BackgroundJob) -> JobResult<()> {
			let call = self.calls.fetch_add(1, Ordering::SeqCst);
			if self.panic {
				panic!("handler exploded");
			}
			if call < self.fail_times {
				return Err(JobError::Failed("transient".to_string()));
			}
			Ok(())
		}
	}

	async fn wait_for<F: Fn() -> bool>(condition: F) {
		for _ in 0..200 {
			if condition() {
				return;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		panic!("condition not reached in time");
	}

	#[tokio::test]
	async fn job_runs_to_completion() {
		let handler = RecordingHandler::ok();
		let queue = JobQueue::start(policy(QueueName::PriceUpdates), handler.clone());

		let job_id = queue
			.enqueue(update_job("p1", UpdatePriority::High))
			.await
			.unwrap();
		wait_for(|| handler.calls() == 1).await;
		queue.shutdown().await;
		let record = queue.job(&job_id).await.expect("record kept");
		assert_eq!(record.state, JobState::Completed);
		assert_eq!(record.attempts, 1);
	}

	#[tokio::test]
	async fn duplicates_coalesce_onto_one_execution() {
		let handler = RecordingHandler::ok();
		let mut p = policy(QueueName::PriceUpdates);
		p.workers = 1;
		let queue = JobQueue::start(p, handler.clone());

		// Delayed jobs stay pending long enough to coalesce against
		let first = queue
			.enqueue(update_job("p1", UpdatePriority::Low))
			.await
			.unwrap();
		let second = queue
			.enqueue(update_job("p1", UpdatePriority::Low))
			.await
			.unwrap();
		assert_eq!(first, second);

		let stats = queue.stats().await;
		assert_eq!(stats.coalesced, 1);
		assert_eq!(stats.pending, 1);
		queue.shutdown().await;
	}

	#[tokio::test]
	async fn failures_retry_until_exhausted() {
		let handler = RecordingHandler::failing(usize::MAX);
		let queue = JobQueue::start(policy(QueueName::PriceUpdates), handler.clone());

		let job_id = queue
			.enqueue(update_job("p1", UpdatePriority::High))
			.await
			.unwrap();
		wait_for(|| handler.calls() == 3).await;

		tokio::time::sleep(Duration::from_millis(50)).await;
		let record = queue.job(&job_id).await.expect("record kept");
		assert!(matches!(record.state, JobState::Exhausted { .. }));
		assert_eq!(record.attempts, 3);

		let stats = queue.stats().await;
		assert_eq!(stats.retried, 2);
		assert_eq!(stats.exhausted, 1);
		queue.shutdown().await;
	}

	#[tokio::test]
	async fn transient_failure_recovers() {
		let handler = RecordingHandler::failing(1);
		let queue = JobQueue::start(policy(QueueName::PriceUpdates), handler.clone());

		let job_id = queue
			.enqueue(update_job("p1", UpdatePriority::High))
			.await
			.unwrap();
		wait_for(|| handler.calls() == 2).await;

		tokio::time::sleep(Duration::from_millis(50)).await;
		let record = queue.job(&job_id).await.expect("record kept");
		assert_eq!(record.state, JobState::Completed);
		assert_eq!(record.attempts, 2);
		queue.shutdown().await;
	}

	#[tokio::test]
	async fn panicking_handler_does_not_kill_the_worker() {
		let handler = RecordingHandler::panicking();
		let mut p = policy(QueueName::PriceUpdates);
		p.workers = 1;
		p.max_attempts = 1;
		let queue = JobQueue::start(p, handler.clone());

		let first = queue
			.enqueue(update_job("p1", UpdatePriority::High))
			.await
			.unwrap();
		wait_for(|| handler.calls() == 1).await;
		tokio::time::sleep(Duration::from_millis(50)).await;

		let record = queue.job(&first).await.expect("record kept");
		assert!(matches!(record.state, JobState::Exhausted { .. }));

		// The sole worker survived and still drains new jobs
		queue
			.enqueue(update_job("p2", UpdatePriority::High))
			.await
			.unwrap();
		wait_for(|| handler.calls() == 2).await;
		queue.shutdown().await;
	}

	#[tokio::test]
	async fn capacity_limits_pending_jobs() {
		let handler = RecordingHandler::ok();
		let mut p = policy(QueueName::Scraping);
		p.capacity = 2;
		p.workers = 1;
		let queue = JobQueue::start(p, handler);

		// Low-priority updates carry a 30s delay, so they stay pending
		for product in ["p1", "p2"] {
			queue
				.enqueue(update_job(product, UpdatePriority::Low))
				.await
				.unwrap();
		}
		let err = queue
			.enqueue(update_job("p3", UpdatePriority::Low))
			.await
			.unwrap_err();
		assert_eq!(err, JobError::QueueFull(QueueName::Scraping));
		queue.shutdown().await;
	}

	#[tokio::test]
	async fn shutdown_rejects_new_jobs() {
		let handler = RecordingHandler::ok();
		let queue = JobQueue::start(policy(QueueName::Notifications), handler);
		queue.shutdown().await;

		let err = queue
			.enqueue(update_job("p1", UpdatePriority::High))
			.await
			.unwrap_err();
		assert_eq!(err, JobError::QueueClosed(QueueName::Notifications));
	}

	struct OrderHandler {
		order: Arc<Mutex<Vec<String>>>,
	}

	#[async_trait]
	impl JobHandler for OrderHandler {
		async fn handle(&self, job: BackgroundJob) -> JobResult<()> {
			if let BackgroundJob::PriceUpdate { product_id, .. } = &job {
				self.order.lock().await.push(product_id.clone());
			}
			// Slow enough for later enqueues to pile up behind the worker
			tokio::time::sleep(Duration::from_millis(50)).await;
			Ok(())
		}
	}

	#[tokio::test]
	async fn equal_priority_runs_in_enqueue_order() {
		let order: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
		let mut p = policy(QueueName::PriceUpdates);
		p.workers = 1;
		let queue = JobQueue::start(
			p,
			Arc::new(OrderHandler {
				order: Arc::clone(&order),
			}),
		);

		for product in ["p1", "p2", "p3"] {
			queue
				.enqueue(update_job(product, UpdatePriority::High))
				.await
				.unwrap();
		}

		tokio::time::sleep(Duration::from_millis(500)).await;
		queue.shutdown().await;
		assert_eq!(*order.lock().await, vec!["p1", "p2", "p3"]);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn enqueue_never_blocks_on_the_retention_sweep() {
		let handler = RecordingHandler::ok();
		let mut p = policy(QueueName::PriceUpdates);
		p.capacity = 5_000;
		p.max_records = 5_000;
		// A tiny retention window makes the sweeper tick constantly while
		// enqueues race it for the dedup and records locks
		p.retention = Duration::from_millis(10);
		let queue = JobQueue::start(p, handler);

		let enqueues = async {
			for i in 0..2_000u32 {
				// Low priority updates are delayed, so they pile up pending
				queue
					.enqueue(update_job(&format!("p{i}"), UpdatePriority::Low))
					.await
					.unwrap();
			}
		};
		tokio::time::timeout(Duration::from_secs(20), enqueues)
			.await
			.expect("enqueues stalled against the retention sweep");
		queue.shutdown().await;
	}

	#[tokio::test]
	async fn retention_sweep_drops_expired_records() {
		let handler = RecordingHandler::ok();
		let mut p = policy(QueueName::PriceUpdates);
		p.retention = Duration::from_millis(50);
		let queue = JobQueue::start(p, handler.clone());

		let job_id = queue
			.enqueue(update_job("p1", UpdatePriority::High))
			.await
			.unwrap();
		wait_for(|| handler.calls() == 1).await;

		for _ in 0..200 {
			if queue.job(&job_id).await.is_none() {
				assert_eq!(queue.stats().await.tracked_records, 0);
				queue.shutdown().await;
				return;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		panic!("completed record outlived its retention window");
	}

	#[tokio::test]
	async fn record_bound_evicts_oldest_terminal_records() {
		let handler = RecordingHandler::ok();
		let mut p = policy(QueueName::PriceUpdates);
		p.max_records = 2;
		let queue = JobQueue::start(p, handler.clone());

		let first = queue
			.enqueue(update_job("p1", UpdatePriority::High))
			.await
			.unwrap();
		wait_for(|| handler.calls() == 1).await;
		tokio::time::sleep(Duration::from_millis(20)).await;
		let second = queue
			.enqueue(update_job("p2", UpdatePriority::High))
			.await
			.unwrap();
		wait_for(|| handler.calls() == 2).await;
		tokio::time::sleep(Duration::from_millis(20)).await;

		// The third record pushes the map over its bound; the oldest
		// terminal record goes, the newer one stays
		queue
			.enqueue(update_job("p3", UpdatePriority::High))
			.await
			.unwrap();
		assert!(queue.job(&first).await.is_none());
		assert!(queue.job(&second).await.is_some());
		assert!(queue.stats().await.tracked_records <= 3);
		queue.shutdown().await;
	}

	#[tokio::test]
	async fn delayed_jobs_wait_for_readiness() {
		let handler = RecordingHandler::ok();
		let queue = JobQueue::start(policy(QueueName::Notifications), handler.clone());

		// Notifications carry a fixed one-second delay
		queue
			.enqueue(BackgroundJob::Notification {
				user_id: "u1".to_string(),
				title: "Price drop".to_string(),
				body: "Now 79.99".to_string(),
			})
			.await
			.unwrap();

		tokio::time::sleep(Duration::from_millis(300)).await;
		assert_eq!(handler.calls(), 0);

		wait_for(|| handler.calls() == 1).await;
		queue.shutdown().await;
	}
}
