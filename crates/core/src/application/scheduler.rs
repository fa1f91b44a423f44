//! Scheduler - FIFO queue with a bounded number of concurrently running jobs
//!
//! - `submit`: admission control (queue depth), persist, enqueue, dispatch
//! - `dispatch`: pop while a concurrency slot is free; each finished job frees
//!   its slot and dispatches again
//! - every read/modify/write of a record reloads it from the store under a
//!   single write guard, so progress writes and position refreshes never race

use crate::domain::error::Result as DomainResult;
use crate::domain::{Job, JobId, JobStatus};
use crate::error::{AppError, Result};
use crate::port::{JobStore, KeypairGenerator, TimeProvider};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

/// Pause before a job whose start could not be persisted is dispatched again
const START_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Point-in-time view of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub running: usize,
    pub queued: usize,
    pub max_concurrent: usize,
    pub max_queue_depth: usize,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<JobId>,
    /// Admissions that passed the depth check but are not persisted yet
    admitting: usize,
    running: usize,
}

/// Scheduler owns the pending queue and the running-slot counter.
///
/// Cloning is cheap and every clone drives the same queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn JobStore>,
    generator: Arc<dyn KeypairGenerator>,
    time_provider: Arc<dyn TimeProvider>,
    max_concurrent: usize,
    max_queue_depth: usize,
    queue: Mutex<QueueState>,
    write_guard: tokio::sync::Mutex<()>,
    position_guard: tokio::sync::Mutex<()>,
    idle: Notify,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// # Arguments
    /// * `store` - Job store (source of truth for every record)
    /// * `generator` - Keypair generator invoked once per requested keypair
    /// * `time_provider` - Time provider for lifecycle timestamps
    /// * `max_concurrent` - Jobs allowed in `running` at once (at least 1)
    /// * `max_queue_depth` - Jobs allowed to wait in `queued`
    pub fn new(
        store: Arc<dyn JobStore>,
        generator: Arc<dyn KeypairGenerator>,
        time_provider: Arc<dyn TimeProvider>,
        max_concurrent: usize,
        max_queue_depth: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                generator,
                time_provider,
                max_concurrent: max_concurrent.max(1),
                max_queue_depth,
                queue: Mutex::new(QueueState::default()),
                write_guard: tokio::sync::Mutex::new(()),
                position_guard: tokio::sync::Mutex::new(()),
                idle: Notify::new(),
            }),
        }
    }

    /// Admit a new job.
    ///
    /// Returns the live 1-based queue position, or `None` if the job was
    /// dispatched straight away.
    ///
    /// # Errors
    /// - AppError::QueueFull if `max_queue_depth` jobs are already waiting
    ///   (nothing is persisted)
    /// - store errors from `create`
    pub async fn submit(&self, job: Job) -> Result<Option<usize>> {
        self.inner.admit(job).await
    }

    /// Re-admit a job that crash recovery already reset and persisted as
    /// `queued`.
    ///
    /// Skips the depth limit: recovery must never drop a job.
    pub async fn requeue(&self, id: JobId) -> Result<Option<usize>> {
        self.inner.lock_queue().admitting += 1;
        self.inner.push(id).await
    }

    /// Live 1-based position of a waiting job
    pub fn queue_position(&self, id: &str) -> Option<usize> {
        self.inner
            .lock_queue()
            .pending
            .iter()
            .position(|pending| pending == id)
            .map(|index| index + 1)
    }

    /// Identifiers waiting, front first
    pub fn queued_ids(&self) -> Vec<JobId> {
        self.inner.lock_queue().pending.iter().cloned().collect()
    }

    pub fn stats(&self) -> SchedulerStats {
        let queue = self.inner.lock_queue();
        SchedulerStats {
            running: queue.running,
            queued: queue.pending.len(),
            max_concurrent: self.inner.max_concurrent,
            max_queue_depth: self.inner.max_queue_depth,
        }
    }

    /// Resolve once nothing is running, waiting or being admitted
    pub async fn wait_until_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl Inner {
    fn lock_queue(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_idle(&self) -> bool {
        let queue = self.lock_queue();
        queue.running == 0 && queue.pending.is_empty() && queue.admitting == 0
    }

    async fn admit(self: &Arc<Self>, job: Job) -> Result<Option<usize>> {
        {
            let mut queue = self.lock_queue();
            let waiting = queue.pending.len() + queue.admitting;
            if waiting >= self.max_queue_depth {
                warn!(
                    job_id = %job.id,
                    waiting = waiting,
                    max_queue_depth = self.max_queue_depth,
                    "Queue full, rejecting job"
                );
                return Err(AppError::QueueFull { depth: waiting });
            }
            queue.admitting += 1;
        }

        let created = self.store.create(&job).await;
        if let Err(e) = created {
            self.lock_queue().admitting -= 1;
            self.idle.notify_waiters();
            return Err(e);
        }

        self.push(job.id.clone()).await
    }

    /// Append an admitted id, dispatch, then persist the new positions
    async fn push(self: &Arc<Self>, id: JobId) -> Result<Option<usize>> {
        let position = {
            let mut queue = self.lock_queue();
            queue.admitting -= 1;
            queue.pending.push_back(id.clone());
            queue.pending.len()
        };
        info!(job_id = %id, position = position, "Job queued");

        self.dispatch();

        if let Err(e) = self.refresh_positions().await {
            warn!(job_id = %id, error = %e, "Failed to persist queue positions");
        }

        let live = self
            .lock_queue()
            .pending
            .iter()
            .position(|pending| *pending == id)
            .map(|index| index + 1);
        Ok(live)
    }

    /// Start queued jobs while slots are free.
    ///
    /// The pop and the slot increment happen in one critical section, so
    /// concurrent callers can neither double-pop nor overshoot the limit.
    fn dispatch(self: &Arc<Self>) {
        let mut popped = false;
        loop {
            let id = {
                let mut queue = self.lock_queue();
                if queue.running >= self.max_concurrent {
                    break;
                }
                match queue.pending.pop_front() {
                    Some(id) => {
                        queue.running += 1;
                        id
                    }
                    None => break,
                }
            };
            popped = true;
            debug!(job_id = %id, "Dispatching job");

            let inner = Arc::clone(self);
            tokio::spawn(inner.run_slot(id));
        }

        if popped {
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                if let Err(e) = inner.refresh_positions().await {
                    warn!(error = %e, "Failed to persist queue positions after dispatch");
                }
            });
        }
    }

    /// Run one job in its slot, then free the slot and dispatch again
    async fn run_slot(self: Arc<Self>, id: JobId) {
        let now = self.time_provider.now_millis();
        match self.mutate(&id, |job| job.start(now)).await {
            Ok(job) => self.run_started(job).await,
            Err(e @ (AppError::NotFound(_) | AppError::Domain(_))) => {
                error!(job_id = %id, error = %e, "Job cannot start, dropping it from the queue");
            }
            Err(e) => {
                // Still persisted as `queued`: back to the head of the queue
                warn!(job_id = %id, error = %e, "Failed to persist job start, will retry");
                {
                    let mut queue = self.lock_queue();
                    queue.running -= 1;
                    queue.pending.push_front(id);
                }
                let inner = Arc::clone(&self);
                tokio::spawn(async move {
                    tokio::time::sleep(START_RETRY_DELAY).await;
                    inner.dispatch();
                });
                return;
            }
        }

        self.lock_queue().running -= 1;
        self.dispatch();
        self.idle.notify_waiters();
    }

    /// Drive a job that is persisted as `running` to a terminal state
    async fn run_started(&self, job: Job) {
        let id = job.id.clone();

        // A panicking generator fails its job instead of leaking the slot
        let failure = match AssertUnwindSafe(self.run_job(job)).catch_unwind().await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                error!(job_id = %id, error = %e, "Job execution aborted");
                Some(format!("storage error: {}", e))
            }
            Err(panic) => {
                let panic_msg = panic_message(panic.as_ref());
                error!(job_id = %id, panic_msg = %panic_msg, "Job execution panicked");
                Some(format!("generator panicked: {}", panic_msg))
            }
        };

        if let Some(message) = failure {
            let now = self.time_provider.now_millis();
            if let Err(e) = self.mutate(&id, move |job| job.fail(message, now)).await {
                error!(job_id = %id, error = %e, "Failed to record job failure");
            }
        }
    }

    /// Generate `count` keypairs one after the other, persisting after each
    /// success.
    ///
    /// A generation error fails the whole job (no retry); results already
    /// produced stay on the record. Only store errors are returned.
    async fn run_job(&self, job: Job) -> Result<()> {
        let id = &job.id;
        info!(
            job_id = %id,
            suffix = %job.suffix,
            count = job.count,
            timeout_ms = job.timeout_per_item_ms,
            "Job started"
        );

        for item in job.progress.completed..job.count {
            match self
                .generator
                .generate_one(&job.suffix, job.timeout_per_item_ms)
                .await
            {
                Ok(keypair) => {
                    info!(
                        job_id = %id,
                        item = item + 1,
                        total = job.count,
                        public_key = %keypair.public_key,
                        elapsed_ms = keypair.elapsed_ms,
                        "Keypair generated"
                    );
                    self.mutate(id, move |job| job.record_result(keypair))
                        .await?;
                }
                Err(e) => {
                    let message = e.to_string();
                    error!(job_id = %id, completed = item, error = %message, "Job failed");
                    let now = self.time_provider.now_millis();
                    self.mutate(id, move |job| job.fail(message, now)).await?;
                    return Ok(());
                }
            }
        }

        let now = self.time_provider.now_millis();
        self.mutate(id, |job| job.complete(now)).await?;
        info!(job_id = %id, count = job.count, "Job completed");
        Ok(())
    }

    /// Reload, modify and save one record under the write guard
    async fn mutate<F>(&self, id: &JobId, apply: F) -> Result<Job>
    where
        F: FnOnce(&mut Job) -> DomainResult<()> + Send,
    {
        let _guard = self.write_guard.lock().await;
        let mut job = self
            .store
            .load(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))?;
        apply(&mut job)?;
        self.store.save(&job).await?;
        Ok(job)
    }

    /// Persist the 1-based position of every waiting job.
    ///
    /// Refreshes run one at a time against a fresh snapshot, and a record
    /// that has left `queued` in the meantime is never touched.
    async fn refresh_positions(&self) -> Result<()> {
        let _serial = self.position_guard.lock().await;
        let waiting: Vec<JobId> = self.lock_queue().pending.iter().cloned().collect();

        for (index, id) in waiting.iter().enumerate() {
            let position = index + 1;
            let _guard = self.write_guard.lock().await;
            let Some(mut job) = self.store.load(id).await? else {
                continue;
            };
            if job.status != JobStatus::Queued || job.queue_position == Some(position) {
                continue;
            }
            job.queue_position = Some(position);
            self.store.save(&job).await?;
        }
        Ok(())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::generator::mocks::{MockBehavior, MockGenerator};
    use crate::port::job_store::mocks::InMemoryJobStore;
    use crate::port::time_provider::TickingTimeProvider;
    use crate::port::GenerationError;
    use std::time::Duration;

    struct Fixture {
        store: Arc<InMemoryJobStore>,
        generator: Arc<MockGenerator>,
        scheduler: Scheduler,
    }

    fn fixture(generator: MockGenerator, max_concurrent: usize, max_queue_depth: usize) -> Fixture {
        let time_provider = Arc::new(TickingTimeProvider::new(1_000));
        let store = Arc::new(InMemoryJobStore::new(time_provider.clone()));
        let generator = Arc::new(generator);
        let scheduler = Scheduler::new(
            store.clone(),
            generator.clone(),
            time_provider,
            max_concurrent,
            max_queue_depth,
        );
        Fixture {
            store,
            generator,
            scheduler,
        }
    }

    async fn load(store: &InMemoryJobStore, id: &str) -> Job {
        store.load(&id.to_string()).await.unwrap().unwrap()
    }

    async fn wait_for<F>(store: &InMemoryJobStore, id: &str, predicate: F) -> Job
    where
        F: Fn(&Job) -> bool,
    {
        for _ in 0..500 {
            let job = load(store, id).await;
            if predicate(&job) {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition never held for job {}", id);
    }

    async fn idle(scheduler: &Scheduler) {
        tokio::time::timeout(Duration::from_secs(5), scheduler.wait_until_idle())
            .await
            .expect("scheduler did not become idle");
    }

    #[tokio::test]
    async fn test_submit_runs_job_to_completion() {
        let f = fixture(MockGenerator::new_success(), 1, 10);
        let job = Job::new_test("ab", 3);
        let id = job.id.clone();

        f.scheduler.submit(job).await.unwrap();
        idle(&f.scheduler).await;

        let job = load(&f.store, &id).await;
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(job.results.len(), 3);
        assert_eq!(job.progress.completed, 3);
        assert_eq!(job.queue_position, None);
        assert!(job.started_at.is_some());
        assert!(job.completed_at.is_some());
        assert_eq!(f.generator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_queue_full_rejects_without_persisting() {
        let f = fixture(MockGenerator::new_gated(), 1, 2);

        f.scheduler.submit(Job::new_test("ab", 1)).await.unwrap(); // running
        f.scheduler.submit(Job::new_test("ab", 1)).await.unwrap(); // queued 1
        f.scheduler.submit(Job::new_test("ab", 1)).await.unwrap(); // queued 2
        assert_eq!(f.store.len(), 3);

        let rejected = Job::new_test("ab", 1);
        let rejected_id = rejected.id.clone();
        let err = f.scheduler.submit(rejected).await.unwrap_err();

        assert!(matches!(err, AppError::QueueFull { depth: 2 }));
        assert_eq!(f.store.len(), 3);
        assert!(f.store.load(&rejected_id).await.unwrap().is_none());
        assert_eq!(f.scheduler.stats().queued, 2);

        f.generator.release();
        idle(&f.scheduler).await;
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_never_exceeded() {
        let generator = MockGenerator::new_success().with_delay(Duration::from_millis(20));
        let f = fixture(generator, 2, 10);

        let mut ids = Vec::new();
        for _ in 0..5 {
            let job = Job::new_test("ab", 2);
            ids.push(job.id.clone());
            f.scheduler.submit(job).await.unwrap();
        }

        for _ in 0..40 {
            let running = f
                .store
                .list_all()
                .await
                .unwrap()
                .iter()
                .filter(|job| job.status == JobStatus::Running)
                .count();
            assert!(running <= 2, "{} jobs running at once", running);
            assert!(f.scheduler.stats().running <= 2);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        idle(&f.scheduler).await;
        assert!(f.generator.max_in_flight() <= 2);
        for id in &ids {
            assert_eq!(load(&f.store, id).await.status, JobStatus::Complete);
        }
    }

    #[tokio::test]
    async fn test_jobs_start_in_submission_order() {
        let f = fixture(MockGenerator::new_success(), 1, 10);

        let mut ids = Vec::new();
        for _ in 0..4 {
            let job = Job::new_test("ab", 1);
            ids.push(job.id.clone());
            f.scheduler.submit(job).await.unwrap();
        }
        idle(&f.scheduler).await;

        let mut started = Vec::new();
        for id in &ids {
            started.push(load(&f.store, id).await.started_at.unwrap());
        }
        let mut sorted = started.clone();
        sorted.sort();
        assert_eq!(started, sorted);
    }

    #[tokio::test]
    async fn test_queue_positions_follow_the_live_queue() {
        let f = fixture(MockGenerator::new_gated(), 1, 10);

        let mut ids = Vec::new();
        for _ in 0..4 {
            let job = Job::new_test("ab", 1);
            ids.push(job.id.clone());
            f.scheduler.submit(job).await.unwrap();
        }

        // First job running, the rest waiting at 1, 2, 3
        wait_for(&f.store, &ids[0], |job| job.status == JobStatus::Running).await;
        assert_eq!(load(&f.store, &ids[0]).await.queue_position, None);
        for (index, id) in ids.iter().enumerate().skip(1) {
            let job = wait_for(&f.store, id, |job| job.queue_position == Some(index)).await;
            assert_eq!(job.status, JobStatus::Queued);
            assert_eq!(f.scheduler.queue_position(id), Some(index));
        }

        // Finish the first job: the second starts, the others move up
        f.generator.allow(1);
        wait_for(&f.store, &ids[1], |job| job.status == JobStatus::Running).await;
        wait_for(&f.store, &ids[2], |job| job.queue_position == Some(1)).await;
        wait_for(&f.store, &ids[3], |job| job.queue_position == Some(2)).await;
        assert_eq!(f.scheduler.queued_ids(), vec![ids[2].clone(), ids[3].clone()]);
        assert_eq!(load(&f.store, &ids[1]).await.queue_position, None);

        f.generator.release();
        idle(&f.scheduler).await;
        for id in &ids {
            let job = load(&f.store, id).await;
            assert_eq!(job.status, JobStatus::Complete);
            assert_eq!(job.queue_position, None);
        }
    }

    #[tokio::test]
    async fn test_generation_failure_fails_job_and_keeps_results() {
        let generator = MockGenerator::new(MockBehavior::FailOnCall(
            2,
            GenerationError::Timeout(50),
        ));
        let f = fixture(generator, 1, 10);
        let job = Job::new_test("ab", 3);
        let id = job.id.clone();

        f.scheduler.submit(job).await.unwrap();
        idle(&f.scheduler).await;

        let job = load(&f.store, &id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.results.len(), 1);
        assert_eq!(job.progress.completed, 1);
        assert!(job.error.as_deref().unwrap().contains("50ms"));
        // No retry of the failed attempt, no further attempts
        assert_eq!(f.generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_job_frees_its_slot() {
        let f = fixture(
            MockGenerator::new_fail(GenerationError::ParseFailure("no address".into())),
            1,
            10,
        );
        let first = Job::new_test("ab", 1);
        let second = Job::new_test("ab", 1);
        let (first_id, second_id) = (first.id.clone(), second.id.clone());

        f.scheduler.submit(first).await.unwrap();
        f.scheduler.submit(second).await.unwrap();
        idle(&f.scheduler).await;

        assert_eq!(load(&f.store, &first_id).await.status, JobStatus::Failed);
        assert_eq!(load(&f.store, &second_id).await.status, JobStatus::Failed);
        assert_eq!(f.scheduler.stats().running, 0);
    }

    #[tokio::test]
    async fn test_unpersisted_start_is_retried_from_queue_head() {
        let f = fixture(MockGenerator::new_success(), 1, 10);
        f.store.fail_next_saves(1);

        let job = Job::new_test("ab", 2);
        let id = job.id.clone();
        f.scheduler.submit(job).await.unwrap();
        idle(&f.scheduler).await;

        let job = load(&f.store, &id).await;
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(job.results.len(), 2);
        assert_eq!(job.error, None);
        assert_eq!(job.queue_position, None);
        assert_eq!(f.generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_store_outage_keeps_unstarted_job_queued() {
        let f = fixture(MockGenerator::new_success(), 1, 10);
        f.store.set_fail_saves(true);

        let job = Job::new_test("ab", 1);
        let id = job.id.clone();
        f.scheduler.submit(job).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        // Persisted `queued` and still owned by the scheduler
        let stranded = load(&f.store, &id).await;
        assert_eq!(stranded.status, JobStatus::Queued);
        assert_eq!(stranded.error, None);
        let stats = f.scheduler.stats();
        assert_eq!(stats.queued + stats.running, 1);
        assert_eq!(f.generator.call_count(), 0);

        f.store.set_fail_saves(false);
        idle(&f.scheduler).await;

        let job = load(&f.store, &id).await;
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(job.results.len(), 1);
        assert_eq!(f.scheduler.stats().running, 0);
        assert_eq!(f.scheduler.queue_position(&id), None);
    }

    #[tokio::test]
    async fn test_storage_error_while_running_fails_job_and_frees_slot() {
        let f = fixture(MockGenerator::new_gated(), 1, 10);
        let first = Job::new_test("ab", 1);
        let second = Job::new_test("ab", 1);
        let (first_id, second_id) = (first.id.clone(), second.id.clone());
        f.scheduler.submit(first).await.unwrap();
        wait_for(&f.store, &first_id, |job| job.status == JobStatus::Running).await;

        // The result write fails, the failure record goes through once saves recover
        f.store.fail_next_saves(1);
        f.generator.allow(1);
        wait_for(&f.store, &first_id, |job| job.status == JobStatus::Failed).await;

        let failed = load(&f.store, &first_id).await;
        assert!(failed.results.is_empty());
        assert!(failed
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("storage error:")));

        f.scheduler.submit(second).await.unwrap();
        f.generator.release();
        idle(&f.scheduler).await;
        assert_eq!(load(&f.store, &second_id).await.status, JobStatus::Complete);
        assert_eq!(f.scheduler.stats().running, 0);
    }

    struct PanickingGenerator;

    #[async_trait::async_trait]
    impl KeypairGenerator for PanickingGenerator {
        async fn generate_one(
            &self,
            _suffix: &str,
            _timeout_ms: u64,
        ) -> std::result::Result<crate::domain::GeneratedKeypair, GenerationError> {
            panic!("grinder blew up");
        }
    }

    #[tokio::test]
    async fn test_generator_panic_fails_job_and_frees_slot() {
        let time_provider = Arc::new(TickingTimeProvider::new(1_000));
        let store = Arc::new(InMemoryJobStore::new(time_provider.clone()));
        let scheduler = Scheduler::new(
            store.clone(),
            Arc::new(PanickingGenerator),
            time_provider,
            1,
            10,
        );

        let first = Job::new_test("ab", 2);
        let second = Job::new_test("ab", 1);
        let (first_id, second_id) = (first.id.clone(), second.id.clone());
        scheduler.submit(first).await.unwrap();
        scheduler.submit(second).await.unwrap();
        idle(&scheduler).await;

        let first = load(&store, &first_id).await;
        assert_eq!(first.status, JobStatus::Failed);
        assert_eq!(
            first.error.as_deref(),
            Some("generator panicked: grinder blew up")
        );
        assert_eq!(load(&store, &second_id).await.status, JobStatus::Failed);
        assert_eq!(scheduler.stats().running, 0);
    }

    #[tokio::test]
    async fn test_requeue_bypasses_depth_limit() {
        let f = fixture(MockGenerator::new_gated(), 1, 1);

        let mut ids = Vec::new();
        for _ in 0..3 {
            let job = Job::new_test("ab", 1);
            ids.push(job.id.clone());
            f.store.seed(job);
        }
        for id in &ids {
            f.scheduler.requeue(id.clone()).await.unwrap();
        }

        assert_eq!(f.scheduler.stats().running, 1);
        assert_eq!(f.scheduler.stats().queued, 2);
        // The regular path still enforces the limit
        assert!(matches!(
            f.scheduler.submit(Job::new_test("ab", 1)).await,
            Err(AppError::QueueFull { .. })
        ));

        f.generator.release();
        idle(&f.scheduler).await;
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected_and_not_queued() {
        let f = fixture(MockGenerator::new_gated(), 1, 10);
        let job = Job::new_test("ab", 1);

        f.scheduler.submit(job.clone()).await.unwrap();
        let err = f.scheduler.submit(job).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateId(_)));
        assert_eq!(f.scheduler.stats().queued, 0);

        f.generator.release();
        idle(&f.scheduler).await;
    }

    #[tokio::test]
    async fn test_stats_report_limits() {
        let f = fixture(MockGenerator::new_success(), 3, 7);
        let stats = f.scheduler.stats();
        assert_eq!(
            stats,
            SchedulerStats {
                running: 0,
                queued: 0,
                max_concurrent: 3,
                max_queue_depth: 7,
            }
        );
    }
}
