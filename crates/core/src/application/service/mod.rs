// Vanity Service - use cases behind the external interface

pub mod request;

pub use request::{validate_request, KeypairRequest, ValidatedRequest};

use crate::application::scheduler::{Scheduler, SchedulerStats};
use crate::config::EngineConfig;
use crate::domain::{GeneratedKeypair, Job, JobId, JobStatus, JobSummary};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, JobStore, KeypairGenerator, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Returned when a job is admitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAccepted {
    pub id: JobId,
    pub status: JobStatus,
    pub queue_position: Option<usize>,
}

/// Keypairs produced inline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedKeypairs {
    pub keypairs: Vec<GeneratedKeypair>,
}

/// Vanity Service
///
/// Validation happens here, before anything reaches the scheduler or store:
/// a rejected request has no side effects.
pub struct VanityService {
    store: Arc<dyn JobStore>,
    scheduler: Scheduler,
    generator: Arc<dyn KeypairGenerator>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    config: EngineConfig,
}

impl VanityService {
    pub fn new(
        store: Arc<dyn JobStore>,
        scheduler: Scheduler,
        generator: Arc<dyn KeypairGenerator>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            scheduler,
            generator,
            id_provider,
            time_provider,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate, persist and enqueue a new job
    ///
    /// # Errors
    /// - AppError::Domain (invalid suffix), nothing persisted
    /// - AppError::QueueFull, nothing persisted
    pub async fn submit_job(&self, req: KeypairRequest) -> Result<JobAccepted> {
        let validated = validate_request(&req, &self.config, self.config.max_suffix_len)?;

        let job = Job::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            validated.suffix.into_inner(),
            validated.count,
            validated.timeout_ms,
        );
        let id = job.id.clone();

        let queue_position = self.scheduler.submit(job).await?;
        let status = match queue_position {
            Some(_) => JobStatus::Queued,
            None => self
                .store
                .load(&id)
                .await?
                .map(|job| job.status)
                .unwrap_or(JobStatus::Queued),
        };

        info!(
            job_id = %id,
            count = validated.count,
            timeout_ms = validated.timeout_ms,
            queue_position = ?queue_position,
            "Job accepted"
        );

        Ok(JobAccepted {
            id,
            status,
            queue_position,
        })
    }

    /// Full record, queue position taken from the live queue
    pub async fn get_job(&self, id: &str) -> Result<Job> {
        let mut job = self
            .store
            .load(&id.to_string())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))?;
        self.overlay_position(&mut job);
        Ok(job)
    }

    /// All jobs without secret material, newest first
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>> {
        let mut jobs = self.store.list_all().await?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(jobs
            .into_iter()
            .map(|mut job| {
                self.overlay_position(&mut job);
                job.summary()
            })
            .collect())
    }

    /// Run the per-item generation loop inline, bypassing the queue.
    ///
    /// Limited to short suffixes because the caller waits for the whole search.
    pub async fn generate_sync(&self, req: KeypairRequest) -> Result<GeneratedKeypairs> {
        let max_len = self.config.sync_max_suffix_len.min(self.config.max_suffix_len);
        let validated = validate_request(&req, &self.config, max_len)?;

        let mut keypairs = Vec::with_capacity(validated.count as usize);
        for _ in 0..validated.count {
            let keypair = self
                .generator
                .generate_one(validated.suffix.as_str(), validated.timeout_ms)
                .await?;
            keypairs.push(keypair);
        }

        info!(
            suffix = %validated.suffix,
            count = keypairs.len(),
            "Inline generation completed"
        );
        Ok(GeneratedKeypairs { keypairs })
    }

    pub fn health(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    fn overlay_position(&self, job: &mut Job) {
        job.queue_position = match job.status {
            JobStatus::Queued => self.scheduler.queue_position(&job.id),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::port::generator::mocks::{MockBehavior, MockGenerator};
    use crate::port::id_provider::SequentialIdProvider;
    use crate::port::job_store::mocks::InMemoryJobStore;
    use crate::port::time_provider::TickingTimeProvider;
    use crate::port::GenerationError;
    use std::time::Duration;

    struct Fixture {
        store: Arc<InMemoryJobStore>,
        generator: Arc<MockGenerator>,
        service: VanityService,
        scheduler: Scheduler,
    }

    fn fixture(generator: MockGenerator, config: EngineConfig) -> Fixture {
        let time_provider = Arc::new(TickingTimeProvider::new(1_000));
        let store = Arc::new(InMemoryJobStore::new(time_provider.clone()));
        let generator = Arc::new(generator);
        let scheduler = Scheduler::new(
            store.clone(),
            generator.clone(),
            time_provider.clone(),
            config.max_concurrent,
            config.max_queue_depth,
        );
        let service = VanityService::new(
            store.clone(),
            scheduler.clone(),
            generator.clone(),
            Arc::new(SequentialIdProvider::new()),
            time_provider,
            config,
        );
        Fixture {
            store,
            generator,
            service,
            scheduler,
        }
    }

    async fn idle(scheduler: &Scheduler) {
        tokio::time::timeout(Duration::from_secs(5), scheduler.wait_until_idle())
            .await
            .expect("scheduler did not become idle");
    }

    #[tokio::test]
    async fn test_submit_and_get() {
        let f = fixture(MockGenerator::new_success(), EngineConfig::default());

        let accepted = f
            .service
            .submit_job(KeypairRequest::new("ab").with_count(2))
            .await
            .unwrap();
        assert_eq!(accepted.id, "job-1");
        idle(&f.scheduler).await;

        let job = f.service.get_job(&accepted.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(job.results.len(), 2);
        assert!(job.results.iter().all(|kp| kp.public_key.ends_with("ab")));
    }

    #[tokio::test]
    async fn test_invalid_suffix_has_no_side_effects() {
        let f = fixture(MockGenerator::new_success(), EngineConfig::default());

        let err = f
            .service
            .submit_job(KeypairRequest::new("a0lI"))
            .await
            .unwrap_err();
        match err {
            AppError::Domain(DomainError::InvalidSuffix(msg)) => {
                assert!(msg.ends_with("'0', 'l', 'I'"), "unexpected: {}", msg)
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(f.store.is_empty());
        assert_eq!(f.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_reports_queue_position() {
        let config = EngineConfig {
            max_concurrent: 1,
            max_queue_depth: 2,
            ..Default::default()
        };
        let f = fixture(MockGenerator::new_gated(), config);

        let first = f.service.submit_job(KeypairRequest::new("ab")).await.unwrap();
        assert_eq!(first.queue_position, None);

        let second = f.service.submit_job(KeypairRequest::new("ab")).await.unwrap();
        assert_eq!(second.status, JobStatus::Queued);
        assert_eq!(second.queue_position, Some(1));

        let third = f.service.submit_job(KeypairRequest::new("ab")).await.unwrap();
        assert_eq!(third.queue_position, Some(2));

        let rejected = f.service.submit_job(KeypairRequest::new("ab")).await;
        assert!(matches!(rejected, Err(AppError::QueueFull { .. })));
        assert_eq!(f.store.len(), 3);

        let job = f.service.get_job(&third.id).await.unwrap();
        assert_eq!(job.queue_position, Some(2));

        f.generator.release();
        idle(&f.scheduler).await;
    }

    #[tokio::test]
    async fn test_get_unknown_job_is_not_found() {
        let f = fixture(MockGenerator::new_success(), EngineConfig::default());
        let err = f.service.get_job("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_jobs_newest_first_without_secrets() {
        let f = fixture(MockGenerator::new_success(), EngineConfig::default());

        for suffix in ["ab", "cd", "ef"] {
            f.service.submit_job(KeypairRequest::new(suffix)).await.unwrap();
        }
        idle(&f.scheduler).await;

        let jobs = f.service.list_jobs().await.unwrap();
        let suffixes: Vec<&str> = jobs.iter().map(|job| job.suffix.as_str()).collect();
        assert_eq!(suffixes, vec!["ef", "cd", "ab"]);
        assert!(jobs.iter().all(|job| job.status == JobStatus::Complete));
        assert!(jobs.iter().all(|job| job.completed_at.is_some()));
    }

    #[tokio::test]
    async fn test_generate_sync_bypasses_queue() {
        let f = fixture(MockGenerator::new_success(), EngineConfig::default());

        let generated = f
            .service
            .generate_sync(KeypairRequest::new("ab").with_count(3))
            .await
            .unwrap();

        assert_eq!(generated.keypairs.len(), 3);
        assert!(f.store.is_empty());
        assert_eq!(f.service.health().queued, 0);
    }

    #[tokio::test]
    async fn test_generate_sync_limits_suffix_length() {
        let config = EngineConfig {
            sync_max_suffix_len: 3,
            ..Default::default()
        };
        let f = fixture(MockGenerator::new_success(), config);

        let err = f
            .service
            .generate_sync(KeypairRequest::new("abcd"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("too long"));
        assert_eq!(f.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_sync_surfaces_generation_error() {
        let f = fixture(
            MockGenerator::new(MockBehavior::FailOnCall(2, GenerationError::Timeout(10))),
            EngineConfig::default(),
        );

        let err = f
            .service
            .generate_sync(KeypairRequest::new("ab").with_count(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generation(GenerationError::Timeout(10))));
    }

    #[tokio::test]
    async fn test_health() {
        let config = EngineConfig {
            max_concurrent: 2,
            max_queue_depth: 9,
            ..Default::default()
        };
        let f = fixture(MockGenerator::new_success(), config);

        let health = f.service.health();
        assert_eq!(health.max_concurrent, 2);
        assert_eq!(health.max_queue_depth, 9);
        assert_eq!(health.running, 0);
        assert_eq!(health.queued, 0);
    }
}
