// Job Store Port (Interface)

use crate::domain::{Job, JobId};
use crate::error::Result;
use async_trait::async_trait;

/// Durable job records, one per identifier.
///
/// The store is the only source of truth for job state. Implementations:
/// - FsJobStore: one JSON file per job (infra-fs)
/// - SqliteJobStore: one row per job (infra-sqlite)
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new record
    ///
    /// # Errors
    /// - AppError::DuplicateId if a record with this id already exists
    async fn create(&self, job: &Job) -> Result<()>;

    /// Point read; a missing record is `Ok(None)`, never an error
    async fn load(&self, id: &JobId) -> Result<Option<Job>>;

    /// Overwrite the full record, stamping `updated_at`.
    ///
    /// Readers never observe a partially written record.
    async fn save(&self, job: &Job) -> Result<()>;

    /// Every readable record ordered by `created_at` ascending.
    ///
    /// Unreadable or corrupt entries are skipped, never fatal.
    async fn list_all(&self) -> Result<Vec<Job>>;
}

/// Identifiers are used as file names and keys; anything else is not-found
pub fn is_valid_job_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use crate::port::TimeProvider;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory store for scheduler tests
    pub struct InMemoryJobStore {
        jobs: Mutex<HashMap<JobId, Job>>,
        time_provider: Arc<dyn TimeProvider>,
        fail_saves: Mutex<bool>,
        failures_left: AtomicUsize,
    }

    impl InMemoryJobStore {
        pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
            Self {
                jobs: Mutex::new(HashMap::new()),
                time_provider,
                fail_saves: Mutex::new(false),
                failures_left: AtomicUsize::new(0),
            }
        }

        /// Number of records currently stored
        pub fn len(&self) -> usize {
            self.jobs.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Make every subsequent `save` fail with a storage error
        pub fn set_fail_saves(&self, fail: bool) {
            *self.fail_saves.lock().unwrap() = fail;
        }

        /// Fail only the next `n` saves
        pub fn fail_next_saves(&self, n: usize) {
            self.failures_left.store(n, Ordering::SeqCst);
        }

        /// Put a record in place without going through `create` (simulates a previous lifetime)
        pub fn seed(&self, job: Job) {
            self.jobs.lock().unwrap().insert(job.id.clone(), job);
        }
    }

    #[async_trait]
    impl JobStore for InMemoryJobStore {
        async fn create(&self, job: &Job) -> Result<()> {
            let mut jobs = self.jobs.lock().unwrap();
            if jobs.contains_key(&job.id) {
                return Err(AppError::DuplicateId(job.id.clone()));
            }
            jobs.insert(job.id.clone(), job.clone());
            Ok(())
        }

        async fn load(&self, id: &JobId) -> Result<Option<Job>> {
            Ok(self.jobs.lock().unwrap().get(id).cloned())
        }

        async fn save(&self, job: &Job) -> Result<()> {
            let one_off = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if one_off || *self.fail_saves.lock().unwrap() {
                return Err(AppError::Storage("disk full".to_string()));
            }
            let mut stamped = job.clone();
            stamped.updated_at = self.time_provider.now_millis();
            self.jobs.lock().unwrap().insert(job.id.clone(), stamped);
            Ok(())
        }

        async fn list_all(&self) -> Result<Vec<Job>> {
            let mut jobs: Vec<Job> = self.jobs.lock().unwrap().values().cloned().collect();
            jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(jobs)
        }
    }
}
