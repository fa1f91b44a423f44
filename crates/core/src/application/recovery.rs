// Crash recovery: requeue work interrupted by a previous process lifetime
use crate::application::scheduler::Scheduler;
use crate::domain::{Job, JobStatus};
use crate::port::JobStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one recovery pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecoveryReport {
    /// Records read from the store
    pub scanned: usize,
    /// Jobs reset and put back in the queue
    pub requeued: usize,
}

/// Crash recovery service
///
/// Runs once on startup, before the service accepts traffic. The store has
/// a single owner, so nothing else can be touching these records.
pub struct RecoveryService {
    store: Arc<dyn JobStore>,
    scheduler: Scheduler,
}

impl RecoveryService {
    pub fn new(store: Arc<dyn JobStore>, scheduler: Scheduler) -> Self {
        Self { store, scheduler }
    }

    /// Reset and requeue every job left `queued` or `running`.
    ///
    /// Algorithm:
    /// 1. Enumerate all records (corrupt ones are skipped by the store)
    /// 2. For each `queued`/`running` job: discard results and progress, set
    ///    `queued`, persist. The external tool has no checkpoints, so partial
    ///    work cannot be resumed.
    /// 3. Requeue the reset jobs oldest first, ignoring the depth limit
    ///
    /// `complete` and `failed` jobs are left untouched.
    ///
    /// # Returns
    /// How many records were scanned and requeued
    pub async fn recover(&self) -> crate::error::Result<RecoveryReport> {
        let jobs = self.store.list_all().await?;
        let scanned = jobs.len();

        info!(scanned = scanned, "Starting interrupted job recovery");

        let mut interrupted: Vec<Job> = jobs
            .into_iter()
            .filter(|job| matches!(job.status, JobStatus::Queued | JobStatus::Running))
            .collect();
        interrupted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        for job in interrupted.iter_mut() {
            let previous = job.status;
            let discarded = job.results.len();
            job.reset_for_recovery()?;
            self.store.save(job).await?;

            if discarded > 0 {
                warn!(
                    job_id = %job.id,
                    previous_status = %previous,
                    discarded_results = discarded,
                    "Discarding partial results of interrupted job"
                );
            } else {
                info!(job_id = %job.id, previous_status = %previous, "Resetting interrupted job");
            }
        }

        for job in &interrupted {
            self.scheduler.requeue(job.id.clone()).await?;
        }

        let report = RecoveryReport {
            scanned,
            requeued: interrupted.len(),
        };
        info!(
            scanned = report.scanned,
            requeued = report.requeued,
            "Interrupted job recovery complete"
        );
        Ok(report)
    }
}
