// Job Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Job ID (UUID v4)
pub type JobId = String;

/// Job Status
///
/// `Queued -> Running -> {Complete | Failed}`. Only crash recovery moves a
/// job back to `Queued`, and only at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Complete => write!(f, "complete"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Progress counter; `completed` never exceeds `total`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub completed: u32,
    pub total: u32,
}

/// One keypair produced by the external generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedKeypair {
    /// Base58 public key (re-derived from the secret, not taken from tool output)
    pub public_key: String,
    /// Base58 encoding of the full 64-byte secret key
    pub secret_key: String,
    /// Wall-clock time spent on this item, measured by the adapter
    pub elapsed_ms: u64,
    /// Time reported by the tool itself, when it prints one
    pub tool_elapsed_seconds: Option<f64>,
}

/// Job Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub suffix: String,
    pub count: u32,
    pub timeout_per_item_ms: u64,

    pub status: JobStatus,
    pub progress: JobProgress,
    #[serde(default)]
    pub results: Vec<GeneratedKeypair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub created_at: i64, // epoch ms
    pub updated_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,

    /// Derived 1-based position while queued; `None` otherwise
    pub queue_position: Option<usize>,
}

impl Job {
    /// Create a new queued job
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `suffix` - Already validated suffix
    /// * `count` - Already clamped keypair count
    /// * `timeout_per_item_ms` - Already clamped per-item timeout
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        suffix: impl Into<String>,
        count: u32,
        timeout_per_item_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            suffix: suffix.into(),
            count,
            timeout_per_item_ms,
            status: JobStatus::Queued,
            progress: JobProgress {
                completed: 0,
                total: count,
            },
            results: Vec::new(),
            error: None,
            created_at,
            updated_at: created_at,
            started_at: None,
            completed_at: None,
            queue_position: None,
        }
    }

    /// Create a test job with deterministic ID and timestamp.
    ///
    /// Uses a simple counter for deterministic test IDs (test-1, test-2, ...).
    /// Timestamps start at 1000 and increment by 1000.
    pub fn new_test(suffix: impl Into<String>, count: u32) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        Self::new(
            format!("test-{}", counter),
            (counter * 1000) as i64,
            suffix,
            count,
            1_000,
        )
    }

    fn transition_error(&self, to: JobStatus) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }

    /// Transition to Running with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        if self.status != JobStatus::Queued {
            return Err(self.transition_error(JobStatus::Running));
        }
        self.status = JobStatus::Running;
        self.queue_position = None;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Append one generated keypair while Running
    pub fn record_result(&mut self, keypair: GeneratedKeypair) -> Result<()> {
        if self.status != JobStatus::Running {
            return Err(DomainError::Validation(format!(
                "cannot record a result for job {} in state {}",
                self.id, self.status
            )));
        }
        if self.progress.completed >= self.progress.total {
            return Err(DomainError::Validation(format!(
                "job {} already has {} of {} results",
                self.id, self.progress.completed, self.progress.total
            )));
        }
        self.results.push(keypair);
        self.progress.completed = self.results.len() as u32;
        Ok(())
    }

    /// Transition to Complete with explicit timestamp
    pub fn complete(&mut self, now_millis: i64) -> Result<()> {
        if self.status != JobStatus::Running {
            return Err(self.transition_error(JobStatus::Complete));
        }
        self.status = JobStatus::Complete;
        self.completed_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Failed, keeping whatever results were already produced
    pub fn fail(&mut self, message: impl Into<String>, now_millis: i64) -> Result<()> {
        if self.status != JobStatus::Running {
            return Err(self.transition_error(JobStatus::Failed));
        }
        self.status = JobStatus::Failed;
        self.error = Some(message.into());
        self.completed_at = Some(now_millis);
        Ok(())
    }

    /// Discard partial work left by a previous process lifetime.
    ///
    /// Only valid for jobs that never reached a terminal state.
    pub fn reset_for_recovery(&mut self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.transition_error(JobStatus::Queued));
        }
        self.status = JobStatus::Queued;
        self.results.clear();
        self.progress = JobProgress {
            completed: 0,
            total: self.count,
        };
        self.error = None;
        self.started_at = None;
        self.completed_at = None;
        self.queue_position = None;
        Ok(())
    }

    /// Listing view without secret material
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            suffix: self.suffix.clone(),
            status: self.status,
            progress: self.progress,
            queue_position: self.queue_position,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

/// Job listing entry (no keys)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub suffix: String,
    pub status: JobStatus,
    pub progress: JobProgress,
    pub queue_position: Option<usize>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}
