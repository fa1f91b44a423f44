// Engine configuration (limits shared by the scheduler and the service boundary)

use crate::error::{AppError, Result};

/// Maximum keypairs per job
pub const MAX_COUNT: u32 = 10;

/// Default maximum jobs running at once
pub const DEFAULT_MAX_CONCURRENT: usize = 1;

/// Default maximum jobs waiting in the queue
pub const DEFAULT_MAX_QUEUE_DEPTH: usize = 50;

/// Default maximum suffix length for queued jobs
pub const DEFAULT_MAX_SUFFIX_LEN: usize = 8;

/// Default maximum suffix length for inline (synchronous) generation
pub const DEFAULT_SYNC_MAX_SUFFIX_LEN: usize = 4;

/// Default per-item timeout (2 minutes)
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Upper bound for any per-item timeout (10 minutes)
pub const DEFAULT_MAX_TIMEOUT_MS: u64 = 600_000;

/// Limits the core enforces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_concurrent: usize,
    pub max_queue_depth: usize,
    pub max_suffix_len: usize,
    pub sync_max_suffix_len: usize,
    pub default_timeout_ms: u64,
    pub max_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_queue_depth: DEFAULT_MAX_QUEUE_DEPTH,
            max_suffix_len: DEFAULT_MAX_SUFFIX_LEN,
            sync_max_suffix_len: DEFAULT_SYNC_MAX_SUFFIX_LEN,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_timeout_ms: DEFAULT_MAX_TIMEOUT_MS,
        }
    }
}

impl EngineConfig {
    /// Reject limits the scheduler cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(AppError::Config("max_concurrent must be at least 1".into()));
        }
        if self.max_queue_depth == 0 {
            return Err(AppError::Config("max_queue_depth must be at least 1".into()));
        }
        if self.max_suffix_len == 0 {
            return Err(AppError::Config("max_suffix_len must be at least 1".into()));
        }
        if self.max_timeout_ms == 0 {
            return Err(AppError::Config("max_timeout_ms must be at least 1".into()));
        }
        Ok(())
    }

    /// Clamp a requested count into [1, MAX_COUNT]; missing means 1
    pub fn clamp_count(&self, requested: Option<i64>) -> u32 {
        requested.unwrap_or(1).clamp(1, MAX_COUNT as i64) as u32
    }

    /// Clamp a requested timeout into [1, max_timeout_ms]; missing means the default.
    ///
    /// Out-of-range values are clamped, never rejected.
    pub fn clamp_timeout(&self, requested: Option<i64>) -> u64 {
        match requested {
            None => self.default_timeout_ms.min(self.max_timeout_ms),
            Some(ms) => {
                let max = i64::try_from(self.max_timeout_ms).unwrap_or(i64::MAX);
                ms.clamp(1, max) as u64
            }
        }
    }
}
