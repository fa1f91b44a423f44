//! RPC Request/Response Types
//!
//! Method parameters and results of the JSON-RPC surface. Requests that carry
//! a suffix reuse `KeypairRequest` from core, whose numeric fields are lenient.

use serde::{Deserialize, Serialize};
use vanity_core::application::SchedulerStats;

pub use vanity_core::application::{GeneratedKeypairs, JobAccepted, KeypairRequest};
pub use vanity_core::domain::{Job, JobSummary};

/// JSON-RPC method names
pub mod method {
    pub const SUBMIT: &str = "vanity.submit.v1";
    pub const GET: &str = "vanity.get.v1";
    pub const LIST: &str = "vanity.list.v1";
    pub const GENERATE: &str = "vanity.generate.v1";
    pub const HEALTH: &str = "admin.health.v1";
}

/// vanity.get.v1 - Fetch one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetJobRequest {
    pub id: String,
}

/// admin.health.v1 - Scheduler snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub version: String,
    pub uptime_seconds: u64,
    #[serde(flatten)]
    pub scheduler: SchedulerStats,
}
