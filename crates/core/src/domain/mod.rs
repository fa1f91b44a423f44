// Domain Layer - Pure business logic and entities

pub mod error;
pub mod job;
pub mod suffix;

// Re-exports
pub use error::DomainError;
pub use job::{GeneratedKeypair, Job, JobId, JobProgress, JobStatus, JobSummary};
pub use suffix::{Suffix, EXCLUDED_CHARS};
