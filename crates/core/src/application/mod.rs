// Application Layer - Use Cases and Business Logic

pub mod recovery;
pub mod scheduler;
pub mod service;

// Re-exports
pub use recovery::{RecoveryReport, RecoveryService};
pub use scheduler::{Scheduler, SchedulerStats};
pub use service::{GeneratedKeypairs, JobAccepted, KeypairRequest, VanityService};
