// Vanity Infrastructure - File Store Adapter
// Implements: JobStore as one pretty-printed JSON file per job

mod job_store;

pub use job_store::FsJobStore;
