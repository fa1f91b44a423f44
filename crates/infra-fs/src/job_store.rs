// File-backed JobStore
//
// Layout: <data_dir>/jobs/<id>.json
// Every write goes to a hidden temp file in the same directory, is fsynced,
// then renamed (save) or hard-linked (create) into place, so readers only
// ever see complete records.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use vanity_core::domain::{Job, JobId};
use vanity_core::error::{AppError, Result};
use vanity_core::port::job_store::is_valid_job_id;
use vanity_core::port::{JobStore, TimeProvider};

const JOBS_DIR: &str = "jobs";
const RECORD_EXT: &str = "json";

pub struct FsJobStore {
    jobs_dir: PathBuf,
    time_provider: Arc<dyn TimeProvider>,
    temp_seq: AtomicU64,
}

impl FsJobStore {
    /// Open (creating if needed) the store under `data_dir`
    pub async fn new(data_dir: impl AsRef<Path>, time_provider: Arc<dyn TimeProvider>) -> Result<Self> {
        let jobs_dir = data_dir.as_ref().join(JOBS_DIR);
        tokio::fs::create_dir_all(&jobs_dir).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create job directory {}: {}",
                jobs_dir.display(),
                e
            ))
        })?;

        let swept = sweep_temp_files(&jobs_dir).await?;
        debug!(path = %jobs_dir.display(), swept, "File job store opened");

        Ok(Self {
            jobs_dir,
            time_provider,
            temp_seq: AtomicU64::new(0),
        })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.jobs_dir.join(format!("{}.{}", id, RECORD_EXT))
    }

    fn temp_path(&self, id: &str) -> PathBuf {
        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        self.jobs_dir.join(format!(".{}.{}.tmp", id, seq))
    }

    /// Serialize `job` into a fresh temp file and fsync it
    async fn write_temp(&self, job: &Job) -> Result<PathBuf> {
        let bytes = serde_json::to_vec_pretty(job)?;
        let temp_path = self.temp_path(&job.id);

        let mut file = tokio::fs::File::create(&temp_path).await.map_err(|e| {
            AppError::Storage(format!("Failed to create {}: {}", temp_path.display(), e))
        })?;
        let written = async {
            file.write_all(&bytes).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(AppError::Storage(format!(
                "Failed to write {}: {}",
                temp_path.display(),
                e
            )));
        }
        Ok(temp_path)
    }

    fn check_id(id: &str) -> Result<()> {
        if is_valid_job_id(id) {
            Ok(())
        } else {
            Err(AppError::Validation(format!("Invalid job id: {:?}", id)))
        }
    }
}

/// Remove hidden temp files left by a write that never reached its rename.
///
/// Only safe while no other writer uses the directory, i.e. at open time.
async fn sweep_temp_files(jobs_dir: &Path) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(jobs_dir).await.map_err(|e| {
        AppError::Storage(format!("Failed to list {}: {}", jobs_dir.display(), e))
    })?;

    let mut swept = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with('.') && name.ends_with(".tmp")) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => swept += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Failed to remove stale temp file");
            }
        }
    }
    if swept > 0 {
        warn!(count = swept, "Removed stale temp files from an interrupted write");
    }
    Ok(swept)
}

#[async_trait]
impl JobStore for FsJobStore {
    async fn create(&self, job: &Job) -> Result<()> {
        Self::check_id(&job.id)?;

        let temp_path = self.write_temp(job).await?;
        let record_path = self.record_path(&job.id);

        // link() refuses to replace an existing file, which makes the
        // existence check and the publish a single step
        let linked = tokio::fs::hard_link(&temp_path, &record_path).await;
        let _ = tokio::fs::remove_file(&temp_path).await;

        match linked {
            Ok(()) => {
                debug!(job_id = %job.id, "Job record created");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(AppError::DuplicateId(job.id.clone()))
            }
            Err(e) => Err(AppError::Storage(format!(
                "Failed to create {}: {}",
                record_path.display(),
                e
            ))),
        }
    }

    async fn load(&self, id: &JobId) -> Result<Option<Job>> {
        if !is_valid_job_id(id) {
            return Ok(None);
        }

        let path = self.record_path(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let job = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Storage(format!("Corrupt job record {}: {}", path.display(), e))
        })?;
        Ok(Some(job))
    }

    async fn save(&self, job: &Job) -> Result<()> {
        Self::check_id(&job.id)?;

        let mut stamped = job.clone();
        stamped.updated_at = self.time_provider.now_millis();

        let temp_path = self.write_temp(&stamped).await?;
        let record_path = self.record_path(&job.id);

        if let Err(e) = tokio::fs::rename(&temp_path, &record_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(AppError::Storage(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                record_path.display(),
                e
            )));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Job>> {
        let mut entries = tokio::fs::read_dir(&self.jobs_dir).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to list {}: {}",
                self.jobs_dir.display(),
                e
            ))
        })?;

        let mut jobs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path.extension().and_then(|ext| ext.to_str()) == Some(RECORD_EXT)
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_record {
                continue;
            }

            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable job record");
                    continue;
                }
            };
            match serde_json::from_slice::<Job>(&bytes) {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping corrupt job record");
                }
            }
        }

        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(jobs)
    }
}
