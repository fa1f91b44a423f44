// SQLite JobStore Implementation

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::warn;
use vanity_core::domain::{Job, JobId};
use vanity_core::error::{AppError, Result};
use vanity_core::port::job_store::is_valid_job_id;
use vanity_core::port::{JobStore, TimeProvider};

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            Some(code) if code == "5" => {
                AppError::Storage(format!("Database locked (SQLITE_BUSY): {}", db_err.message()))
            }
            Some(code) if code == "13" => {
                AppError::Storage(format!("Database full: {}", db_err.message()))
            }
            Some(code) => AppError::Storage(format!(
                "Database error [{}]: {}",
                code,
                db_err.message()
            )),
            None => AppError::Storage(format!("Database error: {}", db_err.message())),
        },
        _ => AppError::Storage(err.to_string()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            // SQLITE_CONSTRAINT_PRIMARYKEY / SQLITE_CONSTRAINT_UNIQUE
            matches!(db_err.code().as_deref(), Some("1555") | Some("2067"))
        }
        _ => false,
    }
}

pub struct SqliteJobStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn create(&self, job: &Job) -> Result<()> {
        let record = serde_json::to_string(job)?;

        let inserted = sqlx::query(
            "INSERT INTO jobs (id, status, created_at, updated_at, record) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&job.id)
        .bind(job.status.to_string())
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(record)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateId(job.id.clone())),
            Err(e) => Err(map_sqlx_error(e)),
        }
    }

    async fn load(&self, id: &JobId) -> Result<Option<Job>> {
        if !is_valid_job_id(id) {
            return Ok(None);
        }

        let record: Option<String> = sqlx::query_scalar("SELECT record FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match record {
            Some(record) => {
                let job = serde_json::from_str(&record).map_err(|e| {
                    AppError::Storage(format!("Corrupt job record {}: {}", id, e))
                })?;
                Ok(Some(job))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, job: &Job) -> Result<()> {
        let mut stamped = job.clone();
        stamped.updated_at = self.time_provider.now_millis();
        let record = serde_json::to_string(&stamped)?;

        let result = sqlx::query(
            "UPDATE jobs SET status = ?, updated_at = ?, record = ? WHERE id = ?",
        )
        .bind(stamped.status.to_string())
        .bind(stamped.updated_at)
        .bind(record)
        .bind(&stamped.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Job {} not found", job.id)));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query("SELECT id, record FROM jobs ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let record: String = row.get("record");
            match serde_json::from_str::<Job>(&record) {
                Ok(job) => jobs.push(job),
                Err(e) => warn!(job_id = %id, error = %e, "Skipping corrupt job record"),
            }
        }
        Ok(jobs)
    }
}
