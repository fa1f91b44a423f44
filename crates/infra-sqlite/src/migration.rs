// Versioned schema migrations, applied in order inside one transaction each

use sqlx::SqlitePool;
use tracing::info;
use vanity_core::error::{AppError, Result};

/// (version, label, script). Every script records its own version in `schema_version`.
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "job records",
    include_str!("../migrations/001_jobs.sql"),
)];

fn storage(e: sqlx::Error) -> AppError {
    AppError::Storage(format!("Migration failed: {}", e))
}

/// Bring the schema up to the latest version; a no-op when already current
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = schema_version(pool).await?;
    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|(version, _, _)| *version > current)
        .collect();

    if pending.is_empty() {
        info!(version = current, "Schema is up to date");
        return Ok(());
    }

    for (version, label, script) in pending {
        info!(version, label, "Applying migration");
        apply_migration(pool, script).await?;
    }
    Ok(())
}

/// Highest applied version, 0 on a fresh database
async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
    )
    .fetch_one(pool)
    .await
    .map_err(storage)?;
    if tracked == 0 {
        return Ok(0);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .map_err(storage)?;
    Ok(version.unwrap_or(0))
}

fn statements(script: &str) -> impl Iterator<Item = String> + '_ {
    script
        .split(';')
        .map(|chunk| {
            chunk
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .map(|statement| statement.trim().to_string())
        .filter(|statement| !statement.is_empty())
}

async fn apply_migration(pool: &SqlitePool, script: &str) -> Result<()> {
    let mut tx = pool.begin().await.map_err(storage)?;
    for statement in statements(script) {
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
    }
    tx.commit().await.map_err(storage)
}
