//! Vanity Queue - Main Entry Point
//!
//! Composition root: configuration, logging, store, recovery, then RPC.

mod config;
mod logging;

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use config::{DaemonConfig, StoreKind};
use vanity_api_rpc::{RpcServer, RpcServerConfig};
use vanity_core::application::{RecoveryService, Scheduler, VanityService};
use vanity_core::port::id_provider::UuidProvider;
use vanity_core::port::time_provider::SystemTimeProvider;
use vanity_core::port::{JobStore, TimeProvider};
use vanity_infra_fs::FsJobStore;
use vanity_infra_sqlite::{create_pool, run_migrations, SqliteJobStore};
use vanity_infra_system::ToolGenerator;

const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn open_store(
    config: &DaemonConfig,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<Arc<dyn JobStore>> {
    match config.store {
        StoreKind::Fs => {
            info!(data_dir = %config.data_dir.display(), "Opening file job store...");
            let store = FsJobStore::new(&config.data_dir, time_provider).await?;
            Ok(Arc::new(store))
        }
        StoreKind::Sqlite => {
            std::fs::create_dir_all(&config.data_dir)?;
            let url = config.sqlite_url();
            info!(url = %url, "Opening SQLite job store...");
            let pool = create_pool(&url).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(SqliteJobStore::new(pool, time_provider)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env()?;

    // 2. Initialize logging (guard flushes the file layer on exit)
    let _log_guard = logging::init_logging(&config)?;

    info!("Vanity Queue v{} starting...", VERSION);

    // 3. Open the store
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let store = open_store(&config, time_provider.clone()).await?;

    // 4. Setup dependencies (DI wiring)
    let generator = Arc::new(ToolGenerator::from_template(
        &config.tool_path,
        &config.tool_args,
    ));
    let scheduler = Scheduler::new(
        store.clone(),
        generator.clone(),
        time_provider.clone(),
        config.engine.max_concurrent,
        config.engine.max_queue_depth,
    );

    // 5. Crash recovery, before any request is accepted
    info!("Running crash recovery...");
    let report = RecoveryService::new(store.clone(), scheduler.clone())
        .recover()
        .await
        .map_err(|e| {
            error!(error = %e, "Crash recovery failed");
            anyhow::anyhow!("Crash recovery failed: {}", e)
        })?;
    info!(
        scanned = report.scanned,
        requeued = report.requeued,
        "Crash recovery completed"
    );

    // 6. Start JSON-RPC server
    let service = Arc::new(VanityService::new(
        store,
        scheduler,
        generator,
        Arc::new(UuidProvider),
        time_provider,
        config.engine.clone(),
    ));
    let rpc_config = RpcServerConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
    };
    let server = RpcServer::new(rpc_config, service)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(
        addr = %server.local_addr,
        tool = %config.tool_path,
        max_concurrent = config.engine.max_concurrent,
        max_queue_depth = config.engine.max_queue_depth,
        "System ready"
    );
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting...");

    // Running jobs stay `running` on disk and are requeued on the next start
    server
        .handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    server.handle.stopped().await;

    info!("Shutdown complete.");

    Ok(())
}
