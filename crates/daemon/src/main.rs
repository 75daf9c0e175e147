//! Walk-in Queue Daemon - Main Entry Point
//!
//! Composition root: config, logging, storage, engine, journal, RPC.

mod config;
mod logging;
mod telemetry;

use anyhow::{Context, Result};
use config::DaemonConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use walkin_api_rpc::RpcServer;
use walkin_core::application::{
    journal_channel, shutdown_channel, JournalStats, JournalWriter, QueueEngine, ShutdownSender,
};
use walkin_core::port::{IdProvider, QueueStore, SystemTimeProvider, TimeProvider, UuidProvider};
use walkin_infra_sqlite::{create_pool, run_migrations, SqlitePool, SqliteQueueStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const JOURNAL_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Background persistence, present when `WALKIN_PERSIST` is on
struct Journal {
    shutdown: ShutdownSender,
    task: JoinHandle<JournalStats>,
    pool: SqlitePool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let config = DaemonConfig::from_env().context("invalid configuration")?;
    let log_guard = logging::init(&config.log)?;

    info!("Walk-in queue daemon v{} starting...", VERSION);

    // 2. Engine (restored from SQLite when persistence is on)
    let id_provider: Arc<dyn IdProvider> = Arc::new(UuidProvider);
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);

    let (engine, journal) = if config.persist {
        let (engine, journal) = open_persistent(&config, id_provider, time_provider).await?;
        (engine, Some(journal))
    } else {
        warn!("Persistence disabled; queue state is lost on exit");
        (QueueEngine::new(id_provider, time_provider), None)
    };
    let engine = Arc::new(engine);

    // 3. JSON-RPC server
    let server = RpcServer::new(config.rpc.clone(), Arc::clone(&engine))
        .start()
        .await
        .context("RPC server start failed")?;

    info!(url = %server.url(), "System ready");
    info!("Press Ctrl+C to shutdown");

    // 4. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 5. Stop accepting requests, then drain the journal
    server.stop().await;
    if let Some(journal) = journal {
        journal.shutdown.shutdown();
        match tokio::time::timeout(JOURNAL_DRAIN_TIMEOUT, journal.task).await {
            Ok(Ok(stats)) => info!(
                written = stats.written,
                failed = stats.failed,
                "Journal drained"
            ),
            Ok(Err(e)) => warn!(error = %e, "Journal task failed"),
            Err(_) => warn!("Journal drain timed out; recent changes may be lost"),
        }
        journal.pool.close().await;
    }

    info!(
        active_tickets = engine.active_ticket_count(),
        "Shutdown complete"
    );
    log_guard.shutdown();
    Ok(())
}

async fn open_persistent(
    config: &DaemonConfig,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<(QueueEngine, Journal)> {
    if let Some(dir) = config.db_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create {}", dir.display()))?;
    }
    info!(db_path = %config.db_path.display(), "Initializing database...");

    let pool = create_pool(&config.database_url())
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    let store = Arc::new(SqliteQueueStore::new(pool.clone()));
    let snapshot = store.load().await.context("Loading queue state failed")?;
    let (tx, rx) = journal_channel();
    let engine = QueueEngine::restore(snapshot, id_provider, time_provider)
        .context("Stored queue state is inconsistent")?
        .with_journal(tx);

    let (shutdown, token) = shutdown_channel();
    let writer = JournalWriter::new(store, rx);
    let task = tokio::spawn(writer.run(token));

    Ok((
        engine,
        Journal {
            shutdown,
            task,
            pool,
        },
    ))
}
