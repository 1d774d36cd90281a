//! `rfsync sync` and `rfsync startup`.
//!
//! Wires the filesystem vault and the RAGFlow client into a
//! [`SyncManager`], runs it on a background task and polls its progress
//! until the run ends. Ctrl-C requests a cooperative stop.

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::api::RagflowClient;
use crate::config::Config;
use crate::index::IndexStore;
use crate::models::{RunStatus, SyncProgress};
use crate::progress::{watch_progress, ProgressMode};
use crate::sync::{SyncManager, SyncSettings, STOPPED_MESSAGE};
use crate::vault::FsVault;

pub fn build_manager(config: &Config) -> Result<SyncManager> {
    let vault = Arc::new(FsVault::new(&config.vault.root)?);
    let api = Arc::new(RagflowClient::new(&config.ragflow, config.sync.chunk_size)?);
    let store = IndexStore::new(vault.clone(), config.vault.index_path.clone());
    Ok(SyncManager::new(
        api,
        vault,
        store,
        SyncSettings::from_config(config),
    ))
}

pub async fn run_sync(config: &Config, mode: ProgressMode) -> Result<SyncProgress> {
    // Nothing starts without credentials and a target.
    config.ensure_ready()?;

    let manager = Arc::new(build_manager(config)?);
    let run = tokio::spawn({
        let manager = manager.clone();
        async move { manager.start_sync().await }
    });

    let reporter = mode.reporter();
    let interval = Duration::from_millis(config.sync.poll_interval_ms);
    let watcher = watch_progress(&manager, interval, reporter.as_ref());
    tokio::pin!(watcher);

    loop {
        tokio::select! {
            _ = &mut watcher => break,
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() && manager.is_running() {
                    manager.stop_sync();
                    eprintln!("Stopping sync process. Please wait for current operations to complete...");
                }
            }
        }
    }

    let progress = run.await?;
    print_summary(config, &progress);

    if progress.status == RunStatus::Error {
        bail!(
            "Sync failed: {}",
            progress.message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(progress)
}

fn print_summary(config: &Config, progress: &SyncProgress) {
    println!("sync {}", config.ragflow.knowledge_base);
    println!("  notes: {}", progress.total);
    println!("  processed: {}", progress.processed);
    println!("  succeeded: {}", progress.succeeded);
    println!("  failed: {}", progress.failed);
    if progress.message.as_deref() == Some(STOPPED_MESSAGE) {
        println!("  stopped by user");
    }
    if progress.status == RunStatus::Completed {
        println!("ok");
    }
}

/// Startup hook: sync after a short delay when enabled in settings.
pub async fn run_startup(config: &Config, mode: ProgressMode) -> Result<()> {
    if !config.sync.on_startup {
        println!("startup sync disabled (sync.on_startup = false)");
        return Ok(());
    }

    let delay = Duration::from_secs(config.sync.startup_delay_secs);
    tracing::info!(delay_secs = delay.as_secs(), "waiting before startup sync");
    tokio::time::sleep(delay).await;

    run_sync(config, mode).await?;
    Ok(())
}
