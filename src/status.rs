//! Sync index overview.
//!
//! Summarises the persisted index without touching the network: how many
//! notes are synced, which ones failed and why, and when the last sync
//! happened. Used by `rfsync status`.

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::index::{IndexStore, NoteIndex};
use crate::models::NoteStatus;
use crate::vault::FsVault;

/// Counts derived from the index.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Unix milliseconds of the most recent attempt.
    pub last_synced: Option<i64>,
}

pub fn summarize(index: &NoteIndex) -> IndexSummary {
    let mut summary = IndexSummary {
        total: index.len(),
        ..Default::default()
    };
    for note in index.values() {
        match note.status {
            NoteStatus::Success => summary.succeeded += 1,
            NoteStatus::Failed => summary.failed += 1,
        }
        summary.last_synced = summary.last_synced.max(Some(note.last_synced));
    }
    summary
}

/// Run the status command: load the index and print a summary.
pub async fn run_status(config: &Config) -> Result<()> {
    let vault = Arc::new(FsVault::new(&config.vault.root)?);
    let store = IndexStore::new(vault, config.vault.index_path.clone());
    let index = store.load().await;
    let summary = summarize(&index);

    println!("RAGFlow Sync: Index Status");
    println!("==========================");
    println!();
    println!("  Vault:          {}", config.vault.root.display());
    println!("  Knowledge base: {}", config.ragflow.knowledge_base);
    println!("  Index:          {}", store.path());
    println!();
    println!("  Notes:          {}", summary.total);
    println!("  Synced:         {}", summary.succeeded);
    println!("  Failed:         {}", summary.failed);
    println!(
        "  Last sync:      {}",
        summary
            .last_synced
            .map(|ms| format_ts_relative(ms / 1000))
            .unwrap_or_else(|| "never".to_string())
    );

    let failures: Vec<_> = index
        .values()
        .filter(|n| n.status == NoteStatus::Failed)
        .collect();
    if !failures.is_empty() {
        println!();
        println!("  Failed notes:");
        println!("  {:<40}   {}", "PATH", "ERROR");
        println!("  {}", "-".repeat(76));
        for note in failures {
            println!(
                "  {:<40}   {}",
                note.path,
                note.error.as_deref().unwrap_or("")
            );
        }
    }

    println!();
    Ok(())
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
