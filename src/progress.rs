//! Sync progress reporting.
//!
//! The sync run never pushes updates; instead [`watch_progress`] polls
//! [`SyncManager::progress`] on a fixed interval and hands each snapshot to a
//! [`ProgressReporter`]. Output goes to **stderr** so stdout stays parseable
//! for scripts.

use std::io::Write;
use std::time::Duration;

use crate::models::{RunStatus, SyncProgress};
use crate::sync::SyncManager;

/// Renders progress snapshots.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: &SyncProgress);
}

/// Status-bar style line for a snapshot.
pub fn status_line(progress: &SyncProgress) -> String {
    match progress.status {
        RunStatus::Idle => "RAGFlow: Ready".to_string(),
        RunStatus::Running => match &progress.message {
            Some(msg) => format!("RAGFlow: {}", msg),
            None => format!(
                "RAGFlow: {}/{} ({} succeeded, {} failed)",
                format_number(progress.processed),
                format_number(progress.total),
                format_number(progress.succeeded),
                format_number(progress.failed)
            ),
        },
        RunStatus::Completed => format!(
            "RAGFlow: Synced {}/{}",
            format_number(progress.succeeded),
            format_number(progress.total)
        ),
        RunStatus::Error => format!(
            "RAGFlow: Sync failed: {}",
            progress.message.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Human-friendly progress on stderr.
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, progress: &SyncProgress) {
        let line = format!("{}\n", status_line(progress));
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, progress: &SyncProgress) {
        let obj = serde_json::json!({
            "event": "progress",
            "progress": progress,
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _progress: &SyncProgress) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

/// Poll `manager` every `interval` until its run reaches a terminal state,
/// reporting each snapshot that differs from the previous one. Idle
/// snapshots, seen before a spawned run has started, are not reported.
/// Returns the terminal snapshot.
pub async fn watch_progress(
    manager: &SyncManager,
    interval: Duration,
    reporter: &dyn ProgressReporter,
) -> SyncProgress {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last: Option<SyncProgress> = None;

    loop {
        ticker.tick().await;
        let progress = manager.progress();
        if progress.status == RunStatus::Idle {
            continue;
        }
        if last.as_ref() != Some(&progress) {
            reporter.report(&progress);
        }
        if progress.status.is_terminal() {
            return progress;
        }
        last = Some(progress);
    }
}
