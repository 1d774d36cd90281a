//! Sync pipeline orchestration.
//!
//! [`SyncManager`] owns the run state: progress counters, the loaded note
//! index and the current run's stop token. A run walks the vault one note at
//! a time:
//!
//! ```text
//! load index → resolve dataset → list notes → filter
//!     for each note: [stop?] → hash → unchanged? skip
//!                              → chunk → create/reuse document → add chunks
//!                    → record outcome → save index
//! ```
//!
//! Stopping is cooperative. [`SyncManager::stop_sync`] cancels the run's
//! token and the loop notices it before starting the next note; requests
//! already in flight for the current note finish normally.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::api::KnowledgeBase;
use crate::chunk::chunk_content;
use crate::index::{IndexStore, NoteIndex};
use crate::models::{Dataset, RunStatus, SyncProgress, SyncedNote};
use crate::vault::{Vault, VaultFile};

pub const STOPPED_MESSAGE: &str = "Sync stopped by user";
pub const STOPPING_MESSAGE: &str = "Stopping sync...";

/// The subset of settings a run needs.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub knowledge_base: String,
    pub exclude_folders: Vec<String>,
    pub chunk_size: usize,
}

impl SyncSettings {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            knowledge_base: config.ragflow.knowledge_base.clone(),
            exclude_folders: config.sync.exclude_folders.clone(),
            chunk_size: config.sync.chunk_size,
        }
    }

    /// Notes that are not markdown, or live under an excluded folder, are
    /// left out of a run.
    pub fn should_exclude(&self, file: &VaultFile) -> bool {
        if file.extension != "md" {
            return true;
        }
        self.exclude_folders
            .iter()
            .any(|folder| file.path.starts_with(&format!("{}/", folder)))
    }
}

/// What `sync_file` did with one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Content hash matched the last successful upload.
    Unchanged,
    /// Chunks were uploaded to the given document.
    Uploaded { document_id: String, chunks: usize },
}

/// Lowercase hex SHA-256 of the note content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct SyncManager {
    api: Arc<dyn KnowledgeBase>,
    vault: Arc<dyn Vault>,
    index_store: IndexStore,
    settings: SyncSettings,
    progress: Mutex<SyncProgress>,
    stop: Mutex<Option<CancellationToken>>,
    index: tokio::sync::Mutex<NoteIndex>,
}

impl SyncManager {
    pub fn new(
        api: Arc<dyn KnowledgeBase>,
        vault: Arc<dyn Vault>,
        index_store: IndexStore,
        settings: SyncSettings,
    ) -> Self {
        Self {
            api,
            vault,
            index_store,
            settings,
            progress: Mutex::new(SyncProgress::default()),
            stop: Mutex::new(None),
            index: tokio::sync::Mutex::new(NoteIndex::new()),
        }
    }

    /// Snapshot of the current progress.
    pub fn progress(&self) -> SyncProgress {
        self.progress_lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.progress_lock().status == RunStatus::Running
    }

    /// Snapshot of the note index as of the last load or update.
    pub async fn index(&self) -> NoteIndex {
        self.index.lock().await.clone()
    }

    /// Ask the current run to stop before its next note. No-op when idle.
    pub fn stop_sync(&self) {
        let mut progress = self.progress_lock();
        if progress.status != RunStatus::Running {
            return;
        }
        if let Some(token) = self.stop_lock().as_ref() {
            token.cancel();
        }
        progress.message = Some(STOPPING_MESSAGE.to_string());
        tracing::info!("stop requested");
    }

    /// Run a full sync and return the final progress.
    ///
    /// Returns immediately with the current snapshot if a run is already
    /// active. Errors never escape: a fatal failure ends the run with
    /// status `error` and the error text as its message.
    pub async fn start_sync(&self) -> SyncProgress {
        let token = CancellationToken::new();
        {
            let mut progress = self.progress_lock();
            if progress.status == RunStatus::Running {
                tracing::warn!("sync already running, ignoring start request");
                return progress.clone();
            }
            *progress = SyncProgress::running();
            *self.stop_lock() = Some(token.clone());
        }

        if let Err(e) = self.run(&token).await {
            tracing::error!("Sync failed: {:#}", e);
            let mut progress = self.progress_lock();
            progress.status = RunStatus::Error;
            progress.message = Some(format!("{:#}", e));
        }

        *self.stop_lock() = None;
        let progress = self.progress();
        tracing::info!(
            status = ?progress.status,
            processed = progress.processed,
            succeeded = progress.succeeded,
            failed = progress.failed,
            "sync finished"
        );
        progress
    }

    async fn run(&self, token: &CancellationToken) -> Result<()> {
        let mut index = self.index.lock().await;
        *index = self.index_store.load().await;

        let dataset = self
            .api
            .get_or_create_dataset(&self.settings.knowledge_base)
            .await
            .context("Failed to get or create dataset")?;

        let files: Vec<VaultFile> = self
            .vault
            .markdown_files()
            .await
            .context("Failed to list vault notes")?
            .into_iter()
            .filter(|f| !self.settings.should_exclude(f))
            .collect();

        self.update(|p| p.total = files.len() as u64);
        tracing::info!(dataset = %dataset.id, total = files.len(), "starting sync");

        for file in &files {
            if token.is_cancelled() {
                self.update(|p| {
                    p.status = RunStatus::Completed;
                    p.message = Some(STOPPED_MESSAGE.to_string());
                });
                tracing::info!("sync stopped by user");
                break;
            }

            match self.sync_file(&dataset, file, &mut index).await {
                Ok(outcome) => {
                    tracing::debug!(path = %file.path, ?outcome, "note synced");
                    self.update(|p| p.succeeded += 1);
                }
                Err(e) => {
                    tracing::warn!(path = %file.path, "Failed to sync file: {:#}", e);
                    index.insert(
                        file.path.clone(),
                        SyncedNote::failed(&file.path, format!("{:#}", e)),
                    );
                    self.update(|p| p.failed += 1);
                }
            }

            self.update(|p| p.processed += 1);
            if let Err(e) = self.index_store.save(&index).await {
                tracing::error!("Failed to save sync index: {:#}", e);
            }
        }

        self.update(|p| {
            if p.status == RunStatus::Running {
                p.status = RunStatus::Completed;
            }
        });
        Ok(())
    }

    /// Sync one note against `dataset`, updating its index entry on success.
    pub async fn sync_file(
        &self,
        dataset: &Dataset,
        file: &VaultFile,
        index: &mut NoteIndex,
    ) -> Result<FileOutcome> {
        let content = self.vault.read(file).await?;
        let hash = content_hash(&content);

        let previous = index.get(&file.path);
        if let Some(note) = previous {
            if note.is_success() && note.hash == hash {
                return Ok(FileOutcome::Unchanged);
            }
        }

        let chunks = chunk_content(&content, self.settings.chunk_size);

        // Known documents are reused as-is; their old chunks stay in place.
        let document_id = match previous.filter(|n| !n.document_id.is_empty()) {
            Some(note) => note.document_id.clone(),
            None => {
                self.api
                    .create_document(&dataset.id, &file.name, &content)
                    .await?
                    .id
            }
        };

        for chunk in &chunks {
            self.api
                .add_chunk(&dataset.id, &document_id, chunk)
                .await?;
        }

        index.insert(
            file.path.clone(),
            SyncedNote::success(&file.path, hash, document_id.clone()),
        );
        Ok(FileOutcome::Uploaded {
            document_id,
            chunks: chunks.len(),
        })
    }

    fn update(&self, f: impl FnOnce(&mut SyncProgress)) {
        f(&mut self.progress_lock());
    }

    fn progress_lock(&self) -> std::sync::MutexGuard<'_, SyncProgress> {
        self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stop_lock(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.stop.lock().unwrap_or_else(|e| e.into_inner())
    }
}
