//! Persisted index of synced notes.
//!
//! A single JSON object mapping note path to [`SyncedNote`], stored through
//! the host's [`StorageAdapter`]. The sync manager loads it once per run and
//! writes it back after every note, so an interrupted run never re-uploads
//! notes that already succeeded.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::SyncedNote;
use crate::vault::StorageAdapter;

/// Path → last known sync state.
pub type NoteIndex = BTreeMap<String, SyncedNote>;

pub struct IndexStore {
    storage: Arc<dyn StorageAdapter>,
    path: String,
}

impl IndexStore {
    pub fn new(storage: Arc<dyn StorageAdapter>, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Load the index. A missing, empty or unreadable file yields an empty
    /// index rather than an error.
    pub async fn load(&self) -> NoteIndex {
        match self.try_load().await {
            Ok(Some(index)) => {
                tracing::info!(entries = index.len(), path = %self.path, "loaded sync index");
                index
            }
            Ok(None) => {
                tracing::info!(path = %self.path, "no existing sync index, starting empty");
                NoteIndex::new()
            }
            Err(e) => {
                tracing::warn!(path = %self.path, "failed to load sync index: {:#}", e);
                NoteIndex::new()
            }
        }
    }

    async fn try_load(&self) -> Result<Option<NoteIndex>> {
        if !self.storage.exists(&self.path).await? {
            return Ok(None);
        }
        let data = self.storage.read(&self.path).await?;
        if data.trim().is_empty() {
            return Ok(None);
        }
        let index: NoteIndex = serde_json::from_str(&data)
            .with_context(|| format!("Invalid sync index JSON in {}", self.path))?;
        Ok(Some(index))
    }

    /// Write the whole index, creating its directory first if needed.
    pub async fn save(&self, index: &NoteIndex) -> Result<()> {
        if let Some(pos) = self.path.rfind('/') {
            let dir = &self.path[..pos];
            if !dir.is_empty() && !self.storage.exists(dir).await? {
                self.storage.mkdir(dir).await?;
            }
        }

        let json = serde_json::to_string_pretty(index)?;
        self.storage.write(&self.path, &json).await?;
        tracing::debug!(entries = index.len(), path = %self.path, "saved sync index");
        Ok(())
    }
}
