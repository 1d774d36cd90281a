//! Core data models shared by the sync pipeline.
//!
//! [`SyncedNote`] is what the persisted index stores per note path,
//! [`SyncProgress`] is the transient run state read by the progress poller,
//! and [`Dataset`], [`Document`] and [`Chunk`] mirror the remote service's
//! JSON payloads.

use serde::{Deserialize, Serialize};

/// Outcome of the last sync attempt for one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    Success,
    Failed,
}

/// Index entry for one vault note, keyed by its vault-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedNote {
    pub path: String,
    /// Content hash of the last successful upload; empty after a failure.
    #[serde(default, alias = "md5")]
    pub hash: String,
    #[serde(default)]
    pub document_id: String,
    /// Unix milliseconds.
    pub last_synced: i64,
    pub status: NoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncedNote {
    pub fn success(path: &str, hash: String, document_id: String) -> Self {
        Self {
            path: path.to_string(),
            hash,
            document_id,
            last_synced: chrono::Utc::now().timestamp_millis(),
            status: NoteStatus::Success,
            error: None,
        }
    }

    /// A failed attempt keeps no hash or document id, so the next run retries
    /// the note from scratch.
    pub fn failed(path: &str, error: String) -> Self {
        Self {
            path: path.to_string(),
            hash: String::new(),
            document_id: String::new(),
            last_synced: chrono::Utc::now().timestamp_millis(),
            status: NoteStatus::Failed,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == NoteStatus::Success
    }
}

/// Lifecycle of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Error)
    }
}

/// Counters for the current (or last) run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncProgress {
    pub total: u64,
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SyncProgress {
    /// Fresh counters for a run that is about to start.
    pub fn running() -> Self {
        Self {
            status: RunStatus::Running,
            ..Self::default()
        }
    }
}

/// Remote knowledge-base container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub chunk_count: u64,
    #[serde(default)]
    pub document_count: u64,
}

/// Remote representation of one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dataset_id: String,
}

/// A unit of text attached to a remote document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub document_id: String,
}
