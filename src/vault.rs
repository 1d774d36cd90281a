//! Host collaborators: note listing and plugin-private storage.
//!
//! The sync core only talks to the host through [`Vault`] (enumerate and
//! read notes) and [`StorageAdapter`] (the small file API used for the
//! persisted index). [`FsVault`] implements both over a directory on disk;
//! [`MemoryVault`] implements both in memory for tests.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use walkdir::WalkDir;

/// A note as listed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultFile {
    /// Vault-relative path with `/` separators.
    pub path: String,
    /// File name including extension.
    pub name: String,
    /// Extension without the leading dot.
    pub extension: String,
}

impl VaultFile {
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let extension = match name.rfind('.') {
            Some(pos) if pos > 0 => name[pos + 1..].to_string(),
            _ => String::new(),
        };
        Self {
            path: path.to_string(),
            name,
            extension,
        }
    }
}

/// Enumerates and reads the user's notes.
#[async_trait]
pub trait Vault: Send + Sync {
    /// All markdown notes, in the host's listing order.
    async fn markdown_files(&self) -> Result<Vec<VaultFile>>;

    /// Current content of a note.
    async fn read(&self, file: &VaultFile) -> Result<String>;
}

/// Text-file storage inside the host's plugin-private area.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool>;
    async fn mkdir(&self, path: &str) -> Result<()>;
    async fn read(&self, path: &str) -> Result<String>;
    async fn write(&self, path: &str, data: &str) -> Result<()>;
}

/// A vault rooted at a directory on disk.
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("Vault root does not exist: {}", root.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn markdown_files(&self) -> Result<Vec<VaultFile>> {
        let root = self.root.clone();
        let mut files = tokio::task::spawn_blocking(move || -> Result<Vec<VaultFile>> {
            let mut files = Vec::new();
            for entry in WalkDir::new(&root) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("md") {
                    continue;
                }
                let relative = path.strip_prefix(&root).unwrap_or(path);
                let rel_str = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push(VaultFile::from_path(&rel_str));
            }
            Ok(files)
        })
        .await??;

        // Sort for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn read(&self, file: &VaultFile) -> Result<String> {
        let path = self.resolve(&file.path);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read note: {}", path.display()))
    }
}

#[async_trait]
impl StorageAdapter for FsVault {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.resolve(path)).await?)
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let dir = self.resolve(path);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", dir.display()))
    }

    async fn read(&self, path: &str) -> Result<String> {
        let file = self.resolve(path);
        tokio::fs::read_to_string(&file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))
    }

    async fn write(&self, path: &str, data: &str) -> Result<()> {
        let file = self.resolve(path);
        tokio::fs::write(&file, data)
            .await
            .with_context(|| format!("Failed to write {}", file.display()))
    }
}

/// In-memory vault and storage for tests.
///
/// Notes are listed in insertion order, like a host that does not sort.
#[derive(Default)]
pub struct MemoryVault {
    notes: RwLock<Vec<(String, String)>>,
    storage: RwLock<BTreeMap<String, String>>,
    dirs: RwLock<Vec<String>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a note, or replace the content of an existing one.
    pub fn put_note(&self, path: &str, content: &str) {
        let mut notes = self.notes.write().unwrap_or_else(|e| e.into_inner());
        match notes.iter_mut().find(|(p, _)| p == path) {
            Some(entry) => entry.1 = content.to_string(),
            None => notes.push((path.to_string(), content.to_string())),
        }
    }

    /// Raw content of a stored (non-note) file.
    pub fn stored(&self, path: &str) -> Option<String> {
        self.storage
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
    }
}

#[async_trait]
impl Vault for MemoryVault {
    async fn markdown_files(&self) -> Result<Vec<VaultFile>> {
        let notes = self.notes.read().unwrap_or_else(|e| e.into_inner());
        Ok(notes
            .iter()
            .map(|(path, _)| VaultFile::from_path(path))
            .filter(|f| f.extension == "md")
            .collect())
    }

    async fn read(&self, file: &VaultFile) -> Result<String> {
        let notes = self.notes.read().unwrap_or_else(|e| e.into_inner());
        notes
            .iter()
            .find(|(p, _)| *p == file.path)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| anyhow::anyhow!("Note not found: {}", file.path))
    }
}

#[async_trait]
impl StorageAdapter for MemoryVault {
    async fn exists(&self, path: &str) -> Result<bool> {
        let in_storage = self
            .storage
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(path);
        let in_dirs = self
            .dirs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|d| d == path);
        Ok(in_storage || in_dirs)
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let mut dirs = self.dirs.write().unwrap_or_else(|e| e.into_inner());
        if !dirs.iter().any(|d| d == path) {
            dirs.push(path.to_string());
        }
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<String> {
        self.stored(path)
            .ok_or_else(|| anyhow::anyhow!("File not found: {}", path))
    }

    async fn write(&self, path: &str, data: &str) -> Result<()> {
        self.storage
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string(), data.to_string());
        Ok(())
    }
}
