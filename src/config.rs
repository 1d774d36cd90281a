//! TOML settings for the sync tool.
//!
//! The settings file plays the role of the host application's settings
//! store: every field is user-editable through `rfsync settings set` and
//! persisted back to the same file.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides `ragflow.api_key`.
pub const API_KEY_ENV: &str = "RAGFLOW_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ragflow: RagflowConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RagflowConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_knowledge_base")]
    pub knowledge_base: String,
    /// Request timeout. Unset means requests may wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for RagflowConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            knowledge_base: default_knowledge_base(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:2081".to_string()
}
fn default_knowledge_base() -> String {
    "obsidian".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VaultConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            index_path: default_index_path(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_index_path() -> String {
    ".obsidian/plugins/obsidian-ragflow-sync/synced-notes.json".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    #[serde(default)]
    pub on_startup: bool,
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,
    #[serde(default = "default_exclude_folders")]
    pub exclude_folders: Vec<String>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            on_startup: false,
            startup_delay_secs: default_startup_delay_secs(),
            exclude_folders: default_exclude_folders(),
            chunk_size: default_chunk_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_startup_delay_secs() -> u64 {
    5
}
fn default_exclude_folders() -> Vec<String> {
    vec![
        "_templates".to_string(),
        ".obsidian".to_string(),
        ".git".to_string(),
        ".github".to_string(),
    ]
}
fn default_chunk_size() -> usize {
    128
}
fn default_poll_interval_ms() -> u64 {
    1000
}

/// Settings that must be present before a sync may start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("RAGFlow API key is not set. Set ragflow.api_key or RAGFLOW_API_KEY.")]
    MissingApiKey,
    #[error("RAGFlow knowledge base name is not set. Set ragflow.knowledge_base.")]
    MissingKnowledgeBase,
}

impl Config {
    /// Check the settings a run cannot do without.
    pub fn ensure_ready(&self) -> Result<(), ConfigError> {
        if self.ragflow.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.ragflow.knowledge_base.trim().is_empty() {
            return Err(ConfigError::MissingKnowledgeBase);
        }
        Ok(())
    }

    /// Apply a single `settings set` edit.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api-key" => self.ragflow.api_key = value.trim().to_string(),
            "base-url" => {
                let url = value.trim();
                validate_base_url(url)?;
                self.ragflow.base_url = url.to_string();
            }
            "knowledge-base" => self.ragflow.knowledge_base = value.trim().to_string(),
            "sync-on-startup" => {
                self.sync.on_startup = parse_bool(value)
                    .ok_or_else(|| anyhow::anyhow!("sync-on-startup expects true or false"))?;
            }
            "exclude-folders" => self.sync.exclude_folders = parse_exclude_folders(value),
            "chunk-size" => {
                let size: usize = value
                    .trim()
                    .parse()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| anyhow::anyhow!("chunk-size must be a positive integer"))?;
                self.sync.chunk_size = size;
            }
            other => bail!(
                "Unknown setting: '{}'. Available: api-key, base-url, knowledge-base, \
                 sync-on-startup, exclude-folders, chunk-size",
                other
            ),
        }
        Ok(())
    }
}

/// Split a comma-separated folder list, trimming entries and dropping blanks.
pub fn parse_exclude_folders(value: &str) -> Vec<String> {
    normalize_folders(value.split(','))
}

/// Trim whitespace and trailing `/` from each folder, dropping blanks.
fn normalize_folders<'a>(folders: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    folders
        .into_iter()
        .map(|f| f.trim().trim_end_matches('/'))
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn validate_base_url(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("ragflow.base_url must start with http:// or https://, got '{}'", url);
    }
    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    if config.sync.chunk_size == 0 {
        bail!("sync.chunk_size must be > 0");
    }
    if config.sync.poll_interval_ms == 0 {
        bail!("sync.poll_interval_ms must be > 0");
    }
    validate_base_url(&config.ragflow.base_url)?;
    Ok(())
}

/// Read the settings file without applying environment overrides.
pub fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    config.sync.exclude_folders =
        normalize_folders(config.sync.exclude_folders.iter().map(String::as_str));
    Ok(config)
}

/// Load settings for a run. `RAGFLOW_API_KEY` overrides the file's key.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = read_config(path)?;

    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            config.ragflow.api_key = key;
        }
    }

    Ok(config)
}

/// Write settings back, creating the parent directory if needed.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    validate(config)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize settings")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}
