//! # RAGFlow Sync
//!
//! Synchronizes a local markdown vault into a RAGFlow knowledge base.
//!
//! Notes are enumerated from the vault, hashed, compared against a persisted
//! index of earlier uploads, chunked on paragraph boundaries and uploaded one
//! at a time through the RAGFlow HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │    Vault    │──▶│ SyncManager  │──▶│ RAGFlow API  │
//! │ list + read │   │ hash + chunk │   │ docs + chunks│
//! └─────────────┘   └──────┬───────┘   └──────────────┘
//!                          │
//!              ┌───────────┴──────────┐
//!              ▼                      ▼
//!        ┌────────────┐        ┌────────────┐
//!        │ JSON index │        │  progress  │
//!        │  (storage) │        │  (polling) │
//!        └────────────┘        └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rfsync settings set api-key ragflow-xxxxxxxx
//! rfsync settings set knowledge-base obsidian
//! rfsync sync                   # upload new and changed notes
//! rfsync status                 # what the index knows
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML settings |
//! | [`models`] | Core data types |
//! | [`chunk`] | Text chunking |
//! | [`vault`] | Note listing and plugin storage |
//! | [`index`] | Persisted sync index |
//! | [`api`] | RAGFlow HTTP client |
//! | [`sync`] | Sync manager |
//! | [`progress`] | Progress polling and rendering |
//! | [`status`] | Index summary |

pub mod api;
pub mod chunk;
pub mod config;
pub mod datasets;
pub mod index;
pub mod models;
pub mod progress;
pub mod settings_cmd;
pub mod status;
pub mod sync;
pub mod sync_cmd;
pub mod vault;
