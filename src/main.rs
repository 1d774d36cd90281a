//! # RAGFlow Sync CLI (`rfsync`)
//!
//! ## Usage
//!
//! ```bash
//! rfsync --config ./config/rfsync.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rfsync sync` | Upload new and changed notes to the knowledge base |
//! | `rfsync startup` | Startup hook: sync after a delay if `sync.on_startup` is set |
//! | `rfsync datasets` | List datasets on the RAGFlow server |
//! | `rfsync status` | Summarise the local sync index |
//! | `rfsync settings show` | Print the current settings |
//! | `rfsync settings set <key> <value>` | Change one setting |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ragflow_sync::progress::ProgressMode;
use ragflow_sync::{config, datasets, settings_cmd, status, sync_cmd};

/// RAGFlow Sync: push a local markdown vault into a RAGFlow knowledge base.
#[derive(Parser)]
#[command(
    name = "rfsync",
    about = "Synchronize a local markdown vault into a RAGFlow knowledge base",
    version
)]
struct Cli {
    /// Path to the settings file (TOML).
    #[arg(long, global = true, default_value = "./config/rfsync.toml")]
    config: PathBuf,

    /// Progress output on stderr. Defaults to `human` on a terminal, `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload new and changed notes.
    ///
    /// Notes whose content hash matches their last successful upload are
    /// skipped. Press Ctrl-C to stop after the note currently uploading.
    Sync,

    /// Run the startup hook.
    ///
    /// Waits `sync.startup_delay_secs` and syncs when `sync.on_startup` is
    /// enabled; does nothing otherwise.
    Startup,

    /// List datasets on the RAGFlow server.
    Datasets,

    /// Summarise the local sync index.
    Status,

    /// View or edit settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings (API key masked).
    Show,
    /// Change one setting.
    ///
    /// Keys: api-key, base-url, knowledge-base, sync-on-startup,
    /// exclude-folders (comma-separated), chunk-size.
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    // Settings commands work without a valid settings file.
    if let Commands::Settings { action } = &cli.command {
        match action {
            SettingsAction::Show => settings_cmd::show_settings(&cli.config)?,
            SettingsAction::Set { key, value } => {
                settings_cmd::set_setting(&cli.config, key, value)?
            }
        }
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    let mode = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    match cli.command {
        Commands::Sync => {
            sync_cmd::run_sync(&cfg, mode).await?;
        }
        Commands::Startup => {
            sync_cmd::run_startup(&cfg, mode).await?;
        }
        Commands::Datasets => {
            datasets::list_datasets(&cfg).await?;
        }
        Commands::Status => {
            status::run_status(&cfg).await?;
        }
        Commands::Settings { .. } => unreachable!("handled before config loading"),
    }

    Ok(())
}
