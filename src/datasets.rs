//! Dataset listing for `rfsync datasets`.
//!
//! Read-only view of the datasets visible to the configured API key.

use anyhow::Result;

use crate::api::{KnowledgeBase, RagflowClient};
use crate::config::Config;
use crate::models::Dataset;

pub async fn list_datasets(config: &Config) -> Result<()> {
    config.ensure_ready()?;
    let client = RagflowClient::new(&config.ragflow, config.sync.chunk_size)?;
    let datasets = client.list_datasets().await;
    print!("{}", render_table(&datasets, &config.ragflow.knowledge_base));
    Ok(())
}

/// Dataset table; the configured knowledge base is marked with `*`.
fn render_table(datasets: &[Dataset], selected: &str) -> String {
    let mut out = format!(
        "  {:<32} {:<36} {:>6} {:>8}\n",
        "DATASET", "ID", "DOCS", "CHUNKS"
    );
    if datasets.is_empty() {
        out.push_str("  (no datasets)\n");
        return out;
    }
    for d in datasets {
        let marker = if d.name == selected { '*' } else { ' ' };
        out.push_str(&format!(
            "{} {:<32} {:<36} {:>6} {:>8}\n",
            marker, d.name, d.id, d.document_count, d.chunk_count
        ));
    }
    out
}
