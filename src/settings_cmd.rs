//! `rfsync settings show` and `rfsync settings set`.

use anyhow::Result;
use std::path::Path;

use crate::config::{read_config, save_config, Config};

/// Print the settings file, with the API key masked.
pub fn show_settings(path: &Path) -> Result<()> {
    let config = read_or_default(path)?;
    print!("{}", render(&config));
    Ok(())
}

/// Apply one edit and write the file back. A missing file starts from the
/// defaults.
pub fn set_setting(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = read_or_default(path)?;
    config.set(key, value)?;
    save_config(path, &config)?;
    println!("{} updated", key);
    Ok(())
}

fn read_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        read_config(path)
    } else {
        Ok(Config::default())
    }
}

fn mask(key: &str) -> String {
    match key.chars().count() {
        0 => "(not set)".to_string(),
        n if n <= 8 => "*".repeat(n),
        n => {
            let tail: String = key.chars().skip(n - 4).collect();
            format!("{}{}", "*".repeat(n - 4), tail)
        }
    }
}

fn render(config: &Config) -> String {
    let mut out = String::new();
    out.push_str(&format!("api-key          {}\n", mask(&config.ragflow.api_key)));
    out.push_str(&format!("base-url         {}\n", config.ragflow.base_url));
    out.push_str(&format!("knowledge-base   {}\n", config.ragflow.knowledge_base));
    out.push_str(&format!("sync-on-startup  {}\n", config.sync.on_startup));
    out.push_str(&format!(
        "exclude-folders  {}\n",
        config.sync.exclude_folders.join(",")
    ));
    out.push_str(&format!("chunk-size       {}\n", config.sync.chunk_size));
    out.push_str(&format!("vault            {}\n", config.vault.root.display()));
    out
}
