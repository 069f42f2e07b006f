use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relata_config::RelataConfig;

pub const CONFIG_FILE: &str = "relata.json";

/// Load relata.json from the current directory.
pub fn load_config() -> Result<RelataConfig> {
    let path = PathBuf::from(CONFIG_FILE);
    if !path.exists() {
        anyhow::bail!("{CONFIG_FILE} not found. Run 'relata init' first.");
    }
    read_config(&path)
}

/// Load config from a specific path.
pub fn load_config_from_path(path: PathBuf) -> Result<RelataConfig> {
    if !path.exists() {
        anyhow::bail!("{CONFIG_FILE} not found at: {}", path.display());
    }
    read_config(&path)
}

/// Load config from the project root, falling back to defaults.
pub fn load_config_or_default(project_root: Option<PathBuf>) -> Result<RelataConfig> {
    let config_path = match project_root {
        Some(root) => root.join(CONFIG_FILE),
        None => PathBuf::from(CONFIG_FILE),
    };

    if config_path.exists() {
        load_config_from_path(config_path)
    } else {
        Ok(RelataConfig::default())
    }
}

fn read_config(path: &Path) -> Result<RelataConfig> {
    let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let config: RelataConfig =
        serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))?;
    Ok(config)
}
