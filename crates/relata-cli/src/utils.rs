use std::sync::Arc;

use anyhow::Result;
use relata_config::RelataConfig;
use relata_loader::{load_config, load_registry};
use relata_registry::SchemaRegistry;

/// Configuration and resolved schema of the project in the current directory.
pub struct Project {
    pub config: RelataConfig,
    pub registry: Arc<SchemaRegistry>,
}

pub fn load_project() -> Result<Project> {
    let config = load_config()?;
    let registry = Arc::new(load_registry(&config)?);
    Ok(Project { config, registry })
}
