use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relata_config::RelataConfig;
use relata_core::EntityDef;
use relata_registry::{RegistryOptions, SchemaRegistry};

/// Load all model definitions from the configured models directory (recursively).
pub fn load_models(config: &RelataConfig) -> Result<Vec<EntityDef>> {
    read_models_dir(config.models_dir())
}

/// Load models relative to `project_root`, reading its relata.json when present.
pub fn load_models_from_dir(project_root: Option<PathBuf>) -> Result<Vec<EntityDef>> {
    let root = match project_root {
        Some(root) => root,
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let config = crate::config::load_config_or_default(Some(root.clone()))?;
    read_models_dir(&root.join(config.models_dir()))
}

/// Load the models and resolve them into a registry.
pub fn load_registry(config: &RelataConfig) -> Result<SchemaRegistry> {
    let entities = load_models(config)?;
    let options = RegistryOptions {
        join_table_prefix: config.join_table_prefix().to_string(),
    };
    let registry = SchemaRegistry::with_options(entities, &options)
        .map_err(|e| anyhow::anyhow!("schema validation failed: {}", e))?;
    tracing::debug!(entities = registry.entities().count(), "loaded schema registry");
    Ok(registry)
}

fn read_models_dir(dir: &Path) -> Result<Vec<EntityDef>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    collect_model_files(dir, &mut files)?;
    // Directory order is platform dependent.
    files.sort();

    files.iter().map(|path| read_model(path)).collect()
}

fn collect_model_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read models directory: {}", dir.display()))?;

    for entry in entries {
        let entry = entry.context("read directory entry")?;
        let path = entry.path();

        if path.is_dir() {
            collect_model_files(&path, files)?;
        } else if path.is_file()
            && matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("json" | "yaml" | "yml")
            )
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Parse one model file. A `$schema` key is accepted and ignored.
fn read_model(path: &Path) -> Result<EntityDef> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("read model file: {}", path.display()))?;

    let entity: EntityDef = if path.extension().and_then(|s| s.to_str()) == Some("json") {
        serde_json::from_str(&content)
            .with_context(|| format!("parse JSON model: {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("parse YAML model: {}", path.display()))?
    };
    tracing::trace!(entity = %entity.name, path = %path.display(), "read model");
    Ok(entity)
}
