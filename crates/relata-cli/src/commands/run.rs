use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use relata_client::{Client, Operation};
use relata_loader::{load_store, save_store};

use crate::utils::load_project;

/// Read a script: a JSON array of operations.
fn read_script(path: &Path) -> Result<Vec<Operation>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read script: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse script: {}", path.display()))
}

/// Execute every operation in order. The data file is written only when
/// all of them succeed and `dry_run` is off.
pub fn cmd_run(script: PathBuf, dry_run: bool) -> Result<()> {
    let project = load_project()?;
    let operations = read_script(&script)?;
    let store = load_store(project.config.data_file(), project.registry.clone())?;
    let mut client = Client::with_store(store);
    tracing::info!(script = %script.display(), operations = operations.len(), dry_run, "running script");

    let mut writes = 0;
    for (index, operation) in operations.iter().enumerate() {
        let result = client.execute(operation).with_context(|| {
            format!(
                "operation {} ({} {}) failed",
                index + 1,
                operation.label(),
                operation.entity()
            )
        })?;
        if operation.is_write() {
            writes += 1;
        }
        println!(
            "{} {} {}",
            format!("[{}]", index + 1).bright_black(),
            operation.label().bright_cyan(),
            operation.entity().bright_green()
        );
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("render result")?
        );
    }

    if dry_run {
        println!(
            "{} {}",
            "Dry run:".bright_yellow().bold(),
            format!("{writes} writes discarded").bright_white()
        );
        return Ok(());
    }
    if writes > 0 {
        save_store(project.config.data_file(), client.store())?;
        println!(
            "{} {}",
            "Saved".bright_green().bold(),
            project.config.data_file().display()
        );
    }
    Ok(())
}
