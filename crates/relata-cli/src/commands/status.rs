use anyhow::Result;
use colored::Colorize;
use relata_loader::load_store;

use crate::utils::load_project;

pub fn cmd_status() -> Result<()> {
    let project = load_project()?;
    let config = &project.config;
    let registry = &project.registry;

    println!("{}", "Configuration:".bright_cyan().bold());
    println!(
        "  {} {}",
        "Models directory:".cyan(),
        format!("{}", config.models_dir().display()).bright_white()
    );
    println!(
        "  {} {}",
        "Data file:".cyan(),
        format!("{}", config.data_file().display()).bright_white()
    );
    println!("  {} {:?}", "Entity naming:".cyan(), config.entity_case());
    println!("  {} {:?}", "Field naming:".cyan(), config.field_case());
    println!("  {} {:?}", "Model format:".cyan(), config.model_format());
    println!(
        "  {} {}",
        "Join table prefix:".cyan(),
        config.join_table_prefix().bright_white()
    );
    println!();

    let store = load_store(config.data_file(), registry.clone())?;
    let declared = registry.entities().filter(|e| !registry.is_implicit(&e.name)).count();
    println!(
        "{} {}",
        "Entities:".bright_cyan().bold(),
        declared.to_string().bright_yellow()
    );
    for entity in registry.entities() {
        let rows = store.count(&entity.name)?;
        let relations = registry.relations_of(&entity.name).len();
        let marker = if registry.is_implicit(&entity.name) {
            " (implicit join)".bright_black().to_string()
        } else {
            String::new()
        };
        print!(
            "  {} {}{} ({} {}, {} {}, {} {})",
            "-".bright_white(),
            entity.name.bright_green(),
            marker,
            entity.fields.len().to_string().bright_blue(),
            "fields".bright_white(),
            relations.to_string().bright_blue(),
            "relations".bright_white(),
            rows.to_string().bright_blue(),
            "rows".bright_white()
        );
        if let Some(description) = &entity.description {
            println!(
                "\n    {} {}",
                "Description:".bright_black(),
                description.bright_white()
            );
        } else {
            println!();
        }
    }
    println!();

    if declared == 0 {
        println!(
            "{} {}",
            "Status:".bright_cyan().bold(),
            "No models found. Create one with 'relata new <name>'.".bright_yellow()
        );
    } else {
        println!(
            "{} {}",
            "Status:".bright_cyan().bold(),
            format!("{} rows stored.", store.snapshot().row_count()).bright_green()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{cmd_init, cmd_new};
    use crate::utils::testing::CwdGuard;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn cmd_status_without_models() {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());
        cmd_init().unwrap();

        cmd_status().unwrap();
    }

    #[test]
    #[serial]
    fn cmd_status_with_models() {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());
        cmd_init().unwrap();
        cmd_new("tag".into(), None).unwrap();

        cmd_status().unwrap();
    }

    #[test]
    #[serial]
    fn cmd_status_requires_config() {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());

        assert!(cmd_status().is_err());
    }
}
