use anyhow::Result;
use colored::Colorize;
use relata_registry::describe_relation;

use crate::utils::load_project;

pub fn cmd_check() -> Result<()> {
    let project = load_project()?;
    let registry = &project.registry;

    let mut relations = 0;
    for entity in registry.entities() {
        let resolved = registry.relations_of(&entity.name);
        if resolved.is_empty() {
            continue;
        }
        println!("{}", entity.name.bright_green().bold());
        for relation in resolved {
            println!("  {}", describe_relation(relation));
        }
        relations += resolved.len();
    }

    let implicit = registry.entities().filter(|e| registry.is_implicit(&e.name)).count();
    println!(
        "{} {} entities, {} relations, {} implicit join tables",
        "Schema is valid:".bright_cyan().bold(),
        registry.entities().count() - implicit,
        relations,
        implicit
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cmd_init;
    use crate::utils::testing::CwdGuard;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn cmd_check_accepts_valid_models() {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());
        cmd_init().unwrap();
        fs::create_dir_all("models").unwrap();
        fs::write(
            "models/tag.json",
            r#"{"name": "Tag", "fields": [{"name": "id", "type": "integer", "primary_key": true}]}"#,
        )
        .unwrap();

        cmd_check().unwrap();
    }

    #[test]
    #[serial]
    fn cmd_check_reports_invalid_models() {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());
        cmd_init().unwrap();
        fs::create_dir_all("models").unwrap();
        fs::write(
            "models/tag.json",
            r#"{"name": "Tag", "fields": [{"name": "label", "type": "text"}]}"#,
        )
        .unwrap();

        let err = cmd_check().unwrap_err();
        assert!(err.to_string().contains("schema validation failed"));
    }
}
