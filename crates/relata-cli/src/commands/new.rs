use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use relata_config::{FileFormat, NameCase};
use relata_core::{EntityDef, FieldDef, FieldType, PrimaryKeyDef, PrimaryKeySyntax, SimpleFieldType};
use relata_naming::{to_camel_case, to_pascal_case, to_snake_case};
use serde_json::Value;

use relata_loader::load_config;

pub fn cmd_new(name: String, format: Option<FileFormat>) -> Result<()> {
    let config = load_config()?;
    let dir = config.models_dir();
    if !dir.exists() {
        fs::create_dir_all(dir).context("create models directory")?;
    }

    let format = format.unwrap_or(config.model_format());
    let entity_name = apply_case(&name, config.entity_case());
    let path = dir.join(format!("{}.{}", to_snake_case(&name), format.extension()));
    if path.exists() {
        bail!("model file already exists: {}", path.display());
    }

    let entity = template(&entity_name, config.field_case());
    let schema_url = schema_url();
    match format {
        FileFormat::Json => write_json_with_schema(&path, &entity, &schema_url)?,
        FileFormat::Yaml | FileFormat::Yml => write_yaml(&path, &entity, &schema_url)?,
    }

    println!("Created model template: {}", path.display());
    Ok(())
}

fn apply_case(name: &str, case: NameCase) -> String {
    match case {
        NameCase::Snake => to_snake_case(name),
        NameCase::Camel => to_camel_case(name),
        NameCase::Pascal => to_pascal_case(name),
    }
}

/// An entity with only an auto-increment `id`.
fn template(name: &str, field_case: NameCase) -> EntityDef {
    let mut id = FieldDef::new(
        apply_case("id", field_case),
        FieldType::Simple(SimpleFieldType::Integer),
    );
    id.primary_key = Some(PrimaryKeySyntax::Object(PrimaryKeyDef {
        auto_increment: true,
    }));

    let mut entity = EntityDef::new(name);
    entity.fields.push(id);
    entity
}

fn schema_url() -> String {
    // RELATA_SCHEMA_BASE_URL overrides the published location.
    let base = std::env::var("RELATA_SCHEMA_BASE_URL")
        .unwrap_or_else(|_| format!("{}/raw/main/schemas", env!("CARGO_PKG_REPOSITORY")));
    format!("{}/model.schema.json", base.trim_end_matches('/'))
}

fn write_json_with_schema(path: &Path, entity: &EntityDef, schema_url: &str) -> Result<()> {
    let mut value = serde_json::to_value(entity).context("serialize entity to json")?;
    if let Value::Object(ref mut map) = value {
        map.insert("$schema".to_string(), Value::String(schema_url.to_string()));
    }
    let text = serde_json::to_string_pretty(&value).context("stringify json with schema")?;
    fs::write(path, text).with_context(|| format!("write file: {}", path.display()))?;
    Ok(())
}

fn write_yaml(path: &Path, entity: &EntityDef, schema_url: &str) -> Result<()> {
    let mut value = serde_yaml::to_value(entity).context("serialize entity to yaml value")?;
    if let serde_yaml::Value::Mapping(ref mut map) = value {
        map.insert(
            serde_yaml::Value::String("$schema".to_string()),
            serde_yaml::Value::String(schema_url.to_string()),
        );
    }
    let text = serde_yaml::to_string(&value).context("serialize yaml with schema")?;
    fs::write(path, text).with_context(|| format!("write file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cmd_init;
    use crate::utils::testing::CwdGuard;
    use relata_config::RelataConfig;
    use rstest::rstest;
    use serial_test::serial;
    use tempfile::tempdir;

    #[rstest]
    #[case(FileFormat::Json, "models/blog_post.json")]
    #[case(FileFormat::Yaml, "models/blog_post.yaml")]
    #[case(FileFormat::Yml, "models/blog_post.yml")]
    #[serial]
    fn cmd_new_writes_loadable_template(#[case] format: FileFormat, #[case] expected: &str) {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());
        cmd_init().unwrap();

        cmd_new("blog_post".into(), Some(format)).unwrap();
        assert!(Path::new(expected).exists());

        let models = relata_loader::load_models(&RelataConfig::default()).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "BlogPost");
        assert!(models[0].field("id").is_some());

        let registry = relata_registry::SchemaRegistry::new(models).unwrap();
        assert!(registry.entity("BlogPost").unwrap().is_auto_increment("id"));
    }

    #[test]
    #[serial]
    fn cmd_new_refuses_to_overwrite() {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());
        cmd_init().unwrap();

        cmd_new("Tag".into(), None).unwrap();
        let err = cmd_new("Tag".into(), None).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    #[serial]
    fn cmd_new_requires_config() {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());

        let err = cmd_new("Tag".into(), None).unwrap_err();
        assert!(err.to_string().contains("relata init"));
    }

    #[rstest]
    #[case(NameCase::Pascal, "user_course", "UserCourse")]
    #[case(NameCase::Camel, "user_course", "userCourse")]
    #[case(NameCase::Snake, "UserCourse", "user_course")]
    fn apply_case_converts(#[case] case: NameCase, #[case] input: &str, #[case] expected: &str) {
        assert_eq!(apply_case(input, case), expected);
    }
}
