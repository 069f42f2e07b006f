use anyhow::{Context, Result};
use relata_core::EntityDef;

/// JSON Schema for model files.
pub fn model_schema() -> Result<String> {
    let schema = schemars::schema_for!(EntityDef);
    serde_json::to_string_pretty(&schema).context("serialize model schema")
}

pub fn cmd_schema() -> Result<()> {
    println!("{}", model_schema()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_describes_entity_definitions() {
        let schema: serde_json::Value = serde_json::from_str(&model_schema().unwrap()).unwrap();
        assert_eq!(schema["title"], "EntityDef");
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&"name".into()));
        assert!(required.contains(&"fields".into()));
    }
}
