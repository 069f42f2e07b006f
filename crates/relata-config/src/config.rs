use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::file_format::FileFormat;
use crate::name_case::NameCase;

/// Default prefix of implicit join entity names (`_PostToTag`).
pub fn default_join_table_prefix() -> String {
    "_".to_string()
}

fn default_data_file() -> PathBuf {
    PathBuf::from("relata-data.json")
}

fn default_entity_naming_case() -> NameCase {
    NameCase::Pascal
}

fn default_field_naming_case() -> NameCase {
    NameCase::Snake
}

/// Top-level relata configuration (`relata.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct RelataConfig {
    pub models_dir: PathBuf,
    #[serde(default)]
    pub model_format: FileFormat,
    /// JSON snapshot holding stored rows between CLI runs.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Prefix for generated implicit join entity names.
    #[serde(default = "default_join_table_prefix")]
    pub join_table_prefix: String,
    #[serde(default = "default_entity_naming_case")]
    pub entity_naming_case: NameCase,
    #[serde(default = "default_field_naming_case")]
    pub field_naming_case: NameCase,
}

impl Default for RelataConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            model_format: FileFormat::Json,
            data_file: default_data_file(),
            join_table_prefix: default_join_table_prefix(),
            entity_naming_case: default_entity_naming_case(),
            field_naming_case: default_field_naming_case(),
        }
    }
}

impl RelataConfig {
    /// Path where model definitions are stored.
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Preferred file format for new models.
    pub fn model_format(&self) -> FileFormat {
        self.model_format
    }

    /// Path of the data snapshot.
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Prefix of implicit join entity names.
    pub fn join_table_prefix(&self) -> &str {
        &self.join_table_prefix
    }

    /// Naming case for entity names.
    pub fn entity_case(&self) -> NameCase {
        self.entity_naming_case
    }

    /// Naming case for field names.
    pub fn field_case(&self) -> NameCase {
        self.field_naming_case
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relata_config_default() {
        let config = RelataConfig::default();

        assert_eq!(config.models_dir, PathBuf::from("models"));
        assert_eq!(config.model_format, FileFormat::Json);
        assert_eq!(config.data_file, PathBuf::from("relata-data.json"));
        assert_eq!(config.join_table_prefix, "_");
        assert_eq!(config.entity_naming_case, NameCase::Pascal);
        assert_eq!(config.field_naming_case, NameCase::Snake);
    }

    #[test]
    fn test_relata_config_minimal_json_fills_defaults() {
        let config: RelataConfig = serde_json::from_str(r#"{"modelsDir": "schema"}"#).unwrap();

        assert_eq!(config.models_dir(), Path::new("schema"));
        assert_eq!(config.data_file(), Path::new("relata-data.json"));
        assert_eq!(config.join_table_prefix(), "_");
        assert_eq!(config.model_format(), FileFormat::Json);
    }

    #[test]
    fn test_relata_config_serializes_camel_case() {
        let json = serde_json::to_value(RelataConfig::default()).unwrap();
        assert_eq!(json["modelsDir"], "models");
        assert_eq!(json["joinTablePrefix"], "_");
        assert_eq!(json["entityNamingCase"], "pascal");
        assert_eq!(json["fieldNamingCase"], "snake");
    }
}
