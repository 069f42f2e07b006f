pub mod config;
pub mod file_format;
pub mod name_case;

pub use config::{RelataConfig, default_join_table_prefix};
pub use file_format::FileFormat;
pub use name_case::NameCase;

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;

    #[test]
    fn default_values_are_pascal_entities_and_snake_fields() {
        let cfg = RelataConfig::default();
        assert_eq!(cfg.models_dir, PathBuf::from("models"));
        assert_eq!(cfg.data_file, PathBuf::from("relata-data.json"));
        assert!(cfg.entity_case().is_pascal());
        assert!(cfg.field_case().is_snake());
    }

    #[test]
    fn overrides_work_via_struct_update() {
        let cfg = RelataConfig {
            models_dir: PathBuf::from("custom_models"),
            data_file: PathBuf::from("state/data.json"),
            entity_naming_case: NameCase::Snake,
            field_naming_case: NameCase::Camel,
            ..Default::default()
        };

        assert_eq!(cfg.models_dir(), Path::new("custom_models"));
        assert_eq!(cfg.data_file(), Path::new("state/data.json"));
        assert!(cfg.entity_case().is_snake());
        assert!(cfg.field_case().is_camel());
    }
}
