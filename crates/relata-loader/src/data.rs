use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use relata_registry::SchemaRegistry;
use relata_store::{Snapshot, Store};

/// Open the store persisted at `path`, or an empty one when the file is absent.
pub fn load_store(path: &Path, registry: Arc<SchemaRegistry>) -> Result<Store> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no data file, starting empty");
        return Ok(Store::new(registry));
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("read data file: {}", path.display()))?;
    let snapshot = Snapshot::from_json(&content)
        .with_context(|| format!("parse data file: {}", path.display()))?;
    let store = Store::restore(registry, &snapshot)
        .with_context(|| format!("restore data file: {}", path.display()))?;
    Ok(store)
}

/// Write every stored row to `path` as a JSON snapshot.
pub fn save_store(path: &Path, store: &Store) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create data directory: {}", parent.display()))?;
    }
    let snapshot = store.snapshot();
    let content = snapshot.to_json_pretty()?;
    fs::write(path, content).with_context(|| format!("write data file: {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = snapshot.row_count(), "saved data file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relata_core::{EntityDef, Record, Value};
    use tempfile::tempdir;

    fn registry() -> Arc<SchemaRegistry> {
        let entities: Vec<EntityDef> = serde_json::from_str(
            r#"[
                {"name": "Author", "fields": [
                    {"name": "id", "type": "integer", "primary_key": {"auto_increment": true}},
                    {"name": "name", "type": "text", "unique": true}
                ]},
                {"name": "Book", "fields": [
                    {"name": "id", "type": "integer", "primary_key": {"auto_increment": true}},
                    {"name": "author_id", "type": "integer", "foreign_key": "Author.id"}
                ]}
            ]"#,
        )
        .unwrap();
        Arc::new(SchemaRegistry::new(entities).unwrap())
    }

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn missing_file_gives_empty_store() {
        let tmp = tempdir().unwrap();
        let store = load_store(&tmp.path().join("data.json"), registry()).unwrap();
        assert_eq!(store.count("Author").unwrap(), 0);
    }

    #[test]
    fn save_then_load_keeps_rows_and_sequences() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state/data.json");

        let mut store = Store::new(registry());
        store.insert("Author", record(&[("name", "Ann".into())])).unwrap();
        store
            .insert("Book", record(&[("author_id", Value::Int(1))]))
            .unwrap();
        save_store(&path, &store).unwrap();

        let mut reloaded = load_store(&path, registry()).unwrap();
        assert_eq!(reloaded.snapshot(), store.snapshot());

        let id = reloaded
            .insert("Author", record(&[("name", "Bo".into())]))
            .unwrap();
        assert_eq!(
            reloaded.get("Author", id).and_then(|r| r.get("id")),
            Some(&Value::Int(2))
        );
    }

    #[test]
    fn rejects_snapshot_with_dangling_reference() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("data.json");
        fs::write(&path, r#"{"tables": {"Book": [{"id": 1, "author_id": 9}]}}"#).unwrap();

        let err = load_store(&path, registry()).unwrap_err();
        assert!(format!("{err:#}").contains("restore data file"));
    }

    #[test]
    fn rejects_malformed_snapshot() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("data.json");
        fs::write(&path, "[1, 2").unwrap();

        let err = load_store(&path, registry()).unwrap_err();
        assert!(format!("{err:#}").contains("parse data file"));
    }
}
