use std::collections::BTreeMap;
use std::sync::Arc;

use relata_core::{EntityName, Record};
use relata_registry::SchemaRegistry;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::Store;

/// Serializable copy of every stored row, grouped by entity in row order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tables: BTreeMap<EntityName, Vec<Record>>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::InvalidSnapshot(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::InvalidSnapshot(e.to_string()))
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

impl Store {
    /// Copy of all rows. Empty tables are left out.
    pub fn snapshot(&self) -> Snapshot {
        let mut tables = BTreeMap::new();
        for entity in self.registry().entities() {
            let rows: Vec<Record> = self
                .rows(&entity.name)
                .map(|rows| rows.map(|(_, record)| record.clone()).collect())
                .unwrap_or_default();
            if !rows.is_empty() {
                tables.insert(entity.name.clone(), rows);
            }
        }
        Snapshot { tables }
    }

    /// Rebuild a store from a snapshot. Rows are re-validated: types, unique
    /// keys and, once every table is loaded, foreign keys.
    pub fn restore(registry: Arc<SchemaRegistry>, snapshot: &Snapshot) -> Result<Self, StoreError> {
        let mut store = Store::new(registry);
        store.begin()?;
        let loaded = store.load(snapshot);
        match loaded {
            Ok(()) => {
                store.commit()?;
                tracing::debug!(rows = snapshot.row_count(), "restored snapshot");
                Ok(store)
            }
            Err(err) => {
                store.rollback()?;
                Err(err)
            }
        }
    }

    fn load(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        for (entity, rows) in &snapshot.tables {
            for record in rows {
                self.insert_row(entity, record.clone(), false)?;
            }
        }
        for (entity, rows) in &snapshot.tables {
            for record in rows {
                self.check_foreign_keys(entity, record)?;
            }
        }
        Ok(())
    }
}
