use std::collections::{BTreeMap, HashMap};

use relata_core::{FieldName, Record, Value};
use relata_registry::UniqueKey;

use crate::store::RowId;

/// Values of `columns` in `record`, or `None` when any is null or absent.
/// Such keys are never indexed and never conflict.
pub(crate) fn key_values(record: &Record, columns: &[FieldName]) -> Option<Vec<Value>> {
    columns
        .iter()
        .map(|c| match record.get(c) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value.clone()),
        })
        .collect()
}

/// Rows of one entity plus a hash index per unique key.
#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    rows: BTreeMap<RowId, Record>,
    indexes: HashMap<String, HashMap<Vec<Value>, RowId>>,
}

impl Table {
    pub(crate) fn new(keys: &[UniqueKey]) -> Self {
        Self {
            rows: BTreeMap::new(),
            indexes: keys
                .iter()
                .map(|k| (k.name.clone(), HashMap::new()))
                .collect(),
        }
    }

    pub(crate) fn get(&self, id: RowId) -> Option<&Record> {
        self.rows.get(&id)
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (RowId, &Record)> {
        self.rows.iter().map(|(id, record)| (*id, record))
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn lookup(&self, key: &UniqueKey, values: &[Value]) -> Option<RowId> {
        self.indexes.get(&key.name)?.get(values).copied()
    }

    pub(crate) fn insert(&mut self, keys: &[UniqueKey], id: RowId, record: Record) {
        for key in keys {
            if let Some(values) = key_values(&record, &key.columns) {
                self.indexes
                    .entry(key.name.clone())
                    .or_default()
                    .insert(values, id);
            }
        }
        self.rows.insert(id, record);
    }

    pub(crate) fn remove(&mut self, keys: &[UniqueKey], id: RowId) -> Option<Record> {
        let record = self.rows.remove(&id)?;
        for key in keys {
            if let Some(values) = key_values(&record, &key.columns)
                && let Some(index) = self.indexes.get_mut(&key.name)
            {
                index.remove(&values);
            }
        }
        Some(record)
    }

    /// Replace a row, returning the previous record.
    pub(crate) fn replace(&mut self, keys: &[UniqueKey], id: RowId, record: Record) -> Option<Record> {
        let old = self.remove(keys, id)?;
        self.insert(keys, id, record);
        Some(old)
    }
}
