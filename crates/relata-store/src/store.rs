use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use relata_core::{
    DefaultGenerator, EntityDef, EntityName, FieldDef, FieldDefault, FieldName, Record,
    ReferenceAction, Value,
};
use relata_registry::{ForeignKey, SchemaRegistry};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::table::{Table, key_values};
use crate::transaction::{TransactionState, Undo, UndoLog};

/// Internal identity of a stored row. Never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Result<T> = std::result::Result<T, StoreError>;

/// In-memory relational store.
///
/// Every public write is a statement: it either applies completely or leaves
/// the store untouched. Inside [`Store::begin`]/[`Store::commit`] the undo log
/// keeps growing so [`Store::rollback`] can revert the whole transaction.
#[derive(Debug, Clone)]
pub struct Store {
    registry: Arc<SchemaRegistry>,
    tables: BTreeMap<EntityName, Table>,
    sequences: BTreeMap<(EntityName, FieldName), i64>,
    next_row: u64,
    state: TransactionState,
    undo: UndoLog,
}

impl Store {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        let tables = registry
            .entities()
            .map(|e| (e.name.clone(), Table::new(registry.unique_keys(&e.name))))
            .collect();
        Self {
            registry,
            tables,
            sequences: BTreeMap::new(),
            next_row: 1,
            state: TransactionState::Inactive,
            undo: UndoLog::default(),
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    // ========== Reads ==========

    fn table(&self, entity: &str) -> Result<&Table> {
        self.tables
            .get(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))
    }

    pub fn get(&self, entity: &str, id: RowId) -> Option<&Record> {
        self.tables.get(entity)?.get(id)
    }

    /// Rows of an entity in insertion order.
    pub fn rows(&self, entity: &str) -> Result<impl Iterator<Item = (RowId, &Record)> + '_> {
        Ok(self.table(entity)?.rows())
    }

    pub fn count(&self, entity: &str) -> Result<usize> {
        Ok(self.table(entity)?.len())
    }

    /// Row whose `fields` equal `values`. The fields must cover a unique key;
    /// the key's index is used and any extra fields are compared afterwards.
    pub fn find_unique<S: AsRef<str>>(
        &self,
        entity: &str,
        fields: &[S],
        values: &[Value],
    ) -> Result<Option<RowId>> {
        let table = self.table(entity)?;
        let not_unique = || {
            StoreError::NotAUniqueKey(
                entity.to_string(),
                fields
                    .iter()
                    .map(|f| f.as_ref())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };
        if fields.len() != values.len() {
            return Err(not_unique());
        }
        let key = self
            .registry
            .covering_unique_key(entity, fields)
            .ok_or_else(not_unique)?;

        let mut key_values = Vec::with_capacity(key.columns.len());
        for column in &key.columns {
            let value = fields
                .iter()
                .position(|f| f.as_ref() == column)
                .and_then(|i| values.get(i))
                .ok_or_else(not_unique)?;
            if value.is_null() {
                return Ok(None);
            }
            key_values.push(value.clone());
        }

        let Some(id) = table.lookup(key, &key_values) else {
            return Ok(None);
        };
        let matches = table.get(id).is_some_and(|record| {
            fields
                .iter()
                .zip(values)
                .all(|(f, v)| record.get(f.as_ref()).unwrap_or(&Value::Null) == v)
        });
        Ok(matches.then_some(id))
    }

    /// Rows whose fields equal every entry of `filter`, in insertion order.
    pub fn scan(&self, entity: &str, filter: &Record) -> Result<Vec<(RowId, &Record)>> {
        let table = self.table(entity)?;
        let def = self.entity_def(entity)?;
        if let Some(unknown) = filter.keys().find(|f| def.field(f).is_none()) {
            return Err(StoreError::UnknownField(entity.to_string(), unknown.clone()));
        }
        Ok(table
            .rows()
            .filter(|(_, record)| {
                filter
                    .iter()
                    .all(|(f, v)| record.get(f).unwrap_or(&Value::Null) == v)
            })
            .collect())
    }

    /// Rows of `fk.entity` whose foreign-key columns equal `key`
    /// (given in `fk.ref_columns` order).
    fn referencing_rows(&self, fk: &ForeignKey, key: &[Value]) -> Vec<RowId> {
        let Some(table) = self.tables.get(&fk.entity) else {
            return Vec::new();
        };
        table
            .rows()
            .filter(|(_, record)| {
                fk.columns
                    .iter()
                    .zip(key)
                    .all(|(c, v)| record.get(c) == Some(v))
            })
            .map(|(id, _)| id)
            .collect()
    }

    fn entity_def(&self, entity: &str) -> Result<&EntityDef> {
        self.registry
            .entity(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))
    }

    // ========== Writes ==========

    /// Insert a row, filling defaults, generated values and sequences for
    /// omitted fields.
    pub fn insert(&mut self, entity: &str, record: Record) -> Result<RowId> {
        self.statement(|store| store.insert_row(entity, record, true))
    }

    /// Merge `changes` into a row. Primary-key columns cannot change.
    pub fn update(&mut self, entity: &str, id: RowId, changes: Record) -> Result<()> {
        self.statement(|store| store.update_row(entity, id, changes))
    }

    /// Delete a row, applying the `on_delete` action of every foreign key
    /// referencing it.
    pub fn delete(&mut self, entity: &str, id: RowId) -> Result<Record> {
        self.statement(|store| {
            let mut deleting = HashSet::new();
            store.delete_row(entity, id, &mut deleting)
        })
    }

    pub(crate) fn insert_row(
        &mut self,
        entity: &str,
        mut record: Record,
        check_foreign_keys: bool,
    ) -> Result<RowId> {
        let registry = Arc::clone(&self.registry);
        let def = registry
            .entity(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        reject_unknown_fields(def, &record)?;

        for field in &def.fields {
            let auto_increment = def.is_auto_increment(&field.name);
            if let Some(value) = record.get(&field.name) {
                if auto_increment && let Value::Int(explicit) = value {
                    self.advance_sequence(entity, &field.name, *explicit);
                }
                continue;
            }
            let value = self.default_value(entity, field, auto_increment)?;
            record.insert(field.name.clone(), value);
        }

        check_fields(def, &record)?;
        if check_foreign_keys {
            self.check_foreign_keys(entity, &record)?;
        }
        self.check_unique(entity, &record, None)?;

        let id = RowId(self.next_row);
        self.next_row += 1;
        let table = self
            .tables
            .get_mut(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        table.insert(registry.unique_keys(entity), id, record);
        self.undo.push(Undo::Inserted {
            entity: entity.to_string(),
            id,
        });
        tracing::debug!(entity, row = %id, "inserted row");
        Ok(id)
    }

    fn update_row(&mut self, entity: &str, id: RowId, changes: Record) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let def = registry
            .entity(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        let old = self
            .get(entity, id)
            .cloned()
            .ok_or_else(|| StoreError::RowNotFound(entity.to_string(), id))?;
        reject_unknown_fields(def, &changes)?;

        if let Some(pk) = registry.primary_key(entity) {
            for column in &pk.columns {
                if let Some(value) = changes.get(column)
                    && old.get(column) != Some(value)
                {
                    return Err(StoreError::ImmutablePrimaryKey(
                        entity.to_string(),
                        column.clone(),
                    ));
                }
            }
        }

        let mut merged = old.clone();
        merged.extend(changes);
        if merged == old {
            return Ok(());
        }

        check_fields(def, &merged)?;
        self.check_foreign_keys(entity, &merged)?;
        self.check_unique(entity, &merged, Some(id))?;

        // Referenced key columns may only change while nothing points at them
        for fk in registry.referencing(entity) {
            let changed = fk.ref_columns.iter().any(|c| old.get(c) != merged.get(c));
            if changed
                && let Some(key) = key_values(&old, &fk.ref_columns)
                && !self.referencing_rows(fk, &key).is_empty()
            {
                return Err(StoreError::KeyInUse(
                    entity.to_string(),
                    fk.ref_columns.join(", "),
                    fk.entity.clone(),
                    fk.name.clone(),
                ));
            }
        }

        let table = self
            .tables
            .get_mut(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        table.replace(registry.unique_keys(entity), id, merged);
        self.undo.push(Undo::Updated {
            entity: entity.to_string(),
            id,
            previous: old,
        });
        tracing::debug!(entity, row = %id, "updated row");
        Ok(())
    }

    fn delete_row(
        &mut self,
        entity: &str,
        id: RowId,
        deleting: &mut HashSet<(EntityName, RowId)>,
    ) -> Result<Record> {
        let registry = Arc::clone(&self.registry);
        let record = self
            .get(entity, id)
            .cloned()
            .ok_or_else(|| StoreError::RowNotFound(entity.to_string(), id))?;
        deleting.insert((entity.to_string(), id));

        for fk in registry.referencing(entity) {
            let Some(key) = key_values(&record, &fk.ref_columns) else {
                continue;
            };
            let children: Vec<RowId> = self
                .referencing_rows(fk, &key)
                .into_iter()
                .filter(|child| !deleting.contains(&(fk.entity.clone(), *child)))
                .collect();
            if children.is_empty() {
                continue;
            }

            match fk.delete_action() {
                ReferenceAction::Cascade => {
                    for child in children {
                        // An earlier cascade may already have removed it
                        if self.get(&fk.entity, child).is_some() {
                            self.delete_row(&fk.entity, child, deleting)?;
                        }
                    }
                }
                ReferenceAction::SetNull => {
                    let changes: Record = fk
                        .columns
                        .iter()
                        .map(|c| (c.clone(), Value::Null))
                        .collect();
                    for child in children {
                        self.update_row(&fk.entity, child, changes.clone())?;
                    }
                }
                ReferenceAction::SetDefault => {
                    let child_def = registry
                        .entity(&fk.entity)
                        .ok_or_else(|| StoreError::UnknownEntity(fk.entity.clone()))?;
                    for child in children {
                        // Generators run once per child row
                        let mut changes = Record::new();
                        for column in &fk.columns {
                            let value = match child_def.field(column) {
                                Some(field) => self.default_value(&fk.entity, field, false)?,
                                None => Value::Null,
                            };
                            changes.insert(column.clone(), value);
                        }
                        self.update_row(&fk.entity, child, changes)?;
                    }
                }
                ReferenceAction::Restrict | ReferenceAction::NoAction => {
                    return Err(StoreError::DeleteRestricted(
                        entity.to_string(),
                        fk.entity.clone(),
                        fk.name.clone(),
                    ));
                }
            }
        }

        let table = self
            .tables
            .get_mut(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        table.remove(registry.unique_keys(entity), id);
        self.undo.push(Undo::Deleted {
            entity: entity.to_string(),
            id,
            record: record.clone(),
        });
        tracing::debug!(entity, row = %id, "deleted row");
        Ok(record)
    }

    // ========== Checks ==========

    pub(crate) fn check_foreign_keys(&self, entity: &str, record: &Record) -> Result<()> {
        for fk in self.registry.foreign_keys(entity) {
            // MATCH SIMPLE: a null in any column skips the check
            let Some(values) = key_values(record, &fk.columns) else {
                continue;
            };
            if self
                .find_unique(&fk.ref_entity, fk.ref_columns.as_slice(), &values)?
                .is_none()
            {
                return Err(StoreError::ForeignKeyViolation {
                    entity: entity.to_string(),
                    constraint: fk.name.clone(),
                    ref_entity: fk.ref_entity.clone(),
                    values,
                });
            }
        }
        Ok(())
    }

    fn check_unique(&self, entity: &str, record: &Record, except: Option<RowId>) -> Result<()> {
        let table = self.table(entity)?;
        for key in self.registry.unique_keys(entity) {
            let Some(values) = key_values(record, &key.columns) else {
                continue;
            };
            if let Some(existing) = table.lookup(key, &values)
                && Some(existing) != except
            {
                return Err(StoreError::UniqueViolation {
                    entity: entity.to_string(),
                    constraint: key.name.clone(),
                    fields: key.columns.clone(),
                    values,
                });
            }
        }
        Ok(())
    }

    // ========== Sequences ==========

    fn set_sequence(&mut self, entity: &str, field: &str, value: i64) {
        let key = (entity.to_string(), field.to_string());
        let previous = self.sequences.insert(key, value);
        self.undo.push(Undo::Sequence {
            entity: entity.to_string(),
            field: field.to_string(),
            previous,
        });
    }

    fn next_sequence(&mut self, entity: &str, field: &str) -> Result<i64> {
        let current = self
            .sequences
            .get(&(entity.to_string(), field.to_string()))
            .copied()
            .unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::SequenceExhausted(entity.to_string(), field.to_string()))?;
        self.set_sequence(entity, field, next);
        Ok(next)
    }

    /// Value a field takes when a write leaves it out.
    fn default_value(
        &mut self,
        entity: &str,
        field: &FieldDef,
        auto_increment: bool,
    ) -> Result<Value> {
        let value = match field.default_kind() {
            Some(FieldDefault::Literal(value)) => value.clone(),
            Some(FieldDefault::Generated(DefaultGenerator::Now)) => Value::Text(
                chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            ),
            Some(FieldDefault::Generated(DefaultGenerator::Uuid)) => {
                Value::Text(uuid::Uuid::new_v4().to_string())
            }
            Some(FieldDefault::Generated(DefaultGenerator::AutoIncrement)) => {
                Value::Int(self.next_sequence(entity, &field.name)?)
            }
            None if auto_increment => Value::Int(self.next_sequence(entity, &field.name)?),
            None => Value::Null,
        };
        Ok(value)
    }

    /// Keep the sequence ahead of explicitly supplied values.
    fn advance_sequence(&mut self, entity: &str, field: &str, value: i64) {
        let current = self
            .sequences
            .get(&(entity.to_string(), field.to_string()))
            .copied()
            .unwrap_or(0);
        if value > current {
            self.set_sequence(entity, field, value);
        }
    }

    // ========== Transactions ==========

    pub fn is_in_transaction(&self) -> bool {
        self.state == TransactionState::Active
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.state == TransactionState::Active {
            return Err(StoreError::TransactionAlreadyActive);
        }
        self.undo.clear();
        self.state = TransactionState::Active;
        tracing::trace!("transaction started");
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(StoreError::NoActiveTransaction);
        }
        tracing::trace!(writes = self.undo.len(), "transaction committed");
        self.undo.clear();
        self.state = TransactionState::Inactive;
        Ok(())
    }

    pub fn rollback(&mut self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(StoreError::NoActiveTransaction);
        }
        tracing::debug!(writes = self.undo.len(), "rolling back transaction");
        self.undo_to(0);
        self.state = TransactionState::Inactive;
        Ok(())
    }

    /// Run `f` in a transaction: commit on `Ok`, roll back on `Err`.
    pub fn transaction<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<StoreError>,
    {
        self.begin()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                self.rollback()?;
                Err(err)
            }
        }
    }

    fn statement<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mark = self.undo.mark();
        match f(self) {
            Ok(value) => {
                if self.state == TransactionState::Inactive {
                    self.undo.clear();
                }
                Ok(value)
            }
            Err(err) => {
                self.undo_to(mark);
                Err(err)
            }
        }
    }

    fn undo_to(&mut self, mark: usize) {
        let registry = Arc::clone(&self.registry);
        for entry in self.undo.drain_after(mark) {
            match entry {
                Undo::Inserted { entity, id } => {
                    if let Some(table) = self.tables.get_mut(&entity) {
                        table.remove(registry.unique_keys(&entity), id);
                    }
                }
                Undo::Updated {
                    entity,
                    id,
                    previous,
                } => {
                    if let Some(table) = self.tables.get_mut(&entity) {
                        table.replace(registry.unique_keys(&entity), id, previous);
                    }
                }
                Undo::Deleted { entity, id, record } => {
                    if let Some(table) = self.tables.get_mut(&entity) {
                        table.insert(registry.unique_keys(&entity), id, record);
                    }
                }
                Undo::Sequence {
                    entity,
                    field,
                    previous,
                } => match previous {
                    Some(value) => {
                        self.sequences.insert((entity, field), value);
                    }
                    None => {
                        self.sequences.remove(&(entity, field));
                    }
                },
            }
        }
    }
}

fn reject_unknown_fields(def: &EntityDef, record: &Record) -> Result<()> {
    match record.keys().find(|f| def.field(f).is_none()) {
        Some(unknown) => Err(StoreError::UnknownField(def.name.clone(), unknown.clone())),
        None => Ok(()),
    }
}

fn check_fields(def: &EntityDef, record: &Record) -> Result<()> {
    for field in &def.fields {
        let value = record.get(&field.name).unwrap_or(&Value::Null);
        if value.is_null() {
            if !field.nullable {
                return Err(StoreError::NullViolation(
                    def.name.clone(),
                    field.name.clone(),
                ));
            }
            continue;
        }
        if !field.r#type.accepts(value) {
            return Err(StoreError::TypeMismatch(
                def.name.clone(),
                field.name.clone(),
                field.r#type.to_string(),
                value.clone(),
            ));
        }
    }
    Ok(())
}
