use relata_core::{Record, Value};
use relata_registry::{JoinLink, Link, ResolvedRelation, SchemaRegistry};
use relata_store::{RowId, Store, StoreError};

use crate::error::ClientError;
use crate::input::{ConnectOrCreate, DataInput, Disconnect, NestedWrite};
use crate::resolver::related;

type Result<T> = std::result::Result<T, ClientError>;

fn describe(record: &Record) -> String {
    let pairs: Vec<String> = record.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    format!("{{{}}}", pairs.join(", "))
}

fn unsupported(relation: &ResolvedRelation, op: &str) -> ClientError {
    ClientError::UnsupportedNestedWrite(
        relation.entity.clone(),
        relation.name.clone(),
        op.to_string(),
    )
}

/// Set `fields` to `values` in `scalars`, refusing to overwrite a different
/// value the caller supplied directly.
fn assign(
    relation: &ResolvedRelation,
    scalars: &mut Record,
    fields: &[String],
    values: &[Value],
) -> Result<()> {
    for (field, value) in fields.iter().zip(values) {
        if let Some(existing) = scalars.get(field)
            && existing != value
        {
            return Err(ClientError::ConflictingForeignKey(
                relation.entity.clone(),
                relation.name.clone(),
                field.clone(),
            ));
        }
        scalars.insert(field.clone(), value.clone());
    }
    Ok(())
}

/// Applies one top-level write and its nested writes to the store.
///
/// Runs inside the caller's transaction; any error leaves partial writes
/// for the caller to roll back.
pub(crate) struct Coordinator<'a> {
    registry: &'a SchemaRegistry,
    store: &'a mut Store,
}

impl<'a> Coordinator<'a> {
    pub(crate) fn new(registry: &'a SchemaRegistry, store: &'a mut Store) -> Self {
        Self { registry, store }
    }

    fn relation(&self, entity: &str, name: &str) -> Result<&'a ResolvedRelation> {
        self.registry
            .relation(entity, name)
            .ok_or_else(|| ClientError::UnknownRelation(entity.to_string(), name.to_string()))
    }

    fn record(&self, entity: &str, id: RowId) -> Result<Record> {
        self.store
            .get(entity, id)
            .cloned()
            .ok_or_else(|| ClientError::RecordNotFound(entity.to_string(), id.to_string()))
    }

    fn values(&self, entity: &str, id: RowId, fields: &[String]) -> Result<Vec<Value>> {
        let record = self.record(entity, id)?;
        Ok(fields
            .iter()
            .map(|f| record.get(f).cloned().unwrap_or_default())
            .collect())
    }

    pub(crate) fn find(&self, entity: &str, r#where: &Record) -> Result<Option<RowId>> {
        let fields: Vec<&str> = r#where.keys().map(String::as_str).collect();
        let values: Vec<Value> = r#where.values().cloned().collect();
        match self.store.find_unique(entity, fields.as_slice(), &values) {
            Ok(found) => Ok(found),
            Err(StoreError::NotAUniqueKey(entity, fields)) => {
                Err(ClientError::NotAUniqueWhere(entity, fields))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) fn require(&self, entity: &str, r#where: &Record) -> Result<RowId> {
        self.find(entity, r#where)?
            .ok_or_else(|| ClientError::RecordNotFound(entity.to_string(), describe(r#where)))
    }

    fn connect_or_create(&mut self, entity: &str, input: ConnectOrCreate) -> Result<RowId> {
        match self.find(entity, &input.r#where)? {
            Some(id) => {
                tracing::debug!(entity, row = %id, "connectOrCreate matched existing row");
                Ok(id)
            }
            None => {
                tracing::debug!(entity, "connectOrCreate creating row");
                self.create(entity, input.create)
            }
        }
    }

    /// Insert a row. Targets of foreign-key relations are linked first so the
    /// row is written with its foreign keys set; inverse and join relations
    /// are written afterwards.
    pub(crate) fn create(&mut self, entity: &str, mut data: DataInput) -> Result<RowId> {
        let relations = std::mem::take(&mut data.relations);
        let mut scalars = data.scalars;
        let mut deferred = Vec::new();

        for (name, write) in relations {
            let relation = self.relation(entity, &name)?;
            if write.disconnect.is_some() {
                return Err(unsupported(relation, "disconnect"));
            }
            match &relation.link {
                Link::Owned { .. } => self.link_owned(relation, &mut scalars, write)?,
                _ => deferred.push((relation, write)),
            }
        }

        let id = self.store.insert(entity, scalars)?;
        for (relation, write) in deferred {
            self.write_linked(relation, id, write)?;
        }
        Ok(id)
    }

    /// Update the row matching `where`, then apply nested writes.
    pub(crate) fn update(&mut self, entity: &str, r#where: &Record, mut data: DataInput) -> Result<RowId> {
        let id = self.require(entity, r#where)?;
        let relations = std::mem::take(&mut data.relations);
        let mut scalars = data.scalars;
        let mut deferred = Vec::new();

        for (name, write) in relations {
            let relation = self.relation(entity, &name)?;
            if write.disconnect.is_some() && write.link_count() > 0 {
                return Err(ClientError::InvalidInput(format!(
                    "{entity}.{name}: disconnect cannot be combined with other operations"
                )));
            }
            match &relation.link {
                Link::Owned {
                    fields, nullable, ..
                } => {
                    if let Some(disconnect) = &write.disconnect {
                        if !nullable {
                            return Err(ClientError::RequiredRelationDisconnect(
                                entity.to_string(),
                                name.clone(),
                            ));
                        }
                        if let Disconnect::Rows(targets) = disconnect {
                            let current = self.record(entity, id)?;
                            let linked = related(self.store, relation, &current)?;
                            for target in targets {
                                let target_id = self.require(&relation.target, target)?;
                                if !linked.iter().any(|r| r.id == target_id) {
                                    return Err(ClientError::RecordNotFound(
                                        relation.target.clone(),
                                        describe(target),
                                    ));
                                }
                            }
                        }
                        let nulls = vec![Value::Null; fields.len()];
                        assign(relation, &mut scalars, fields, &nulls)?;
                    }
                    self.link_owned(relation, &mut scalars, write)?;
                }
                _ => deferred.push((relation, write)),
            }
        }

        if !scalars.is_empty() {
            self.store.update(entity, id, scalars)?;
        }
        for (relation, write) in deferred {
            self.write_linked(relation, id, write)?;
        }
        Ok(id)
    }

    pub(crate) fn delete(&mut self, entity: &str, r#where: &Record) -> Result<Record> {
        let id = self.require(entity, r#where)?;
        Ok(self.store.delete(entity, id)?)
    }

    /// Resolve the single target of a foreign-key relation and copy its
    /// referenced key into `scalars`.
    fn link_owned(
        &mut self,
        relation: &ResolvedRelation,
        scalars: &mut Record,
        write: NestedWrite,
    ) -> Result<()> {
        let Link::Owned {
            fields, references, ..
        } = &relation.link
        else {
            return Ok(());
        };
        let target = relation.target.as_str();
        let NestedWrite {
            create,
            connect,
            connect_or_create,
            attach,
            ..
        } = write;
        if !attach.is_empty() {
            return Err(unsupported(relation, "attach"));
        }

        let linked = if let Some(data) = create.into_iter().next() {
            tracing::debug!(entity = %relation.entity, relation = %relation.name, "nested create");
            Some(self.create(target, data)?)
        } else if let Some(r#where) = connect.first() {
            tracing::debug!(entity = %relation.entity, relation = %relation.name, "nested connect");
            Some(self.require(target, r#where)?)
        } else if let Some(input) = connect_or_create.into_iter().next() {
            Some(self.connect_or_create(target, input)?)
        } else {
            None
        };

        if let Some(target_id) = linked {
            let values = self.values(target, target_id, references)?;
            assign(relation, scalars, fields, &values)?;
        }
        Ok(())
    }

    /// Writes on relations whose linking rows live elsewhere: inverse
    /// children and join rows. `parent` is already stored.
    fn write_linked(
        &mut self,
        relation: &ResolvedRelation,
        parent: RowId,
        write: NestedWrite,
    ) -> Result<()> {
        match &relation.link {
            Link::Owned { .. } => Ok(()),
            Link::Inverse {
                fields,
                references,
                nullable,
                ..
            } => {
                let key = self.values(&relation.entity, parent, references)?;
                let link: Record = fields.iter().cloned().zip(key.iter().cloned()).collect();
                self.write_inverse(relation, parent, write, &link, fields, *nullable)
            }
            Link::Join(join) => {
                let key = self.values(&relation.entity, parent, &join.source_references)?;
                self.write_join(relation, join, &key, write)
            }
        }
    }

    fn write_inverse(
        &mut self,
        relation: &ResolvedRelation,
        parent: RowId,
        write: NestedWrite,
        link: &Record,
        fields: &[String],
        nullable: bool,
    ) -> Result<()> {
        let target = relation.target.as_str();
        if !write.attach.is_empty() {
            return Err(unsupported(relation, "attach"));
        }

        if let Some(disconnect) = &write.disconnect {
            if !nullable {
                return Err(ClientError::RequiredRelationDisconnect(
                    relation.entity.clone(),
                    relation.name.clone(),
                ));
            }
            let parent_record = self.record(&relation.entity, parent)?;
            let linked = related(self.store, relation, &parent_record)?;
            let children: Vec<RowId> = match disconnect {
                Disconnect::Current => linked.iter().map(|r| r.id).collect(),
                Disconnect::Rows(targets) => {
                    let mut children = Vec::with_capacity(targets.len());
                    for r#where in targets {
                        let child = self.require(target, r#where)?;
                        if !linked.iter().any(|r| r.id == child) {
                            return Err(ClientError::RecordNotFound(
                                target.to_string(),
                                describe(r#where),
                            ));
                        }
                        children.push(child);
                    }
                    children
                }
            };
            let nulls: Record = fields.iter().map(|f| (f.clone(), Value::Null)).collect();
            for child in children {
                tracing::debug!(entity = %relation.entity, relation = %relation.name, row = %child, "nested disconnect");
                self.store.update(target, child, nulls.clone())?;
            }
        }

        for mut data in write.create {
            tracing::debug!(entity = %relation.entity, relation = %relation.name, "nested create");
            let values: Vec<Value> = link.values().cloned().collect();
            let keys: Vec<String> = link.keys().cloned().collect();
            assign(relation, &mut data.scalars, &keys, &values)?;
            self.create(target, data)?;
        }
        for r#where in &write.connect {
            tracing::debug!(entity = %relation.entity, relation = %relation.name, "nested connect");
            let child = self.require(target, r#where)?;
            self.store.update(target, child, link.clone())?;
        }
        for input in write.connect_or_create {
            match self.find(target, &input.r#where)? {
                Some(child) => self.store.update(target, child, link.clone())?,
                None => {
                    let mut data = input.create;
                    let values: Vec<Value> = link.values().cloned().collect();
                    let keys: Vec<String> = link.keys().cloned().collect();
                    assign(relation, &mut data.scalars, &keys, &values)?;
                    self.create(target, data)?;
                }
            }
        }
        Ok(())
    }

    fn write_join(
        &mut self,
        relation: &ResolvedRelation,
        join: &JoinLink,
        source: &[Value],
        write: NestedWrite,
    ) -> Result<()> {
        let target = relation.target.as_str();

        if let Some(disconnect) = &write.disconnect {
            let Disconnect::Rows(targets) = disconnect else {
                return Err(unsupported(relation, "disconnect"));
            };
            for r#where in targets {
                let target_id = self.require(target, r#where)?;
                let pair = self.join_pair(relation, join, source, target_id)?;
                let rows: Vec<RowId> = self
                    .store
                    .scan(&join.entity, &pair)?
                    .into_iter()
                    .map(|(id, _)| id)
                    .collect();
                for row in rows {
                    tracing::debug!(entity = %relation.entity, relation = %relation.name, row = %row, "removing join row");
                    self.store.delete(&join.entity, row)?;
                }
            }
        }

        for data in write.create {
            tracing::debug!(entity = %relation.entity, relation = %relation.name, "nested create");
            let target_id = self.create(target, data)?;
            self.insert_join_row(relation, join, source, target_id, Record::new(), true)?;
        }
        for r#where in &write.connect {
            tracing::debug!(entity = %relation.entity, relation = %relation.name, "nested connect");
            let target_id = self.require(target, r#where)?;
            self.insert_join_row(relation, join, source, target_id, Record::new(), true)?;
        }
        for input in write.connect_or_create {
            let target_id = self.connect_or_create(target, input)?;
            self.insert_join_row(relation, join, source, target_id, Record::new(), true)?;
        }
        for attach in write.attach {
            tracing::debug!(entity = %relation.entity, relation = %relation.name, "nested attach");
            let target_id = self.require(target, &attach.r#where)?;
            self.insert_join_row(relation, join, source, target_id, attach.pivot, false)?;
        }
        Ok(())
    }

    /// Join columns pairing the parent's key with the target row's key.
    fn join_pair(
        &self,
        relation: &ResolvedRelation,
        join: &JoinLink,
        source: &[Value],
        target_id: RowId,
    ) -> Result<Record> {
        let target_key = self.values(&relation.target, target_id, &join.target_references)?;
        Ok(join
            .source_fields
            .iter()
            .cloned()
            .zip(source.iter().cloned())
            .chain(join.target_fields.iter().cloned().zip(target_key))
            .collect())
    }

    /// Insert a join row. With `skip_existing`, an existing pair is left as is;
    /// otherwise a duplicate pair fails on the join entity's keys.
    fn insert_join_row(
        &mut self,
        relation: &ResolvedRelation,
        join: &JoinLink,
        source: &[Value],
        target_id: RowId,
        pivot: Record,
        skip_existing: bool,
    ) -> Result<()> {
        let pair = self.join_pair(relation, join, source, target_id)?;
        if skip_existing && !self.store.scan(&join.entity, &pair)?.is_empty() {
            tracing::trace!(join = %join.entity, "join row already present");
            return Ok(());
        }
        let mut row = pivot;
        row.extend(pair);
        self.store.insert(&join.entity, row)?;
        Ok(())
    }
}
