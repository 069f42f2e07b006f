use std::sync::Arc;

use relata_core::Record;
use relata_registry::SchemaRegistry;
use relata_store::Store;
use serde_json::Value as Json;

use crate::error::ClientError;
use crate::include::Include;
use crate::input::{DataInput, parse_unique_where, parse_where};
use crate::mutation::Coordinator;
use crate::node::Node;
use crate::operation::Operation;
use crate::resolver::load_node;

type Result<T> = std::result::Result<T, ClientError>;

/// Entry point for reads and nested writes.
///
/// Each write call runs in its own store transaction, so a failing nested
/// operation leaves no trace of the sibling writes that preceded it.
#[derive(Debug, Clone)]
pub struct Client {
    registry: Arc<SchemaRegistry>,
    store: Store,
}

impl Client {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        let store = Store::new(Arc::clone(&registry));
        Self { registry, store }
    }

    pub fn with_store(store: Store) -> Self {
        Self {
            registry: Arc::clone(store.registry()),
            store,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    fn check_entity(&self, entity: &str) -> Result<()> {
        match self.registry.entity(entity) {
            Some(_) => Ok(()),
            None => Err(ClientError::UnknownEntity(entity.to_string())),
        }
    }

    fn include(&self, entity: &str, json: &Json) -> Result<Include> {
        Include::parse(&self.registry, entity, json)
    }

    // ========== Writes ==========

    pub fn create(&mut self, entity: &str, data: &Json) -> Result<Node> {
        self.create_with(entity, data, &Include::new())
    }

    pub fn create_with(&mut self, entity: &str, data: &Json, include: &Include) -> Result<Node> {
        let registry = Arc::clone(&self.registry);
        let input = DataInput::parse(&registry, entity, data)?;
        let id = self
            .store
            .transaction(|store| Coordinator::new(&registry, store).create(entity, input))?;
        tracing::info!(entity, row = %id, "created record");
        load_node(&self.store, entity, id, include)
    }

    pub fn update(&mut self, entity: &str, r#where: &Json, data: &Json) -> Result<Node> {
        self.update_with(entity, r#where, data, &Include::new())
    }

    pub fn update_with(
        &mut self,
        entity: &str,
        r#where: &Json,
        data: &Json,
        include: &Include,
    ) -> Result<Node> {
        let registry = Arc::clone(&self.registry);
        let r#where = parse_unique_where(&registry, entity, r#where)?;
        let input = DataInput::parse(&registry, entity, data)?;
        let id = self
            .store
            .transaction(|store| Coordinator::new(&registry, store).update(entity, &r#where, input))?;
        tracing::info!(entity, row = %id, "updated record");
        load_node(&self.store, entity, id, include)
    }

    /// Delete the row matching `where`; returns it as it was.
    pub fn delete(&mut self, entity: &str, r#where: &Json) -> Result<Node> {
        let registry = Arc::clone(&self.registry);
        let r#where = parse_unique_where(&registry, entity, r#where)?;
        let record = self
            .store
            .transaction(|store| Coordinator::new(&registry, store).delete(entity, &r#where))?;
        tracing::info!(entity, "deleted record");
        Ok(Node::new(entity, record))
    }

    // ========== Reads ==========

    pub fn find_unique(&self, entity: &str, r#where: &Json, include: &Include) -> Result<Option<Node>> {
        let r#where = parse_unique_where(&self.registry, entity, r#where)?;
        let fields: Vec<&str> = r#where.keys().map(String::as_str).collect();
        let values: Vec<_> = r#where.values().cloned().collect();
        match self.store.find_unique(entity, fields.as_slice(), &values)? {
            Some(id) => Ok(Some(load_node(&self.store, entity, id, include)?)),
            None => Ok(None),
        }
    }

    /// Rows equal to every field of `filter` (`null` matches all rows).
    pub fn find_many(&self, entity: &str, filter: &Json, include: &Include) -> Result<Vec<Node>> {
        let filter = match filter {
            Json::Null => {
                self.check_entity(entity)?;
                Record::new()
            }
            other => parse_where(&self.registry, entity, other)?,
        };
        self.store
            .scan(entity, &filter)?
            .into_iter()
            .map(|(id, _)| load_node(&self.store, entity, id, include))
            .collect()
    }

    pub fn count(&self, entity: &str) -> Result<usize> {
        self.check_entity(entity)?;
        Ok(self.store.count(entity)?)
    }

    /// Run a scripted operation and render its result as JSON.
    pub fn execute(&mut self, operation: &Operation) -> Result<Json> {
        tracing::debug!(op = operation.label(), entity = operation.entity(), "executing operation");
        let result = match operation {
            Operation::Create {
                entity,
                data,
                include,
            } => {
                let include = self.include(entity, include)?;
                self.create_with(entity, data, &include)?.to_json()
            }
            Operation::Update {
                entity,
                r#where,
                data,
                include,
            } => {
                let include = self.include(entity, include)?;
                self.update_with(entity, r#where, data, &include)?.to_json()
            }
            Operation::Delete { entity, r#where } => self.delete(entity, r#where)?.to_json(),
            Operation::FindUnique {
                entity,
                r#where,
                include,
            } => {
                let include = self.include(entity, include)?;
                self.find_unique(entity, r#where, &include)?
                    .map(|node| node.to_json())
                    .unwrap_or(Json::Null)
            }
            Operation::FindMany {
                entity,
                r#where,
                include,
            } => {
                let include = self.include(entity, include)?;
                Json::Array(
                    self.find_many(entity, r#where, &include)?
                        .iter()
                        .map(Node::to_json)
                        .collect(),
                )
            }
            Operation::Count { entity } => Json::from(self.count(entity)?),
        };
        Ok(result)
    }
}
