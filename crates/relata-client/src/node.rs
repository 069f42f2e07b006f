use std::collections::BTreeMap;

use relata_core::{EntityName, Record, RelationName, Value};
use relata_registry::PIVOT_KEY;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A loaded record with the relations that were included.
///
/// Serializes as one JSON object: scalar fields, then each included
/// relation (`null`, an object or a list), then `pivot` when present.
/// The registry keeps `pivot` free on targets of `through` relations.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub entity: EntityName,
    pub record: Record,
    pub relations: BTreeMap<RelationName, Included>,
    /// Join row linking this node to its parent through an explicit join entity.
    pub pivot: Option<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Included {
    One(Option<Box<Node>>),
    Many(Vec<Node>),
}

impl Node {
    pub fn new(entity: impl Into<EntityName>, record: Record) -> Self {
        Self {
            entity: entity.into(),
            record,
            relations: BTreeMap::new(),
            pivot: None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }

    /// The included to-one relation, if it is linked.
    pub fn one(&self, relation: &str) -> Option<&Node> {
        match self.relations.get(relation)? {
            Included::One(node) => node.as_deref(),
            Included::Many(_) => None,
        }
    }

    /// The included to-many relation; empty when not included.
    pub fn many(&self, relation: &str) -> &[Node] {
        match self.relations.get(relation) {
            Some(Included::Many(nodes)) => nodes,
            _ => &[],
        }
    }

    pub fn pivot(&self) -> Option<&Record> {
        self.pivot.as_ref()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Included {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Included::One(node) => node.serialize(serializer),
            Included::Many(nodes) => nodes.serialize(serializer),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.record.len() + self.relations.len() + usize::from(self.pivot.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (field, value) in &self.record {
            map.serialize_entry(field, value)?;
        }
        for (relation, included) in &self.relations {
            map.serialize_entry(relation, included)?;
        }
        if let Some(pivot) = &self.pivot {
            map.serialize_entry(PIVOT_KEY, pivot)?;
        }
        map.end()
    }
}
