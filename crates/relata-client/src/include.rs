use std::collections::BTreeMap;

use relata_core::RelationName;
use relata_registry::SchemaRegistry;
use serde_json::Value as Json;

use crate::error::ClientError;

/// Relations to load alongside a record, nested per relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Include {
    relations: BTreeMap<RelationName, Include>,
}

impl Include {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relation with its own nested include.
    pub fn with(mut self, relation: impl Into<RelationName>, nested: Include) -> Self {
        self.relations.insert(relation.into(), nested);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelationName, &Include)> {
        self.relations.iter()
    }

    /// Parse `{"posts": true, "profile": {"include": {...}}}` for `entity`.
    /// `null` means nothing is included; `false` entries are skipped.
    pub fn parse(registry: &SchemaRegistry, entity: &str, json: &Json) -> Result<Self, ClientError> {
        if registry.entity(entity).is_none() {
            return Err(ClientError::UnknownEntity(entity.to_string()));
        }
        let object = match json {
            Json::Null => return Ok(Self::new()),
            Json::Object(object) => object,
            other => {
                return Err(ClientError::InvalidInput(format!(
                    "include must be an object, got {other}"
                )));
            }
        };

        let mut include = Self::new();
        for (name, value) in object {
            let relation = registry
                .relation(entity, name)
                .ok_or_else(|| ClientError::UnknownRelation(entity.to_string(), name.clone()))?;
            let nested = match value {
                Json::Bool(false) => continue,
                Json::Bool(true) => Self::new(),
                Json::Object(options) => match options.get("include") {
                    Some(nested) => Self::parse(registry, &relation.target, nested)?,
                    None => Self::new(),
                },
                other => {
                    return Err(ClientError::InvalidInput(format!(
                        "include of {entity}.{name} must be a bool or object, got {other}"
                    )));
                }
            };
            include.relations.insert(name.clone(), nested);
        }
        Ok(include)
    }
}
