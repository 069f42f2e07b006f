use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use relata_core::{
    EntityConstraint, EntityDef, EntityName, FieldName, ReferenceAction,
};
use relata_naming::{build_foreign_key_name, build_primary_key_name};

use crate::error::RegistryError;
use crate::relation::{Link, ResolvedRelation, resolve_relation};
use crate::validate::validate_entities;

/// Options affecting how the registry is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Prefix of generated join entity names.
    pub join_table_prefix: String,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            join_table_prefix: "_".to_string(),
        }
    }
}

/// A primary or unique key of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub name: String,
    pub columns: Vec<FieldName>,
    pub primary: bool,
}

/// A foreign-key constraint, indexed by the entity owning its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: String,
    pub entity: EntityName,
    pub columns: Vec<FieldName>,
    pub ref_entity: EntityName,
    pub ref_columns: Vec<FieldName>,
    pub on_delete: Option<ReferenceAction>,
}

impl ForeignKey {
    /// Action applied to referencing rows when the referenced row is deleted.
    /// Unset actions refuse the delete.
    pub fn delete_action(&self) -> ReferenceAction {
        self.on_delete.unwrap_or(ReferenceAction::Restrict)
    }
}

/// Validated entities with their relations resolved.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    entities: BTreeMap<EntityName, EntityDef>,
    implicit: BTreeSet<EntityName>,
    relations: BTreeMap<EntityName, Vec<ResolvedRelation>>,
    keys: BTreeMap<EntityName, Vec<UniqueKey>>,
    foreign_keys: BTreeMap<EntityName, Vec<ForeignKey>>,
}

impl SchemaRegistry {
    pub fn new(entities: Vec<EntityDef>) -> Result<Self, RegistryError> {
        Self::with_options(entities, &RegistryOptions::default())
    }

    /// Normalize and validate `entities`, resolve every relation and add
    /// the implicit join entities the relations need.
    pub fn with_options(
        entities: Vec<EntityDef>,
        options: &RegistryOptions,
    ) -> Result<Self, RegistryError> {
        let entities = entities
            .iter()
            .map(EntityDef::normalize)
            .collect::<Result<Vec<_>, _>>()?;
        validate_entities(&entities)?;

        let entity_map: HashMap<&str, &EntityDef> =
            entities.iter().map(|e| (e.name.as_str(), e)).collect();

        let mut relations = BTreeMap::new();
        let mut implicit: BTreeMap<EntityName, EntityDef> = BTreeMap::new();
        let mut self_joins: HashMap<EntityName, usize> = HashMap::new();
        for entity in &entities {
            let mut names = HashSet::new();
            let mut resolved = Vec::with_capacity(entity.relations.len());
            for def in &entity.relations {
                if !names.insert(def.name.as_str()) {
                    return Err(RegistryError::DuplicateRelationName(
                        entity.name.clone(),
                        def.name.clone(),
                    ));
                }
                if entity.field(&def.name).is_some() {
                    return Err(RegistryError::RelationFieldClash(
                        entity.name.clone(),
                        def.name.clone(),
                    ));
                }

                let (mut relation, join) =
                    resolve_relation(entity, def, &entity_map, &options.join_table_prefix)?;
                claim_self_join(&mut relation, &mut self_joins)?;
                if let Some(join) = join {
                    if entity_map.contains_key(join.name.as_str()) {
                        return Err(RegistryError::JoinTableNameConflict(join.name));
                    }
                    match implicit.get(&join.name) {
                        Some(existing) if *existing != join => {
                            return Err(RegistryError::JoinTableConflict(join.name));
                        }
                        Some(_) => {}
                        None => {
                            implicit.insert(join.name.clone(), join);
                        }
                    }
                }
                resolved.push(relation);
            }
            relations.insert(entity.name.clone(), resolved);
        }

        let implicit_names: BTreeSet<EntityName> = implicit.keys().cloned().collect();
        let mut all: BTreeMap<EntityName, EntityDef> = entities
            .into_iter()
            .map(|e| (e.name.clone(), e))
            .collect();
        all.extend(implicit);

        let mut keys = BTreeMap::new();
        let mut foreign_keys = BTreeMap::new();
        for entity in all.values() {
            keys.insert(entity.name.clone(), unique_keys_of(entity));
            foreign_keys.insert(entity.name.clone(), foreign_keys_of(entity));
        }

        Ok(Self {
            entities: all,
            implicit: implicit_names,
            relations,
            keys,
            foreign_keys,
        })
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// All entities, implicit join entities included, ordered by name.
    pub fn entities(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.values()
    }

    pub fn is_implicit(&self, name: &str) -> bool {
        self.implicit.contains(name)
    }

    pub fn relation(&self, entity: &str, name: &str) -> Option<&ResolvedRelation> {
        self.relations_of(entity).iter().find(|r| r.name == name)
    }

    /// Relations of an entity in declaration order.
    pub fn relations_of(&self, entity: &str) -> &[ResolvedRelation] {
        self.relations.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn primary_key(&self, entity: &str) -> Option<&UniqueKey> {
        self.unique_keys(entity).iter().find(|k| k.primary)
    }

    /// Primary key first, then unique constraints in declaration order.
    pub fn unique_keys(&self, entity: &str) -> &[UniqueKey] {
        self.keys.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The key `fields` identify a row by: one with exactly these columns if
    /// any, otherwise one whose columns are all among them.
    pub fn covering_unique_key<S: AsRef<str>>(
        &self,
        entity: &str,
        fields: &[S],
    ) -> Option<&UniqueKey> {
        let keys = self.unique_keys(entity);
        let contains = |column: &FieldName| fields.iter().any(|f| f.as_ref() == column);
        keys.iter()
            .find(|k| k.columns.len() == fields.len() && k.columns.iter().all(contains))
            .or_else(|| keys.iter().find(|k| k.columns.iter().all(contains)))
    }

    /// Foreign keys owned by `entity`.
    pub fn foreign_keys(&self, entity: &str) -> &[ForeignKey] {
        self.foreign_keys.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Foreign keys of any entity that reference `target`.
    pub fn referencing<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a ForeignKey> {
        self.foreign_keys
            .values()
            .flatten()
            .filter(move |fk| fk.ref_entity == target)
    }
}

fn unique_keys_of(entity: &EntityDef) -> Vec<UniqueKey> {
    let mut keys = Vec::new();
    for constraint in &entity.constraints {
        match constraint {
            EntityConstraint::PrimaryKey { columns, .. } => keys.insert(
                0,
                UniqueKey {
                    name: build_primary_key_name(&entity.name),
                    columns: columns.clone(),
                    primary: true,
                },
            ),
            EntityConstraint::Unique { name, columns } => keys.push(UniqueKey {
                name: name.clone().unwrap_or_else(|| {
                    relata_naming::build_unique_constraint_name(&entity.name, columns, None)
                }),
                columns: columns.clone(),
                primary: false,
            }),
            EntityConstraint::ForeignKey { .. } => {}
        }
    }
    keys
}

fn foreign_keys_of(entity: &EntityDef) -> Vec<ForeignKey> {
    entity
        .constraints
        .iter()
        .filter_map(|c| match c {
            EntityConstraint::ForeignKey {
                name,
                columns,
                ref_entity,
                ref_columns,
                on_delete,
            } => Some(ForeignKey {
                name: name
                    .clone()
                    .unwrap_or_else(|| build_foreign_key_name(&entity.name, columns, None)),
                entity: entity.name.clone(),
                columns: columns.clone(),
                ref_entity: ref_entity.clone(),
                ref_columns: ref_columns.clone(),
                on_delete: *on_delete,
            }),
            _ => None,
        })
        .collect()
}

/// Render a one-line summary of a resolved relation.
/// The first relation of an entity to itself through an implicit join table
/// reads from column `A`, the second from column `B`.
fn claim_self_join(
    relation: &mut ResolvedRelation,
    claims: &mut HashMap<EntityName, usize>,
) -> Result<(), RegistryError> {
    if relation.entity != relation.target {
        return Ok(());
    }
    let Link::Join(join) = &mut relation.link else {
        return Ok(());
    };
    if !join.implicit {
        return Ok(());
    }
    let claimed = claims.entry(join.entity.clone()).or_insert(0);
    match *claimed {
        0 => {}
        1 => join.flip(),
        _ => {
            return Err(RegistryError::SelfJoinTableOverclaimed(
                join.entity.clone(),
                relation.entity.clone(),
                relation.name.clone(),
            ));
        }
    }
    *claimed += 1;
    Ok(())
}

pub fn describe_relation(relation: &ResolvedRelation) -> String {
    let detail = match &relation.link {
        Link::Owned { fields, references, .. } => format!(
            "{}.[{}] -> {}.[{}]",
            relation.entity,
            fields.join(", "),
            relation.target,
            references.join(", ")
        ),
        Link::Inverse { fields, references, .. } => format!(
            "{}.[{}] <- {}.[{}]",
            relation.entity,
            references.join(", "),
            relation.target,
            fields.join(", ")
        ),
        Link::Join(join) => format!(
            "{} <-> {} via {}",
            relation.entity, relation.target, join.entity
        ),
    };
    format!(
        "{}.{}: {} ({}) {}",
        relation.entity,
        relation.name,
        relation.kind,
        relation.link.label(),
        detail
    )
}
