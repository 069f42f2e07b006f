use std::collections::HashMap;

use relata_core::{
    EntityConstraint, EntityDef, EntityName, FieldName, RelationDef, RelationKind, RelationName,
    RelationVia,
};
use relata_naming::{build_foreign_key_name, build_join_table_name, join_table_endpoints};

use crate::error::RegistryError;
use crate::join::{JOIN_COLUMN_A, JOIN_COLUMN_B, implicit_join_entity};
use crate::validate::is_unique_set;

/// Key under which a loaded row exposes its explicit join row.
pub const PIVOT_KEY: &str = "pivot";

/// A declared relation with its mapping checked against the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelation {
    /// Entity declaring the relation.
    pub entity: EntityName,
    pub name: RelationName,
    pub target: EntityName,
    pub kind: RelationKind,
    pub link: Link,
}

impl ResolvedRelation {
    pub fn is_to_many(&self) -> bool {
        self.kind.is_to_many()
    }
}

/// How rows of the two entities are linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    /// `fields` on the declaring entity reference `references` on the target.
    Owned {
        constraint: String,
        fields: Vec<FieldName>,
        references: Vec<FieldName>,
        nullable: bool,
    },
    /// `fields` on the target reference `references` on the declaring entity.
    Inverse {
        constraint: String,
        fields: Vec<FieldName>,
        references: Vec<FieldName>,
        nullable: bool,
    },
    /// Rows of a join entity pair the two sides.
    Join(JoinLink),
}

impl JoinLink {
    /// Read and write the pair from the other end of the join entity.
    pub(crate) fn flip(&mut self) {
        std::mem::swap(&mut self.source_fields, &mut self.target_fields);
        std::mem::swap(&mut self.source_references, &mut self.target_references);
    }
}

impl Link {
    pub fn label(&self) -> &'static str {
        match self {
            Link::Owned { .. } => "foreign_key",
            Link::Inverse { .. } => "inverse",
            Link::Join(join) if join.implicit => "join_table",
            Link::Join(_) => "through",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinLink {
    pub entity: EntityName,
    /// Generated join entity without attributes of its own.
    pub implicit: bool,
    /// Join columns referencing the declaring entity.
    pub source_fields: Vec<FieldName>,
    pub source_references: Vec<FieldName>,
    /// Join columns referencing the target.
    pub target_fields: Vec<FieldName>,
    pub target_references: Vec<FieldName>,
}

struct MatchedForeignKey<'a> {
    name: String,
    columns: &'a [FieldName],
    ref_columns: &'a [FieldName],
}

/// Foreign key on `owner` toward `ref_entity` whose columns are exactly `fields`, in any order.
fn find_foreign_key<'a>(
    owner: &'a EntityDef,
    ref_entity: &str,
    fields: &[FieldName],
) -> Option<MatchedForeignKey<'a>> {
    if fields.is_empty() {
        return None;
    }
    owner.constraints.iter().find_map(|c| match c {
        EntityConstraint::ForeignKey {
            name,
            columns,
            ref_entity: r,
            ref_columns,
            ..
        } if r == ref_entity
            && columns.len() == fields.len()
            && fields.iter().all(|f| columns.contains(f)) =>
        {
            Some(MatchedForeignKey {
                name: name
                    .clone()
                    .unwrap_or_else(|| build_foreign_key_name(&owner.name, columns, None)),
                columns,
                ref_columns,
            })
        }
        _ => None,
    })
}

fn any_nullable(entity: &EntityDef, fields: &[FieldName]) -> bool {
    fields
        .iter()
        .any(|f| entity.field(f).is_some_and(|field| field.nullable))
}

fn check_kind(entity: &EntityDef, def: &RelationDef, derived: RelationKind) -> Result<(), RegistryError> {
    if def.kind != derived {
        return Err(RegistryError::RelationKindMismatch(
            entity.name.clone(),
            def.name.clone(),
            def.kind,
            derived,
        ));
    }
    Ok(())
}

/// Resolve one relation of `entity`. Returns the implicit join entity the
/// relation needs, if any; both sides of a join table produce the same one.
pub(crate) fn resolve_relation(
    entity: &EntityDef,
    def: &RelationDef,
    entities: &HashMap<&str, &EntityDef>,
    join_table_prefix: &str,
) -> Result<(ResolvedRelation, Option<EntityDef>), RegistryError> {
    let target = entities.get(def.target.as_str()).ok_or_else(|| {
        RegistryError::RelationTargetNotFound(
            entity.name.clone(),
            def.name.clone(),
            def.target.clone(),
        )
    })?;
    let not_found = |owner: &str, fields: &[FieldName]| {
        RegistryError::RelationForeignKeyNotFound(
            entity.name.clone(),
            def.name.clone(),
            owner.to_string(),
            fields.join(", "),
        )
    };

    let mut implicit = None;
    let link = match &def.via {
        RelationVia::ForeignKey { fields } => {
            let fk = find_foreign_key(entity, &target.name, fields)
                .ok_or_else(|| not_found(&entity.name, fields))?;
            let derived = if is_unique_set(entity, fk.columns) {
                RelationKind::OneToOne
            } else {
                RelationKind::ManyToOne
            };
            check_kind(entity, def, derived)?;
            Link::Owned {
                constraint: fk.name,
                fields: fk.columns.to_vec(),
                references: fk.ref_columns.to_vec(),
                nullable: any_nullable(entity, fk.columns),
            }
        }
        RelationVia::Inverse { fields } => {
            let fk = find_foreign_key(target, &entity.name, fields)
                .ok_or_else(|| not_found(&target.name, fields))?;
            let derived = if is_unique_set(target, fk.columns) {
                RelationKind::OneToOne
            } else {
                RelationKind::OneToMany
            };
            check_kind(entity, def, derived)?;
            Link::Inverse {
                constraint: fk.name,
                fields: fk.columns.to_vec(),
                references: fk.ref_columns.to_vec(),
                nullable: any_nullable(target, fk.columns),
            }
        }
        RelationVia::JoinTable { name } => {
            check_kind(entity, def, RelationKind::ManyToMany)?;
            let single_key = |e: &EntityDef| -> Result<FieldName, RegistryError> {
                match e.primary_key() {
                    Some([column]) => Ok(column.clone()),
                    _ => Err(RegistryError::JoinTableRequiresSingleKey(
                        entity.name.clone(),
                        def.name.clone(),
                        e.name.clone(),
                    )),
                }
            };
            let source_key = single_key(entity)?;
            let target_key = single_key(target)?;

            let (a, _) = join_table_endpoints(&entity.name, &target.name);
            let join_name = name.clone().unwrap_or_else(|| {
                build_join_table_name(join_table_prefix, &entity.name, &target.name)
            });
            let (source_column, target_column) = if a == entity.name {
                (JOIN_COLUMN_A, JOIN_COLUMN_B)
            } else {
                (JOIN_COLUMN_B, JOIN_COLUMN_A)
            };
            implicit = Some(implicit_join_entity(&join_name, entity, target)?);
            Link::Join(JoinLink {
                entity: join_name,
                implicit: true,
                source_fields: vec![source_column.to_string()],
                source_references: vec![source_key],
                target_fields: vec![target_column.to_string()],
                target_references: vec![target_key],
            })
        }
        RelationVia::Through {
            entity: join_name,
            source_fields,
            target_fields,
        } => {
            check_kind(entity, def, RelationKind::ManyToMany)?;
            if target.field(PIVOT_KEY).is_some() || target.relation(PIVOT_KEY).is_some() {
                return Err(RegistryError::ReservedPivotName(
                    entity.name.clone(),
                    def.name.clone(),
                    target.name.clone(),
                ));
            }
            let join = entities.get(join_name.as_str()).ok_or_else(|| {
                RegistryError::JoinEntityNotFound(
                    entity.name.clone(),
                    def.name.clone(),
                    join_name.clone(),
                )
            })?;
            let source = find_foreign_key(join, &entity.name, source_fields)
                .ok_or_else(|| not_found(&join.name, source_fields))?;
            let target_fk = find_foreign_key(join, &target.name, target_fields)
                .ok_or_else(|| not_found(&join.name, target_fields))?;
            Link::Join(JoinLink {
                entity: join.name.clone(),
                implicit: false,
                source_fields: source.columns.to_vec(),
                source_references: source.ref_columns.to_vec(),
                target_fields: target_fk.columns.to_vec(),
                target_references: target_fk.ref_columns.to_vec(),
            })
        }
    };

    Ok((
        ResolvedRelation {
            entity: entity.name.clone(),
            name: def.name.clone(),
            target: target.name.clone(),
            kind: def.kind,
            link,
        },
        implicit,
    ))
}
