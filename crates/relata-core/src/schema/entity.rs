use serde::{Deserialize, Serialize};
use thiserror::Error;

use relata_naming::{build_foreign_key_name, build_unique_constraint_name};

use crate::schema::{
    StrOrBoolOrArray,
    constraint::EntityConstraint,
    default::{DefaultGenerator, FieldDefault},
    field::FieldDef,
    foreign_key::ForeignKeySyntax,
    names::{EntityName, FieldName},
    relation::RelationDef,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityValidationError {
    #[error("invalid foreign key reference on {0}.{1}: '{2}' (expected 'Entity.column')")]
    InvalidForeignKeyReference(String, String, String),
    #[error("entity '{0}' declares an inline primary key that differs from its primary_key constraint")]
    ConflictingPrimaryKey(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct EntityDef {
    pub name: EntityName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub constraints: Vec<EntityConstraint>,
    #[serde(default)]
    pub relations: Vec<RelationDef>,
}

impl EntityDef {
    pub fn new(name: impl Into<EntityName>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
            constraints: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Primary key columns declared as a constraint. Call on a normalized entity.
    pub fn primary_key(&self) -> Option<&[FieldName]> {
        self.constraints.iter().find_map(|c| match c {
            EntityConstraint::PrimaryKey { columns, .. } => Some(columns.as_slice()),
            _ => None,
        })
    }

    /// Whether the field is filled from a per-entity sequence when omitted.
    pub fn is_auto_increment(&self, field: &str) -> bool {
        let by_default = self.field(field).is_some_and(|f| {
            f.default_kind() == Some(FieldDefault::Generated(DefaultGenerator::AutoIncrement))
        });
        let by_primary_key = self.constraints.iter().any(|c| {
            matches!(
                c,
                EntityConstraint::PrimaryKey { auto_increment: true, columns }
                    if columns.len() == 1 && columns[0] == field
            )
        });
        by_default || by_primary_key
    }

    /// Normalizes inline field constraints (primary_key, unique, foreign_key)
    /// into entity-level constraints, and names every unnamed unique and
    /// foreign-key constraint. Normalizing twice yields the same entity.
    pub fn normalize(&self) -> Result<Self, EntityValidationError> {
        let mut constraints = self.constraints.clone();

        // Primary key
        let pk_fields: Vec<FieldName> = self
            .fields
            .iter()
            .filter(|f| f.primary_key.as_ref().is_some_and(|pk| pk.is_primary_key()))
            .map(|f| f.name.clone())
            .collect();
        let inline_auto_increment = self
            .fields
            .iter()
            .any(|f| f.primary_key.as_ref().is_some_and(|pk| pk.auto_increment()));

        if !pk_fields.is_empty() {
            let existing = constraints
                .iter_mut()
                .find(|c| matches!(c, EntityConstraint::PrimaryKey { .. }));
            match existing {
                Some(EntityConstraint::PrimaryKey {
                    columns,
                    auto_increment,
                }) => {
                    let mut declared = columns.clone();
                    let mut inline = pk_fields.clone();
                    declared.sort();
                    inline.sort();
                    if declared != inline {
                        return Err(EntityValidationError::ConflictingPrimaryKey(
                            self.name.clone(),
                        ));
                    }
                    *auto_increment |= inline_auto_increment;
                }
                _ => constraints.push(EntityConstraint::PrimaryKey {
                    auto_increment: inline_auto_increment,
                    columns: pk_fields,
                }),
            }
        }

        for field in &self.fields {
            // Inline unique
            match &field.unique {
                Some(StrOrBoolOrArray::Bool(true)) => {
                    let exists = constraints.iter().any(|c| {
                        matches!(c, EntityConstraint::Unique { columns, .. }
                            if columns.len() == 1 && columns[0] == field.name)
                    });
                    if !exists {
                        constraints.push(EntityConstraint::Unique {
                            name: None,
                            columns: vec![field.name.clone()],
                        });
                    }
                }
                Some(StrOrBoolOrArray::Str(name)) => {
                    add_to_named_unique(&mut constraints, name, &field.name);
                }
                Some(StrOrBoolOrArray::Array(names)) => {
                    // Each element names a (possibly composite) constraint this field belongs to
                    for name in names {
                        add_to_named_unique(&mut constraints, name, &field.name);
                    }
                }
                Some(StrOrBoolOrArray::Bool(false)) | None => {}
            }

            // Inline foreign_key
            if let Some(syntax) = &field.foreign_key {
                let fk = syntax.to_def().ok_or_else(|| {
                    let reference = match syntax {
                        ForeignKeySyntax::Reference(r) => r.clone(),
                        ForeignKeySyntax::Object(o) => o.ref_entity.clone(),
                    };
                    EntityValidationError::InvalidForeignKeyReference(
                        self.name.clone(),
                        field.name.clone(),
                        reference,
                    )
                })?;

                let exists = constraints.iter().any(|c| {
                    matches!(c, EntityConstraint::ForeignKey { columns, .. }
                        if columns.len() == 1 && columns[0] == field.name)
                });
                if !exists {
                    constraints.push(EntityConstraint::ForeignKey {
                        name: None,
                        columns: vec![field.name.clone()],
                        ref_entity: fk.ref_entity,
                        ref_columns: fk.ref_columns,
                        on_delete: fk.on_delete,
                    });
                }
            }
        }

        for constraint in &mut constraints {
            match constraint {
                EntityConstraint::Unique {
                    name: name @ None,
                    columns,
                } => {
                    *name = Some(build_unique_constraint_name(&self.name, columns, None));
                }
                EntityConstraint::ForeignKey {
                    name: name @ None,
                    columns,
                    ..
                } => {
                    *name = Some(build_foreign_key_name(&self.name, columns, None));
                }
                _ => {}
            }
        }

        Ok(EntityDef {
            name: self.name.clone(),
            description: self.description.clone(),
            fields: self.fields.clone(),
            constraints,
            relations: self.relations.clone(),
        })
    }
}

fn add_to_named_unique(constraints: &mut Vec<EntityConstraint>, name: &str, field: &str) {
    let existing = constraints.iter_mut().find(|c| {
        matches!(c, EntityConstraint::Unique { name: Some(n), .. } if n == name)
    });
    match existing {
        Some(EntityConstraint::Unique { columns, .. }) => {
            if !columns.iter().any(|c| c == field) {
                columns.push(field.to_string());
            }
        }
        _ => constraints.push(EntityConstraint::Unique {
            name: Some(name.to_string()),
            columns: vec![field.to_string()],
        }),
    }
}
