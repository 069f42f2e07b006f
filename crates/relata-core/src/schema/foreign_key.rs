use serde::{Deserialize, Serialize};

use crate::schema::{
    names::{EntityName, FieldName},
    reference::ReferenceAction,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct ForeignKeyDef {
    pub ref_entity: EntityName,
    pub ref_columns: Vec<FieldName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferenceAction>,
}

/// Inline `foreign_key` syntax: `"User.id"` or a full [`ForeignKeyDef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case", untagged)]
pub enum ForeignKeySyntax {
    Reference(String),
    Object(ForeignKeyDef),
}

impl ForeignKeySyntax {
    /// Expand to a full definition. Returns None for a malformed `Entity.column` string.
    pub fn to_def(&self) -> Option<ForeignKeyDef> {
        match self {
            ForeignKeySyntax::Object(def) => Some(def.clone()),
            ForeignKeySyntax::Reference(reference) => {
                let (entity, column) = reference.split_once('.')?;
                if entity.is_empty() || column.is_empty() || column.contains('.') {
                    return None;
                }
                Some(ForeignKeyDef {
                    ref_entity: entity.to_string(),
                    ref_columns: vec![column.to_string()],
                    on_delete: None,
                })
            }
        }
    }
}
