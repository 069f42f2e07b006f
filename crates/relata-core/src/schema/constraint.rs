use serde::{Deserialize, Serialize};

use crate::schema::{
    ReferenceAction,
    names::{EntityName, FieldName},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EntityConstraint {
    PrimaryKey {
        #[serde(default)]
        auto_increment: bool,
        columns: Vec<FieldName>,
    },
    Unique {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        columns: Vec<FieldName>,
    },
    ForeignKey {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        columns: Vec<FieldName>,
        ref_entity: EntityName,
        ref_columns: Vec<FieldName>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_delete: Option<ReferenceAction>,
    },
}

impl EntityConstraint {
    pub fn columns(&self) -> &[FieldName] {
        match self {
            EntityConstraint::PrimaryKey { columns, .. }
            | EntityConstraint::Unique { columns, .. }
            | EntityConstraint::ForeignKey { columns, .. } => columns,
        }
    }

    /// Label used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            EntityConstraint::PrimaryKey { .. } => "PrimaryKey",
            EntityConstraint::Unique { .. } => "Unique",
            EntityConstraint::ForeignKey { .. } => "ForeignKey",
        }
    }
}
