use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::names::{EntityName, FieldName, RelationName};

/// Cardinality of a relation, seen from the entity declaring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationKind {
    /// True when the relation resolves to a list.
    pub fn is_to_many(self) -> bool {
        matches!(self, RelationKind::OneToMany | RelationKind::ManyToMany)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationKind::OneToOne => "one_to_one",
            RelationKind::OneToMany => "one_to_many",
            RelationKind::ManyToOne => "many_to_one",
            RelationKind::ManyToMany => "many_to_many",
        };
        f.write_str(s)
    }
}

/// Where the columns linking the two entities live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum RelationVia {
    /// Foreign-key columns on this entity reference the target.
    ForeignKey { fields: Vec<FieldName> },
    /// Foreign-key columns on the target reference this entity.
    Inverse { fields: Vec<FieldName> },
    /// Implicit join entity with one column per side and no extra attributes.
    JoinTable {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<EntityName>,
    },
    /// Explicit join entity, free to carry pivot attributes.
    Through {
        entity: EntityName,
        /// Join entity columns referencing this entity.
        source_fields: Vec<FieldName>,
        /// Join entity columns referencing the target.
        target_fields: Vec<FieldName>,
    },
}

impl RelationVia {
    pub fn label(&self) -> &'static str {
        match self {
            RelationVia::ForeignKey { .. } => "foreign_key",
            RelationVia::Inverse { .. } => "inverse",
            RelationVia::JoinTable { .. } => "join_table",
            RelationVia::Through { .. } => "through",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct RelationDef {
    pub name: RelationName,
    pub target: EntityName,
    pub kind: RelationKind,
    pub via: RelationVia,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_each_mapping() {
        let json = r#"[
            {"name": "author", "target": "User", "kind": "many_to_one",
             "via": {"type": "foreign_key", "fields": ["author_id"]}},
            {"name": "posts", "target": "Post", "kind": "one_to_many",
             "via": {"type": "inverse", "fields": ["author_id"]}},
            {"name": "tags", "target": "Tag", "kind": "many_to_many",
             "via": {"type": "join_table"}},
            {"name": "courses", "target": "Course", "kind": "many_to_many",
             "via": {"type": "through", "entity": "UserCourse",
                     "source_fields": ["user_id"], "target_fields": ["course_id"]}}
        ]"#;
        let relations: Vec<RelationDef> = serde_json::from_str(json).unwrap();
        assert_eq!(relations.len(), 4);
        assert_eq!(
            relations[0].via,
            RelationVia::ForeignKey {
                fields: vec!["author_id".into()]
            }
        );
        assert_eq!(relations[2].via, RelationVia::JoinTable { name: None });
        assert!(matches!(
            &relations[3].via,
            RelationVia::Through { entity, .. } if entity == "UserCourse"
        ));
    }

    #[test]
    fn to_many_kinds() {
        assert!(RelationKind::OneToMany.is_to_many());
        assert!(RelationKind::ManyToMany.is_to_many());
        assert!(!RelationKind::OneToOne.is_to_many());
        assert!(!RelationKind::ManyToOne.is_to_many());
    }
}
