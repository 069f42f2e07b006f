use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use relata_core::EntityName;

/// One client call, as written in a script file.
///
/// ```json
/// {"op": "create", "entity": "User", "data": {"email": "alice@prisma.io"}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Operation {
    Create {
        entity: EntityName,
        data: Json,
        #[serde(default, skip_serializing_if = "Json::is_null")]
        include: Json,
    },
    Update {
        entity: EntityName,
        r#where: Json,
        data: Json,
        #[serde(default, skip_serializing_if = "Json::is_null")]
        include: Json,
    },
    Delete {
        entity: EntityName,
        r#where: Json,
    },
    FindUnique {
        entity: EntityName,
        r#where: Json,
        #[serde(default, skip_serializing_if = "Json::is_null")]
        include: Json,
    },
    FindMany {
        entity: EntityName,
        #[serde(default, skip_serializing_if = "Json::is_null")]
        r#where: Json,
        #[serde(default, skip_serializing_if = "Json::is_null")]
        include: Json,
    },
    Count {
        entity: EntityName,
    },
}

impl Operation {
    pub fn entity(&self) -> &str {
        match self {
            Operation::Create { entity, .. }
            | Operation::Update { entity, .. }
            | Operation::Delete { entity, .. }
            | Operation::FindUnique { entity, .. }
            | Operation::FindMany { entity, .. }
            | Operation::Count { entity } => entity,
        }
    }

    /// Whether executing the operation can change stored rows.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Operation::Create { .. } | Operation::Update { .. } | Operation::Delete { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::Update { .. } => "update",
            Operation::Delete { .. } => "delete",
            Operation::FindUnique { .. } => "find_unique",
            Operation::FindMany { .. } => "find_many",
            Operation::Count { .. } => "count",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn deserializes_script() {
        let ops: Vec<Operation> = serde_json::from_value(json!([
            {"op": "create", "entity": "User", "data": {"email": "a@x"}},
            {"op": "find_unique", "entity": "User", "where": {"id": 1}, "include": {"posts": true}},
            {"op": "find_many", "entity": "Post"},
            {"op": "count", "entity": "Tag"}
        ]))
        .unwrap();

        assert_eq!(ops.len(), 4);
        assert!(matches!(&ops[0], Operation::Create { include, .. } if include.is_null()));
        assert!(matches!(&ops[1], Operation::FindUnique { r#where, .. } if r#where["id"] == 1));
        assert!(matches!(&ops[2], Operation::FindMany { r#where, .. } if r#where.is_null()));
        assert_eq!(ops[3].entity(), "Tag");
    }

    #[rstest]
    #[case(json!({"op": "create", "entity": "User", "data": {}}), true, "create")]
    #[case(json!({"op": "delete", "entity": "User", "where": {"id": 1}}), true, "delete")]
    #[case(json!({"op": "count", "entity": "User"}), false, "count")]
    fn classifies_operations(#[case] json: Json, #[case] write: bool, #[case] label: &str) {
        let op: Operation = serde_json::from_value(json).unwrap();
        assert_eq!(op.is_write(), write);
        assert_eq!(op.label(), label);
    }

    #[test]
    fn rejects_unknown_op() {
        let result = serde_json::from_value::<Operation>(json!({"op": "upsert", "entity": "User"}));
        assert!(result.is_err());
    }
}
