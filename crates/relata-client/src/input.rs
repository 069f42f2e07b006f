use std::collections::BTreeMap;

use relata_core::{Record, RelationName, Value};
use relata_registry::{Link, ResolvedRelation, SchemaRegistry};
use serde::Deserialize;
use serde_json::Value as Json;

use crate::error::ClientError;

type Result<T> = std::result::Result<T, ClientError>;

/// Scalar fields and nested relation writes for one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataInput {
    pub scalars: Record,
    pub relations: BTreeMap<RelationName, NestedWrite>,
}

/// Nested operations on one relation, in the order they are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedWrite {
    pub create: Vec<DataInput>,
    pub connect: Vec<Record>,
    pub connect_or_create: Vec<ConnectOrCreate>,
    pub attach: Vec<Attach>,
    pub disconnect: Option<Disconnect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOrCreate {
    pub r#where: Record,
    pub create: DataInput,
}

/// Join row for an explicit join entity: the target plus pivot attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Attach {
    pub r#where: Record,
    pub pivot: Record,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Disconnect {
    /// `true` on a to-one relation: unlink whatever is linked.
    Current,
    /// Unlink the listed targets.
    Rows(Vec<Record>),
}

impl NestedWrite {
    /// Operations that link a target (everything but `disconnect`).
    pub fn link_count(&self) -> usize {
        self.create.len() + self.connect.len() + self.connect_or_create.len() + self.attach.len()
    }
}

fn as_object<'a>(json: &'a Json, what: &str) -> Result<&'a serde_json::Map<String, Json>> {
    json.as_object()
        .ok_or_else(|| ClientError::InvalidInput(format!("{what} must be an object, got {json}")))
}

/// One object or a list of objects.
fn one_or_many<'a>(json: &'a Json, relation: &ResolvedRelation, op: &str) -> Result<Vec<&'a Json>> {
    let items: Vec<&Json> = match json {
        Json::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    if !relation.is_to_many() && items.len() > 1 {
        return Err(ClientError::ToOneMultiple(
            relation.entity.clone(),
            relation.name.clone(),
        ));
    }
    if items.is_empty() {
        return Err(ClientError::InvalidInput(format!(
            "{}.{}: empty '{op}'",
            relation.entity, relation.name
        )));
    }
    Ok(items)
}

fn scalar(entity: &str, field: &str, json: &Json) -> Result<Value> {
    Value::deserialize(json).map_err(|_| {
        ClientError::InvalidInput(format!("{entity}.{field} must be a scalar, got {json}"))
    })
}

/// Parse a `where` object: scalar fields of `entity`, matched by equality.
pub fn parse_where(registry: &SchemaRegistry, entity: &str, json: &Json) -> Result<Record> {
    let def = registry
        .entity(entity)
        .ok_or_else(|| ClientError::UnknownEntity(entity.to_string()))?;
    let object = as_object(json, "where")?;
    let mut record = Record::new();
    for (key, value) in object {
        if def.field(key).is_none() {
            return Err(ClientError::UnknownField(entity.to_string(), key.clone()));
        }
        record.insert(key.clone(), scalar(entity, key, value)?);
    }
    Ok(record)
}

/// A `where` that must identify at most one row.
pub fn parse_unique_where(registry: &SchemaRegistry, entity: &str, json: &Json) -> Result<Record> {
    let record = parse_where(registry, entity, json)?;
    let fields: Vec<&str> = record.keys().map(String::as_str).collect();
    if registry.covering_unique_key(entity, fields.as_slice()).is_none() {
        return Err(ClientError::NotAUniqueWhere(
            entity.to_string(),
            fields.join(", "),
        ));
    }
    Ok(record)
}

impl DataInput {
    /// Parse a data object for `entity`. Keys are either scalar fields or
    /// relation names carrying nested writes.
    pub fn parse(registry: &SchemaRegistry, entity: &str, json: &Json) -> Result<Self> {
        let def = registry
            .entity(entity)
            .ok_or_else(|| ClientError::UnknownEntity(entity.to_string()))?;
        let object = as_object(json, "data")?;

        let mut input = DataInput::default();
        for (key, value) in object {
            if def.field(key).is_some() {
                input
                    .scalars
                    .insert(key.clone(), scalar(entity, key, value)?);
            } else if let Some(relation) = registry.relation(entity, key) {
                input
                    .relations
                    .insert(key.clone(), NestedWrite::parse(registry, relation, value)?);
            } else {
                return Err(ClientError::UnknownField(entity.to_string(), key.clone()));
            }
        }
        Ok(input)
    }
}

impl NestedWrite {
    pub fn parse(registry: &SchemaRegistry, relation: &ResolvedRelation, json: &Json) -> Result<Self> {
        let target = relation.target.as_str();
        let object = as_object(json, &format!("{}.{}", relation.entity, relation.name))?;

        let mut write = NestedWrite::default();
        for (op, value) in object {
            match op.as_str() {
                "create" => {
                    for item in one_or_many(value, relation, op)? {
                        write.create.push(DataInput::parse(registry, target, item)?);
                    }
                }
                "connect" => {
                    for item in one_or_many(value, relation, op)? {
                        write
                            .connect
                            .push(parse_unique_where(registry, target, item)?);
                    }
                }
                "connectOrCreate" | "connect_or_create" => {
                    for item in one_or_many(value, relation, op)? {
                        let item = as_object(item, op)?;
                        let (Some(r#where), Some(create)) = (item.get("where"), item.get("create"))
                        else {
                            return Err(ClientError::InvalidInput(format!(
                                "{op} needs 'where' and 'create'"
                            )));
                        };
                        write.connect_or_create.push(ConnectOrCreate {
                            r#where: parse_unique_where(registry, target, r#where)?,
                            create: DataInput::parse(registry, target, create)?,
                        });
                    }
                }
                "attach" => {
                    let Link::Join(join) = &relation.link else {
                        return Err(unsupported(relation, op));
                    };
                    if join.implicit {
                        return Err(unsupported(relation, op));
                    }
                    for item in one_or_many(value, relation, op)? {
                        let item = as_object(item, op)?;
                        let Some(r#where) = item.get("where") else {
                            return Err(ClientError::InvalidInput(format!("{op} needs 'where'")));
                        };
                        let pivot = match item.get("pivot") {
                            Some(pivot) => parse_pivot(registry, &join.entity, pivot)?,
                            None => Record::new(),
                        };
                        write.attach.push(Attach {
                            r#where: parse_unique_where(registry, target, r#where)?,
                            pivot,
                        });
                    }
                }
                "disconnect" => {
                    write.disconnect = Some(match value {
                        Json::Bool(true) if !relation.is_to_many() => Disconnect::Current,
                        Json::Bool(_) => {
                            return Err(ClientError::InvalidInput(format!(
                                "{}.{}: disconnect takes a list of where objects",
                                relation.entity, relation.name
                            )));
                        }
                        other => Disconnect::Rows(
                            one_or_many(other, relation, op)?
                                .into_iter()
                                .map(|item| parse_unique_where(registry, target, item))
                                .collect::<Result<_>>()?,
                        ),
                    });
                }
                other => {
                    return Err(ClientError::InvalidInput(format!(
                        "{}.{}: unknown nested operation '{other}'",
                        relation.entity, relation.name
                    )));
                }
            }
        }

        if !relation.is_to_many() && write.link_count() > 1 {
            return Err(ClientError::ToOneMultiple(
                relation.entity.clone(),
                relation.name.clone(),
            ));
        }
        Ok(write)
    }
}

/// Pivot attributes may not overwrite the join columns.
fn parse_pivot(registry: &SchemaRegistry, join_entity: &str, json: &Json) -> Result<Record> {
    let record = parse_where(registry, join_entity, json)?;
    let foreign: Vec<&str> = registry
        .foreign_keys(join_entity)
        .iter()
        .flat_map(|fk| fk.columns.iter().map(String::as_str))
        .collect();
    if let Some(column) = record.keys().find(|k| foreign.contains(&k.as_str())) {
        return Err(ClientError::InvalidInput(format!(
            "pivot cannot set join column {join_entity}.{column}"
        )));
    }
    Ok(record)
}

fn unsupported(relation: &ResolvedRelation, op: &str) -> ClientError {
    ClientError::UnsupportedNestedWrite(
        relation.entity.clone(),
        relation.name.clone(),
        op.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::tutorial;
    use serde_json::json;

    #[test]
    fn splits_scalars_and_relations() {
        let registry = tutorial();
        let input = DataInput::parse(
            &registry,
            "User",
            &json!({
                "email": "alice@prisma.io",
                "profile": {"create": {"bio": "I like turtles"}},
                "posts": {"connect": [{"id": 1}, {"id": 2}]}
            }),
        )
        .unwrap();

        assert_eq!(input.scalars["email"], Value::from("alice@prisma.io"));
        assert_eq!(input.relations["profile"].create.len(), 1);
        assert_eq!(input.relations["posts"].connect.len(), 2);
    }

    #[test]
    fn accepts_both_connect_or_create_spellings() {
        let registry = tutorial();
        for key in ["connectOrCreate", "connect_or_create"] {
            let mut tags = serde_json::Map::new();
            tags.insert(
                key.to_string(),
                json!({"where": {"name": "rust"}, "create": {"name": "rust"}}),
            );
            let input = DataInput::parse(&registry, "Post", &json!({"tags": tags})).unwrap();
            assert_eq!(input.relations["tags"].connect_or_create.len(), 1);
        }
    }

    #[test]
    fn to_one_rejects_multiple_operations() {
        let registry = tutorial();
        let err = DataInput::parse(
            &registry,
            "Post",
            &json!({"author": {"create": {"email": "a@x"}, "connect": {"id": 1}}}),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::ToOneMultiple(_, r) if r == "author"));

        let err = DataInput::parse(
            &registry,
            "User",
            &json!({"profile": {"create": [{"bio": "a"}, {"bio": "b"}]}}),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::ToOneMultiple(_, r) if r == "profile"));
    }

    #[test]
    fn where_must_cover_a_unique_key() {
        let registry = tutorial();
        let err = DataInput::parse(
            &registry,
            "Post",
            &json!({"author": {"connect": {"name": "Alice"}}}),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::NotAUniqueWhere(e, f) if e == "User" && f == "name"));
    }

    #[test]
    fn attach_is_only_for_explicit_join_entities() {
        let registry = tutorial();
        let input = DataInput::parse(
            &registry,
            "User",
            &json!({"courses": {"attach": {"where": {"id": 1}, "pivot": {"progress": 40}}}}),
        )
        .unwrap();
        assert_eq!(input.relations["courses"].attach[0].pivot["progress"], Value::Int(40));

        let err = DataInput::parse(
            &registry,
            "Post",
            &json!({"tags": {"attach": {"where": {"id": 1}}}}),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedNestedWrite(_, _, op) if op == "attach"));

        let err = DataInput::parse(
            &registry,
            "User",
            &json!({"courses": {"attach": {"where": {"id": 1}, "pivot": {"course_id": 2}}}}),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[test]
    fn disconnect_shapes() {
        let registry = tutorial();
        let input =
            DataInput::parse(&registry, "User", &json!({"profile": {"disconnect": true}})).unwrap();
        assert_eq!(input.relations["profile"].disconnect, Some(Disconnect::Current));

        let err =
            DataInput::parse(&registry, "Post", &json!({"tags": {"disconnect": true}})).unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[test]
    fn rejects_unknown_keys_and_non_scalars() {
        let registry = tutorial();
        let err = DataInput::parse(&registry, "User", &json!({"nickname": "al"})).unwrap_err();
        assert!(matches!(err, ClientError::UnknownField(_, f) if f == "nickname"));

        let err = DataInput::parse(&registry, "User", &json!({"email": ["a", "b"]})).unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));

        let err = DataInput::parse(&registry, "User", &json!({"posts": {"upsert": {}}})).unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(msg) if msg.contains("upsert")));
    }
}
