use std::collections::{HashMap, HashSet};

use relata_core::{
    ComplexFieldType, EntityConstraint, EntityDef, FieldDef, FieldDefault, FieldType,
    ReferenceAction, SimpleFieldType,
};

use crate::error::RegistryError;

/// Validate normalized entity definitions for data integrity issues.
/// Checks for:
/// - Duplicate entity and field names
/// - Missing or nullable primary keys
/// - Constraints referencing non-existent fields, or with empty field lists
/// - Foreign keys referencing non-existent entities/fields, with mismatched
///   arity or types, or not pointing at a primary/unique key
/// - Referential actions the referencing fields cannot honor
/// - Defaults the field type rejects, duplicate enum variants
pub fn validate_entities(entities: &[EntityDef]) -> Result<(), RegistryError> {
    let mut names = HashSet::new();
    for entity in entities {
        if !names.insert(entity.name.as_str()) {
            return Err(RegistryError::DuplicateEntityName(entity.name.clone()));
        }
    }

    let entity_map: HashMap<&str, &EntityDef> =
        entities.iter().map(|e| (e.name.as_str(), e)).collect();

    for entity in entities {
        validate_entity(entity, &entity_map)?;
    }

    Ok(())
}

fn validate_entity(
    entity: &EntityDef,
    entity_map: &HashMap<&str, &EntityDef>,
) -> Result<(), RegistryError> {
    let mut field_names = HashSet::new();
    for field in &entity.fields {
        if !field_names.insert(field.name.as_str()) {
            return Err(RegistryError::DuplicateFieldName(
                entity.name.clone(),
                field.name.clone(),
            ));
        }
        validate_field(field, entity)?;
    }

    let primary_key = entity
        .primary_key()
        .ok_or_else(|| RegistryError::MissingPrimaryKey(entity.name.clone()))?;
    for column in primary_key {
        if entity.field(column).is_some_and(|f| f.nullable) {
            return Err(RegistryError::NullablePrimaryKey(
                entity.name.clone(),
                column.clone(),
            ));
        }
    }

    for constraint in &entity.constraints {
        validate_constraint(constraint, entity, &field_names, entity_map)?;
    }

    Ok(())
}

fn validate_field(field: &FieldDef, entity: &EntityDef) -> Result<(), RegistryError> {
    if let FieldType::Complex(ComplexFieldType::Enum { name, values }) = &field.r#type {
        let mut seen = HashSet::new();
        for variant in values {
            if !seen.insert(variant.as_str()) {
                return Err(RegistryError::DuplicateEnumVariant(
                    name.clone(),
                    entity.name.clone(),
                    field.name.clone(),
                    variant.clone(),
                ));
            }
        }
    }

    match field.default_kind() {
        Some(FieldDefault::Literal(value)) => {
            if value.is_null() && !field.nullable {
                return Err(RegistryError::InvalidDefault(
                    entity.name.clone(),
                    field.name.clone(),
                    "null default on a non-nullable field".to_string(),
                ));
            }
            if !field.r#type.accepts(value) {
                return Err(RegistryError::InvalidDefault(
                    entity.name.clone(),
                    field.name.clone(),
                    format!("{} is not a valid {}", value, field.r#type),
                ));
            }
        }
        Some(FieldDefault::Generated(generator)) => {
            if !field.r#type.supports_generator(generator) {
                return Err(RegistryError::InvalidDefault(
                    entity.name.clone(),
                    field.name.clone(),
                    format!("{} cannot fill a {} field", generator, field.r#type),
                ));
            }
        }
        None => {}
    }

    if entity.is_auto_increment(&field.name) && !field.r#type.supports_auto_increment() {
        return Err(RegistryError::InvalidDefault(
            entity.name.clone(),
            field.name.clone(),
            format!("auto_increment requires an integer type, found {}", field.r#type),
        ));
    }

    Ok(())
}

fn validate_constraint(
    constraint: &EntityConstraint,
    entity: &EntityDef,
    field_names: &HashSet<&str>,
    entity_map: &HashMap<&str, &EntityDef>,
) -> Result<(), RegistryError> {
    let columns = constraint.columns();
    if columns.is_empty() {
        return Err(RegistryError::EmptyConstraintFields(
            entity.name.clone(),
            constraint.kind().to_string(),
        ));
    }
    for column in columns {
        if !field_names.contains(column.as_str()) {
            return Err(RegistryError::ConstraintFieldNotFound(
                entity.name.clone(),
                constraint.kind().to_string(),
                column.clone(),
            ));
        }
    }

    if let EntityConstraint::ForeignKey {
        columns,
        ref_entity,
        ref_columns,
        on_delete,
        ..
    } = constraint
    {
        let label = columns.join(", ");
        if ref_columns.is_empty() {
            return Err(RegistryError::EmptyConstraintFields(
                ref_entity.clone(),
                "ForeignKey (ref_columns)".to_string(),
            ));
        }

        // Check that referenced entity exists
        let target = entity_map.get(ref_entity.as_str()).ok_or_else(|| {
            RegistryError::ForeignKeyEntityNotFound(
                entity.name.clone(),
                label.clone(),
                ref_entity.clone(),
            )
        })?;

        // Check that all referenced fields exist in the referenced entity
        for ref_column in ref_columns {
            if target.field(ref_column).is_none() {
                return Err(RegistryError::ForeignKeyFieldNotFound(
                    entity.name.clone(),
                    label.clone(),
                    ref_entity.clone(),
                    ref_column.clone(),
                ));
            }
        }

        if columns.len() != ref_columns.len() {
            return Err(RegistryError::ForeignKeyArityMismatch(
                entity.name.clone(),
                label,
                columns.len(),
                ref_columns.len(),
            ));
        }

        if !is_unique_set(target, ref_columns) {
            return Err(RegistryError::ForeignKeyTargetNotUnique(
                entity.name.clone(),
                label,
                ref_entity.clone(),
            ));
        }

        for (column, ref_column) in columns.iter().zip(ref_columns) {
            // Both fields exist: checked above
            let (Some(local), Some(remote)) = (entity.field(column), target.field(ref_column))
            else {
                continue;
            };
            if !types_compatible(&local.r#type, &remote.r#type) {
                return Err(RegistryError::ForeignKeyTypeMismatch(
                    entity.name.clone(),
                    column.clone(),
                    local.r#type.to_string(),
                    ref_entity.clone(),
                    ref_column.clone(),
                    remote.r#type.to_string(),
                ));
            }
        }

        match on_delete {
            Some(ReferenceAction::SetNull) => {
                if let Some(column) = columns
                    .iter()
                    .find(|c| entity.field(c).is_some_and(|f| !f.nullable))
                {
                    return Err(RegistryError::InvalidReferenceAction(
                        entity.name.clone(),
                        label,
                        ReferenceAction::SetNull.to_string(),
                        format!("{column} is not nullable"),
                    ));
                }
            }
            Some(ReferenceAction::SetDefault) => {
                if let Some(column) = columns
                    .iter()
                    .find(|c| entity.field(c).is_some_and(|f| f.default.is_none()))
                {
                    return Err(RegistryError::InvalidReferenceAction(
                        entity.name.clone(),
                        label,
                        ReferenceAction::SetDefault.to_string(),
                        format!("{column} has no default"),
                    ));
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Integer widths are interchangeable for references; everything else must match exactly.
fn types_compatible(local: &FieldType, remote: &FieldType) -> bool {
    let is_int = |t: &FieldType| {
        matches!(
            t,
            FieldType::Simple(SimpleFieldType::Integer | SimpleFieldType::BigInt)
        )
    };
    local == remote || (is_int(local) && is_int(remote))
}

/// True when the columns contain a primary or unique key of the entity,
/// so at most one row can match any assignment of them.
pub(crate) fn is_unique_set<S: AsRef<str>>(entity: &EntityDef, columns: &[S]) -> bool {
    entity.constraints.iter().any(|c| match c {
        EntityConstraint::PrimaryKey { columns: key, .. }
        | EntityConstraint::Unique { columns: key, .. } => key
            .iter()
            .all(|k| columns.iter().any(|c| c.as_ref() == k)),
        EntityConstraint::ForeignKey { .. } => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relata_core::{FieldDef, Value};
    use rstest::rstest;

    fn int(name: &str) -> FieldDef {
        FieldDef::new(name, FieldType::Simple(SimpleFieldType::Integer))
    }

    fn text(name: &str) -> FieldDef {
        FieldDef::new(name, FieldType::Simple(SimpleFieldType::Text))
    }

    fn pk(columns: &[&str]) -> EntityConstraint {
        EntityConstraint::PrimaryKey {
            auto_increment: false,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn fk(columns: &[&str], ref_entity: &str, ref_columns: &[&str]) -> EntityConstraint {
        EntityConstraint::ForeignKey {
            name: None,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ref_entity: ref_entity.into(),
            ref_columns: ref_columns.iter().map(|c| c.to_string()).collect(),
            on_delete: None,
        }
    }

    fn entity(name: &str, fields: Vec<FieldDef>, constraints: Vec<EntityConstraint>) -> EntityDef {
        EntityDef {
            fields,
            constraints,
            ..EntityDef::new(name)
        }
    }

    fn user() -> EntityDef {
        entity(
            "User",
            vec![int("id"), text("email")],
            vec![
                pk(&["id"]),
                EntityConstraint::Unique {
                    name: None,
                    columns: vec!["email".into()],
                },
            ],
        )
    }

    fn post() -> EntityDef {
        entity(
            "Post",
            vec![int("id"), int("author_id")],
            vec![pk(&["id"]), fk(&["author_id"], "User", &["id"])],
        )
    }

    #[test]
    fn valid_schema_passes() {
        assert!(validate_entities(&[user(), post()]).is_ok());
    }

    #[test]
    fn duplicate_entity_names() {
        let err = validate_entities(&[user(), user()]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateEntityName(name) if name == "User"));
    }

    #[test]
    fn duplicate_field_names() {
        let mut u = user();
        u.fields.push(text("email"));
        let err = validate_entities(&[u]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateFieldName(e, f) if e == "User" && f == "email"));
    }

    #[test]
    fn missing_primary_key() {
        let e = entity("Tag", vec![text("name")], vec![]);
        let err = validate_entities(&[e]).unwrap_err();
        assert!(matches!(err, RegistryError::MissingPrimaryKey(name) if name == "Tag"));
    }

    #[test]
    fn nullable_primary_key() {
        let mut id = int("id");
        id.nullable = true;
        let e = entity("Tag", vec![id], vec![pk(&["id"])]);
        let err = validate_entities(&[e]).unwrap_err();
        assert!(matches!(err, RegistryError::NullablePrimaryKey(_, f) if f == "id"));
    }

    #[test]
    fn constraint_field_not_found() {
        let e = entity("Tag", vec![int("id")], vec![pk(&["uuid"])]);
        let err = validate_entities(&[e]).unwrap_err();
        assert!(matches!(err, RegistryError::ConstraintFieldNotFound(_, kind, f) if kind == "PrimaryKey" && f == "uuid"));
    }

    #[test]
    fn empty_constraint_fields() {
        let e = entity("Tag", vec![int("id")], vec![pk(&[])]);
        let err = validate_entities(&[e]).unwrap_err();
        assert!(matches!(err, RegistryError::EmptyConstraintFields(_, kind) if kind == "PrimaryKey"));
    }

    #[test]
    fn foreign_key_entity_not_found() {
        let err = validate_entities(&[post()]).unwrap_err();
        assert!(matches!(err, RegistryError::ForeignKeyEntityNotFound(_, _, target) if target == "User"));
    }

    #[test]
    fn foreign_key_field_not_found() {
        let p = entity(
            "Post",
            vec![int("id"), int("author_id")],
            vec![pk(&["id"]), fk(&["author_id"], "User", &["uid"])],
        );
        let err = validate_entities(&[user(), p]).unwrap_err();
        assert!(matches!(err, RegistryError::ForeignKeyFieldNotFound(_, _, _, f) if f == "uid"));
    }

    #[test]
    fn foreign_key_arity_mismatch() {
        let p = entity(
            "Post",
            vec![int("id"), int("author_id")],
            vec![pk(&["id"]), fk(&["author_id"], "User", &["id", "email"])],
        );
        let err = validate_entities(&[user(), p]).unwrap_err();
        assert!(matches!(err, RegistryError::ForeignKeyArityMismatch(_, _, 1, 2)));
    }

    #[test]
    fn foreign_key_must_target_unique_key() {
        let mut u = user();
        u.fields.push(text("nickname"));
        let p = entity(
            "Post",
            vec![int("id"), text("author_nick")],
            vec![pk(&["id"]), fk(&["author_nick"], "User", &["nickname"])],
        );
        let err = validate_entities(&[u, p]).unwrap_err();
        assert!(matches!(err, RegistryError::ForeignKeyTargetNotUnique(_, _, t) if t == "User"));
    }

    #[test]
    fn foreign_key_type_mismatch() {
        let p = entity(
            "Post",
            vec![int("id"), text("author_id")],
            vec![pk(&["id"]), fk(&["author_id"], "User", &["id"])],
        );
        let err = validate_entities(&[user(), p]).unwrap_err();
        assert!(matches!(err, RegistryError::ForeignKeyTypeMismatch(..)));
    }

    #[test]
    fn foreign_key_integer_widths_are_compatible() {
        let p = entity(
            "Post",
            vec![
                int("id"),
                FieldDef::new("author_id", FieldType::Simple(SimpleFieldType::BigInt)),
            ],
            vec![pk(&["id"]), fk(&["author_id"], "User", &["id"])],
        );
        assert!(validate_entities(&[user(), p]).is_ok());
    }

    #[rstest]
    #[case(ReferenceAction::SetNull, "author_id is not nullable")]
    #[case(ReferenceAction::SetDefault, "author_id has no default")]
    fn reference_action_requires_field_support(
        #[case] action: ReferenceAction,
        #[case] reason: &str,
    ) {
        let mut p = post();
        if let EntityConstraint::ForeignKey { on_delete, .. } = &mut p.constraints[1] {
            *on_delete = Some(action);
        }
        let err = validate_entities(&[user(), p]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidReferenceAction(_, _, _, r) if r == reason));
    }

    #[test]
    fn set_null_accepted_on_nullable_field() {
        let mut p = post();
        p.fields[1].nullable = true;
        if let EntityConstraint::ForeignKey { on_delete, .. } = &mut p.constraints[1] {
            *on_delete = Some(ReferenceAction::SetNull);
        }
        assert!(validate_entities(&[user(), p]).is_ok());
    }

    #[test]
    fn duplicate_enum_variant() {
        let status = FieldDef::new(
            "status",
            FieldType::Complex(ComplexFieldType::Enum {
                name: "status".into(),
                values: vec!["ACTIVE".into(), "ACTIVE".into()],
            }),
        );
        let e = entity("Course", vec![int("id"), status], vec![pk(&["id"])]);
        let err = validate_entities(&[e]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateEnumVariant(_, _, _, v) if v == "ACTIVE"));
    }

    #[rstest]
    #[case(Value::Text("zero".into()))]
    #[case(Value::Null)]
    #[case(Value::Text("now()".into()))]
    fn invalid_defaults(#[case] default: Value) {
        let mut progress = int("progress");
        progress.default = Some(default);
        let e = entity("UserCourse", vec![int("id"), progress], vec![pk(&["id"])]);
        let err = validate_entities(&[e]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDefault(_, f, _) if f == "progress"));
    }

    #[test]
    fn auto_increment_requires_integer() {
        let e = entity(
            "Tag",
            vec![text("id")],
            vec![EntityConstraint::PrimaryKey {
                auto_increment: true,
                columns: vec!["id".into()],
            }],
        );
        let err = validate_entities(&[e]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDefault(_, f, _) if f == "id"));
    }

    #[test]
    fn unique_set_covers_supersets() {
        let course = entity(
            "UserCourse",
            vec![int("user_id"), int("course_id")],
            vec![pk(&["user_id", "course_id"])],
        );
        assert!(is_unique_set(&course, &["course_id", "user_id"]));
        assert!(!is_unique_set(&course, &["user_id"]));
        assert!(is_unique_set(&user(), &["email"]));
        assert!(is_unique_set(&user(), &["email", "id"]));
    }
}
