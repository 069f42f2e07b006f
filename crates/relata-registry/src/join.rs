use relata_core::{
    EntityConstraint, EntityDef, FieldDef, FieldName, ReferenceAction,
};
use relata_naming::join_table_endpoints;

use crate::error::RegistryError;

/// Column of an implicit join entity referencing the alphabetically smaller endpoint.
pub const JOIN_COLUMN_A: &str = "A";
/// Column referencing the other endpoint.
pub const JOIN_COLUMN_B: &str = "B";

/// Build the implicit join entity pairing `left` and `right`.
///
/// Both endpoints need a single-column primary key. The join entity has
/// columns `A` and `B`, a composite primary key over both, and a cascading
/// foreign key per column, so deleting either endpoint drops its pairs.
pub fn implicit_join_entity(
    name: &str,
    left: &EntityDef,
    right: &EntityDef,
) -> Result<EntityDef, RegistryError> {
    let (a_name, _) = join_table_endpoints(&left.name, &right.name);
    let (a, b) = if a_name == left.name {
        (left, right)
    } else {
        (right, left)
    };

    let mut fields = Vec::with_capacity(2);
    let mut constraints = vec![EntityConstraint::PrimaryKey {
        auto_increment: false,
        columns: vec![JOIN_COLUMN_A.to_string(), JOIN_COLUMN_B.to_string()],
    }];
    for (column, endpoint) in [(JOIN_COLUMN_A, a), (JOIN_COLUMN_B, b)] {
        let key = single_key_field(name, endpoint)?;
        fields.push(FieldDef::new(column, key.r#type.clone()));
        constraints.push(EntityConstraint::ForeignKey {
            name: None,
            columns: vec![column.to_string()],
            ref_entity: endpoint.name.clone(),
            ref_columns: vec![key.name.clone()],
            on_delete: Some(ReferenceAction::Cascade),
        });
    }

    let entity = EntityDef {
        description: Some(format!(
            "implicit join table between {} and {}",
            a.name, b.name
        )),
        fields,
        constraints,
        ..EntityDef::new(name)
    };
    Ok(entity.normalize()?)
}

fn single_key_field<'a>(join: &str, endpoint: &'a EntityDef) -> Result<&'a FieldDef, RegistryError> {
    let column: Option<&FieldName> = match endpoint.primary_key() {
        Some([column]) => Some(column),
        _ => None,
    };
    column
        .and_then(|c| endpoint.field(c))
        .ok_or_else(|| {
            RegistryError::JoinTableRequiresSingleKey(
                endpoint.name.clone(),
                join.to_string(),
                endpoint.name.clone(),
            )
        })
}
