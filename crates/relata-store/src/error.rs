use relata_core::{FieldName, Value};
use thiserror::Error;

use crate::store::RowId;

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    #[error("unknown field: {0}.{1}")]
    UnknownField(String, String),
    #[error("type mismatch on {0}.{1}: expected {2}, got {3}")]
    TypeMismatch(String, String, String, Value),
    #[error("null value in non-nullable field {0}.{1}")]
    NullViolation(String, String),
    #[error("unique constraint {constraint} violated on {entity}: ({}) = ({})", .fields.join(", "), join_values(.values))]
    UniqueViolation {
        entity: String,
        constraint: String,
        fields: Vec<FieldName>,
        values: Vec<Value>,
    },
    #[error("foreign key {constraint} violated on {entity}: no {ref_entity} row with ({})", join_values(.values))]
    ForeignKeyViolation {
        entity: String,
        constraint: String,
        ref_entity: String,
        values: Vec<Value>,
    },
    #[error("cannot delete {0} row: still referenced by {1} through {2}")]
    DeleteRestricted(String, String, String),
    #[error("cannot change {0}.[{1}]: still referenced by {2} through {3}")]
    KeyInUse(String, String, String, String),
    #[error("row not found: {0} {1}")]
    RowNotFound(String, RowId),
    #[error("primary key field is immutable: {0}.{1}")]
    ImmutablePrimaryKey(String, String),
    #[error("fields [{1}] do not cover a unique key of {0}")]
    NotAUniqueKey(String, String),
    #[error("sequence exhausted for {0}.{1}")]
    SequenceExhausted(String, String),
    #[error("a transaction is already active")]
    TransactionAlreadyActive,
    #[error("no active transaction")]
    NoActiveTransaction,
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
