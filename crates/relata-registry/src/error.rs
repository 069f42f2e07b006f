use relata_core::{EntityValidationError, RelationKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate entity name: {0}")]
    DuplicateEntityName(String),
    #[error("duplicate field name: {0}.{1}")]
    DuplicateFieldName(String, String),
    #[error("entity '{0}' must have a primary key")]
    MissingPrimaryKey(String),
    #[error("primary key field must not be nullable: {0}.{1}")]
    NullablePrimaryKey(String, String),
    #[error("constraint references non-existent field: {0}.{1} -> {2}")]
    ConstraintFieldNotFound(String, String, String),
    #[error("constraint has empty field list: {0}.{1}")]
    EmptyConstraintFields(String, String),
    #[error("foreign key references non-existent entity: {0}.{1} -> {2}")]
    ForeignKeyEntityNotFound(String, String, String),
    #[error("foreign key references non-existent field: {0}.{1} -> {2}.{3}")]
    ForeignKeyFieldNotFound(String, String, String, String),
    #[error("foreign key column count mismatch on {0}.{1}: {2} != {3}")]
    ForeignKeyArityMismatch(String, String, usize, usize),
    #[error("foreign key {0}.{1} must reference a primary or unique key of {2}")]
    ForeignKeyTargetNotUnique(String, String, String),
    #[error("foreign key type mismatch: {0}.{1} is {2} but {3}.{4} is {5}")]
    ForeignKeyTypeMismatch(String, String, String, String, String, String),
    #[error("foreign key {0}.{1} cannot use on_delete {2}: {3}")]
    InvalidReferenceAction(String, String, String, String),
    #[error("enum '{0}' in field '{1}.{2}' has duplicate variant: '{3}'")]
    DuplicateEnumVariant(String, String, String, String),
    #[error("invalid default for {0}.{1}: {2}")]
    InvalidDefault(String, String, String),
    #[error("duplicate relation name: {0}.{1}")]
    DuplicateRelationName(String, String),
    #[error("relation name clashes with a field: {0}.{1}")]
    RelationFieldClash(String, String),
    #[error("relation {0}.{1} targets non-existent entity: {2}")]
    RelationTargetNotFound(String, String, String),
    #[error("relation {0}.{1} has no matching foreign key on {2} for fields [{3}]")]
    RelationForeignKeyNotFound(String, String, String, String),
    #[error("relation {0}.{1} is declared {2} but its mapping makes it {3}")]
    RelationKindMismatch(String, String, RelationKind, RelationKind),
    #[error("relation {0}.{1} uses join entity '{2}' which does not exist")]
    JoinEntityNotFound(String, String, String),
    #[error("relation {0}.{1} needs a single-column primary key on {2} to use an implicit join table")]
    JoinTableRequiresSingleKey(String, String, String),
    #[error("implicit join table '{0}' clashes with a declared entity")]
    JoinTableNameConflict(String),
    #[error("implicit join table '{0}' is shared by different entity pairs")]
    JoinTableConflict(String),
    #[error("implicit join table '{0}' already links both sides of the self-relation; declared again by {1}.{2}")]
    SelfJoinTableOverclaimed(String, String, String),
    #[error("relation {0}.{1} exposes join rows as 'pivot', which clashes with {2}.pivot")]
    ReservedPivotName(String, String, String),
    #[error(transparent)]
    Entity(#[from] EntityValidationError),
}
