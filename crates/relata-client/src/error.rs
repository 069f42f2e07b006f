use relata_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    #[error("unknown field: {0}.{1}")]
    UnknownField(String, String),
    #[error("unknown relation: {0}.{1}")]
    UnknownRelation(String, String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("where on {0} must cover a unique key, got [{1}]")]
    NotAUniqueWhere(String, String),
    #[error("no {0} record matches {1}")]
    RecordNotFound(String, String),
    #[error("to-one relation {0}.{1} accepts a single nested operation")]
    ToOneMultiple(String, String),
    #[error("relation {0}.{1} conflicts with the value given for field {2}")]
    ConflictingForeignKey(String, String, String),
    #[error("relation {0}.{1} is required and cannot be disconnected")]
    RequiredRelationDisconnect(String, String),
    #[error("relation {0}.{1} does not support '{2}' here")]
    UnsupportedNestedWrite(String, String, String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
