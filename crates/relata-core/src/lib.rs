pub mod schema;
pub mod value;

pub use schema::{
    ComplexFieldType, DefaultGenerator, EntityConstraint, EntityDef, EntityName,
    EntityValidationError, FieldDef, FieldDefault, FieldName, FieldType, ForeignKeyDef,
    ForeignKeySyntax, PrimaryKeyDef, PrimaryKeySyntax, ReferenceAction, RelationDef, RelationKind,
    RelationName, RelationVia, SimpleFieldType, StrOrBoolOrArray,
};
pub use value::{Record, Value};
