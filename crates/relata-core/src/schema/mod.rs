pub mod constraint;
pub mod default;
pub mod entity;
pub mod field;
pub mod foreign_key;
pub mod names;
pub mod primary_key;
pub mod reference;
pub mod relation;
pub mod str_or_bool;

pub use constraint::EntityConstraint;
pub use default::{DefaultGenerator, FieldDefault};
pub use entity::{EntityDef, EntityValidationError};
pub use field::{ComplexFieldType, FieldDef, FieldType, SimpleFieldType};
pub use foreign_key::{ForeignKeyDef, ForeignKeySyntax};
pub use names::{EntityName, FieldName, RelationName};
pub use primary_key::{PrimaryKeyDef, PrimaryKeySyntax};
pub use reference::ReferenceAction;
pub use relation::{RelationDef, RelationKind, RelationVia};
pub use str_or_bool::StrOrBoolOrArray;
