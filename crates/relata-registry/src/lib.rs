//! Schema registry: validated entity definitions plus resolved relations.
//!
//! The registry is pure data. It is built once from model definitions and
//! shared by the store and the client.

pub mod error;
pub mod join;
pub mod registry;
pub mod relation;
pub mod validate;

pub use error::RegistryError;
pub use join::{JOIN_COLUMN_A, JOIN_COLUMN_B};
pub use registry::{ForeignKey, RegistryOptions, SchemaRegistry, UniqueKey, describe_relation};
pub use relation::{JoinLink, Link, PIVOT_KEY, ResolvedRelation};
pub use validate::validate_entities;
