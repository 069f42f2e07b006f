//! Relational store backing the client.
//!
//! Rows live in memory, keyed by [`RowId`]. Every write is checked against
//! the [`SchemaRegistry`](relata_registry::SchemaRegistry): types, nulls,
//! unique keys, foreign keys and `on_delete` actions. Writes are undone as a
//! unit when a statement fails or a transaction rolls back.

pub mod error;
pub mod snapshot;
pub mod store;
mod table;
mod transaction;

pub use error::StoreError;
pub use snapshot::Snapshot;
pub use store::{RowId, Store};
