//! Relationship resolver and mutation coordinator.
//!
//! [`Client`] parses JSON-shaped inputs against the schema registry, applies
//! nested `create`/`connect`/`connectOrCreate`/`attach`/`disconnect` writes in
//! one store transaction, and loads records with their included relations.

pub mod client;
pub mod error;
pub mod include;
pub mod input;
mod mutation;
pub mod node;
pub mod operation;
pub mod resolver;

pub use client::Client;
pub use error::ClientError;
pub use include::Include;
pub use input::{Attach, ConnectOrCreate, DataInput, Disconnect, NestedWrite};
pub use node::{Included, Node};
pub use operation::Operation;
pub use resolver::{RelatedRow, load_node, related};
