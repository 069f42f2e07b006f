//! Relational mapping over JSON-defined entities.
//!
//! ```no_run
//! use relata::Project;
//! use serde_json::json;
//!
//! let mut project = Project::open(".")?;
//! project
//!     .client_mut()
//!     .create("User", &json!({"email": "alice@prisma.io", "profile": {"create": {}}}))?;
//! project.save()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

#[doc(inline)]
pub use relata_client::{
    Client, ClientError, Include, Included, Node, Operation, RelatedRow, load_node, related,
};
pub use relata_config::{FileFormat, NameCase, RelataConfig};
pub use relata_core::{EntityDef, FieldDef, FieldType, Record, RelationDef, RelationKind, Value};
pub use relata_registry::{RegistryError, ResolvedRelation, SchemaRegistry, describe_relation};
pub use relata_store::{RowId, Snapshot, Store, StoreError};

/// A client bound to a project directory: its models and its data file.
#[derive(Debug)]
pub struct Project {
    config: RelataConfig,
    client: Client,
}

impl Project {
    /// Load relata.json (or defaults), the models and the stored rows under `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut config = relata_loader::load_config_or_default(Some(root.to_path_buf()))?;
        config.models_dir = root.join(&config.models_dir);
        config.data_file = root.join(&config.data_file);

        let registry = Arc::new(relata_loader::load_registry(&config)?);
        let store = relata_loader::load_store(config.data_file(), registry)?;
        Ok(Self {
            config,
            client: Client::with_store(store),
        })
    }

    pub fn config(&self) -> &RelataConfig {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Write the stored rows back to the data file.
    pub fn save(&self) -> Result<()> {
        relata_loader::save_store(self.config.data_file(), self.client.store())
    }
}
