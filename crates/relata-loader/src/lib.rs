pub mod config;
pub mod data;
pub mod models;

pub use config::{CONFIG_FILE, load_config, load_config_from_path, load_config_or_default};
pub use data::{load_store, save_store};
pub use models::{load_models, load_models_from_dir, load_registry};
