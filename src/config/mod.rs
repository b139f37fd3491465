//! Configuration of the settings manager itself.

mod env;
mod error;
mod file;
mod loader;
mod source;

use std::path::PathBuf;

use serde::Deserialize;

pub use env::EnvSource;
pub use error::ConfigError;
pub(crate) use file::read_file;
pub use file::FileSource;
pub use loader::ConfigLoader;
pub use source::{ConfigEntry, ConfigSource};

/// Deserialized manager configuration.
///
/// ```toml
/// schemas = ["config/schemas/shop.toml"]
///
/// [store]
/// backend = "file"
/// path = "var/settings"
///
/// [cache]
/// enabled = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Schema files registered at startup.
    pub schemas: Vec<PathBuf>,
    pub store: StoreConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory of the file backend.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
}
