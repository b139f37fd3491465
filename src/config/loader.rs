use std::path::Path;

use serde::de::DeserializeOwned;

use super::env::EnvSource;
use super::file::FileSource;
use super::source::ConfigSource;
use super::ConfigError;

/// Layered loader for TOML configuration.
///
/// Sources are merged in registration order, later ones overriding earlier
/// ones. Nested tables merge recursively; other values (arrays included)
/// are replaced entirely.
///
/// ```no_run
/// use dragon_settings::config::{ConfigLoader, ManagerConfig};
///
/// let config: ManagerConfig = ConfigLoader::new()
///     .with_file("config/settings.toml", true)
///     .with_env("DRAGON_SETTINGS", "__")?
///     .with_file("config/settings.local.toml", false)
///     .build()?;
/// # Ok::<(), dragon_settings::config::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "loaders do nothing until .build() is called"]
pub struct ConfigLoader {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a TOML file. Missing optional files are skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Adds environment variables under `prefix`, split on `separator`.
    pub fn with_env(
        self,
        prefix: impl Into<String>,
        separator: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(self.with_source(EnvSource::new(prefix, separator)?))
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Merges all sources and deserializes the result once.
    pub fn build<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        let mut merged = toml::Table::new();

        for source in &self.sources {
            for entry in source.entries()? {
                entry.merge_into(&mut merged);
            }
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(ConfigError::DeserializeError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ManagerConfig, StoreBackend};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_later_sources_override() {
        let mut base = NamedTempFile::new().unwrap();
        writeln!(
            base,
            r#"
            schemas = ["schemas/shop.toml"]

            [store]
            backend = "file"
            path = "var/settings"
            "#
        )
        .unwrap();

        let env = EnvSource::new("APP", "__")
            .unwrap()
            .with_vars([("APP__CACHE__ENABLED", "true"), ("APP__STORE__PATH", "/tmp/s")]);

        let config: ManagerConfig = ConfigLoader::new()
            .with_file(base.path(), true)
            .with_source(env)
            .with_file("/nonexistent/local.toml", false)
            .build()
            .unwrap();

        assert_eq!(config.schemas.len(), 1);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.path.as_deref(), Some(Path::new("/tmp/s")));
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_empty_loader_yields_defaults() {
        let config: ManagerConfig = ConfigLoader::new().build().unwrap();

        assert_eq!(config, ManagerConfig::default());
    }

    #[test]
    fn test_deserialize_error() {
        let env = EnvSource::new("APP", "__")
            .unwrap()
            .with_vars([("APP__STORE__BACKEND", "postgres")]);

        let result: Result<ManagerConfig, _> = ConfigLoader::new().with_source(env).build();
        assert!(matches!(result, Err(ConfigError::DeserializeError(_))));
    }
}
