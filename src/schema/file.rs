//! Schema definitions authored as TOML.
//!
//! ```toml
//! [[schema]]
//! alias = "shop.general"
//!
//! [[schema.parameter]]
//! name = "name"
//! type = "string"
//! required = true
//!
//! [[schema.parameter]]
//! name = "tagline"
//! type = "string"
//! default = "Welcome"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::{SchemaDefinition, SchemaRegistry};
use crate::config::{read_file, ConfigError};
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    schema: Vec<SchemaDefinition>,
}

/// Parses every schema declared in a TOML document.
pub fn parse_schemas(contents: &str) -> Result<Vec<SchemaDefinition>, toml::de::Error> {
    let file: SchemaFile = toml::from_str(contents)?;
    Ok(file.schema)
}

/// Loads every schema declared in a TOML file. The file must exist.
pub fn load_schema_file(path: impl AsRef<Path>) -> Result<Vec<SchemaDefinition>, ConfigError> {
    let path = path.as_ref();
    let contents = read_file(path, true)?.ok_or_else(|| ConfigError::FileNotFound(path.to_path_buf()))?;
    parse_schemas(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

impl SchemaRegistry {
    /// Loads a schema file and registers all of its schemas.
    ///
    /// Nothing is registered if any alias in the file is a duplicate, either
    /// within the file or of a schema already in the registry.
    pub fn register_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let schemas = load_schema_file(path)?;

        let mut seen = HashSet::new();
        for schema in &schemas {
            if self.has(schema.alias()) || !seen.insert(schema.alias()) {
                return Err(Error::DuplicateSchema(schema.alias().to_string()));
            }
        }

        tracing::debug!(path = %path.display(), count = schemas.len(), "loaded schema file");
        for schema in schemas {
            self.register(schema)?;
        }
        Ok(())
    }
}
