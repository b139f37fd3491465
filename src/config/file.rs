//! Manager config files, and the file reading shared with schema files.

use std::path::{Path, PathBuf};

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// A TOML document describing the manager: `schemas`, `[store]`, `[cache]`.
///
/// The whole document becomes one root entry. A base file is usually
/// required, while a local override file next to it is optional and
/// skipped when absent.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let Some(contents) = read_file(&self.path, self.required)? else {
            tracing::debug!(path = %self.path.display(), "optional config file absent");
            return Ok(vec![]);
        };
        let document = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(vec![ConfigEntry::root(document)])
    }
}

/// Reads a config or schema file.
///
/// An absent file is `FileNotFound` when `required`, and `Ok(None)` otherwise.
pub(crate) fn read_file(path: &Path, required: bool) -> Result<Option<String>, ConfigError> {
    let err = match std::fs::read_to_string(path) {
        Ok(contents) => return Ok(Some(contents)),
        Err(err) => err,
    };
    match (err.kind(), required) {
        (std::io::ErrorKind::NotFound, false) => Ok(None),
        (std::io::ErrorKind::NotFound, true) => Err(ConfigError::FileNotFound(path.to_path_buf())),
        _ => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: err,
        }),
    }
}
