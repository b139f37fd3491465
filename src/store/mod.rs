//! Persistence engines for settings records.
//!
//! A store works in two steps: [`persist`](SettingsStore::persist) stages a
//! record and [`flush`](SettingsStore::flush) makes everything staged durable.
//! Lookups only see flushed records. A flush empties the staging area even
//! when it fails, so a rejected write never lands with a later commit.

mod file;
mod memory;

use std::path::PathBuf;

use thiserror::Error;

use crate::settings::Settings;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode settings record '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to encode settings record: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("found {count} stored records for schema '{schema}', expected at most one")]
    DuplicateSettings { schema: String, count: usize },

    #[error("store lock poisoned")]
    Poisoned,

    #[error("commit failed: {0}")]
    Commit(String),
}

pub trait SettingsStore: Send + Sync + std::fmt::Debug {
    /// Returns every flushed record belonging to `schema`.
    fn find_by_schema(&self, schema: &str) -> Result<Vec<Settings>, StoreError>;

    /// Stages `settings` for the next flush, assigning an id if it has none.
    fn persist(&self, settings: &mut Settings) -> Result<(), StoreError>;

    /// Commits all staged records.
    ///
    /// Staged records are discarded whether or not the commit succeeds.
    fn flush(&self) -> Result<(), StoreError>;
}
