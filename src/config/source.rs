//! Layers feeding [`ManagerConfig`](super::ManagerConfig).
//!
//! A source yields entries; the loader folds them into one table in source
//! order, then deserializes that table once.

use toml::{Table, Value};

use super::ConfigError;

/// One contribution to the manager configuration.
///
/// A config file contributes its whole document with an empty `path`. An
/// environment variable such as `DRAGON_SETTINGS__STORE__BACKEND` contributes
/// a single value at `["store", "backend"]`.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub path: Vec<String>,
    pub value: Value,
}

impl ConfigEntry {
    pub fn root(table: Table) -> Self {
        Self {
            path: Vec::new(),
            value: Value::Table(table),
        }
    }

    pub fn at_path(path: Vec<String>, value: Value) -> Self {
        Self { path, value }
    }

    /// Folds this entry into `config`.
    ///
    /// Missing sections along the path are created, and a scalar in the way
    /// of a section is replaced by one. A table landing on a table is overlaid
    /// key by key; any other value replaces the previous one, arrays
    /// included, so a later `schemas = [...]` overrides rather than appends.
    pub fn merge_into(self, config: &mut Table) {
        let Some((leaf, sections)) = self.path.split_last() else {
            if let Value::Table(layer) = self.value {
                overlay(config, layer);
            }
            return;
        };

        let mut section = config;
        for name in sections {
            let slot = section
                .entry(name.as_str())
                .or_insert_with(|| Value::Table(Table::new()));
            if !slot.is_table() {
                *slot = Value::Table(Table::new());
            }
            let Value::Table(inner) = slot else {
                return;
            };
            section = inner;
        }

        set_value(section, leaf.clone(), self.value);
    }
}

/// Something that contributes entries to the manager configuration.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

fn overlay(base: &mut Table, layer: Table) {
    for (key, value) in layer {
        set_value(base, key, value);
    }
}

fn set_value(section: &mut Table, key: String, value: Value) {
    match (section.get_mut(&key), value) {
        (Some(Value::Table(existing)), Value::Table(layer)) => overlay(existing, layer),
        (_, value) => {
            section.insert(key, value);
        }
    }
}
