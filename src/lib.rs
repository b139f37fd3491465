//! Schema-driven resolution and persistence of named settings groups.
//!
//! A [`SettingsManager`] looks up a schema by alias, finds any stored values
//! through a resolver, drops parameters the schema no longer knows, applies
//! defaults and constraints, and hands back a [`Settings`] record. Saving
//! re-validates the record, persists it, and notifies observers around the
//! commit.

pub mod config;
mod error;
pub mod events;
mod manager;
pub mod parameters;
pub mod resolver;
pub mod schema;
pub mod settings;
pub mod store;

pub use error::{Error, Result};
pub use manager::{SettingsManager, SettingsManagerBuilder};
pub use settings::{Settings, SettingsId};
