//! Schema-driven validation and defaulting of parameter mappings.

mod builder;
mod error;

pub use builder::SettingsBuilder;
pub use error::ParameterError;
