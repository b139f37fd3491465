//! Schema definitions and their registry.

mod definition;
mod file;
mod registry;

pub use definition::{Constraints, ParameterKind, ParameterSpec, ParameterValidator, SchemaDefinition};
pub use file::{load_schema_file, parse_schemas};
pub use registry::SchemaRegistry;
