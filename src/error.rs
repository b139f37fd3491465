use crate::config::ConfigError;
use crate::parameters::ParameterError;
use crate::store::StoreError;
use thiserror::Error;

/// Top-level error type for the dragon-settings library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("no schema registered under alias '{0}'")]
    SchemaNotFound(String),

    #[error("a schema is already registered under alias '{0}'")]
    DuplicateSchema(String),

    #[error("no resolver registered for schema '{0}'")]
    ResolverNotFound(String),

    #[error("invalid parameters: {0}")]
    Parameter(#[from] ParameterError),

    #[error("settings store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("settings manager requires a store")]
    MissingStore,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
