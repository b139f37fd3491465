use thiserror::Error;

/// Schema-validation failures raised by a
/// [`SettingsBuilder`](super::SettingsBuilder).
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ParameterError {
    #[error("parameter '{0}' is declared more than once")]
    DuplicateParameter(String),

    #[error("required parameter '{0}' is missing")]
    MissingRequiredParameter(String),

    #[error("parameter '{name}' is invalid: {reason}")]
    ConstraintViolation { name: String, reason: String },

    #[error("parameter '{0}' is not defined by the schema")]
    UnknownParameter(String),
}
