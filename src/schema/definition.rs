use std::fmt;

use serde::Deserialize;
use toml::Value;

/// Custom check attached to a parameter in code.
///
/// Returns a human readable reason on failure.
pub type ParameterValidator = fn(&Value) -> Result<(), String>;

/// Value type a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Integer,
    /// Accepts integers too; they are widened on resolution.
    Float,
    Boolean,
    Array,
    Table,
    #[default]
    Any,
}

impl ParameterKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Table => "table",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value constraints beyond the parameter's kind.
///
/// `min`/`max` are inclusive numeric bounds. `min_length`/`max_length` count
/// string characters, array items, or table entries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub one_of: Option<Vec<Value>>,
}

/// Declaration of a single parameter within a schema.
#[derive(Clone, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: ParameterKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(flatten)]
    pub constraints: Constraints,
    #[serde(skip)]
    pub validator: Option<ParameterValidator>,
}

impl fmt::Debug for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("constraints", &self.constraints)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl ParameterSpec {
    /// Creates an optional parameter of the given kind with no default.
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            constraints: Constraints::default(),
            validator: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.constraints.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.constraints.max = Some(max);
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.max_length = Some(len);
        self
    }

    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.constraints.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn validator(mut self, validator: ParameterValidator) -> Self {
        self.validator = Some(validator);
        self
    }
}

/// Declarative description of a named settings group.
///
/// Parameters keep their declaration order. Names are expected to be unique;
/// duplicates are representable here and rejected when a
/// [`SettingsBuilder`](crate::parameters::SettingsBuilder) is built from the
/// definition.
///
/// ```
/// use dragon_settings::schema::{ParameterKind, ParameterSpec, SchemaDefinition};
///
/// let schema = SchemaDefinition::new("shop.general")
///     .parameter(ParameterSpec::new("name", ParameterKind::String).required())
///     .parameter(ParameterSpec::new("tagline", ParameterKind::String).default_value("Welcome"));
///
/// assert_eq!(schema.parameters().len(), 2);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDefinition {
    alias: String,
    #[serde(default, rename = "parameter")]
    parameters: Vec<ParameterSpec>,
}

impl SchemaDefinition {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }
}
