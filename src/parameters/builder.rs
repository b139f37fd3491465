use std::cmp::Ordering;
use std::collections::HashSet;

use toml::{Table, Value};

use super::ParameterError;
use crate::schema::{Constraints, ParameterKind, ParameterSpec, SchemaDefinition};

/// Validates and normalises a parameter mapping against one schema.
///
/// A builder accumulates exactly one schema's parameters and is meant to be
/// thrown away after use. Resolution is strict: keys not registered through
/// [`build_from`](Self::build_from) are rejected, so callers that want to
/// tolerate stale keys must drop them first (see [`retain_defined`](Self::retain_defined)).
///
/// ```
/// use dragon_settings::parameters::SettingsBuilder;
/// use dragon_settings::schema::{ParameterKind, ParameterSpec, SchemaDefinition};
///
/// let schema = SchemaDefinition::new("shop.general")
///     .parameter(ParameterSpec::new("tagline", ParameterKind::String).default_value("Welcome"));
///
/// let builder = SettingsBuilder::from_schema(&schema)?;
/// let resolved = builder.resolve(&toml::Table::new())?;
/// assert_eq!(resolved["tagline"].as_str(), Some("Welcome"));
/// # Ok::<(), dragon_settings::parameters::ParameterError>(())
/// ```
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    specs: Vec<ParameterSpec>,
    defined: HashSet<String>,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder and registers every parameter of `schema`.
    pub fn from_schema(schema: &SchemaDefinition) -> Result<Self, ParameterError> {
        let mut builder = Self::new();
        builder.build_from(schema)?;
        Ok(builder)
    }

    /// Registers each parameter of `schema` into this builder.
    ///
    /// Fails on the first name that is already registered.
    pub fn build_from(&mut self, schema: &SchemaDefinition) -> Result<(), ParameterError> {
        for spec in schema.parameters() {
            if !self.defined.insert(spec.name.clone()) {
                return Err(ParameterError::DuplicateParameter(spec.name.clone()));
            }
            self.specs.push(spec.clone());
        }
        Ok(())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    /// Drops every key this builder does not define, returning the removed names.
    pub fn retain_defined(&self, parameters: &mut Table) -> Vec<String> {
        let unknown: Vec<String> = parameters
            .keys()
            .filter(|name| !self.is_defined(name))
            .cloned()
            .collect();
        for name in &unknown {
            parameters.remove(name);
        }
        unknown
    }

    /// Produces the final parameter mapping.
    ///
    /// Provided values are checked against their spec and passed through
    /// (integers given for `float` parameters are widened). Absent optional
    /// parameters take their default, or are left out when they have none.
    pub fn resolve(&self, parameters: &Table) -> Result<Table, ParameterError> {
        if let Some(name) = parameters.keys().find(|name| !self.is_defined(name)) {
            return Err(ParameterError::UnknownParameter(name.clone()));
        }

        let mut resolved = Table::new();
        for spec in &self.specs {
            match parameters.get(&spec.name) {
                Some(value) => {
                    let value = check_value(spec, value).map_err(|reason| {
                        ParameterError::ConstraintViolation {
                            name: spec.name.clone(),
                            reason,
                        }
                    })?;
                    resolved.insert(spec.name.clone(), value);
                }
                None if spec.required && spec.default.is_none() => {
                    return Err(ParameterError::MissingRequiredParameter(spec.name.clone()));
                }
                None => {
                    if let Some(default) = &spec.default {
                        resolved.insert(spec.name.clone(), default.clone());
                    }
                }
            }
        }
        Ok(resolved)
    }
}

fn check_value(spec: &ParameterSpec, value: &Value) -> Result<Value, String> {
    let value = coerce_kind(spec.kind, value)?;
    check_constraints(&spec.constraints, &value)?;
    if let Some(validator) = spec.validator {
        validator(&value)?;
    }
    Ok(value)
}

fn coerce_kind(kind: ParameterKind, value: &Value) -> Result<Value, String> {
    let matches = match (kind, value) {
        (ParameterKind::Any, _) => true,
        (ParameterKind::String, Value::String(_))
        | (ParameterKind::Integer, Value::Integer(_))
        | (ParameterKind::Float, Value::Float(_))
        | (ParameterKind::Boolean, Value::Boolean(_))
        | (ParameterKind::Array, Value::Array(_))
        | (ParameterKind::Table, Value::Table(_)) => true,
        (ParameterKind::Float, Value::Integer(i)) => return Ok(Value::Float(*i as f64)),
        _ => false,
    };

    if matches {
        Ok(value.clone())
    } else {
        Err(format!("expected {kind}, got {}", value.type_str()))
    }
}

fn check_constraints(constraints: &Constraints, value: &Value) -> Result<(), String> {
    if constraints.min.is_some() || constraints.max.is_some() {
        if !value.is_integer() && !value.is_float() {
            return Err(format!("range applies to numbers, got {}", value.type_str()));
        }
        if value.as_float().is_some_and(|f| !f.is_finite()) {
            return Err(format!("{value} is not a finite number"));
        }
        if let Some(min) = constraints.min {
            if !matches!(compare_number(value, min), Some(Ordering::Greater | Ordering::Equal)) {
                return Err(format!("{value} is below the minimum of {min}"));
            }
        }
        if let Some(max) = constraints.max {
            if !matches!(compare_number(value, max), Some(Ordering::Less | Ordering::Equal)) {
                return Err(format!("{value} is above the maximum of {max}"));
            }
        }
    }

    if constraints.min_length.is_some() || constraints.max_length.is_some() {
        let len = match value {
            Value::String(s) => s.chars().count(),
            Value::Array(a) => a.len(),
            Value::Table(t) => t.len(),
            other => {
                return Err(format!(
                    "length applies to strings, arrays and tables, got {}",
                    other.type_str()
                ))
            }
        };
        if let Some(min) = constraints.min_length {
            if len < min {
                return Err(format!("length {len} is shorter than {min}"));
            }
        }
        if let Some(max) = constraints.max_length {
            if len > max {
                return Err(format!("length {len} is longer than {max}"));
            }
        }
    }

    if let Some(allowed) = &constraints.one_of {
        if !allowed.contains(value) {
            return Err(format!("{value} is not one of the allowed values"));
        }
    }

    Ok(())
}

/// Orders a numeric value against a bound.
///
/// Integers are compared exactly against integral bounds. Returns `None`
/// for NaN, so a NaN never satisfies a bound.
fn compare_number(value: &Value, bound: f64) -> Option<Ordering> {
    match value {
        Value::Integer(i) => {
            if bound.fract() == 0.0 && bound >= i64::MIN as f64 && bound < i64::MAX as f64 {
                Some(i.cmp(&(bound as i64)))
            } else {
                (*i as f64).partial_cmp(&bound)
            }
        }
        Value::Float(f) => f.partial_cmp(&bound),
        _ => None,
    }
}
