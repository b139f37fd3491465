use toml::Value;

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// Reads `PREFIX<sep>SECTION<sep>KEY` environment variables.
///
/// Path segments are lowercased, so `DRAGON_SETTINGS__STORE__BACKEND=file`
/// sets `store.backend`. Values are coerced to boolean, integer, or float
/// when they look like one, and kept as strings otherwise.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
    vars: Option<Vec<(String, String)>>,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Result<Self, ConfigError> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(ConfigError::EmptySeparator);
        }
        Ok(Self {
            prefix: prefix.into(),
            separator,
            vars: None,
        })
    }

    /// Reads from a fixed set of variables instead of the process environment.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    fn entry_for(&self, key: &str, value: &str) -> Option<ConfigEntry> {
        let rest = key.strip_prefix(&self.prefix)?.strip_prefix(&self.separator)?;
        if rest.is_empty() {
            return None;
        }
        let path = rest.split(&self.separator).map(str::to_lowercase).collect();
        Some(ConfigEntry::at_path(path, coerce_value(value)))
    }
}

impl ConfigSource for EnvSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let entries: Vec<ConfigEntry> = match &self.vars {
            Some(vars) => vars.iter().filter_map(|(k, v)| self.entry_for(k, v)).collect(),
            None => std::env::vars()
                .filter_map(|(k, v)| self.entry_for(&k, &v))
                .collect(),
        };
        Ok(entries)
    }
}

fn coerce_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }

    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
    }

    if s.contains('.') {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_vars_become_paths() {
        let source = EnvSource::new("APP", "__")
            .unwrap()
            .with_vars([
                ("APP__STORE__BACKEND", "file"),
                ("APP__CACHE__ENABLED", "TRUE"),
                ("OTHER__STORE__BACKEND", "memory"),
                ("APP__", "ignored"),
            ]);

        let mut entries = source.entries().unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, ["cache", "enabled"]);
        assert_eq!(entries[0].value, Value::Boolean(true));
        assert_eq!(entries[1].path, ["store", "backend"]);
        assert_eq!(entries[1].value, Value::String("file".into()));
    }

    #[test]
    fn test_coercion() {
        assert_eq!(coerce_value("42"), Value::Integer(42));
        assert_eq!(coerce_value("-7"), Value::Integer(-7));
        assert_eq!(coerce_value("0.5"), Value::Float(0.5));
        assert_eq!(coerce_value("1.2.3"), Value::String("1.2.3".into()));
        assert_eq!(coerce_value("-"), Value::String("-".into()));
    }

    #[test]
    fn test_empty_separator_rejected() {
        assert!(matches!(EnvSource::new("APP", ""), Err(ConfigError::EmptySeparator)));
    }
}
