//! The persisted settings record and its factory.

use std::fmt;

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

/// Identity assigned by a [`SettingsStore`](crate::store::SettingsStore) when a
/// record is first persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsId(pub u64);

impl fmt::Display for SettingsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named group of parameter values belonging to one schema.
///
/// The schema alias acts as the logical key. Between a
/// [`load`](crate::SettingsManager::load) and a
/// [`save`](crate::SettingsManager::save) the instance belongs to the caller;
/// the manager keeps no handle to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<SettingsId>,
    schema: String,
    #[serde(default)]
    parameters: Table,
}

impl Settings {
    /// Creates an unsaved record for the given schema with no parameters.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            id: None,
            schema: schema.into(),
            parameters: Table::new(),
        }
    }

    pub fn id(&self) -> Option<SettingsId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: SettingsId) {
        self.id = Some(id);
    }

    pub(crate) fn restore_id(&mut self, id: Option<SettingsId>) {
        self.id = id;
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn set_schema(&mut self, schema: impl Into<String>) {
        self.schema = schema.into();
    }

    pub fn parameters(&self) -> &Table {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: Table) {
        self.parameters = parameters;
    }

    /// Returns a single parameter value, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Sets a single parameter value, replacing any previous one.
    ///
    /// Values are not checked here; validation happens on load and save.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Removes a parameter, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.parameters.remove(name)
    }
}

/// Creates blank records when no stored settings resolve for a schema.
pub trait SettingsFactory: Send + Sync + fmt::Debug {
    fn create_new(&self) -> Settings;
}

/// Factory producing an empty, unsaved [`Settings`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSettingsFactory;

impl SettingsFactory for DefaultSettingsFactory {
    fn create_new(&self) -> Settings {
        Settings::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creates_blank_record() {
        let settings = DefaultSettingsFactory.create_new();

        assert_eq!(settings.id(), None);
        assert_eq!(settings.schema(), "");
        assert!(settings.parameters().is_empty());
    }

    #[test]
    fn test_set_and_get_parameter() {
        let mut settings = Settings::new("shop.general");
        settings.set("name", "Acme");
        settings.set("items_per_page", 20);

        assert_eq!(settings.get("name"), Some(&Value::String("Acme".into())));
        assert_eq!(settings.get("items_per_page"), Some(&Value::Integer(20)));
        assert_eq!(settings.remove("name"), Some(Value::String("Acme".into())));
        assert_eq!(settings.get("name"), None);
    }

    #[test]
    fn test_toml_round_trip_keeps_identity() {
        let mut settings = Settings::new("shop.general");
        settings.set_id(SettingsId(7));
        settings.set("name", "Acme");

        let encoded = toml::to_string(&settings).unwrap();
        let decoded: Settings = toml::from_str(&encoded).unwrap();

        assert_eq!(decoded, settings);
    }

    #[test]
    fn test_unsaved_record_omits_id() {
        let encoded = toml::to_string(&Settings::new("shop.general")).unwrap();

        assert!(!encoded.contains("id"));
    }
}
