use std::collections::HashMap;
use std::sync::Arc;

use super::SchemaDefinition;
use crate::{Error, Result};

/// Lookup of schema definitions by alias.
///
/// Populated at setup time and handed to the
/// [`SettingsManager`](crate::SettingsManager); lookups never mutate it.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<SchemaDefinition>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its own alias.
    ///
    /// Aliases are unique; registering the same alias twice fails.
    pub fn register(&mut self, schema: SchemaDefinition) -> Result<()> {
        let alias = schema.alias().to_string();
        if self.schemas.contains_key(&alias) {
            return Err(Error::DuplicateSchema(alias));
        }
        self.schemas.insert(alias, Arc::new(schema));
        Ok(())
    }

    /// Chaining variant of [`register`](Self::register).
    pub fn with_schema(mut self, schema: SchemaDefinition) -> Result<Self> {
        self.register(schema)?;
        Ok(self)
    }

    pub fn get_schema(&self, alias: &str) -> Result<Arc<SchemaDefinition>> {
        self.schemas
            .get(alias)
            .cloned()
            .ok_or_else(|| Error::SchemaNotFound(alias.to_string()))
    }

    pub fn has(&self, alias: &str) -> bool {
        self.schemas.contains_key(alias)
    }

    /// Registered aliases in no particular order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParameterKind, ParameterSpec};

    #[test]
    fn test_register_and_get() {
        let registry = SchemaRegistry::new()
            .with_schema(
                SchemaDefinition::new("shop.general")
                    .parameter(ParameterSpec::new("name", ParameterKind::String)),
            )
            .unwrap();

        let schema = registry.get_schema("shop.general").unwrap();
        assert_eq!(schema.alias(), "shop.general");
        assert_eq!(schema.parameters().len(), 1);
        assert!(registry.has("shop.general"));
    }

    #[test]
    fn test_unknown_alias() {
        let registry = SchemaRegistry::new();

        let result = registry.get_schema("missing");
        assert!(matches!(result, Err(Error::SchemaNotFound(alias)) if alias == "missing"));
    }

    #[test]
    fn test_duplicate_alias() {
        let mut registry = SchemaRegistry::new();
        registry.register(SchemaDefinition::new("mail")).unwrap();

        let result = registry.register(SchemaDefinition::new("mail"));
        assert!(matches!(result, Err(Error::DuplicateSchema(alias)) if alias == "mail"));
        assert_eq!(registry.len(), 1);
    }
}
