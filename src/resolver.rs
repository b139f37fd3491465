//! Strategies for locating previously stored settings.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::settings::Settings;
use crate::store::{SettingsStore, StoreError};
use crate::{Error, Result};

/// Locates an existing record for a schema alias.
///
/// `Ok(None)` means nothing is stored yet and is a normal outcome.
pub trait SettingsResolver: Send + Sync + fmt::Debug {
    fn resolve(&self, schema: &str) -> Result<Option<Settings>, StoreError>;
}

/// Default resolver: looks the alias up in a [`SettingsStore`].
///
/// More than one stored record for an alias is reported as
/// [`StoreError::DuplicateSettings`] rather than picking one.
#[derive(Debug, Clone)]
pub struct StoreResolver {
    store: Arc<dyn SettingsStore>,
}

impl StoreResolver {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }
}

impl SettingsResolver for StoreResolver {
    fn resolve(&self, schema: &str) -> Result<Option<Settings>, StoreError> {
        let mut found = self.store.find_by_schema(schema)?;
        match found.len() {
            0 | 1 => Ok(found.pop()),
            count => {
                tracing::warn!(schema, count, "multiple stored settings for one schema");
                Err(StoreError::DuplicateSettings {
                    schema: schema.to_string(),
                    count,
                })
            }
        }
    }
}

/// Which resolver handles a given alias.
#[derive(Debug, Clone, Copy)]
pub enum ResolverSelection<'a> {
    Default,
    Override(&'a dyn SettingsResolver),
}

/// Per-alias resolver overrides.
#[derive(Debug, Clone, Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, Arc<dyn SettingsResolver>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `schema` to `resolver`, replacing any previous override.
    pub fn register(&mut self, schema: impl Into<String>, resolver: Arc<dyn SettingsResolver>) {
        self.resolvers.insert(schema.into(), resolver);
    }

    pub fn has(&self, schema: &str) -> bool {
        self.resolvers.contains_key(schema)
    }

    pub fn get(&self, schema: &str) -> Result<&dyn SettingsResolver> {
        self.resolvers
            .get(schema)
            .map(|r| r.as_ref())
            .ok_or_else(|| Error::ResolverNotFound(schema.to_string()))
    }

    pub fn select(&self, schema: &str) -> ResolverSelection<'_> {
        match self.resolvers.get(schema) {
            Some(resolver) => ResolverSelection::Override(resolver.as_ref()),
            None => ResolverSelection::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[derive(Debug)]
    struct Fixed(Settings);

    impl SettingsResolver for Fixed {
        fn resolve(&self, _schema: &str) -> Result<Option<Settings>, StoreError> {
            Ok(Some(self.0.clone()))
        }
    }

    #[test]
    fn test_store_resolver_absent() {
        let resolver = StoreResolver::new(Arc::new(MemoryStore::new()));

        assert!(resolver.resolve("shop.general").unwrap().is_none());
    }

    #[test]
    fn test_store_resolver_found() {
        let store = Arc::new(MemoryStore::new());
        store.insert(Settings::new("shop.general")).unwrap();
        let resolver = StoreResolver::new(store);

        let found = resolver.resolve("shop.general").unwrap().unwrap();
        assert_eq!(found.schema(), "shop.general");
    }

    #[test]
    fn test_store_resolver_duplicates() {
        let store = Arc::new(MemoryStore::new());
        store.insert(Settings::new("shop.general")).unwrap();
        store.insert(Settings::new("shop.general")).unwrap();
        let resolver = StoreResolver::new(store);

        let result = resolver.resolve("shop.general");
        assert!(matches!(
            result,
            Err(StoreError::DuplicateSettings { count: 2, .. })
        ));
    }

    #[test]
    fn test_registry_selection() {
        let mut registry = ResolverRegistry::new();
        registry.register("mail", Arc::new(Fixed(Settings::new("mail"))));

        assert!(registry.has("mail"));
        assert!(matches!(registry.select("mail"), ResolverSelection::Override(_)));
        assert!(matches!(registry.select("shop.general"), ResolverSelection::Default));
        assert!(registry.get("mail").is_ok());
        assert!(matches!(
            registry.get("shop.general"),
            Err(Error::ResolverNotFound(alias)) if alias == "shop.general"
        ));
    }
}
