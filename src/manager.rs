//! Loading and saving settings against their schemas.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::{ConfigError, ManagerConfig, StoreBackend};
use crate::events::{EventNotifier, SettingsEvent, SettingsEventKind};
use crate::parameters::SettingsBuilder;
use crate::resolver::{ResolverRegistry, ResolverSelection, SettingsResolver, StoreResolver};
use crate::schema::SchemaRegistry;
use crate::settings::{DefaultSettingsFactory, Settings, SettingsFactory};
use crate::store::{FileStore, MemoryStore, SettingsStore};
use crate::{Error, Result};

/// Resolves, validates, and persists settings.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use dragon_settings::schema::{ParameterKind, ParameterSpec, SchemaDefinition, SchemaRegistry};
/// use dragon_settings::store::MemoryStore;
/// use dragon_settings::SettingsManager;
///
/// let schemas = SchemaRegistry::new().with_schema(
///     SchemaDefinition::new("shop.general")
///         .parameter(ParameterSpec::new("name", ParameterKind::String).default_value("Shop"))
///         .parameter(ParameterSpec::new("tagline", ParameterKind::String).default_value("Welcome")),
/// )?;
///
/// let manager = SettingsManager::builder()
///     .with_schemas(schemas)
///     .with_store(Arc::new(MemoryStore::new()))
///     .build()?;
///
/// let mut settings = manager.load("shop.general")?;
/// settings.set("name", "Acme");
/// manager.save(&mut settings)?;
///
/// assert_eq!(manager.load("shop.general")?.get("name").and_then(|v| v.as_str()), Some("Acme"));
/// # Ok::<(), dragon_settings::Error>(())
/// ```
#[derive(Debug)]
pub struct SettingsManager {
    schemas: SchemaRegistry,
    resolvers: ResolverRegistry,
    store: Arc<dyn SettingsStore>,
    factory: Box<dyn SettingsFactory>,
    default_resolver: Box<dyn SettingsResolver>,
    notifier: EventNotifier,
    cache: Option<Mutex<HashMap<String, Settings>>>,
}

impl SettingsManager {
    pub fn builder() -> SettingsManagerBuilder {
        SettingsManagerBuilder::default()
    }

    /// Starts a builder from deserialized configuration.
    ///
    /// Registers the configured schema files, opens the configured store, and
    /// applies the cache policy. Resolver overrides and observers can still be
    /// added to the returned builder.
    pub fn builder_from_config(config: &ManagerConfig) -> Result<SettingsManagerBuilder> {
        let mut schemas = SchemaRegistry::new();
        for path in &config.schemas {
            schemas.register_file(path)?;
        }

        let store: Arc<dyn SettingsStore> = match config.store.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::File => {
                let path = config.store.path.as_ref().ok_or(ConfigError::MissingStorePath)?;
                Arc::new(FileStore::open(path)?)
            }
        };

        Ok(Self::builder()
            .with_schemas(schemas)
            .with_store(store)
            .cache_resolved(config.cache.enabled))
    }

    /// Loads settings for `schema`, dropping parameters the schema no longer defines.
    pub fn load(&self, schema: &str) -> Result<Settings> {
        self.load_with(schema, true)
    }

    /// Loads settings for `schema`, failing on parameters the schema does not define.
    pub fn load_strict(&self, schema: &str) -> Result<Settings> {
        self.load_with(schema, false)
    }

    /// Loads settings for `schema`.
    ///
    /// Stored values are looked up through the alias' resolver override, or
    /// the default resolver. When nothing is stored a fresh record is created.
    /// With `ignore_unknown`, parameters not defined by the schema are dropped
    /// before validation; otherwise they fail it. Nothing is persisted.
    pub fn load_with(&self, schema: &str, ignore_unknown: bool) -> Result<Settings> {
        let cache = self.cache.as_ref().filter(|_| ignore_unknown);

        if let Some(cache) = cache {
            let cached = cache.lock().unwrap_or_else(PoisonError::into_inner).get(schema).cloned();
            if let Some(settings) = cached {
                tracing::debug!(schema, "settings served from runtime cache");
                return Ok(settings);
            }
        }

        let settings = self.resolve_settings(schema, ignore_unknown)?;

        if let Some(cache) = cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(schema.to_string(), settings.clone());
        }
        Ok(settings)
    }

    fn resolve_settings(&self, alias: &str, ignore_unknown: bool) -> Result<Settings> {
        let schema = self.schemas.get_schema(alias)?;

        let resolver = match self.resolvers.select(alias) {
            ResolverSelection::Override(resolver) => {
                tracing::debug!(schema = alias, "using resolver override");
                resolver
            }
            ResolverSelection::Default => self.default_resolver.as_ref(),
        };

        let mut settings = match resolver.resolve(alias)? {
            Some(settings) => settings,
            None => {
                tracing::debug!(schema = alias, "no stored settings, creating new");
                let mut settings = self.factory.create_new();
                settings.set_schema(alias);
                settings
            }
        };

        let mut parameters = settings.parameters().clone();
        let builder = SettingsBuilder::from_schema(&schema)?;

        // Must run before resolve(), which rejects unknown keys.
        if ignore_unknown {
            let removed = builder.retain_defined(&mut parameters);
            if !removed.is_empty() {
                tracing::debug!(schema = alias, ?removed, "dropped parameters unknown to schema");
            }
        }

        settings.set_parameters(builder.resolve(&parameters)?);
        Ok(settings)
    }

    /// Validates and persists `settings`.
    ///
    /// Parameters are checked against the schema but not rewritten, so
    /// defaults are not stored unless the caller set them. Invalid settings
    /// fail before the store is touched. A pre-save event fires after staging
    /// and a post-save event after a successful commit; a failed commit
    /// leaves only the pre-save event delivered, nothing stored, and the
    /// record's id as it was before the call.
    pub fn save(&self, settings: &mut Settings) -> Result<()> {
        let schema = self.schemas.get_schema(settings.schema())?;
        SettingsBuilder::from_schema(&schema)?.resolve(settings.parameters())?;

        let previous_id = settings.id();
        if let Err(e) = self.store.persist(settings) {
            settings.restore_id(previous_id);
            return Err(e.into());
        }

        self.notifier.dispatch(&SettingsEvent {
            kind: SettingsEventKind::PreSave,
            settings,
        });

        if let Err(e) = self.store.flush() {
            tracing::warn!(schema = settings.schema(), error = %e, "settings commit failed");
            settings.restore_id(previous_id);
            return Err(e.into());
        }

        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(settings.schema());
        }

        tracing::info!(schema = settings.schema(), id = ?settings.id(), "settings saved");
        self.notifier.dispatch(&SettingsEvent {
            kind: SettingsEventKind::PostSave,
            settings,
        });
        Ok(())
    }

    /// Forgets every cached resolution. No-op when caching is off.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }
}

/// Builder for a [`SettingsManager`].
///
/// Only the store is mandatory. The factory defaults to
/// [`DefaultSettingsFactory`] and the default resolver to a
/// [`StoreResolver`] over the configured store.
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct SettingsManagerBuilder {
    schemas: SchemaRegistry,
    resolvers: ResolverRegistry,
    store: Option<Arc<dyn SettingsStore>>,
    factory: Option<Box<dyn SettingsFactory>>,
    default_resolver: Option<Box<dyn SettingsResolver>>,
    notifier: EventNotifier,
    cache: bool,
}

impl SettingsManagerBuilder {
    pub fn with_schemas(mut self, schemas: SchemaRegistry) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_resolvers(mut self, resolvers: ResolverRegistry) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Routes loads of `schema` to `resolver` instead of the default resolver.
    pub fn with_resolver(mut self, schema: impl Into<String>, resolver: Arc<dyn SettingsResolver>) -> Self {
        self.resolvers.register(schema, resolver);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_factory(mut self, factory: impl SettingsFactory + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    pub fn with_default_resolver(mut self, resolver: impl SettingsResolver + 'static) -> Self {
        self.default_resolver = Some(Box::new(resolver));
        self
    }

    pub fn with_notifier(mut self, notifier: EventNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Subscribes an observer to save events.
    pub fn on_event<F>(mut self, observer: F) -> Self
    where
        F: Fn(&SettingsEvent<'_>) + Send + Sync + 'static,
    {
        self.notifier.subscribe(observer);
        self
    }

    /// Memoizes lenient loads per alias for the manager's lifetime.
    ///
    /// Saves through the same manager evict the alias. Writes from elsewhere
    /// are not seen until [`SettingsManager::clear_cache`] is called.
    pub fn cache_resolved(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    /// Returns an error if no store was provided.
    pub fn build(self) -> Result<SettingsManager> {
        let store = self.store.ok_or(Error::MissingStore)?;
        let default_resolver = self
            .default_resolver
            .unwrap_or_else(|| Box::new(StoreResolver::new(Arc::clone(&store))));

        Ok(SettingsManager {
            schemas: self.schemas,
            resolvers: self.resolvers,
            store,
            factory: self.factory.unwrap_or_else(|| Box::new(DefaultSettingsFactory)),
            default_resolver,
            notifier: self.notifier,
            cache: self.cache.then(|| Mutex::new(HashMap::new())),
        })
    }
}
