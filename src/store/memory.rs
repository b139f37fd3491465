use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{SettingsStore, StoreError};
use crate::settings::{Settings, SettingsId};

/// Process-local store. Records live as long as the store does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    staged: BTreeMap<SettingsId, Settings>,
    committed: BTreeMap<SettingsId, Settings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `settings` directly, bypassing staging.
    ///
    /// Useful for seeding. Returns the assigned id.
    pub fn insert(&self, mut settings: Settings) -> Result<SettingsId, StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        let id = inner.assign_id(&mut settings);
        inner.committed.insert(id, settings);
        Ok(id)
    }

    /// Number of committed records.
    pub fn len(&self) -> Result<usize, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.committed.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl Inner {
    fn assign_id(&mut self, settings: &mut Settings) -> SettingsId {
        match settings.id() {
            Some(id) => {
                self.next_id = self.next_id.max(id.0);
                id
            }
            None => {
                self.next_id += 1;
                let id = SettingsId(self.next_id);
                settings.set_id(id);
                id
            }
        }
    }
}

impl SettingsStore for MemoryStore {
    fn find_by_schema(&self, schema: &str) -> Result<Vec<Settings>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .committed
            .values()
            .filter(|s| s.schema() == schema)
            .cloned()
            .collect())
    }

    fn persist(&self, settings: &mut Settings) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        let id = inner.assign_id(settings);
        inner.staged.insert(id, settings.clone());
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        let staged = std::mem::take(&mut inner.staged);
        inner.committed.extend(staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_assigns_id_but_needs_flush() {
        let store = MemoryStore::new();
        let mut settings = Settings::new("shop.general");
        settings.set("name", "Acme");

        store.persist(&mut settings).unwrap();
        assert_eq!(settings.id(), Some(SettingsId(1)));
        assert!(store.find_by_schema("shop.general").unwrap().is_empty());

        store.flush().unwrap();
        let found = store.find_by_schema("shop.general").unwrap();
        assert_eq!(found, vec![settings]);
    }

    #[test]
    fn test_persist_existing_record_updates_in_place() {
        let store = MemoryStore::new();
        let mut settings = Settings::new("shop.general");
        store.persist(&mut settings).unwrap();
        store.flush().unwrap();

        settings.set("name", "Acme");
        store.persist(&mut settings).unwrap();
        store.flush().unwrap();

        assert_eq!(store.len().unwrap(), 1);
        let found = store.find_by_schema("shop.general").unwrap();
        assert_eq!(found[0].get("name").and_then(|v| v.as_str()), Some("Acme"));
    }

    #[test]
    fn test_insert_keeps_ids_unique() {
        let store = MemoryStore::new();
        let mut seeded = Settings::new("mail");
        seeded.set_id(SettingsId(10));
        store.insert(seeded).unwrap();

        let mut fresh = Settings::new("shop.general");
        store.persist(&mut fresh).unwrap();

        assert_eq!(fresh.id(), Some(SettingsId(11)));
    }

    #[test]
    fn test_poisoned_lock_reported() {
        let store = MemoryStore::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.inner.lock().unwrap();
            panic!("poison");
        }));

        assert!(matches!(store.len(), Err(StoreError::Poisoned)));
        assert!(matches!(store.is_empty(), Err(StoreError::Poisoned)));
    }

    #[test]
    fn test_find_filters_by_schema() {
        let store = MemoryStore::new();
        store.insert(Settings::new("mail")).unwrap();
        store.insert(Settings::new("shop.general")).unwrap();

        assert_eq!(store.find_by_schema("mail").unwrap().len(), 1);
        assert!(store.find_by_schema("missing").unwrap().is_empty());
    }
}
