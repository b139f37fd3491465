//! Directory-backed store, one TOML file per record.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use super::{SettingsStore, StoreError};
use crate::settings::{Settings, SettingsId};

const FILE_PREFIX: &str = "settings-";
const FILE_SUFFIX: &str = ".toml";

/// Stores each record as `settings-<id>.toml` under a directory.
///
/// Flushing writes every staged record through a temporary file that is
/// renamed into place, so a record file is either the old or the new
/// version, never a partial write.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    staged: BTreeMap<SettingsId, Settings>,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    ///
    /// New ids continue after the highest id already on disk.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

        let next_id = record_files(&dir)?
            .into_iter()
            .map(|(id, _)| id.0)
            .max()
            .unwrap_or(0);

        Ok(Self {
            dir,
            inner: Mutex::new(Inner {
                next_id,
                staged: BTreeMap::new(),
            }),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: SettingsId) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{id}{FILE_SUFFIX}"))
    }

    fn write_record(&self, settings: &Settings, path: &Path) -> Result<(), StoreError> {
        let encoded = toml::to_string(settings)?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        tmp.write_all(encoded.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| io_error(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| io_error(path, e.error))?;
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn find_by_schema(&self, schema: &str) -> Result<Vec<Settings>, StoreError> {
        let mut found = Vec::new();
        for (_, path) in record_files(&self.dir)? {
            let contents = std::fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
            let settings: Settings = toml::from_str(&contents).map_err(|e| StoreError::Decode {
                path: path.clone(),
                source: e,
            })?;
            if settings.schema() == schema {
                found.push(settings);
            }
        }
        Ok(found)
    }

    fn persist(&self, settings: &mut Settings) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        let id = match settings.id() {
            Some(id) => {
                inner.next_id = inner.next_id.max(id.0);
                id
            }
            None => {
                inner.next_id += 1;
                let id = SettingsId(inner.next_id);
                settings.set_id(id);
                id
            }
        };
        inner.staged.insert(id, settings.clone());
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        let staged = {
            let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
            std::mem::take(&mut inner.staged)
        };
        for (id, settings) in staged {
            self.write_record(&settings, &self.path_for(id))?;
        }
        Ok(())
    }
}

/// Lists `(id, path)` of every record file in `dir`, sorted by id.
fn record_files(dir: &Path) -> Result<Vec<(SettingsId, PathBuf)>, StoreError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
        let path = entry.map_err(|e| io_error(dir, e))?.path();
        let id = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(FILE_PREFIX))
            .and_then(|name| name.strip_suffix(FILE_SUFFIX))
            .and_then(|id| id.parse::<u64>().ok());
        if let Some(id) = id {
            files.push((SettingsId(id), path));
        }
    }
    files.sort();
    Ok(files)
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flush_writes_record_file() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        let mut settings = Settings::new("shop.general");
        settings.set("name", "Acme");
        store.persist(&mut settings).unwrap();
        assert!(store.find_by_schema("shop.general").unwrap().is_empty());

        store.flush().unwrap();

        assert!(dir.path().join("settings-1.toml").exists());
        assert_eq!(store.find_by_schema("shop.general").unwrap(), vec![settings]);
    }

    #[test]
    fn test_failed_flush_drops_staged_record() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");
        let store = FileStore::open(&root).unwrap();

        std::fs::remove_dir_all(&root).unwrap();
        let mut rejected = Settings::new("mail");
        store.persist(&mut rejected).unwrap();
        assert!(matches!(store.flush(), Err(StoreError::Io { .. })));

        std::fs::create_dir_all(&root).unwrap();
        store.persist(&mut Settings::new("shop.general")).unwrap();
        store.flush().unwrap();

        assert!(store.find_by_schema("mail").unwrap().is_empty());
        assert_eq!(store.find_by_schema("shop.general").unwrap().len(), 1);
    }

    #[test]
    fn test_reopen_continues_ids() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.persist(&mut Settings::new("mail")).unwrap();
            store.persist(&mut Settings::new("shop.general")).unwrap();
            store.flush().unwrap();
        }

        let store = FileStore::open(dir.path()).unwrap();
        let mut fresh = Settings::new("shop.taxes");
        store.persist(&mut fresh).unwrap();

        assert_eq!(fresh.id(), Some(SettingsId(3)));
        assert_eq!(store.find_by_schema("mail").unwrap().len(), 1);
    }

    #[test]
    fn test_unrelated_files_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a record").unwrap();
        std::fs::write(dir.path().join("settings-x.toml"), "broken").unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.find_by_schema("mail").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_record_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("settings-1.toml"), "schema = ").unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        let result = store.find_by_schema("mail");
        assert!(matches!(result, Err(StoreError::Decode { .. })));
    }
}
