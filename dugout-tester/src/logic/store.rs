use anyhow::{Context, Result};
use dugout_game::{KeyValueStore, MemoryStore, StoreError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key-value store persisted as one pretty-printed JSON object on disk.
///
/// Every save rewrites the whole file through a sibling temp file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonFileStore {
    /// Open `path`. A missing, unreadable or malformed file starts the store
    /// empty; the next save overwrites it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::read_entries(&path).unwrap_or_else(|err| {
            log::warn!("ignoring store {}: {err:#}", path.display());
            BTreeMap::new()
        });
        Self { path, entries }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, Value>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read store {}", path.display()))?;
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text)
            .with_context(|| format!("store {} is not a JSON object", path.display()))
    }

    fn flush(&self, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)?,
            _ => {}
        }
        let payload = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), value);
        self.flush(&entries)?;
        self.entries = entries;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.flush(&BTreeMap::new())?;
        self.entries.clear();
        Ok(())
    }
}

/// Store chosen on the command line.
#[derive(Debug)]
pub enum TesterStore {
    Memory(MemoryStore),
    File(JsonFileStore),
}

impl TesterStore {
    /// File-backed when `path` is given, in-memory otherwise.
    #[must_use]
    pub fn from_arg(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::File(JsonFileStore::open(path)),
            None => Self::Memory(MemoryStore::new()),
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Memory(_) => "in-memory".to_string(),
            Self::File(store) => store.path().display().to_string(),
        }
    }
}

impl KeyValueStore for TesterStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        match self {
            Self::Memory(store) => store.load(key),
            Self::File(store) => store.load(key),
        }
    }

    fn save(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.save(key, value),
            Self::File(store) => store.save(key, value),
        }
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.clear(),
            Self::File(store) => store.clear(),
        }
    }
}
