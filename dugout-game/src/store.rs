//! Key-value persistence contract.
//!
//! Stores hold JSON values under string keys. Typed reads tolerate missing
//! or corrupt payloads by falling back to the caller's default.
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::StoreError;

/// Backend for team records and career stats.
pub trait KeyValueStore {
    /// Fetch the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the backend cannot be read.
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the backend cannot be written.
    fn save(&mut self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the backend cannot be cleared.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Typed read falling back to `default` on a missing key, a read failure or
/// a payload that no longer deserializes.
pub fn load_or<S, T>(store: &S, key: &str, default: T) -> T
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.load(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("discarding corrupt store entry {key}: {err}");
                default
            }
        },
        Ok(None) => default,
        Err(err) => {
            log::warn!("store read for {key} failed: {err}");
            default
        }
    }
}

/// Typed write.
///
/// # Errors
///
/// Returns `StoreError` when the value cannot be serialized or written.
pub fn save_as<S, T>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    let value = serde_json::to_value(value)?;
    store.save(key, value)
}

/// Store kept entirely in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }
}
