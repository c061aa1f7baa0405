use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Storage key the listing page writes its search results under.
pub const DEFAULT_STORAGE_KEY: &str = "listData";

/// Host-provided string store, keyed by name (the page's local storage).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Store backed by a dump of the page's local storage: one JSON object
/// whose keys are storage keys.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    inner: MemoryStore,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self> {
        info!("Loading storage dump from {:?}", path);
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read storage dump {:?}", path))?;
        let store = Self::from_dump(&raw)
            .with_context(|| format!("Failed to parse storage dump {:?}", path))?;
        info!("Storage dump loaded with {} keys.", store.inner.entries.len());
        Ok(store)
    }

    /// Builds the store from dump text. String values are kept verbatim;
    /// anything else is re-encoded so lookups always yield JSON text.
    pub fn from_dump(raw: &str) -> Result<Self> {
        let dump: serde_json::Map<String, Value> =
            serde_json::from_str(raw).context("Storage dump must be a JSON object")?;

        let mut inner = MemoryStore::new();
        for (key, value) in dump {
            let text = match value {
                Value::String(s) => s,
                other => {
                    debug!("Re-encoding non-string value stored under '{}'", key);
                    other.to_string()
                }
            };
            inner.insert(key, text);
        }
        Ok(Self { inner })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }
}
