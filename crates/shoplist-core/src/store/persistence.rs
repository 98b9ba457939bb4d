//! Persistence bridge between the in-memory state and device storage.
//!
//! The whole application state is written as one JSON document after every
//! transition that changes it. Reading is forgiving: each top-level field is
//! decoded on its own and falls back to its default when missing or malformed,
//! so a damaged store degrades to an empty list instead of failing start-up.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::constants::LOCAL_STORE_FILE;
use crate::models::{FilterTag, Item};
use crate::store::ItemStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Snapshot of everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub items: ItemStore,
    pub override_ordering: bool,
    pub filter_tags: Vec<FilterTag>,
    pub no_tags_filter_active: bool,
}

fn field_or_default<T: DeserializeOwned + Default>(value: &Value, key: &str) -> T {
    value
        .get(key)
        .and_then(|field| match T::deserialize(field) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!("Discarding malformed persisted field '{}': {}", key, e);
                None
            }
        })
        .unwrap_or_default()
}

impl PersistedState {
    pub fn to_value(&self) -> Result<Value, StorageError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode field by field; anything unreadable falls back to its default.
    pub fn from_value(value: &Value) -> Self {
        let items: BTreeMap<String, Item> = field_or_default(value, "items");
        Self {
            items: ItemStore::from_items(items.into_values()),
            override_ordering: field_or_default(value, "overrideOrdering"),
            filter_tags: field_or_default(value, "filterTags"),
            no_tags_filter_active: field_or_default(value, "noTagsFilterActive"),
        }
    }

    pub fn from_json_str(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                tracing::warn!("Persisted state is not valid JSON, starting empty: {}", e);
                Self::default()
            }
        }
    }
}

/// Device storage for the serialized application state.
pub trait LocalStorage: Send {
    /// Raw stored document, `None` when nothing was written yet.
    fn read(&self) -> Result<Option<String>, StorageError>;

    fn write(&self, state: &Value) -> Result<(), StorageError>;
}

/// Load the persisted state, treating any storage failure as "no data".
pub fn load_state(storage: &dyn LocalStorage) -> PersistedState {
    match storage.read() {
        Ok(Some(raw)) => PersistedState::from_json_str(&raw),
        Ok(None) => PersistedState::default(),
        Err(e) => {
            tracing::warn!("Failed to read local storage, starting empty: {}", e);
            PersistedState::default()
        }
    }
}

/// JSON document on disk, written atomically via a temp file and rename.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            path: data_dir.as_ref().join(LOCAL_STORE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalStorage for JsonFileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, state: &Value) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let temp_file = self.path.with_extension("json.tmp");
        std::fs::write(&temp_file, json)?;
        std::fs::rename(&temp_file, &self.path)?;
        Ok(())
    }
}

/// In-memory storage; clones share the same document.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            contents: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl LocalStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents())
    }

    fn write(&self, state: &Value) -> Result<(), StorageError> {
        *self.contents.lock() = Some(serde_json::to_string(state)?);
        Ok(())
    }
}
