//! Collection registry persistence
//!
//! The registry is the locally-known list of collections plus which one is
//! the default. It is the only part of the local model that survives a
//! restart; notes are re-fetched from their stores.

use crate::model::{Collection, CollectionKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur while loading or saving the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Everything the registry stores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_collection: Option<CollectionKey>,
    #[serde(default)]
    pub collections: Vec<Collection>,
}

impl RegistrySnapshot {
    pub fn find(&self, title: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.title == title)
    }
}

/// Trait for registry backends
pub trait CollectionRegistry: Send + Sync {
    fn load(&self) -> RegistryResult<RegistrySnapshot>;

    fn persist(&self, snapshot: &RegistrySnapshot) -> RegistryResult<()>;
}

/// Registry kept as pretty-printed JSON in a single file
#[derive(Debug, Clone)]
pub struct JsonFileRegistry {
    path: PathBuf,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CollectionRegistry for JsonFileRegistry {
    /// A missing or empty file is an empty registry
    fn load(&self) -> RegistryResult<RegistrySnapshot> {
        if !self.path.exists() {
            return Ok(RegistrySnapshot::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(RegistrySnapshot::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn persist(&self, snapshot: &RegistrySnapshot) -> RegistryResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory registry (useful for testing)
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: Mutex<(RegistrySnapshot, usize)>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            state: Mutex::new((snapshot, 0)),
        }
    }

    /// How many times `persist` has been called
    pub fn persist_count(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).1
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).0.clone()
    }
}

impl CollectionRegistry for MemoryRegistry {
    fn load(&self) -> RegistryResult<RegistrySnapshot> {
        Ok(self.snapshot())
    }

    fn persist(&self, snapshot: &RegistrySnapshot) -> RegistryResult<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.0 = snapshot.clone();
        state.1 += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RemoteId, StoreUrl};

    #[test]
    fn memory_registry_counts_persists() {
        let registry = MemoryRegistry::new();
        assert_eq!(registry.load().unwrap(), RegistrySnapshot::default());

        let coll = Collection::new("Work", StoreUrl::parse("http://a.test").unwrap()).with_id(RemoteId::new(1));
        let snapshot = RegistrySnapshot {
            default_collection: Some(coll.key),
            collections: vec![coll],
        };
        registry.persist(&snapshot).unwrap();
        registry.persist(&snapshot).unwrap();
        assert_eq!(registry.persist_count(), 2);
        assert_eq!(registry.load().unwrap().find("Work").map(|c| c.id), Some(Some(RemoteId::new(1))));
    }

    #[test]
    fn empty_file_is_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collections.json");
        std::fs::write(&path, "").unwrap();
        let registry = JsonFileRegistry::new(&path);
        assert_eq!(registry.load().unwrap(), RegistrySnapshot::default());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collections.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            JsonFileRegistry::new(&path).load(),
            Err(RegistryError::Serialization(_))
        ));
    }
}
