//! Persistence collaborators: a narrow key-value boundary plus the versioned
//! JSON envelope wrapped around every record kept across sessions.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{StorageError, StorageResult};

/// External key-value store boundary.
///
/// Implementations move bytes; record shapes and version tagging are the
/// callers' concern (see [`load_versioned`] / [`save_versioned`]).
pub trait Storage: Send + Sync {
    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    fn save(&self, key: &str, bytes: &[u8]) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Keeps records for the lifetime of the process. The default for tests and
/// for embedding contexts without a writable disk.
#[derive(Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> StorageResult<()> {
        self.records
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.records.lock().unwrap().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per record under a root directory.
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonFileStorage { root: root.into() }
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl Storage for JsonFileStorage {
    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(self.record_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(format!(
                "Failed to read record {key}: {err}"
            ))),
        }
    }

    fn save(&self, key: &str, bytes: &[u8]) -> StorageResult<()> {
        fs::create_dir_all(&self.root).map_err(|err| {
            StorageError::Io(format!("Failed to create storage directory: {err}"))
        })?;
        fs::write(self.record_path(key), bytes)
            .map_err(|err| StorageError::Io(format!("Failed to write record {key}: {err}")))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(format!(
                "Failed to remove record {key}: {err}"
            ))),
        }
    }
}

/// Envelope wrapped around every persisted record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Persisted<T> {
    pub state: T,
    pub version: u32,
}

/// Loads and unwraps a versioned record.
///
/// A missing record reads as absent. A version mismatch also reads as
/// absent and drops the stale bytes so the next save starts clean.
pub fn load_versioned<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
    version: u32,
) -> StorageResult<Option<T>> {
    let Some(bytes) = storage.load(key)? else {
        return Ok(None);
    };

    let record: Persisted<T> = serde_json::from_slice(&bytes)
        .map_err(|err| StorageError::Serde(format!("Failed to decode record {key}: {err}")))?;

    if record.version != version {
        tracing::warn!(
            "Discarding persisted record {} with stale version {} (expected {})",
            key,
            record.version,
            version
        );
        storage.remove(key)?;
        return Ok(None);
    }

    Ok(Some(record.state))
}

/// Wraps a record in the versioned envelope and saves it.
pub fn save_versioned<T: Serialize>(
    storage: &dyn Storage,
    key: &str,
    version: u32,
    state: &T,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec(&Persisted { state, version })
        .map_err(|err| StorageError::Serde(format!("Failed to encode record {key}: {err}")))?;
    storage.save(key, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Marker {
        name: String,
    }

    #[test]
    fn memory_round_trip_through_envelope() {
        let storage = MemoryStorage::new();
        let record = Marker {
            name: "pikachu".to_string(),
        };

        save_versioned(&storage, "marker", 1, &record).unwrap();
        let loaded: Option<Marker> = load_versioned(&storage, "marker", 1).unwrap();

        assert_eq!(loaded, Some(record));
    }

    #[test]
    fn missing_record_reads_as_absent() {
        let storage = MemoryStorage::new();
        let loaded: Option<Marker> = load_versioned(&storage, "marker", 1).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn version_mismatch_invalidates_record() {
        let storage = MemoryStorage::new();
        save_versioned(&storage, "marker", 1, &Marker { name: "old".to_string() }).unwrap();

        let loaded: Option<Marker> = load_versioned(&storage, "marker", 2).unwrap();
        assert_eq!(loaded, None);
        // The stale bytes are gone, not just skipped.
        assert_eq!(storage.load("marker").unwrap(), None);
    }

    #[test]
    fn corrupted_record_surfaces_serde_error() {
        let storage = MemoryStorage::new();
        storage.save("marker", b"not json").unwrap();

        let result: StorageResult<Option<Marker>> = load_versioned(&storage, "marker", 1);
        assert!(matches!(result, Err(StorageError::Serde(_))));
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());

        assert_eq!(storage.load("marker").unwrap(), None);
        save_versioned(&storage, "marker", 1, &Marker { name: "eevee".to_string() }).unwrap();

        let loaded: Option<Marker> = load_versioned(&storage, "marker", 1).unwrap();
        assert_eq!(loaded.unwrap().name, "eevee");

        storage.remove("marker").unwrap();
        assert_eq!(storage.load("marker").unwrap(), None);
        // Removing an absent record stays quiet.
        storage.remove("marker").unwrap();
    }

    #[test]
    fn envelope_keeps_the_expected_wire_shape() {
        let storage = MemoryStorage::new();
        save_versioned(&storage, "marker", 1, &Marker { name: "mew".to_string() }).unwrap();

        let bytes = storage.load("marker").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["state"]["name"], "mew");
    }
}
