//! Value-table persistence.
//!
//! Training pushes snapshots through a [`TableStore`]. A failed push is
//! reported to the caller, which logs it and keeps training.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use crate::q_table::QTable;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StoreError {
    #[display("failed to access {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("invalid table data in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub trait TableStore: fmt::Debug + Send {
    fn save(&mut self, table: &QTable) -> Result<(), StoreError>;
    fn load(&self) -> Result<QTable, StoreError>;
}

/// Stores the table as JSON in a single file.
///
/// Saving writes a sibling temporary file and renames it over the target, so
/// readers never observe a partly written table. Loading a missing file gives
/// an empty table.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TableStore for JsonFileStore {
    fn save(&mut self, table: &QTable) -> Result<(), StoreError> {
        let json = serde_json::to_vec(table).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|source| StoreError::Io {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn load(&self) -> Result<QTable, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(QTable::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemorySlot>>,
}

#[derive(Debug, Default)]
struct MemorySlot {
    table: Option<QTable>,
    saves: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).saves
    }
}

impl TableStore for MemoryStore {
    fn save(&mut self, table: &QTable) -> Result<(), StoreError> {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        slot.table = Some(table.clone());
        slot.saves += 1;
        Ok(())
    }

    fn load(&self) -> Result<QTable, StoreError> {
        let slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.table.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use hamlet_grid::{Action, StateKey, Tile};

    use super::*;

    fn sample_table() -> QTable {
        let mut table = QTable::new();
        let key: StateKey = "E0/0R".parse().unwrap();
        table.update(key.clone(), Action::at(0, 1, Tile::House), 12.5);
        table.update(key, Action::at(1, 0, Tile::Green), -3.0);
        table
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hamlet-store-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = temp_dir("round-trip");
        let mut store = JsonFileStore::new(dir.join("q_table.json"));
        let table = sample_table();
        store.save(&table).unwrap();
        assert_eq!(store.load().unwrap(), table);
        assert!(!dir.join("q_table.json.tmp").exists());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let dir = temp_dir("missing");
        let store = JsonFileStore::new(dir.join("absent.json"));
        assert!(store.load().unwrap().is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let dir = temp_dir("garbage");
        let path = dir.join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
        assert!(err.to_string().contains("bad.json"));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_json_store_unwritable_target() {
        let dir = temp_dir("unwritable");
        let mut store = JsonFileStore::new(dir.join("no-such-dir").join("q.json"));
        assert!(matches!(store.save(&sample_table()), Err(StoreError::Io { .. })));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        assert!(store.load().unwrap().is_empty());
        writer.save(&sample_table()).unwrap();
        assert_eq!(store.load().unwrap(), sample_table());
        assert_eq!(store.saves(), 1);
    }
}
