use crate::error::PersistenceError;
use crate::ports::PersistenceStore;
use crate::store::Snapshot;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Keeps the snapshot as one JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceStore for JsonFileStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Atomic replace.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, snapshot.to_json()?)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), records = snapshot.records.len(), "snapshot saved");
        Ok(())
    }

    fn load(&mut self) -> Result<Option<Snapshot>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Snapshot::from_json(&raw).map(Some)
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Holds the snapshot in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Option<Snapshot>,
}

impl PersistenceStore for MemoryStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn load(&mut self) -> Result<Option<Snapshot>, PersistenceError> {
        Ok(self.snapshot.clone())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.snapshot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WorkoutStore;
    use crate::types::{Coordinates, Workout};
    use chrono::{TimeZone, Utc};

    fn snapshot() -> Snapshot {
        let here = Coordinates::new(51.5, -0.12).unwrap();
        let mut store = WorkoutStore::new();
        store.add(
            Workout::running(here, 7.5, 41.0, 176.0, Utc.timestamp_millis_opt(1_713_087_000_123).unwrap())
                .unwrap(),
        );
        store.to_snapshot()
    }

    #[test]
    fn missing_file_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("workouts.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested").join("workouts.json"));

        store.save(&snapshot()).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot()));

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn garbage_on_disk_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workouts.json");
        fs::write(&path, "[{\"id\": 3").unwrap();

        let mut store = JsonFileStore::new(path);
        assert!(matches!(store.load(), Err(PersistenceError::Malformed(_))));
    }
}
