//! File-based backend: one JSON file per aggregate under a data directory.
//!
//! This is the deployment backend. Snapshots are written through a
//! temporary file followed by a rename so a crash mid-save leaves the
//! previous snapshot intact rather than a truncated file.
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::{Aggregate, StoreBackend};
use crate::error::StoreError;

/// Persists aggregates as `users.json`, `codes.json`, and `pairings.json`
/// under a single directory, created on open if missing.
pub struct JsonDirBackend {
    dir: PathBuf,
}

impl JsonDirBackend {
    /// Open (and create, if needed) the data directory.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, aggregate: Aggregate) -> PathBuf {
        self.dir.join(aggregate.file_name())
    }
}

impl StoreBackend for JsonDirBackend {
    fn load(&self, aggregate: Aggregate) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(aggregate);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, aggregate: Aggregate, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(aggregate);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_directory_and_round_trips() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let backend = JsonDirBackend::open(&dir).unwrap();

        assert!(backend.load(Aggregate::Pairings).unwrap().is_none());
        backend.save(Aggregate::Pairings, br#"{"p1":{}}"#).unwrap();
        assert_eq!(
            backend.load(Aggregate::Pairings).unwrap().unwrap(),
            br#"{"p1":{}}"#
        );
        assert!(dir.join("pairings.json").exists());
        assert!(!dir.join("pairings.json.tmp").exists());
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let tmp = TempDir::new().unwrap();
        let backend = JsonDirBackend::open(tmp.path()).unwrap();
        backend.save(Aggregate::Users, b"first").unwrap();
        backend.save(Aggregate::Users, b"second").unwrap();
        assert_eq!(backend.load(Aggregate::Users).unwrap().unwrap(), b"second");
    }
}
