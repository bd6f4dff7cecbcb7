//! Pluggable persistence backend for the entity store.
//!
//! The store keeps its working state in memory and flushes each aggregate
//! (users, codes, pairings) through a [`StoreBackend`] as an opaque byte
//! snapshot. This keeps the storage boundary swappable: tests run against
//! the in-memory backend, deployments persist JSON files on disk.
//!
//! The derived user→pairings index never crosses this boundary — it is a
//! pure function of the pairings aggregate and is rebuilt on load.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::StoreError;

mod json_dir;

pub use json_dir::JsonDirBackend;

/// The three independently loadable/saveable aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Users,
    Codes,
    Pairings,
}

impl Aggregate {
    /// All aggregates, in load order.
    pub const ALL: [Aggregate; 3] = [Aggregate::Users, Aggregate::Codes, Aggregate::Pairings];

    /// File name used by file-based backends.
    pub fn file_name(&self) -> &'static str {
        match self {
            Aggregate::Users => "users.json",
            Aggregate::Codes => "codes.json",
            Aggregate::Pairings => "pairings.json",
        }
    }
}

/// Trait for an aggregate-snapshot storage backend.
///
/// Implementations persist whole aggregates at a time; partial updates are
/// deliberately not part of the contract, since every mutating operation
/// in the engine flushes its full read-mutate-persist unit.
pub trait StoreBackend: Send + Sync {
    /// Load the latest snapshot of an aggregate. `None` means the
    /// aggregate has never been saved (fresh store).
    fn load(&self, aggregate: Aggregate) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the stored snapshot of an aggregate.
    fn save(&self, aggregate: Aggregate, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Configuration for selecting and building a backend.
///
/// # Example
/// ```
/// use store::BackendConfig;
///
/// // In-memory (for testing)
/// let config = BackendConfig::in_memory();
///
/// // JSON files under a data directory
/// let config = BackendConfig::json_dir("/var/lib/pairlink");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// Keep snapshots in a process-local map. Useful for tests and
    /// ephemeral stores; contents are lost on drop.
    #[default]
    InMemory,
    /// Persist one pretty-printed JSON file per aggregate under `path`
    /// (`users.json`, `codes.json`, `pairings.json`).
    JsonDir { path: PathBuf },
}

impl BackendConfig {
    /// Create an in-memory backend configuration.
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    /// Create a JSON-directory backend configuration rooted at `path`.
    pub fn json_dir<P: Into<PathBuf>>(path: P) -> Self {
        BackendConfig::JsonDir { path: path.into() }
    }

    /// Build the backend for this configuration.
    pub fn build(&self) -> Result<Box<dyn StoreBackend>, StoreError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::JsonDir { path } => Ok(Box::new(JsonDirBackend::open(path)?)),
        }
    }
}

/// In-memory backend over a `RwLock<HashMap>`.
#[derive(Default)]
pub struct InMemoryBackend {
    snapshots: RwLock<HashMap<Aggregate, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for InMemoryBackend {
    fn load(&self, aggregate: Aggregate) -> Result<Option<Vec<u8>>, StoreError> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| StoreError::backend("in-memory snapshot lock poisoned"))?;
        Ok(snapshots.get(&aggregate).cloned())
    }

    fn save(&self, aggregate: Aggregate, bytes: &[u8]) -> Result<(), StoreError> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| StoreError::backend("in-memory snapshot lock poisoned"))?;
        snapshots.insert(aggregate, bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_round_trip() {
        let backend = InMemoryBackend::new();
        assert!(backend.load(Aggregate::Users).unwrap().is_none());
        backend.save(Aggregate::Users, b"{}").unwrap();
        assert_eq!(backend.load(Aggregate::Users).unwrap().unwrap(), b"{}");
        // Aggregates are independent.
        assert!(backend.load(Aggregate::Codes).unwrap().is_none());
    }

    #[test]
    fn aggregate_file_names_are_stable() {
        assert_eq!(Aggregate::Users.file_name(), "users.json");
        assert_eq!(Aggregate::Codes.file_name(), "codes.json");
        assert_eq!(Aggregate::Pairings.file_name(), "pairings.json");
    }
}
