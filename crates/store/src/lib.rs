//! # Pairlink Entity Store
//!
//! Owns the three entity aggregates — users, pairing codes, pairings —
//! plus the derived user→pairing-ids index, and moves them across the
//! persistence boundary as whole-aggregate snapshots.
//!
//! ## Contract
//!
//! - The store is the only owner of the entity maps. The pairing system
//!   reads and mutates through it, then calls [`EntityStore::persist`] to
//!   flush the complete state of one logical operation — there is no
//!   partial persistence of a multi-entity change.
//! - The index is never persisted. On [`EntityStore::open`] and on import
//!   it is rebuilt by iterating the pairings map and inserting each
//!   pairing id under both member user ids. Within a process session the
//!   per-user lists stay insertion-ordered via incremental maintenance.
//! - Concurrency is the caller's concern: the store is a plain key-value
//!   aggregate and mutating methods take `&mut self`.
//!
//! ## Data Flow
//!
//! ```text
//! BackendConfig ──build()──▶ StoreBackend
//!                                │ load (3 aggregates)
//!                                ▼
//!                      EntityStore { users, codes, pairings }
//!                                │ rebuild index from pairings
//!                                ▼
//!                      user_pairings: user_id → [pairing_id, …]
//! ```
use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, error, info};

use profile::{Pairing, PairingCode, UserProfile};

mod backend;
mod error;
mod snapshot;

pub use crate::backend::{
    Aggregate, BackendConfig, InMemoryBackend, JsonDirBackend, StoreBackend,
};
pub use crate::error::StoreError;
pub use crate::snapshot::{ExportDocument, EXPORT_VERSION};

/// Durable snapshot of the pairing engine's entities.
pub struct EntityStore {
    backend: Box<dyn StoreBackend>,
    users: HashMap<String, UserProfile>,
    codes: HashMap<String, PairingCode>,
    pairings: HashMap<String, Pairing>,
    /// Derived index: user id → insertion-ordered pairing ids.
    user_pairings: HashMap<String, Vec<String>>,
}

impl EntityStore {
    /// Build the configured backend, load any existing snapshots, and
    /// rebuild the index.
    pub fn open(config: &BackendConfig) -> Result<Self, StoreError> {
        Self::with_backend(config.build()?)
    }

    /// Fresh in-memory store, mostly for tests and ephemeral use.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(&BackendConfig::in_memory())
    }

    /// Wrap an already-constructed backend and load from it.
    pub fn with_backend(backend: Box<dyn StoreBackend>) -> Result<Self, StoreError> {
        let mut store = Self {
            backend,
            users: HashMap::new(),
            codes: HashMap::new(),
            pairings: HashMap::new(),
            user_pairings: HashMap::new(),
        };
        store.load()?;
        Ok(store)
    }

    fn load(&mut self) -> Result<(), StoreError> {
        if let Some(bytes) = self.backend.load(Aggregate::Users)? {
            self.users = serde_json::from_slice(&bytes)?;
        }
        if let Some(bytes) = self.backend.load(Aggregate::Codes)? {
            self.codes = serde_json::from_slice(&bytes)?;
        }
        if let Some(bytes) = self.backend.load(Aggregate::Pairings)? {
            self.pairings = serde_json::from_slice(&bytes)?;
        }
        self.rebuild_index();
        info!(
            users = self.users.len(),
            codes = self.codes.len(),
            pairings = self.pairings.len(),
            "store_loaded"
        );
        Ok(())
    }

    /// Flush all three aggregates through the backend.
    ///
    /// A failure here means durability is uncertain for the in-memory
    /// mutation that preceded it; the error is logged and propagated so
    /// callers can surface the degraded mode instead of assuming the write
    /// landed.
    pub fn persist(&self) -> Result<(), StoreError> {
        let result = self.persist_inner();
        if let Err(err) = &result {
            error!(error = %err, "store_save_failed");
        } else {
            debug!("store_saved");
        }
        result
    }

    fn persist_inner(&self) -> Result<(), StoreError> {
        self.backend
            .save(Aggregate::Users, &serde_json::to_vec_pretty(&self.users)?)?;
        self.backend
            .save(Aggregate::Codes, &serde_json::to_vec_pretty(&self.codes)?)?;
        self.backend.save(
            Aggregate::Pairings,
            &serde_json::to_vec_pretty(&self.pairings)?,
        )?;
        Ok(())
    }

    // ── Users ───────────────────────────────────────────────────────────

    pub fn user(&self, user_id: &str) -> Option<&UserProfile> {
        self.users.get(user_id)
    }

    pub fn user_mut(&mut self, user_id: &str) -> Option<&mut UserProfile> {
        self.users.get_mut(user_id)
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    /// Insert a profile and seed its (empty) index entry.
    pub fn insert_user(&mut self, user: UserProfile) {
        self.user_pairings.entry(user.user_id.clone()).or_default();
        self.users.insert(user.user_id.clone(), user);
    }

    pub fn users(&self) -> &HashMap<String, UserProfile> {
        &self.users
    }

    // ── Codes ───────────────────────────────────────────────────────────

    pub fn code(&self, code: &str) -> Option<&PairingCode> {
        self.codes.get(code)
    }

    pub fn code_mut(&mut self, code: &str) -> Option<&mut PairingCode> {
        self.codes.get_mut(code)
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.codes.contains_key(code)
    }

    pub fn insert_code(&mut self, code: PairingCode) {
        self.codes.insert(code.code.clone(), code);
    }

    pub fn codes(&self) -> &HashMap<String, PairingCode> {
        &self.codes
    }

    /// Mutable sweep access for the expiration pass.
    pub fn codes_values_mut(&mut self) -> impl Iterator<Item = &mut PairingCode> {
        self.codes.values_mut()
    }

    // ── Pairings & index ────────────────────────────────────────────────

    pub fn pairing(&self, pairing_id: &str) -> Option<&Pairing> {
        self.pairings.get(pairing_id)
    }

    pub fn pairing_mut(&mut self, pairing_id: &str) -> Option<&mut Pairing> {
        self.pairings.get_mut(pairing_id)
    }

    pub fn pairings(&self) -> &HashMap<String, Pairing> {
        &self.pairings
    }

    /// Mutable sweep access for the archival pass.
    pub fn pairings_values_mut(&mut self) -> impl Iterator<Item = &mut Pairing> {
        self.pairings.values_mut()
    }

    /// Insert a pairing and append its id under both members' index
    /// entries (incremental maintenance — never recomputed lazily).
    pub fn insert_pairing(&mut self, pairing: Pairing) {
        let id = pairing.pairing_id.clone();
        for member in [&pairing.user1_id, &pairing.user2_id] {
            self.user_pairings
                .entry(member.clone())
                .or_default()
                .push(id.clone());
        }
        self.pairings.insert(id, pairing);
    }

    /// Remove a pairing, pruning both members' index entries. Returns the
    /// removed record, or `None` for an unknown id.
    pub fn remove_pairing(&mut self, pairing_id: &str) -> Option<Pairing> {
        let pairing = self.pairings.remove(pairing_id)?;
        for member in [&pairing.user1_id, &pairing.user2_id] {
            if let Some(ids) = self.user_pairings.get_mut(member) {
                ids.retain(|id| id != pairing_id);
            }
        }
        Some(pairing)
    }

    /// The insertion-ordered pairing ids involving `user_id`. Unknown
    /// users yield an empty slice, not an error.
    pub fn pairing_ids_for(&self, user_id: &str) -> &[String] {
        self.user_pairings
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Recompute the index from the pairings map. Every registered user
    /// gets an entry (possibly empty); users referenced only by pairings
    /// get one too. Order across a rebuild follows pairing-map iteration
    /// and is not guaranteed stable across reloads.
    pub fn rebuild_index(&mut self) {
        self.user_pairings.clear();
        for user_id in self.users.keys() {
            self.user_pairings.insert(user_id.clone(), Vec::new());
        }
        for (pairing_id, pairing) in &self.pairings {
            for member in [&pairing.user1_id, &pairing.user2_id] {
                self.user_pairings
                    .entry(member.clone())
                    .or_default()
                    .push(pairing_id.clone());
            }
        }
    }

    // ── Export / import ─────────────────────────────────────────────────

    /// Snapshot the three aggregates into a versioned document. The index
    /// is not exported.
    pub fn export(&self) -> ExportDocument {
        ExportDocument {
            version: EXPORT_VERSION.to_string(),
            exported_at: Utc::now(),
            users: self.users.clone(),
            codes: self.codes.clone(),
            pairings: self.pairings.clone(),
        }
    }

    /// Replace all in-memory state with a document's aggregates and
    /// rebuild the index. The version check runs before anything is
    /// touched, so a rejected document leaves the pre-import state intact.
    /// Persistence is the caller's follow-up step.
    pub fn replace_all(&mut self, doc: ExportDocument) -> Result<(), StoreError> {
        doc.check_version()?;
        self.users = doc.users;
        self.codes = doc.codes;
        self.pairings = doc.pairings;
        self.rebuild_index();
        info!(
            users = self.users.len(),
            codes = self.codes.len(),
            pairings = self.pairings.len(),
            "store_replaced"
        );
        Ok(())
    }

    /// Entity counts as `(users, codes, pairings)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.users.len(), self.codes.len(), self.pairings.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use profile::{PairingStatus, NewUser};
    use serde_json::Map;
    use tempfile::TempDir;

    fn user(id: &str) -> UserProfile {
        let req = NewUser::new(id, "Someone");
        let now = Utc::now();
        UserProfile {
            user_id: req.user_id,
            username: req.username,
            email: None,
            avatar_url: None,
            preferences: Map::new(),
            interests: vec![],
            created_at: now,
            last_active: now,
            is_verified: false,
        }
    }

    fn pairing(id: &str, a: &str, b: &str) -> Pairing {
        let now = Utc::now();
        Pairing {
            pairing_id: id.into(),
            user1_id: a.into(),
            user2_id: b.into(),
            created_at: now,
            status: PairingStatus::Active,
            compatibility_score: 0.5,
            shared_interests: vec![],
            last_interaction: now,
            metadata: Map::new(),
        }
    }

    #[test]
    fn index_maintained_incrementally() {
        let mut store = EntityStore::in_memory().unwrap();
        store.insert_user(user("alice"));
        store.insert_user(user("bob"));
        assert!(store.pairing_ids_for("alice").is_empty());

        store.insert_pairing(pairing("p1", "alice", "bob"));
        store.insert_pairing(pairing("p2", "alice", "carol"));
        assert_eq!(store.pairing_ids_for("alice"), ["p1", "p2"]);
        assert_eq!(store.pairing_ids_for("bob"), ["p1"]);
        assert_eq!(store.pairing_ids_for("carol"), ["p2"]);

        let removed = store.remove_pairing("p1").unwrap();
        assert_eq!(removed.pairing_id, "p1");
        assert_eq!(store.pairing_ids_for("alice"), ["p2"]);
        assert!(store.pairing_ids_for("bob").is_empty());
        assert!(store.remove_pairing("p1").is_none());
    }

    #[test]
    fn persists_and_reloads_from_json_dir() {
        let tmp = TempDir::new().unwrap();
        let config = BackendConfig::json_dir(tmp.path());

        {
            let mut store = EntityStore::open(&config).unwrap();
            store.insert_user(user("alice"));
            store.insert_user(user("bob"));
            store.insert_pairing(pairing("p1", "alice", "bob"));
            store.persist().unwrap();
        }

        let reopened = EntityStore::open(&config).unwrap();
        assert_eq!(reopened.counts(), (2, 0, 1));
        assert_eq!(reopened.pairing_ids_for("alice"), ["p1"]);
        assert_eq!(reopened.pairing_ids_for("bob"), ["p1"]);
    }

    #[test]
    fn export_then_replace_is_observationally_identical() {
        let mut store = EntityStore::in_memory().unwrap();
        store.insert_user(user("alice"));
        store.insert_user(user("bob"));
        store.insert_pairing(pairing("p1", "alice", "bob"));

        let doc = store.export();

        let mut other = EntityStore::in_memory().unwrap();
        other.replace_all(doc).unwrap();
        assert_eq!(other.users(), store.users());
        assert_eq!(other.codes(), store.codes());
        assert_eq!(other.pairings(), store.pairings());
        assert_eq!(other.pairing_ids_for("alice"), ["p1"]);
    }

    #[test]
    fn replace_rejects_bad_version_and_keeps_state() {
        let mut store = EntityStore::in_memory().unwrap();
        store.insert_user(user("alice"));

        let mut doc = store.export();
        doc.version = "0.9".into();
        let err = store.replace_all(doc).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedSnapshotVersion(_)));
        assert!(store.contains_user("alice"));
    }

    #[test]
    fn rebuild_seeds_empty_entries_for_all_users() {
        let mut store = EntityStore::in_memory().unwrap();
        store.insert_user(user("loner"));
        store.rebuild_index();
        assert!(store.pairing_ids_for("loner").is_empty());
        // Slice, not a missing-user error.
        assert!(store.pairing_ids_for("ghost").is_empty());
    }
}
