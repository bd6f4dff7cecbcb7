//! The pairing system: orchestration over validation, the entity store,
//! and the compatibility engine.
//!
//! Every mutating operation is one atomic unit — validate, mutate the
//! in-memory store, persist — and takes `&mut self`, so the borrow checker
//! enforces the mutual-exclusion discipline the engine's invariants need.
//! Callers in concurrent environments wrap the system in a `Mutex` (or
//! `RwLock` when read operations should proceed concurrently).
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use compat::CompatibilityConfig;
use profile::{
    coerce_metadata, coerce_preferences, normalize_interests, validate_code_format,
    validate_duration_hours, validate_email, validate_interest, validate_max_uses,
    validate_metadata_size, validate_new_user, validate_username, CodeTheme, NewUser, Pairing,
    PairingCode, PairingStatus, UserProfile, UserUpdate, ValidationConfig,
    DEFAULT_CODE_LIFETIME_HOURS,
};
use store::{BackendConfig, EntityStore, ExportDocument};

use crate::codegen::{self, CodeGenConfig, CodeGenError};
use crate::error::{PairingError, RedeemError};


/// Issuance request for a pairing code. Defaults: single use, 24-hour
/// lifetime, default theme, animated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeRequest {
    pub owner_id: String,
    pub max_uses: u32,
    pub expires_hours: u32,
    pub theme: CodeTheme,
    pub is_animated: bool,
    /// Opaque caller metadata; must be a flat JSON object within the
    /// configured size cap.
    pub metadata: Option<Value>,
}

impl CodeRequest {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            max_uses: 1,
            expires_hours: DEFAULT_CODE_LIFETIME_HOURS as u32,
            theme: CodeTheme::default(),
            is_animated: true,
            metadata: None,
        }
    }

    pub fn with_max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = max_uses;
        self
    }

    pub fn with_expiry_hours(mut self, hours: u32) -> Self {
        self.expires_hours = hours;
        self
    }

    pub fn with_theme(mut self, theme: CodeTheme) -> Self {
        self.theme = theme;
        self
    }
}

/// Per-user aggregate returned by [`PairingSystem::user_stats`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserStats {
    pub user_id: String,
    pub total_pairings: usize,
    pub active_pairings: usize,
    pub codes_generated: usize,
    /// Codes owned by the user that are currently redeemable.
    pub active_codes: usize,
    /// Mean compatibility across active pairings; 0 when there are none.
    pub compatibility_avg: f64,
    /// The most frequently recurring shared interest across the user's
    /// pairings, first-encountered winning ties. `None` when no pairing
    /// shares any interest.
    pub most_common_interest: Option<String>,
}

/// Counts returned by one [`PairingSystem::cleanup_expired`] sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanupReport {
    pub expired_codes: usize,
    pub archived_pairings: usize,
}

/// Pairing retention window: non-active pairings untouched for this long
/// are archived by the cleanup sweep.
const ARCHIVE_AFTER_DAYS: i64 = 30;

/// Orchestrates the pairing-code lifecycle.
///
/// ```
/// use pairlink::{CodeRequest, PairingSystem};
/// use profile::NewUser;
/// use store::{BackendConfig, EntityStore};
///
/// let store = EntityStore::open(&BackendConfig::in_memory()).unwrap();
/// let mut system = PairingSystem::new(store);
///
/// system
///     .register_user(NewUser::new("alice_01", "Alice").with_interests(["chess"]))
///     .unwrap();
/// system
///     .register_user(NewUser::new("bob_02", "Bob").with_interests(["chess"]))
///     .unwrap();
///
/// let code = system
///     .generate_pairing_code(CodeRequest::new("alice_01"))
///     .unwrap();
/// let pairing_id = system.use_code(&code.code, "bob_02").unwrap();
/// assert!(system.get_pairing(&pairing_id).unwrap().is_active());
/// ```
pub struct PairingSystem {
    store: EntityStore,
    validation: ValidationConfig,
    compat_cfg: CompatibilityConfig,
    codegen_cfg: CodeGenConfig,
}

impl PairingSystem {
    /// Wrap an already-loaded store with default configs.
    pub fn new(store: EntityStore) -> Self {
        Self::with_configs(
            store,
            ValidationConfig::default(),
            CompatibilityConfig::default(),
            CodeGenConfig::default(),
        )
    }

    /// Wrap a store with explicit per-stage configs.
    pub fn with_configs(
        store: EntityStore,
        validation: ValidationConfig,
        compat_cfg: CompatibilityConfig,
        codegen_cfg: CodeGenConfig,
    ) -> Self {
        Self {
            store,
            validation,
            compat_cfg,
            codegen_cfg,
        }
    }

    /// Open the configured backend and wrap the loaded store.
    pub fn open(config: &BackendConfig) -> Result<Self, PairingError> {
        Ok(Self::new(EntityStore::open(config)?))
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    // ── Users ───────────────────────────────────────────────────────────

    /// Register a new user. Validation runs first; a duplicate `user_id`
    /// fails with [`PairingError::AlreadyExists`] and leaves the original
    /// profile untouched.
    pub fn register_user(&mut self, req: NewUser) -> Result<UserProfile, PairingError> {
        validate_new_user(&req, &self.validation)?;
        if self.store.contains_user(&req.user_id) {
            return Err(PairingError::AlreadyExists(req.user_id));
        }

        let preferences = match &req.preferences {
            Some(value) => {
                validate_metadata_size(value, &self.validation)?;
                coerce_preferences(value)?
            }
            None => Map::new(),
        };
        let now = Utc::now();
        let user = UserProfile {
            user_id: req.user_id,
            username: req.username,
            email: req.email,
            avatar_url: req.avatar_url,
            preferences,
            interests: normalize_interests(&req.interests),
            created_at: now,
            last_active: now,
            is_verified: req.is_verified,
        };

        self.store.insert_user(user.clone());
        self.store.persist()?;
        info!(user_id = %user.user_id, username = %user.username, "user_registered");
        Ok(user)
    }

    /// Lookup by user id.
    pub fn get_user(&self, user_id: &str) -> Option<&UserProfile> {
        self.store.user(user_id)
    }

    /// Apply an allow-listed profile update and bump `last_active`. New
    /// values are validated before anything is written.
    pub fn update_user(
        &mut self,
        user_id: &str,
        update: UserUpdate,
    ) -> Result<UserProfile, PairingError> {
        if let Some(username) = &update.username {
            validate_username(username, &self.validation)?;
        }
        if let Some(Some(email)) = &update.email {
            validate_email(email)?;
        }
        let interests = match &update.interests {
            Some(list) => {
                for interest in list {
                    validate_interest(interest, &self.validation)?;
                }
                Some(normalize_interests(list))
            }
            None => None,
        };
        let preferences = match &update.preferences {
            Some(value) => {
                validate_metadata_size(value, &self.validation)?;
                Some(coerce_preferences(value)?)
            }
            None => None,
        };

        let now = Utc::now();
        let user = self
            .store
            .user_mut(user_id)
            .ok_or_else(|| PairingError::UnknownUser(user_id.to_string()))?;
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(avatar_url) = update.avatar_url {
            user.avatar_url = avatar_url;
        }
        if let Some(preferences) = preferences {
            user.preferences = preferences;
        }
        if let Some(interests) = interests {
            user.interests = interests;
        }
        if let Some(is_verified) = update.is_verified {
            user.is_verified = is_verified;
        }
        user.last_active = now;
        let updated = user.clone();

        self.store.persist()?;
        debug!(user_id = %user_id, "user_updated");
        Ok(updated)
    }

    // ── Codes ───────────────────────────────────────────────────────────

    /// Issue a fresh pairing code for a registered owner.
    pub fn generate_pairing_code(&mut self, req: CodeRequest) -> Result<PairingCode, PairingError> {
        if !self.store.contains_user(&req.owner_id) {
            return Err(PairingError::UnknownUser(req.owner_id));
        }
        validate_duration_hours(req.expires_hours, &self.validation)?;
        validate_max_uses(req.max_uses, &self.validation)?;
        let metadata = match &req.metadata {
            Some(value) => {
                validate_metadata_size(value, &self.validation)?;
                coerce_metadata(value)?
            }
            None => Map::new(),
        };

        let code_str = codegen::generate_code(&self.codegen_cfg, |candidate| {
            self.store.contains_code(candidate)
        })
        .map_err(|CodeGenError::Saturated { max_len }| PairingError::CodeSpaceSaturated {
            max_len,
        })?;

        let now = Utc::now();
        let mut code = PairingCode::new(
            code_str,
            req.owner_id,
            now,
            Some(now + Duration::hours(req.expires_hours as i64)),
            req.max_uses,
        );
        code.theme = req.theme;
        code.is_animated = req.is_animated;
        code.metadata = metadata;

        self.store.insert_code(code.clone());
        self.store.persist()?;
        info!(
            code = %code.code,
            owner_id = %code.owner_id,
            max_uses = code.max_uses,
            "code_generated"
        );
        Ok(code)
    }

    /// Lookup by code value.
    pub fn get_pairing_code(&self, code: &str) -> Option<&PairingCode> {
        self.store.code(code)
    }

    /// Deactivate a code ahead of its expiry. Returns whether the code
    /// existed.
    pub fn revoke_code(&mut self, code: &str) -> Result<bool, PairingError> {
        match self.store.code_mut(code) {
            None => Ok(false),
            Some(pairing_code) => {
                pairing_code.revoke();
                self.store.persist()?;
                info!(code = %code, "code_revoked");
                Ok(true)
            }
        }
    }

    // ── Redemption ──────────────────────────────────────────────────────

    /// Redeem a code on behalf of `user_id`, minting a new active pairing
    /// with the code's owner.
    ///
    /// The checks short-circuit in order: unknown code, self-pair,
    /// unusable code (inactive/expired/used up), unregistered redeemer,
    /// existing active pairing between the two users. Only then is the
    /// use counted and the pairing created. This sequence is the engine's
    /// core contract: a code mints at most `max_uses` pairings, never two
    /// active pairings between the same pair, and never a self-pairing.
    pub fn use_code(&mut self, code: &str, user_id: &str) -> Result<String, RedeemError> {
        let now = Utc::now();
        if !validate_code_format(code, &self.validation) {
            return Err(RedeemError::InvalidCode);
        }
        let (owner_id, usable) = match self.store.code(code) {
            None => return Err(RedeemError::InvalidCode),
            Some(pairing_code) => (
                pairing_code.owner_id.clone(),
                pairing_code.is_valid_at(now),
            ),
        };
        // Self-redemption is refused outright, even on a code that is
        // already expired or exhausted.
        if owner_id == user_id {
            return Err(RedeemError::SelfPair);
        }
        if !usable {
            return Err(RedeemError::CodeNotUsable);
        }
        if !self.store.contains_user(user_id) {
            return Err(RedeemError::UnknownUser(user_id.to_string()));
        }

        let already_paired = self.store.pairing_ids_for(user_id).iter().any(|pid| {
            self.store.pairing(pid).is_some_and(|pairing| {
                pairing.is_active() && pairing.counterpart_of(user_id) == Some(owner_id.as_str())
            })
        });
        if already_paired {
            return Err(RedeemError::AlreadyPaired);
        }

        // Atomic use-increment. Validity was checked above, so a refusal
        // here means the limit is already consumed.
        let used = self
            .store
            .code_mut(code)
            .map(|pairing_code| pairing_code.use_once(now))
            .unwrap_or(false);
        if !used {
            return Err(RedeemError::UsageLimitReached);
        }

        let report = match (self.store.user(&owner_id), self.store.user(user_id)) {
            (Some(owner), Some(redeemer)) => compat::score(owner, redeemer, &self.compat_cfg),
            // Both were confirmed registered before the increment.
            _ => return Err(RedeemError::UnknownUser(user_id.to_string())),
        };

        let pairing_id = Uuid::new_v4().to_string();
        let pairing = Pairing {
            pairing_id: pairing_id.clone(),
            user1_id: owner_id.clone(),
            user2_id: user_id.to_string(),
            created_at: now,
            status: PairingStatus::Active,
            compatibility_score: report.score,
            shared_interests: report.shared_interests,
            last_interaction: now,
            metadata: Map::new(),
        };
        self.store.insert_pairing(pairing);
        self.store.persist()?;
        info!(
            pairing_id = %pairing_id,
            user1_id = %owner_id,
            user2_id = %user_id,
            "pairing_created"
        );
        Ok(pairing_id)
    }

    // ── Pairings ────────────────────────────────────────────────────────

    /// All pairings involving `user_id`, optionally filtered by status,
    /// sorted by `last_interaction` descending. Unknown users yield an
    /// empty list.
    pub fn get_user_pairings(
        &self,
        user_id: &str,
        status: Option<PairingStatus>,
    ) -> Vec<Pairing> {
        let mut pairings: Vec<Pairing> = self
            .store
            .pairing_ids_for(user_id)
            .iter()
            .filter_map(|pid| self.store.pairing(pid))
            .filter(|pairing| status.is_none_or(|s| pairing.status == s))
            .cloned()
            .collect();
        pairings.sort_by(|a, b| b.last_interaction.cmp(&a.last_interaction));
        pairings
    }

    /// Lookup by pairing id.
    pub fn get_pairing(&self, pairing_id: &str) -> Option<&Pairing> {
        self.store.pairing(pairing_id)
    }

    /// Set a pairing's status and bump `last_interaction`. Unknown ids
    /// are a no-op returning `Ok(None)`.
    pub fn update_pairing_status(
        &mut self,
        pairing_id: &str,
        status: PairingStatus,
    ) -> Result<Option<Pairing>, PairingError> {
        let now = Utc::now();
        let updated = match self.store.pairing_mut(pairing_id) {
            None => return Ok(None),
            Some(pairing) => {
                pairing.status = status;
                pairing.touch(now);
                pairing.clone()
            }
        };
        self.store.persist()?;
        info!(pairing_id = %pairing_id, status = ?status, "pairing_status_updated");
        Ok(Some(updated))
    }

    /// Remove a pairing and prune both index entries. Returns whether the
    /// pairing existed.
    pub fn delete_pairing(&mut self, pairing_id: &str) -> Result<bool, PairingError> {
        if self.store.remove_pairing(pairing_id).is_none() {
            return Ok(false);
        }
        self.store.persist()?;
        info!(pairing_id = %pairing_id, "pairing_deleted");
        Ok(true)
    }

    // ── Aggregates ──────────────────────────────────────────────────────

    /// Aggregate statistics for one user. `None` for unregistered ids.
    pub fn user_stats(&self, user_id: &str) -> Option<UserStats> {
        if !self.store.contains_user(user_id) {
            return None;
        }
        let now = Utc::now();

        let mut total_pairings = 0usize;
        let mut active_pairings = 0usize;
        let mut score_sum = 0.0f64;
        let mut interest_counts: Vec<(String, usize)> = Vec::new();
        for pid in self.store.pairing_ids_for(user_id) {
            let Some(pairing) = self.store.pairing(pid) else {
                continue;
            };
            total_pairings += 1;
            if pairing.is_active() {
                active_pairings += 1;
                score_sum += pairing.compatibility_score;
            }
            for interest in &pairing.shared_interests {
                match interest_counts.iter_mut().find(|(name, _)| name == interest) {
                    Some((_, count)) => *count += 1,
                    None => interest_counts.push((interest.clone(), 1)),
                }
            }
        }

        // First-encountered interest wins ties: only a strictly greater
        // count displaces the running best.
        let most_common_interest = interest_counts
            .iter()
            .fold(None::<(&str, usize)>, |best, (name, count)| match best {
                Some((_, best_count)) if *count <= best_count => best,
                _ => Some((name.as_str(), *count)),
            })
            .map(|(name, _)| name.to_string());

        let codes_generated = self
            .store
            .codes()
            .values()
            .filter(|c| c.owner_id == user_id)
            .count();
        let active_codes = self
            .store
            .codes()
            .values()
            .filter(|c| c.owner_id == user_id && c.is_valid_at(now))
            .count();

        Some(UserStats {
            user_id: user_id.to_string(),
            total_pairings,
            active_pairings,
            codes_generated,
            active_codes,
            compatibility_avg: if active_pairings > 0 {
                score_sum / active_pairings as f64
            } else {
                0.0
            },
            most_common_interest,
        })
    }

    /// Sweep expired codes inactive and archive stale non-active
    /// pairings. Idempotent: entities already swept are not recounted, so
    /// back-to-back runs report zero on the second pass.
    pub fn cleanup_expired(&mut self) -> Result<CleanupReport, PairingError> {
        let now = Utc::now();
        let cutoff = now - Duration::days(ARCHIVE_AFTER_DAYS);

        let mut expired_codes = 0usize;
        for code in self.store.codes_values_mut() {
            if code.is_active && now > code.expires_at {
                code.is_active = false;
                expired_codes += 1;
            }
        }

        let mut archived_pairings = 0usize;
        for pairing in self.store.pairings_values_mut() {
            let stale = pairing.status != PairingStatus::Active
                && pairing.status != PairingStatus::Archived
                && pairing.last_interaction < cutoff;
            if stale {
                pairing.status = PairingStatus::Archived;
                archived_pairings += 1;
            }
        }

        if expired_codes > 0 || archived_pairings > 0 {
            self.store.persist()?;
        }
        debug!(expired_codes, archived_pairings, "cleanup_swept");
        Ok(CleanupReport {
            expired_codes,
            archived_pairings,
        })
    }

    // ── Export / import ─────────────────────────────────────────────────

    /// Snapshot the full store into a versioned document.
    pub fn export_data(&self) -> ExportDocument {
        self.store.export()
    }

    /// Replace all state with a document's aggregates and rebuild the
    /// index. A rejected document (bad version) leaves the pre-import
    /// state intact.
    pub fn import_data(&mut self, doc: ExportDocument) -> Result<(), PairingError> {
        self.store.replace_all(doc)?;
        self.store.persist()?;
        info!("data_imported");
        Ok(())
    }

    /// Parse and import a document from JSON text. Parsing completes
    /// before any destructive replacement begins, so malformed payloads
    /// never corrupt the store.
    pub fn import_json(&mut self, json: &str) -> Result<(), PairingError> {
        let doc = ExportDocument::from_json(json).map_err(PairingError::Store)?;
        self.import_data(doc)
    }
}
