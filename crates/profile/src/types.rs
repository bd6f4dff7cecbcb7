//! Core entity types for the pairing engine.
//!
//! These types represent the three persisted aggregates — users, pairing
//! codes, and pairings — plus the request shapes callers hand to the
//! pairing system. They are designed to be:
//!
//! - **Serializable**: JSON persistence via serde, with ISO-8601 timestamps
//!   and enums as lowercase strings
//! - **Cloneable**: Cheap to clone for snapshot export
//! - **Comparable**: Support equality checks for testing
//!
//! # Type Hierarchy
//!
//! ```text
//! UserProfile                 PairingCode                Pairing
//! ├── user_id                 ├── code (key)             ├── pairing_id (key)
//! ├── username                ├── owner_id → UserProfile ├── user1_id → UserProfile
//! ├── email?                  ├── created_at             ├── user2_id → UserProfile
//! ├── avatar_url?             ├── expires_at             ├── created_at
//! ├── preferences             ├── max_uses / uses_count  ├── status
//! ├── interests               ├── theme / is_animated    ├── compatibility_score
//! ├── created_at              ├── is_active              ├── shared_interests
//! ├── last_active             └── metadata               ├── last_interaction
//! └── is_verified                                        └── metadata
//! ```
//!
//! Derived state is never stored: a code's validity is computed from
//! `is_active`, `uses_count`, and `expires_at`; the user→pairings index
//! lives in the store and is rebuilt from the pairing map on load.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default code lifetime applied when issuance does not specify one.
pub const DEFAULT_CODE_LIFETIME_HOURS: i64 = 24;

/// Status of a pairing relationship.
///
/// Persisted as its lowercase string form; unknown strings are rejected at
/// deserialization time.
///
/// `Pending` is a reserved state: the redemption flow creates pairings
/// directly in `Active` and nothing currently transitions into or out of
/// `Pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PairingStatus {
    Pending,
    Active,
    Expired,
    Revoked,
    Archived,
}

/// Visual theme attached to a pairing code.
///
/// The engine treats this as an opaque label; rendering is the caller's
/// concern. Persisted as a lowercase string.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CodeTheme {
    #[default]
    Default,
    Neon,
    Cyberpunk,
    Matrix,
    Aurora,
    Hologram,
}

/// A registered user profile.
///
/// Created once via registration and mutated only through the allow-listed
/// [`UserUpdate`] fields. Never deleted by the core; import may replace the
/// whole user set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Caller-assigned unique identifier, 3–50 chars of `[A-Za-z0-9_-]`.
    pub user_id: String,
    /// Display name, 2–30 chars.
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Opaque caller preferences. Flat string→value mapping, size-bounded
    /// at validation time.
    #[serde(default)]
    pub preferences: Map<String, Value>,
    /// Ordered set of interest labels, each ≤50 chars. Duplicates are
    /// dropped at registration, preserving first occurrence.
    #[serde(default)]
    pub interests: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    #[serde(default)]
    pub is_verified: bool,
}

/// A redeemable pairing code owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PairingCode {
    /// The code string itself; unique key in the code map.
    pub code: String,
    /// Must reference a registered user.
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// How many successful redemptions this code may mint. Always ≥1.
    pub max_uses: u32,
    /// Successful redemptions so far. Never exceeds `max_uses`.
    #[serde(default)]
    pub uses_count: u32,
    #[serde(default)]
    pub theme: CodeTheme,
    #[serde(default = "default_true")]
    pub is_animated: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

impl PairingCode {
    /// Construct a fresh, active code. `expires_at` defaults to
    /// `created_at + 24h` when not supplied.
    pub fn new(
        code: String,
        owner_id: String,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
        max_uses: u32,
    ) -> Self {
        let expires_at =
            expires_at.unwrap_or(created_at + Duration::hours(DEFAULT_CODE_LIFETIME_HOURS));
        Self {
            code,
            owner_id,
            created_at,
            expires_at,
            max_uses,
            uses_count: 0,
            theme: CodeTheme::default(),
            is_animated: true,
            is_active: true,
            metadata: Map::new(),
        }
    }

    /// Derived validity: active, under its use limit, and not yet expired
    /// as of `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.uses_count < self.max_uses && now < self.expires_at
    }

    /// [`is_valid_at`](Self::is_valid_at) against the current clock.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Time remaining until expiry, clamped to zero once past.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    /// Consume one use if the code is currently valid. Returns whether the
    /// use was recorded.
    pub fn use_once(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_valid_at(now) {
            self.uses_count += 1;
            true
        } else {
            false
        }
    }

    /// Deactivate the code. Revoked codes stay in the map for audit until
    /// bulk cleanup removes them.
    pub fn revoke(&mut self) {
        self.is_active = false;
    }
}

/// A bidirectional relationship between two users, minted by redemption.
///
/// `user1_id` is the code issuer and `user2_id` the redeemer; the
/// relationship itself is unordered. At most one **active** pairing may
/// exist between any two distinct users — the pairing system enforces this
/// at redemption time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pairing {
    pub pairing_id: String,
    pub user1_id: String,
    pub user2_id: String,
    pub created_at: DateTime<Utc>,
    pub status: PairingStatus,
    /// Compatibility in `[0.0, 1.0]`, computed once at creation.
    pub compatibility_score: f64,
    #[serde(default)]
    pub shared_interests: Vec<String>,
    pub last_interaction: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Pairing {
    /// Whether the pairing is in `Active` status.
    pub fn is_active(&self) -> bool {
        self.status == PairingStatus::Active
    }

    /// Whether `user_id` occupies either slot.
    pub fn involves(&self, user_id: &str) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The other member relative to `user_id`, if `user_id` is a member.
    pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
        if self.user1_id == user_id {
            Some(&self.user2_id)
        } else if self.user2_id == user_id {
            Some(&self.user1_id)
        } else {
            None
        }
    }

    /// Bump `last_interaction` to `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_interaction = now;
    }
}

/// Registration request.
///
/// `user_id` and `username` are required; everything else defaults. The
/// raw `preferences` value is accepted as loose JSON and validated to be a
/// flat object before the profile is constructed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewUser {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub preferences: Option<Value>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub is_verified: bool,
}

impl NewUser {
    /// Minimal request with just the required identity fields.
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    /// Builder-style interest list.
    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }
}

/// Allow-listed profile mutation. `None` fields are left untouched.
///
/// This is the only way an existing profile changes; `user_id`,
/// `created_at`, and `last_active` are never caller-writable
/// (`last_active` is bumped by the update itself).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub preferences: Option<Value>,
    pub interests: Option<Vec<String>>,
    pub is_verified: Option<bool>,
}

impl UserUpdate {
    /// Whether the update carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.avatar_url.is_none()
            && self.preferences.is_none()
            && self.interests.is_none()
            && self.is_verified.is_none()
    }
}
