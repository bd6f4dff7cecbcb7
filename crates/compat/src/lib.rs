//! # Pairlink Compatibility Engine
//!
//! Computes a `[0.0, 1.0]` affinity score and the shared-interest set for
//! a pair of user profiles at the moment a pairing is minted.
//!
//! ## Contract
//!
//! - The engine is a pure function of `(user1, user2, config)`: no I/O,
//!   no network, no clock reads, and no global process state.
//! - For the same two profiles and the same [`CompatibilityConfig`], the
//!   output is bit identical across processes and platforms.
//! - `user1` is the code issuer and `user2` the redeemer; the interest
//!   term is normalized against the issuer's interest count.
//!
//! ## Score Composition
//!
//! Each term is clamped non-negative before summation and the total is
//! clamped to 1.0:
//!
//! 1. **Interest overlap** — `|interests1 ∩ interests2| / max(|interests1|, 1)`,
//!    weighted 0.4.
//! 2. **Preference baseline** — a fixed 0.15 contribution. This is a
//!    documented placeholder for future preference-similarity logic, kept
//!    deliberately non-structural.
//! 3. **Recency affinity** — `max(0, 1 - |Δlast_active| / 86400s)`,
//!    weighted 0.2. Users active within the same day score highest.
//! 4. **Variety term** — a stable SHA-256 hash of the concatenated user
//!    ids, reduced modulo 100 and scaled by 0.001. Distinct pairs spread
//!    out; the same pair always reproduces the same value.
//!
//! ## Example
//!
//! ```
//! use compat::{score, CompatibilityConfig};
//! use chrono::Utc;
//! use profile::UserProfile;
//!
//! fn user(id: &str, interests: &[&str]) -> UserProfile {
//!     let now = Utc::now();
//!     UserProfile {
//!         user_id: id.into(),
//!         username: id.into(),
//!         email: None,
//!         avatar_url: None,
//!         preferences: Default::default(),
//!         interests: interests.iter().map(|s| s.to_string()).collect(),
//!         created_at: now,
//!         last_active: now,
//!         is_verified: false,
//!     }
//! }
//!
//! let report = score(
//!     &user("alice_01", &["chess", "hiking"]),
//!     &user("bob_02", &["chess", "cooking"]),
//!     &CompatibilityConfig::default(),
//! );
//! assert_eq!(report.shared_interests, vec!["chess".to_string()]);
//! assert!(report.score > 0.15 && report.score <= 1.0);
//! ```
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use profile::UserProfile;

/// Weights and windows for the score terms. Defaults match the engine's
/// documented composition; the sum of weights plus the maximum variety
/// contribution stays within 1.0 for typical configs, and the final score
/// is clamped regardless.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompatibilityConfig {
    /// Weight of the interest-overlap term.
    pub interest_weight: f64,
    /// Fixed preference contribution. Placeholder for future
    /// preference-similarity logic; not a bug to tune away silently.
    pub preference_baseline: f64,
    /// Weight of the recency-affinity term.
    pub recency_weight: f64,
    /// Window over which last-active deltas decay to zero, in seconds.
    pub recency_window_secs: f64,
    /// Scale applied to the hash-derived variety value in `[0, 99]`.
    pub variety_scale: f64,
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        Self {
            interest_weight: 0.4,
            preference_baseline: 0.15,
            recency_weight: 0.2,
            recency_window_secs: 86_400.0,
            variety_scale: 0.001,
        }
    }
}

/// Result of scoring a pair of profiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompatibilityReport {
    /// Final clamped score in `[0.0, 1.0]`.
    pub score: f64,
    /// Literal intersection of both interest lists, in the issuer's
    /// interest order.
    pub shared_interests: Vec<String>,
}

/// Score two profiles. Pure and deterministic; see the crate docs for the
/// term-by-term composition.
pub fn score(
    user1: &UserProfile,
    user2: &UserProfile,
    cfg: &CompatibilityConfig,
) -> CompatibilityReport {
    let shared_interests = shared_interests(user1, user2);

    let interest_term = if user1.interests.is_empty() {
        0.0
    } else {
        shared_interests.len() as f64 / user1.interests.len().max(1) as f64 * cfg.interest_weight
    };

    let delta_secs = (user1.last_active - user2.last_active)
        .num_seconds()
        .unsigned_abs() as f64;
    let recency_term = (1.0 - delta_secs / cfg.recency_window_secs).max(0.0) * cfg.recency_weight;

    let variety_term = pair_hash_mod_100(&user1.user_id, &user2.user_id) as f64 * cfg.variety_scale;

    let total = interest_term.max(0.0)
        + cfg.preference_baseline.max(0.0)
        + recency_term.max(0.0)
        + variety_term.max(0.0);

    CompatibilityReport {
        score: total.min(1.0),
        shared_interests,
    }
}

/// The literal set intersection of both interest lists, preserving
/// `user1`'s order. Inputs are already deduplicated by registration
/// normalization.
pub fn shared_interests(user1: &UserProfile, user2: &UserProfile) -> Vec<String> {
    user1
        .interests
        .iter()
        .filter(|interest| user2.interests.contains(interest))
        .cloned()
        .collect()
}

/// Stable per-pair hash: SHA-256 over `user1_id ‖ user2_id`, first eight
/// bytes as a big-endian u64, reduced modulo 100. Order-sensitive, which
/// matches the issuer/redeemer slot semantics.
fn pair_hash_mod_100(user1_id: &str, user2_id: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(user1_id.as_bytes());
    hasher.update(user2_id.as_bytes());
    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix) % 100
}
