//! Pairlink entity model and validation layer.
//!
//! This is where caller input enters the pairing engine. The crate owns
//! the three persisted entity shapes — [`UserProfile`], [`PairingCode`],
//! and [`Pairing`] — plus the pure validation gates the pairing system
//! runs before any mutation.
//!
//! ## What lives here
//!
//! - **Entity types** — serde-ready records with ISO-8601 timestamps and
//!   lowercase-string enums ([`PairingStatus`], [`CodeTheme`])
//! - **Validation** — pure predicates over registration input, code
//!   format, issuance parameters, and opaque metadata blobs. No I/O, no
//!   clock beyond what the caller passes in.
//! - **Limits** — [`ValidationConfig`] with the engine's documented
//!   defaults (user_id 3–50 chars, durations 1–720 h, metadata ≤10 KB, …)
//!
//! Errors are typed ([`ValidationError`]) so adapters can render a
//! specific message per failure instead of string-matching.
//!
//! ## Example
//!
//! ```
//! use profile::{validate_new_user, NewUser, ValidationConfig};
//!
//! let cfg = ValidationConfig::default();
//! let req = NewUser::new("alice_01", "Alice").with_interests(["chess"]);
//! assert!(validate_new_user(&req, &cfg).is_ok());
//! ```
mod config;
mod error;
mod types;
mod validation;

pub use crate::config::{ConfigError, ValidationConfig};
pub use crate::error::ValidationError;
pub use crate::types::{
    CodeTheme, NewUser, Pairing, PairingCode, PairingStatus, UserProfile, UserUpdate,
    DEFAULT_CODE_LIFETIME_HOURS,
};
pub use crate::validation::{
    coerce_metadata, coerce_preferences, normalize_interests, validate_code_format, validate_duration_hours,
    validate_email, validate_interest, validate_max_uses, validate_metadata_size,
    validate_new_user, validate_user_id, validate_username,
};
