//! Workspace umbrella crate for Pairlink.
//!
//! Pairlink is a pairing-code lifecycle and compatibility-matching
//! engine: a user mints a short-lived, limited-use numeric code; another
//! user redeems it to form a bidirectional pairing scored for affinity.
//! This crate stitches the member stages together so callers drive
//! everything through a single [`PairingSystem`]:
//!
//! - `profile` — entity model and pure input validation
//! - `store` — the three entity aggregates, derived user→pairings index,
//!   and the pluggable snapshot persistence boundary
//! - `compat` — deterministic compatibility scoring
//!
//! ## The core contract
//!
//! Redemption ([`PairingSystem::use_code`]) enforces, in order: the code
//! exists, is still usable, is not being self-redeemed, and no active
//! pairing already links the two users. A code mints at most `max_uses`
//! pairings; at most one active pairing exists per user pair.
//!
//! ## Concurrency
//!
//! The engine is synchronous and call-and-return. Mutating operations
//! take `&mut self` and run their whole validate-mutate-persist sequence
//! before returning; wrap the system in a `Mutex` to share it across
//! threads.
//!
//! ## Example
//!
//! ```
//! use pairlink::{BackendConfig, CodeRequest, NewUser, PairingSystem, RedeemError};
//!
//! let mut system = PairingSystem::open(&BackendConfig::in_memory()).unwrap();
//! system.register_user(NewUser::new("issuer_1", "Issuer")).unwrap();
//! system.register_user(NewUser::new("friend_1", "Friend")).unwrap();
//!
//! let code = system
//!     .generate_pairing_code(CodeRequest::new("issuer_1").with_max_uses(1))
//!     .unwrap();
//! let pairing_id = system.use_code(&code.code, "friend_1").unwrap();
//! assert!(system.get_pairing(&pairing_id).unwrap().is_active());
//!
//! // The single use is consumed; a further redemption is refused.
//! system.register_user(NewUser::new("third_1", "Third")).unwrap();
//! assert!(matches!(
//!     system.use_code(&code.code, "third_1"),
//!     Err(RedeemError::CodeNotUsable)
//! ));
//! ```
pub use compat::{score, shared_interests, CompatibilityConfig, CompatibilityReport};
pub use profile::{
    CodeTheme, ConfigError, NewUser, Pairing, PairingCode, PairingStatus, UserProfile, UserUpdate,
    ValidationConfig, ValidationError,
};
pub use store::{
    Aggregate, BackendConfig, EntityStore, ExportDocument, StoreBackend, StoreError,
    EXPORT_VERSION,
};

mod codegen;
mod error;
mod system;

pub use crate::codegen::{generate_code, CodeGenConfig, CodeGenError};
pub use crate::error::{PairingError, RedeemError};
pub use crate::system::{CleanupReport, CodeRequest, PairingSystem, UserStats};
