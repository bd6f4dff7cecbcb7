//! Error surface of the pairing system.
//!
//! Two families, because their consumers differ:
//!
//! - [`PairingError`] covers registration, issuance, updates, and
//!   persistence — the operations adapters call around the redemption
//!   path.
//! - [`RedeemError`] is the typed reason set for [`use_code`]
//!   failures. Chat and web adapters render a specific user-facing
//!   message per reason, so these are distinct variants rather than a
//!   generic error string.
//!
//! [`use_code`]: crate::PairingSystem::use_code
use thiserror::Error;

use profile::ValidationError;
use store::StoreError;

/// Failure of a non-redemption pairing-system operation.
#[derive(Debug, Error)]
pub enum PairingError {
    /// Registration hit an existing user id. The original profile is
    /// left unchanged.
    #[error("user {0} already exists")]
    AlreadyExists(String),

    /// The operation requires a registered user that isn't there.
    #[error("user {0} not found")]
    UnknownUser(String),

    /// Caller-supplied data failed a validation gate before any mutation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Persistence failure; the in-memory effect of the operation may or
    /// may not be durable.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Code generation exhausted its widened code space. Practically
    /// unreachable until the store approaches saturation.
    #[error("pairing code space saturated after widening to {max_len} digits")]
    CodeSpaceSaturated { max_len: usize },
}

/// Why a redemption was refused. Each check in the redemption sequence
/// short-circuits with its own reason.
#[derive(Debug, Error)]
pub enum RedeemError {
    /// No such code in the store (or the string fails the format gate).
    #[error("invalid pairing code")]
    InvalidCode,

    /// The code exists but is inactive, expired, or out of uses.
    #[error("pairing code has expired or been used")]
    CodeNotUsable,

    /// The redeemer is not a registered user.
    #[error("user {0} not found")]
    UnknownUser(String),

    /// A code cannot pair its owner with themselves.
    #[error("cannot pair with yourself")]
    SelfPair,

    /// An active pairing already exists between these two users.
    #[error("users are already paired")]
    AlreadyPaired,

    /// The atomic use-increment found the limit already consumed.
    /// Unreachable in the single-threaded flow (validity is checked
    /// first) but kept total for defense in depth.
    #[error("pairing code usage limit reached")]
    UsageLimitReached,

    /// Persistence failure after the pairing was minted in memory.
    #[error(transparent)]
    Store(#[from] StoreError),
}
