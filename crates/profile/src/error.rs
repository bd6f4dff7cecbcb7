//! Error types produced by validation.
//!
//! All variants describe malformed caller-supplied input, rejected before
//! any store mutation begins. They are typed, cloneable, and comparable so
//! callers (chat or web adapters) can map each case to a specific
//! user-facing message rather than pattern-matching on strings.
use thiserror::Error;

/// Validation failure over caller-supplied data.
///
/// Corresponds to the `InvalidInput` class of the error taxonomy: local,
/// side-effect free, and always raised before any state changes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("user_id must be {min}-{max} characters, got {len}")]
    UserIdLength { len: usize, min: usize, max: usize },

    #[error("user_id may only contain letters, numbers, underscores, and hyphens")]
    UserIdCharset,

    #[error("username must be {min}-{max} characters, got {len}")]
    UsernameLength { len: usize, min: usize, max: usize },

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("interest entries must be non-empty")]
    EmptyInterest,

    #[error("interest {interest:?} exceeds {max} characters")]
    InterestTooLong { interest: String, max: usize },

    #[error("preferences must be a flat JSON object")]
    PreferencesNotObject,

    #[error("metadata must be a flat JSON object")]
    MetadataNotObject,

    #[error("metadata serializes to {bytes} bytes, limit is {limit}")]
    MetadataTooLarge { bytes: usize, limit: usize },

    #[error("code lifetime must be {min}-{max} hours, got {hours}")]
    DurationOutOfRange { hours: u32, min: u32, max: u32 },

    #[error("max_uses must be {min}-{max}, got {value}")]
    MaxUsesOutOfRange { value: u32, min: u32, max: u32 },
}
