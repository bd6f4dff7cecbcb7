//! Pure validation predicates over caller-supplied input.
//!
//! Every function here is side-effect free: it inspects a value against
//! the limits in [`ValidationConfig`] and either passes or returns a typed
//! [`ValidationError`]. The pairing system runs these gates strictly
//! before any mutation, so a failed validation can never leave the store
//! in a partial state.
//!
//! The one deliberate exception to the error-returning shape is
//! [`validate_code_format`], which answers a yes/no question about a
//! string a caller typed in — a malformed code is an expected lookup miss,
//! not an input fault.
use serde_json::{Map, Value};

use crate::config::ValidationConfig;
use crate::error::ValidationError;
use crate::types::NewUser;

/// Validate a registration request.
///
/// Checks, in order: user_id length and charset, username length, email
/// shape (when present), interest entries, and that `preferences` — if
/// supplied — is a flat JSON object within the metadata size cap.
pub fn validate_new_user(req: &NewUser, cfg: &ValidationConfig) -> Result<(), ValidationError> {
    validate_user_id(&req.user_id, cfg)?;
    validate_username(&req.username, cfg)?;
    if let Some(email) = &req.email {
        validate_email(email)?;
    }
    for interest in &req.interests {
        validate_interest(interest, cfg)?;
    }
    if let Some(preferences) = &req.preferences {
        coerce_preferences(preferences)?;
        validate_metadata_size(preferences, cfg)?;
    }
    Ok(())
}

/// Validate the user_id identity key: 3–50 chars of `[A-Za-z0-9_-]` by
/// default.
pub fn validate_user_id(user_id: &str, cfg: &ValidationConfig) -> Result<(), ValidationError> {
    let len = user_id.chars().count();
    if len < cfg.min_user_id_len || len > cfg.max_user_id_len {
        return Err(ValidationError::UserIdLength {
            len,
            min: cfg.min_user_id_len,
            max: cfg.max_user_id_len,
        });
    }
    if !user_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::UserIdCharset);
    }
    Ok(())
}

/// Validate the display name length.
pub fn validate_username(username: &str, cfg: &ValidationConfig) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if len < cfg.min_username_len || len > cfg.max_username_len {
        return Err(ValidationError::UsernameLength {
            len,
            min: cfg.min_username_len,
            max: cfg.max_username_len,
        });
    }
    Ok(())
}

/// Minimal structural email check: one `@`, non-empty local part, and a
/// dotted domain. Deliverability is out of scope.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let malformed = || ValidationError::InvalidEmail(email.to_string());
    let (local, domain) = email.split_once('@').ok_or_else(malformed)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(malformed());
    }
    Ok(())
}

/// Validate a single interest label: non-empty after trimming and within
/// the per-entry length cap.
pub fn validate_interest(interest: &str, cfg: &ValidationConfig) -> Result<(), ValidationError> {
    if interest.trim().is_empty() {
        return Err(ValidationError::EmptyInterest);
    }
    let len = interest.chars().count();
    if len > cfg.max_interest_len {
        return Err(ValidationError::InterestTooLong {
            interest: interest.to_string(),
            max: cfg.max_interest_len,
        });
    }
    Ok(())
}

/// Normalize an interest list to ordered-set semantics: trim whitespace
/// and drop duplicates, preserving first occurrence.
pub fn normalize_interests(interests: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(interests.len());
    for raw in interests {
        let interest = raw.trim();
        if !interest.is_empty() && !seen.iter().any(|s: &String| s == interest) {
            seen.push(interest.to_string());
        }
    }
    seen
}

/// Interpret a loose preferences value as a flat string→value object.
pub fn coerce_preferences(value: &Value) -> Result<Map<String, Value>, ValidationError> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        _ => Err(ValidationError::PreferencesNotObject),
    }
}

/// Interpret an opaque metadata value as a flat string→value object.
/// Issuance accepts loose JSON here; anything but an object (or null) is
/// an input fault.
pub fn coerce_metadata(value: &Value) -> Result<Map<String, Value>, ValidationError> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        _ => Err(ValidationError::MetadataNotObject),
    }
}

/// Pairing code format gate: length within configured bounds and matching
/// `[A-Z0-9][A-Z0-9-]*[A-Z0-9]` (uppercase alphanumerics with interior
/// hyphens). Returns a bool — malformed codes are lookup misses, not
/// errors.
pub fn validate_code_format(code: &str, cfg: &ValidationConfig) -> bool {
    let len = code.chars().count();
    if len < cfg.min_code_len || len > cfg.max_code_len {
        return false;
    }
    let is_edge = |c: char| c.is_ascii_uppercase() || c.is_ascii_digit();
    let mut chars = code.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    // min_code_len >= 1 is enforced by ConfigError::ZeroBound, so last()
    // always exists here.
    let last = code.chars().last().unwrap_or(first);
    if !is_edge(first) || !is_edge(last) {
        return false;
    }
    code.chars().all(|c| is_edge(c) || c == '-')
}

/// Code lifetime gate: 1–720 hours by default.
pub fn validate_duration_hours(hours: u32, cfg: &ValidationConfig) -> Result<(), ValidationError> {
    if hours < cfg.min_duration_hours || hours > cfg.max_duration_hours {
        return Err(ValidationError::DurationOutOfRange {
            hours,
            min: cfg.min_duration_hours,
            max: cfg.max_duration_hours,
        });
    }
    Ok(())
}

/// Code use-limit gate: 1–1000 by default.
pub fn validate_max_uses(max_uses: u32, cfg: &ValidationConfig) -> Result<(), ValidationError> {
    if max_uses < cfg.min_max_uses || max_uses > cfg.max_max_uses {
        return Err(ValidationError::MaxUsesOutOfRange {
            value: max_uses,
            min: cfg.min_max_uses,
            max: cfg.max_max_uses,
        });
    }
    Ok(())
}

/// Opaque metadata size gate: the serialized form must fit in
/// `max_metadata_bytes` (10 KB by default).
pub fn validate_metadata_size<T: serde::Serialize>(
    metadata: &T,
    cfg: &ValidationConfig,
) -> Result<(), ValidationError> {
    // Serialization of Map<String, Value> / Value cannot fail; fall back
    // to the limit check against zero rather than panicking if it ever
    // does for an exotic T.
    let bytes = serde_json::to_vec(metadata).map(|v| v.len()).unwrap_or(0);
    if bytes > cfg.max_metadata_bytes {
        return Err(ValidationError::MetadataTooLarge {
            bytes,
            limit: cfg.max_metadata_bytes,
        });
    }
    Ok(())
}
