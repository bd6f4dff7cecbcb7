//! Configuration for validation limits.
//!
//! [`ValidationConfig`] bounds every caller-supplied field the pairing
//! system accepts. It is cheap to clone and serde-friendly so deployments
//! can load it from JSON or TOML alongside the rest of their config.
//!
//! ```rust
//! use profile::ValidationConfig;
//!
//! let cfg = ValidationConfig::default();
//! cfg.validate().expect("defaults are internally consistent");
//! assert_eq!(cfg.max_duration_hours, 720);
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a [`ValidationConfig`] is internally inconsistent (a min
/// bound above its max). Checked once at startup, not per operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field}: min bound {min} exceeds max bound {max}")]
    InvertedBounds {
        field: &'static str,
        min: u64,
        max: u64,
    },
    #[error("{field} must be non-zero")]
    ZeroBound { field: &'static str },
}

/// Limits applied to caller-supplied identifiers, codes, durations, and
/// metadata. Defaults match the engine's documented contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationConfig {
    /// user_id length bounds (inclusive).
    pub min_user_id_len: usize,
    pub max_user_id_len: usize,
    /// username length bounds (inclusive).
    pub min_username_len: usize,
    pub max_username_len: usize,
    /// Per-interest label length cap.
    pub max_interest_len: usize,
    /// Pairing code length bounds (inclusive).
    pub min_code_len: usize,
    pub max_code_len: usize,
    /// Code lifetime bounds in hours (inclusive).
    pub min_duration_hours: u32,
    pub max_duration_hours: u32,
    /// Code use-limit bounds (inclusive).
    pub min_max_uses: u32,
    pub max_max_uses: u32,
    /// Serialized size cap for opaque metadata and preferences blobs.
    pub max_metadata_bytes: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_user_id_len: 3,
            max_user_id_len: 50,
            min_username_len: 2,
            max_username_len: 30,
            max_interest_len: 50,
            min_code_len: 6,
            max_code_len: 20,
            min_duration_hours: 1,
            max_duration_hours: 720,
            min_max_uses: 1,
            max_max_uses: 1000,
            max_metadata_bytes: 10 * 1024,
        }
    }
}

impl ValidationConfig {
    /// Check internal consistency. Call once when the config is loaded.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds: [(&'static str, u64, u64); 5] = [
            (
                "user_id_len",
                self.min_user_id_len as u64,
                self.max_user_id_len as u64,
            ),
            (
                "username_len",
                self.min_username_len as u64,
                self.max_username_len as u64,
            ),
            (
                "code_len",
                self.min_code_len as u64,
                self.max_code_len as u64,
            ),
            (
                "duration_hours",
                self.min_duration_hours as u64,
                self.max_duration_hours as u64,
            ),
            (
                "max_uses",
                self.min_max_uses as u64,
                self.max_max_uses as u64,
            ),
        ];
        for (field, min, max) in bounds {
            if min == 0 {
                return Err(ConfigError::ZeroBound { field });
            }
            if min > max {
                return Err(ConfigError::InvertedBounds { field, min, max });
            }
        }
        if self.max_metadata_bytes == 0 {
            return Err(ConfigError::ZeroBound {
                field: "max_metadata_bytes",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ValidationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn inverted_bounds_rejected() {
        let cfg = ValidationConfig {
            min_code_len: 30,
            max_code_len: 20,
            ..ValidationConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvertedBounds {
                field: "code_len",
                ..
            })
        ));
    }

    #[test]
    fn zero_bounds_rejected() {
        let cfg = ValidationConfig {
            min_max_uses: 0,
            ..ValidationConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroBound { .. })));
    }
}
