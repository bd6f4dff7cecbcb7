//! Pairing-code generation.
//!
//! Codes are random digit strings, collision-checked against the live
//! code map. The original generate-and-check loop is kept but hardened:
//! retries per width are bounded, and on exhaustion the code space is
//! widened by adding digits instead of looping unbounded — an adversary
//! hoarding codes degrades issuance into longer codes, not a livelock.
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling bounds for code generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeGenConfig {
    /// Starting code width in digits.
    pub initial_len: usize,
    /// Hard cap on code width. Must stay within the validation layer's
    /// `max_code_len` so generated codes always pass the format gate.
    pub max_len: usize,
    /// Digits added per widening step.
    pub widen_step: usize,
    /// Collision retries before widening.
    pub attempts_per_len: u32,
}

impl Default for CodeGenConfig {
    fn default() -> Self {
        Self {
            initial_len: 8,
            max_len: 16,
            widen_step: 2,
            attempts_per_len: 32,
        }
    }
}

/// The widened code space still produced nothing but collisions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodeGenError {
    #[error("pairing code space saturated after widening to {max_len} digits")]
    Saturated { max_len: usize },
}

/// Sample a fresh code not rejected by `is_taken`.
///
/// At each width, up to `attempts_per_len` random digit strings are
/// drawn; persistent collisions widen the space by `widen_step` digits up
/// to `max_len` before failing.
pub fn generate_code<F>(cfg: &CodeGenConfig, is_taken: F) -> Result<String, CodeGenError>
where
    F: Fn(&str) -> bool,
{
    let mut rng = rand::thread_rng();
    let mut len = cfg.initial_len;
    loop {
        for _ in 0..cfg.attempts_per_len {
            let code: String = (0..len)
                .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
                .collect();
            if !is_taken(&code) {
                return Ok(code);
            }
        }
        if len >= cfg.max_len {
            return Err(CodeGenError::Saturated {
                max_len: cfg.max_len,
            });
        }
        len = (len + cfg.widen_step).min(cfg.max_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generates_digit_codes_at_initial_width() {
        let cfg = CodeGenConfig::default();
        let code = generate_code(&cfg, |_| false).unwrap();
        assert_eq!(code.len(), cfg.initial_len);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn widens_when_initial_width_is_saturated() {
        let cfg = CodeGenConfig::default();
        // Pretend every 8-digit code is taken; the first widened draw wins.
        let code = generate_code(&cfg, |c| c.len() == cfg.initial_len).unwrap();
        assert_eq!(code.len(), cfg.initial_len + cfg.widen_step);
    }

    #[test]
    fn saturation_is_an_error_not_a_livelock() {
        let cfg = CodeGenConfig::default();
        let err = generate_code(&cfg, |_| true).unwrap_err();
        assert_eq!(
            err,
            CodeGenError::Saturated {
                max_len: cfg.max_len
            }
        );
    }

    #[test]
    fn consecutive_draws_are_distinct_in_practice() {
        let cfg = CodeGenConfig::default();
        let mut seen = HashSet::new();
        for _ in 0..64 {
            seen.insert(generate_code(&cfg, |_| false).unwrap());
        }
        // 64 draws from a 10^8 space colliding down to a handful would
        // indicate a broken RNG wiring, not bad luck.
        assert!(seen.len() > 60);
    }
}
