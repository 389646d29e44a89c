//! Configuration and error types for the Count-Min Sketch.
//!
//! The sketch dimensions are derived entirely from the two error parameters,
//! so this module is the single place where `(delta, epsilon)` are validated
//! and turned into `(depth, width)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known default seed so that two runs without an explicit seed are
/// still bit-identical.
pub const DEFAULT_SEED: u64 = 0xBEEF_FACE_CAFE_F00D;

/// Error parameters and seed for a [`crate::CountMinSketch`].
///
/// `delta` bounds the probability that an estimate exceeds the true count by
/// more than `epsilon * total`, and together they fix the counter table shape:
/// `depth = ceil(ln(1/delta))` rows, `width = ceil(e/epsilon)` columns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SketchConfig {
    /// Error probability; must lie in the open interval (0, 1).
    pub delta: f64,
    /// Error tolerance; must lie in the open interval (0, 1).
    pub epsilon: f64,
    /// Seed for the hash-coefficient matrix.
    ///
    /// Two sketches built from equal configs hold identical coefficients.
    pub seed: u64,
}

impl SketchConfig {
    /// Create a configuration with the default error parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error probability (shrinks `delta` to add hash rows).
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Set the error tolerance (shrinks `epsilon` to add columns).
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the coefficient seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the error parameters.
    pub fn validate(&self) -> Result<(), SketchError> {
        if !(self.delta > 0.0 && self.delta < 1.0) {
            return Err(SketchError::InvalidDelta { delta: self.delta });
        }
        if !(self.epsilon > 0.0 && self.epsilon < 1.0) {
            return Err(SketchError::InvalidEpsilon {
                epsilon: self.epsilon,
            });
        }
        Ok(())
    }

    /// Counter table shape `(depth, width)` implied by the error parameters.
    ///
    /// Callers must validate first; out-of-range parameters here would yield
    /// nonsense dimensions rather than an error.
    pub fn dims(&self) -> (usize, usize) {
        let depth = (1.0 / self.delta).ln().ceil() as usize;
        let width = (std::f64::consts::E / self.epsilon).ceil() as usize;
        (depth.max(1), width)
    }
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            delta: 1e-4,
            epsilon: 5e-5,
            seed: DEFAULT_SEED,
        }
    }
}

/// Errors produced while constructing a sketch.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SketchError {
    #[error("invalid config: delta must lie in (0, 1) (got {delta})")]
    InvalidDelta { delta: f64 },

    #[error("invalid config: epsilon must lie in (0, 1) (got {epsilon})")]
    InvalidEpsilon { epsilon: f64 },

    #[error("sketch of {cells} cells exceeds the i32 coefficient domain")]
    WidthOverflow { cells: usize },

    #[error("hash arity must be >= 1 (got {arity})")]
    InvalidArity { arity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let cfg = SketchConfig::default();
        assert_eq!(cfg.delta, 1e-4);
        assert_eq!(cfg.epsilon, 5e-5);
        assert_eq!(cfg.seed, DEFAULT_SEED);
    }

    #[test]
    fn config_builder_chain() {
        let cfg = SketchConfig::new()
            .with_delta(1e-2)
            .with_epsilon(1e-3)
            .with_seed(42);
        assert_eq!(cfg.delta, 1e-2);
        assert_eq!(cfg.epsilon, 1e-3);
        assert_eq!(cfg.seed, 42);
    }

    #[test]
    fn config_validate_default_ok() {
        assert!(SketchConfig::default().validate().is_ok());
    }

    #[test]
    fn config_validate_rejects_delta_bounds() {
        for delta in [0.0, 1.0, -0.5, 2.0] {
            let cfg = SketchConfig::new().with_delta(delta);
            assert!(matches!(
                cfg.validate(),
                Err(SketchError::InvalidDelta { .. })
            ));
        }
    }

    #[test]
    fn config_validate_rejects_epsilon_bounds() {
        for epsilon in [0.0, 1.0, -1e-3] {
            let cfg = SketchConfig::new().with_epsilon(epsilon);
            assert!(matches!(
                cfg.validate(),
                Err(SketchError::InvalidEpsilon { .. })
            ));
        }
    }

    #[test]
    fn dims_match_closed_form() {
        // ln(1/1e-4) = 9.21 -> 10 rows, ceil(e / 5e-5) = 54366 columns.
        let (depth, width) = SketchConfig::default().dims();
        assert_eq!(depth, 10);
        assert_eq!(width, 54366);
    }

    #[test]
    fn dims_loose_parameters_stay_positive() {
        let cfg = SketchConfig::new().with_delta(0.9).with_epsilon(0.9);
        let (depth, width) = cfg.dims();
        assert!(depth >= 1);
        assert!(width >= 3);
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = SketchConfig::new().with_delta(1e-3).with_seed(7);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SketchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn error_display_mentions_parameter() {
        let err = SketchError::InvalidDelta { delta: 0.0 };
        assert!(err.to_string().contains("delta"));
        let err = SketchError::InvalidEpsilon { epsilon: 1.0 };
        assert!(err.to_string().contains("epsilon"));
    }
}
