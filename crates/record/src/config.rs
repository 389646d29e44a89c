//! Record-construction parameters and error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use planner::PlanError;

/// Batch size last used before adaptive planning existed; callers that need
/// to reproduce old runs can pass `BatchPolicy::Fixed(LEGACY_BATCH_SIZE)`.
pub const LEGACY_BATCH_SIZE: usize = 500;

/// How many sequences to lay out per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Let the memory planner pick the largest batch that fits the budget.
    Auto,
    /// Use exactly this many sequences per batch.
    Fixed(usize),
}

impl Default for BatchPolicy {
    fn default() -> Self {
        BatchPolicy::Auto
    }
}

/// Budget knobs forwarded to the planner when [`BatchPolicy::Auto`] is in
/// effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanningOptions {
    /// Explicit byte budget; `None` falls back to the device default.
    pub target_bytes: Option<u64>,
    /// Fraction of device memory considered usable.
    pub safety: f64,
    /// Smallest batch worth launching.
    pub min_batch: usize,
    /// Largest batch to lay out at once.
    pub max_batch: usize,
}

impl Default for PlanningOptions {
    fn default() -> Self {
        Self {
            target_bytes: None,
            safety: 0.8,
            min_batch: 10,
            max_batch: 10_000,
        }
    }
}

/// Parameters for building a [`crate::Record`] from an input map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordParams {
    /// Motif size k.
    pub motif_size: usize,
    /// Filter length; required for the convolution case.
    pub filter_len: Option<i32>,
    /// Batch sizing policy.
    pub batch: BatchPolicy,
    /// Planner knobs for the auto policy.
    pub planning: PlanningOptions,
}

impl RecordParams {
    /// Parameters for an ordinary-case record of the given motif size.
    pub fn ordinary(motif_size: usize) -> Self {
        Self {
            motif_size,
            filter_len: None,
            batch: BatchPolicy::default(),
            planning: PlanningOptions::default(),
        }
    }

    /// Parameters for a convolution-case record.
    pub fn convolution(motif_size: usize, filter_len: i32) -> Self {
        Self {
            filter_len: Some(filter_len),
            ..Self::ordinary(motif_size)
        }
    }

    /// Override the batch policy.
    pub fn with_batch(mut self, batch: BatchPolicy) -> Self {
        self.batch = batch;
        self
    }

    /// Override the planner knobs.
    pub fn with_planning(mut self, planning: PlanningOptions) -> Self {
        self.planning = planning;
        self
    }

    /// Validate the parameters that do not depend on the input map.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.motif_size == 0 {
            return Err(RecordError::InvalidMotifSize {
                motif_size: self.motif_size,
            });
        }
        if let Some(filter_len) = self.filter_len {
            if filter_len < 1 {
                return Err(RecordError::InvalidFilterLen { filter_len });
            }
        }
        if let BatchPolicy::Fixed(batch_size) = self.batch {
            if batch_size == 0 {
                return Err(RecordError::InvalidBatchSize { batch_size });
            }
        }
        Ok(())
    }
}

/// Errors that can occur while normalising input and laying out batches.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum RecordError {
    #[error("input map contains no non-empty sequences")]
    EmptyInput,

    #[error("motif size must be >= 1 (got {motif_size})")]
    InvalidMotifSize { motif_size: usize },

    #[error("motif size {motif_size} exceeds the longest sequence length {max_len}")]
    MotifSizeExceedsLength { motif_size: usize, max_len: usize },

    #[error("sequence {sequence} mixes feature kinds with the rest of the corpus")]
    MixedFeatureKinds { sequence: i32 },

    #[error("convolution input requires a filter length")]
    MissingFilterLen,

    #[error("filter length must be >= 1 (got {filter_len})")]
    InvalidFilterLen { filter_len: i32 },

    #[error("sequence {sequence} carries id {id}; ids must be >= 1 (zero marks padding)")]
    NonPositiveId { sequence: i32, id: i32 },

    #[error("batch size must be >= 1 (got {batch_size})")]
    InvalidBatchSize { batch_size: usize },

    #[error("batch planning failed: {0}")]
    Plan(#[from] PlanError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_defaults() {
        let params = RecordParams::ordinary(3);
        assert_eq!(params.motif_size, 3);
        assert_eq!(params.filter_len, None);
        assert_eq!(params.batch, BatchPolicy::Auto);
        assert_eq!(params.planning.min_batch, 10);
        assert_eq!(params.planning.max_batch, 10_000);
        assert_eq!(params.planning.safety, 0.8);
    }

    #[test]
    fn params_convolution_sets_filter_len() {
        let params = RecordParams::convolution(3, 8);
        assert_eq!(params.filter_len, Some(8));
    }

    #[test]
    fn params_validate_rejects_zero_motif_size() {
        let params = RecordParams::ordinary(0);
        assert!(matches!(
            params.validate(),
            Err(RecordError::InvalidMotifSize { motif_size: 0 })
        ));
    }

    #[test]
    fn params_validate_rejects_bad_filter_len() {
        let params = RecordParams::convolution(3, 0);
        assert!(matches!(
            params.validate(),
            Err(RecordError::InvalidFilterLen { filter_len: 0 })
        ));
    }

    #[test]
    fn params_validate_rejects_zero_fixed_batch() {
        let params = RecordParams::ordinary(3).with_batch(BatchPolicy::Fixed(0));
        assert!(matches!(
            params.validate(),
            Err(RecordError::InvalidBatchSize { batch_size: 0 })
        ));
    }

    #[test]
    fn batch_policy_serde_roundtrip() {
        for policy in [BatchPolicy::Auto, BatchPolicy::Fixed(LEGACY_BATCH_SIZE)] {
            let json = serde_json::to_string(&policy).unwrap();
            let back: BatchPolicy = serde_json::from_str(&json).unwrap();
            assert_eq!(policy, back);
        }
    }
}
