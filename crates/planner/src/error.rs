//! Error types produced by the batch planner.

use thiserror::Error;

/// Errors that can occur while estimating memory and choosing a batch size.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum PlanError {
    #[error("safety factor must lie in (0, 1] (got {safety})")]
    InvalidSafety { safety: f64 },

    #[error("min_batch must be >= 1 (got {min_batch})")]
    InvalidMinBatch { min_batch: usize },

    #[error("max_batch {max_batch} is below min_batch {min_batch}")]
    BatchBoundsInverted { min_batch: usize, max_batch: usize },

    #[error("nothing to plan: total_points is 0")]
    NoPoints,

    #[error(
        "fixed memory {fixed_bytes} B alone exceeds the budget {budget_bytes} B; \
         loosen epsilon/delta or raise the target"
    )]
    FixedMemoryExceedsBudget { fixed_bytes: u64, budget_bytes: u64 },

    #[error(
        "per-point memory {per_point_bytes} B leaves room for fewer than \
         min_batch={min_batch} points in the remaining {remaining_bytes} B"
    )]
    PerPointExceedsBudget {
        per_point_bytes: u64,
        remaining_bytes: u64,
        min_batch: usize,
    },
}
