//! Closed-form memory estimation and batch-size selection.
//!
//! The per-point cost covers one sequence column in the reference tensor,
//! its contribution column, and one column of the selection bitmap. The
//! fixed cost covers the combination matrix plus the sketch counters and
//! coefficients, which exist once regardless of batching. Everything is
//! plain integer arithmetic so a plan can be asserted to the byte.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Assumed device memory when no explicit target is configured.
pub const DEFAULT_DEVICE_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Shape and budget inputs for [`plan`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanRequest {
    /// Number of retained sequences to lay out.
    pub total_points: usize,
    /// Longest retained sequence length L.
    pub max_len: usize,
    /// Motif size k.
    pub motif_size: usize,
    /// Reference-tensor columns per slot: 2 for ordinary motifs, 3 when a
    /// position column is carried.
    pub ref_columns: usize,
    /// Coefficient columns per hash row (k, or 2k - 1 with gap terms).
    pub hash_arity: usize,
    /// Hash rows of the sketch the record will attach to.
    pub sketch_depth: usize,
    /// Counter columns per sketch row.
    pub sketch_width: usize,
    /// Optional explicit budget in bytes; capped by the device budget.
    pub target_bytes: Option<u64>,
    /// Fraction of device memory considered usable.
    pub safety: f64,
    /// Smallest batch worth launching.
    pub min_batch: usize,
    /// Largest batch to lay out at once.
    pub max_batch: usize,
}

impl PlanRequest {
    fn validate(&self) -> Result<(), PlanError> {
        if !(self.safety > 0.0 && self.safety <= 1.0) {
            return Err(PlanError::InvalidSafety {
                safety: self.safety,
            });
        }
        if self.min_batch == 0 {
            return Err(PlanError::InvalidMinBatch {
                min_batch: self.min_batch,
            });
        }
        if self.max_batch < self.min_batch {
            return Err(PlanError::BatchBoundsInverted {
                min_batch: self.min_batch,
                max_batch: self.max_batch,
            });
        }
        if self.total_points == 0 {
            return Err(PlanError::NoPoints);
        }
        Ok(())
    }
}

/// A chosen batch size with its memory breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchPlan {
    /// Sequences per batch.
    pub batch_size: usize,
    /// Batches needed to cover every point; only the last may be smaller.
    pub num_batches: usize,
    /// Bytes resident regardless of batch size.
    pub fixed_bytes: u64,
    /// Bytes per laid-out sequence.
    pub per_point_bytes: u64,
    /// `fixed + batch_size * per_point`.
    pub peak_bytes: u64,
    /// Effective budget the plan was fitted into.
    pub budget_bytes: u64,
}

impl BatchPlan {
    /// Fixed memory in MB for diagnostics.
    pub fn fixed_mb(&self) -> f64 {
        self.fixed_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Peak memory in GB for diagnostics.
    pub fn peak_gb(&self) -> f64 {
        self.peak_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

impl std::fmt::Display for BatchPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "batch_size={} num_batches={} fixed={:.2}MB per_point={}B peak={:.3}GB budget={:.3}GB",
            self.batch_size,
            self.num_batches,
            self.fixed_mb(),
            self.per_point_bytes,
            self.peak_gb(),
            self.budget_bytes as f64 / (1024.0 * 1024.0 * 1024.0),
        )
    }
}

/// `C(l, k)` without overflow surprises; saturates at `u64::MAX`.
///
/// Saturation only matters for shapes whose tensors could never be allocated
/// anyway, where it drives the planner into its out-of-memory error.
pub fn binomial(l: usize, k: usize) -> u64 {
    if k > l {
        return 0;
    }
    let k = k.min(l - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc.saturating_mul((l - i) as u128) / (i + 1) as u128;
        if acc > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    acc as u64
}

/// Bytes needed per laid-out sequence: reference columns, contributions,
/// and one selection-bitmap column.
pub fn per_point_bytes(max_len: usize, ref_columns: usize, combinations: u64) -> u64 {
    let slots = max_len as u64;
    (ref_columns as u64 + 1) * 4 * slots + combinations
}

/// Bytes resident independent of batch size: the combination matrix, the
/// sketch counters, and the coefficient matrix.
pub fn fixed_bytes(
    motif_size: usize,
    combinations: u64,
    depth: usize,
    width: usize,
    hash_arity: usize,
) -> u64 {
    let combs = (motif_size as u64).saturating_mul(combinations).saturating_mul(4);
    let counters = (depth as u64) * (width as u64) * 4;
    let coeffs = (depth as u64) * (hash_arity as u64) * 4;
    combs.saturating_add(counters).saturating_add(coeffs)
}

/// Choose a batch size that keeps `fixed + batch * per_point` under budget.
pub fn plan(req: &PlanRequest) -> Result<BatchPlan, PlanError> {
    req.validate()?;

    let device_budget = (DEFAULT_DEVICE_BYTES as f64 * req.safety) as u64;
    let budget = req.target_bytes.unwrap_or(u64::MAX).min(device_budget);

    let m = binomial(req.max_len, req.motif_size);
    let fixed = fixed_bytes(
        req.motif_size,
        m,
        req.sketch_depth,
        req.sketch_width,
        req.hash_arity,
    );
    let per_point = per_point_bytes(req.max_len, req.ref_columns, m);

    if budget <= fixed {
        return Err(PlanError::FixedMemoryExceedsBudget {
            fixed_bytes: fixed,
            budget_bytes: budget,
        });
    }

    let remaining = budget - fixed;
    let raw = (remaining / per_point.max(1)) as usize;
    if raw < req.min_batch {
        return Err(PlanError::PerPointExceedsBudget {
            per_point_bytes: per_point,
            remaining_bytes: remaining,
            min_batch: req.min_batch,
        });
    }

    let batch_size = raw.min(req.max_batch).min(req.total_points);
    let num_batches = req.total_points.div_ceil(batch_size);

    Ok(BatchPlan {
        batch_size,
        num_batches,
        fixed_bytes: fixed,
        per_point_bytes: per_point,
        peak_bytes: fixed + batch_size as u64 * per_point,
        budget_bytes: budget,
    })
}
