//! Adaptive memory planning for motifmine.
//!
//! Every sequence laid out into a batch costs a predictable number of bytes,
//! and a handful of structures (combination matrix, sketch counters and
//! coefficients) cost a predictable fixed amount. This crate turns those two
//! closed forms plus a byte budget into a batch size, clamped to the
//! configured bounds, or a typed out-of-memory error when no batch size can
//! fit.

mod error;
mod plan;

pub use crate::error::PlanError;
pub use crate::plan::{
    binomial, fixed_bytes, per_point_bytes, plan, BatchPlan, PlanRequest, DEFAULT_DEVICE_BYTES,
};
