//! Record construction for motifmine.
//!
//! This crate turns a corpus — a map from sequence id to a variable-length
//! feature list — into the dense, padded tensors the mining passes run over:
//! a `k x C(L, k)` combination table, per-batch `L x R x B` reference tensors,
//! matching contribution tensors, and zeroed selection bitmaps, all sharing a
//! single Count-Min Sketch handle.
//!
//! ```
//! use std::sync::Arc;
//!
//! use record::{build_record, BatchPolicy, Feature, InputMap, RecordParams};
//! use sketch::{CountMinSketch, SketchConfig};
//!
//! let mut map = InputMap::new();
//! map.insert(1, vec![
//!     Feature::Ordinary { id: 10, contribution: 1.0 },
//!     Feature::Ordinary { id: 20, contribution: 1.0 },
//! ]);
//!
//! let cfg = SketchConfig::new().with_delta(0.1).with_epsilon(0.01);
//! let cms = Arc::new(CountMinSketch::new(2, &cfg).unwrap());
//! let params = RecordParams::ordinary(2).with_batch(BatchPolicy::Fixed(100));
//! let record = build_record(map, &params, cms).unwrap();
//!
//! assert_eq!(record.num_combinations(), 1);
//! assert_eq!(record.total_points(), 1);
//! ```

mod builder;
mod combs;
pub mod config;
pub mod types;

pub use crate::builder::{build_record, Record};
pub use crate::combs::combinations;
pub use crate::config::{
    BatchPolicy, PlanningOptions, RecordError, RecordParams, LEGACY_BATCH_SIZE,
};
pub use crate::types::{
    infer_case, Feature, InputMap, MotifCase, DATA_COL, FILTER_COL, POS_COL,
};
