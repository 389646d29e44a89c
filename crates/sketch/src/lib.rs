//! Count-Min Sketch for motifmine.
//!
//! This crate owns the shared counter table every counting pass increments
//! and every selection pass reads. It is deliberately small: error-parameter
//! configuration, the counter/coefficient allocation, the legacy two-step
//! column fold, and lock-free increment/peek. What gets hashed — motif
//! combinations, gaps — is the caller's business; the sketch only sees raw
//! signed 32-bit hash values.
//!
//! ```
//! use sketch::{CountMinSketch, SketchConfig};
//!
//! let cfg = SketchConfig::new().with_delta(0.01).with_epsilon(0.01).with_seed(7);
//! let cms = CountMinSketch::new(3, &cfg).unwrap();
//!
//! let col = cms.fold(12345);
//! cms.increment(0, col);
//! assert_eq!(cms.peek(0, col), 1);
//! ```

mod cms;
pub mod config;

pub use crate::cms::CountMinSketch;
pub use crate::config::{SketchConfig, SketchError, DEFAULT_SEED};
