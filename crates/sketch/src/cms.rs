//! The Count-Min Sketch counter table.
//!
//! A sketch is a `depth x width` table of atomic 32-bit counters plus a
//! `depth x arity` matrix of hash coefficients. A raw hash is a wrapping
//! signed dot product of feature values against one coefficient row; folding
//! it into a column goes through the two-step floored modulus
//! `((h mod depth*width) mod width)`, which reproduces the legacy folding
//! behaviour exactly. Increments are lock-free, so the table can be shared
//! across as many counting threads as the caller likes.

use std::sync::atomic::{AtomicU32, Ordering};

use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{SketchConfig, SketchError};

/// Shared frequency counter with bounded overestimation.
///
/// Estimates never undercount: the minimum over all hash rows of the folded
/// counters is an upper bound on the true frequency with probability
/// `1 - delta`.
#[derive(Debug)]
pub struct CountMinSketch {
    depth: usize,
    width: usize,
    /// Row-major `depth x width` counters.
    counters: Vec<AtomicU32>,
    /// `depth x arity` coefficients, each drawn uniformly from
    /// `[1, depth*width - 1]`.
    coeffs: Array2<i32>,
    seed: u64,
}

impl CountMinSketch {
    /// Build a sketch for hashes of `arity` terms.
    ///
    /// `arity` is the number of coefficient columns each row carries: the
    /// motif size for ordinary motifs, `2k - 1` for convolution motifs
    /// (filter ids interleaved with gaps).
    pub fn new(arity: usize, cfg: &SketchConfig) -> Result<Self, SketchError> {
        cfg.validate()?;
        if arity == 0 {
            return Err(SketchError::InvalidArity { arity });
        }
        let (depth, width) = cfg.dims();
        let cells = depth
            .checked_mul(width)
            .filter(|&c| c <= i32::MAX as usize)
            .ok_or(SketchError::WidthOverflow {
                cells: depth.saturating_mul(width),
            })?;

        let mut counters = Vec::with_capacity(cells);
        counters.resize_with(cells, || AtomicU32::new(0));

        let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
        let coeffs = Array2::from_shape_fn((depth, arity), |_| rng.gen_range(1..cells as i32));

        Ok(Self {
            depth,
            width,
            counters,
            coeffs,
            seed: cfg.seed,
        })
    }

    /// Number of hash rows.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of counter columns per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total counter cells (`depth * width`).
    pub fn cells(&self) -> usize {
        self.depth * self.width
    }

    /// Number of coefficient columns per row.
    pub fn arity(&self) -> usize {
        self.coeffs.ncols()
    }

    /// Seed the coefficient matrix was drawn from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Hash coefficient for `(row, term)`.
    #[inline]
    pub fn coeff(&self, row: usize, term: usize) -> i32 {
        self.coeffs[(row, term)]
    }

    /// Fold a raw hash into a 0-based column index.
    ///
    /// Both modulus steps are floored (the raw hash may have wrapped
    /// negative), and the first step runs in i64 so `depth * width` cannot
    /// overflow the intermediate.
    #[inline]
    pub fn fold(&self, hash: i32) -> usize {
        let cells = (self.depth * self.width) as i64;
        let folded = (hash as i64).rem_euclid(cells) % self.width as i64;
        folded as usize
    }

    /// Atomically bump the counter at `(row, col)`.
    #[inline]
    pub fn increment(&self, row: usize, col: usize) {
        self.counters[row * self.width + col].fetch_add(1, Ordering::Relaxed);
    }

    /// Read the counter at `(row, col)`.
    #[inline]
    pub fn peek(&self, row: usize, col: usize) -> u32 {
        self.counters[row * self.width + col].load(Ordering::Relaxed)
    }

    /// Copy out every counter, row-major. Intended for tests and diagnostics.
    pub fn snapshot(&self) -> Vec<u32> {
        self.counters
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cfg() -> SketchConfig {
        // depth 2, width 6: ln(1/0.2) = 1.61 -> 2, ceil(e / 0.5) = 6.
        SketchConfig::new().with_delta(0.2).with_epsilon(0.5)
    }

    // ==================== Construction ====================

    #[test]
    fn new_derives_dims_from_config() {
        let cms = CountMinSketch::new(3, &small_cfg()).unwrap();
        assert_eq!(cms.depth(), 2);
        assert_eq!(cms.width(), 6);
        assert_eq!(cms.cells(), 12);
        assert_eq!(cms.arity(), 3);
    }

    #[test]
    fn new_rejects_invalid_parameters() {
        let bad = SketchConfig::new().with_delta(0.0);
        assert!(matches!(
            CountMinSketch::new(3, &bad),
            Err(SketchError::InvalidDelta { .. })
        ));
        assert!(matches!(
            CountMinSketch::new(0, &small_cfg()),
            Err(SketchError::InvalidArity { arity: 0 })
        ));
    }

    #[test]
    fn new_starts_zeroed() {
        let cms = CountMinSketch::new(2, &small_cfg()).unwrap();
        assert!(cms.snapshot().iter().all(|&c| c == 0));
    }

    #[test]
    fn coefficients_stay_in_domain() {
        let cms = CountMinSketch::new(5, &SketchConfig::default()).unwrap();
        let upper = cms.cells() as i32;
        for row in 0..cms.depth() {
            for term in 0..cms.arity() {
                let c = cms.coeff(row, term);
                assert!(c >= 1 && c < upper, "coefficient {c} out of [1, {upper})");
            }
        }
    }

    #[test]
    fn coefficients_deterministic_per_seed() {
        let cfg = small_cfg().with_seed(99);
        let a = CountMinSketch::new(4, &cfg).unwrap();
        let b = CountMinSketch::new(4, &cfg).unwrap();
        for row in 0..a.depth() {
            for term in 0..a.arity() {
                assert_eq!(a.coeff(row, term), b.coeff(row, term));
            }
        }
    }

    #[test]
    fn coefficients_differ_across_seeds() {
        let a = CountMinSketch::new(4, &small_cfg().with_seed(1)).unwrap();
        let b = CountMinSketch::new(4, &small_cfg().with_seed(2)).unwrap();
        let same = (0..a.depth())
            .flat_map(|r| (0..a.arity()).map(move |t| (r, t)))
            .all(|(r, t)| a.coeff(r, t) == b.coeff(r, t));
        assert!(!same, "different seeds should change the coefficient matrix");
    }

    // ==================== Fold ====================

    #[test]
    fn fold_is_in_column_range() {
        let cms = CountMinSketch::new(2, &small_cfg()).unwrap();
        for h in [-100, -1, 0, 1, 5, 6, 11, 12, 13, i32::MIN, i32::MAX] {
            let col = cms.fold(h);
            assert!(col < cms.width(), "fold({h}) = {col} out of range");
        }
    }

    #[test]
    fn fold_uses_floored_modulus_for_negative_hashes() {
        let cms = CountMinSketch::new(2, &small_cfg()).unwrap();
        // cells = 12, width = 6: -1 mod 12 = 11, 11 mod 6 = 5.
        assert_eq!(cms.fold(-1), 5);
        // -13 mod 12 = 11 as well.
        assert_eq!(cms.fold(-13), 5);
    }

    #[test]
    fn fold_periodic_in_cell_count() {
        let cms = CountMinSketch::new(2, &small_cfg()).unwrap();
        let cells = cms.cells() as i32;
        for h in [-7, 0, 3, 11] {
            assert_eq!(cms.fold(h), cms.fold(h + cells));
        }
    }

    // ==================== Counters ====================

    #[test]
    fn increment_and_peek_single_cell() {
        let cms = CountMinSketch::new(2, &small_cfg()).unwrap();
        cms.increment(1, 4);
        cms.increment(1, 4);
        cms.increment(0, 4);
        assert_eq!(cms.peek(1, 4), 2);
        assert_eq!(cms.peek(0, 4), 1);
        assert_eq!(cms.peek(0, 0), 0);
    }

    #[test]
    fn increments_from_many_threads_all_land() {
        use std::sync::Arc;

        let cms = Arc::new(CountMinSketch::new(2, &small_cfg()).unwrap());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cms = Arc::clone(&cms);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    cms.increment(0, 3);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cms.peek(0, 3), 8000);
    }

    #[test]
    fn snapshot_reflects_counts() {
        let cms = CountMinSketch::new(2, &small_cfg()).unwrap();
        cms.increment(0, 0);
        cms.increment(1, 5);
        let snap = cms.snapshot();
        assert_eq!(snap.len(), cms.cells());
        assert_eq!(snap[0], 1);
        assert_eq!(snap[cms.width() + 5], 1);
        assert_eq!(snap.iter().sum::<u32>(), 2);
    }
}
