//! Shared combination gathering, hashing, and estimation helpers.
//!
//! All three passes agree on what makes a combination valid and on how a
//! combination hashes against one sketch row, so both live here. Hash
//! arithmetic is wrapping signed 32-bit; a wrapped-negative hash is fine
//! because the sketch fold uses floored modulus.

use ndarray::ArrayView2;

use record::{FILTER_COL, POS_COL};
use sketch::CountMinSketch;

/// Gather the filter values of combination `j` from one sequence slice
/// (`L x R`). Returns false when any referenced slot is padding.
pub(crate) fn gather_ordinary(
    seq: &ArrayView2<'_, i32>,
    combs: &ArrayView2<'_, i32>,
    j: usize,
    filters: &mut Vec<i32>,
) -> bool {
    filters.clear();
    for e in 0..combs.nrows() {
        let slot = combs[[e, j]] as usize - 1;
        let filter = seq[[slot, FILTER_COL]];
        if filter == 0 {
            return false;
        }
        filters.push(filter);
    }
    true
}

/// Gather filter values and inter-filter gaps of combination `j`. Returns
/// false on padding or when adjacent filters overlap (negative gap).
pub(crate) fn gather_convolution(
    seq: &ArrayView2<'_, i32>,
    combs: &ArrayView2<'_, i32>,
    j: usize,
    filter_len: i32,
    filters: &mut Vec<i32>,
    gaps: &mut Vec<i32>,
) -> bool {
    if !gather_ordinary(seq, combs, j, filters) {
        return false;
    }
    gaps.clear();
    for e in 0..combs.nrows() - 1 {
        let here = seq[[combs[[e, j]] as usize - 1, POS_COL]];
        let next = seq[[combs[[e + 1, j]] as usize - 1, POS_COL]];
        let gap = next - here - filter_len;
        if gap < 0 {
            return false;
        }
        gaps.push(gap);
    }
    true
}

/// Raw hash of an ordinary combination against sketch row `row`.
#[inline]
pub(crate) fn hash_ordinary(cms: &CountMinSketch, row: usize, filters: &[i32]) -> i32 {
    let mut hash = 0i32;
    for (e, &filter) in filters.iter().enumerate() {
        hash = hash.wrapping_add(filter.wrapping_mul(cms.coeff(row, e)));
    }
    hash
}

/// Raw hash of a convolution combination: filters on even coefficient
/// columns, gaps interleaved on odd ones.
#[inline]
pub(crate) fn hash_convolution(
    cms: &CountMinSketch,
    row: usize,
    filters: &[i32],
    gaps: &[i32],
) -> i32 {
    let mut hash = 0i32;
    for (e, &filter) in filters.iter().enumerate() {
        hash = hash.wrapping_add(filter.wrapping_mul(cms.coeff(row, 2 * e)));
    }
    for (e, &gap) in gaps.iter().enumerate() {
        hash = hash.wrapping_add(gap.wrapping_mul(cms.coeff(row, 2 * e + 1)));
    }
    hash
}

/// Count-Min estimate for an ordinary combination: the minimum over every
/// hash row of the folded counter.
pub(crate) fn estimate_ordinary(cms: &CountMinSketch, filters: &[i32]) -> u32 {
    (0..cms.depth())
        .map(|row| cms.peek(row, cms.fold(hash_ordinary(cms, row, filters))))
        .min()
        .unwrap_or(0)
}

/// Count-Min estimate for a convolution combination.
pub(crate) fn estimate_convolution(cms: &CountMinSketch, filters: &[i32], gaps: &[i32]) -> u32 {
    (0..cms.depth())
        .map(|row| cms.peek(row, cms.fold(hash_convolution(cms, row, filters, gaps))))
        .min()
        .unwrap_or(0)
}
