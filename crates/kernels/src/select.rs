//! The selection pass: mark every (combination, sequence) pair whose
//! Count-Min estimate reaches the enrichment threshold.
//!
//! The estimate is the minimum over *all* hash rows. Selection only ever
//! writes `true`, so re-running the pass is idempotent and cell writes are
//! safe to parallelise column-by-column.

use ndarray::parallel::prelude::*;
use ndarray::{ArrayViewMut1, Axis};

use record::{MotifCase, Record};

use crate::hash::{estimate_convolution, estimate_ordinary, gather_convolution, gather_ordinary};

/// Flag combinations whose estimated frequency is at least `min_count`.
pub fn select_pass(record: &mut Record, min_count: u32, use_parallel: bool) {
    match record.case() {
        MotifCase::Ordinary => select_ordinary(record, min_count, use_parallel),
        MotifCase::Convolution => select_convolution(record, min_count, use_parallel),
    }
}

fn select_ordinary(record: &mut Record, min_count: u32, use_parallel: bool) {
    let motif_size = record.motif_size();
    let cms = record.cms_handle();

    for b in 0..record.num_batches() {
        let (combs, refs, bitmap) = record.selection_parts_mut(b);
        let combs = combs.view();
        let body = |(n, mut column): (usize, ArrayViewMut1<'_, bool>)| {
            let seq = refs.index_axis(Axis(2), n);
            let mut filters = Vec::with_capacity(motif_size);
            for j in 0..combs.ncols() {
                if !gather_ordinary(&seq, &combs, j, &mut filters) {
                    continue;
                }
                if estimate_ordinary(&cms, &filters) >= min_count {
                    column[j] = true;
                }
            }
        };
        if use_parallel {
            bitmap
                .axis_iter_mut(Axis(1))
                .into_par_iter()
                .enumerate()
                .for_each(body);
        } else {
            bitmap.axis_iter_mut(Axis(1)).enumerate().for_each(body);
        }
    }
}

fn select_convolution(record: &mut Record, min_count: u32, use_parallel: bool) {
    let motif_size = record.motif_size();
    let filter_len = record.filter_len().unwrap_or(1);
    let cms = record.cms_handle();

    for b in 0..record.num_batches() {
        let (combs, refs, bitmap) = record.selection_parts_mut(b);
        let combs = combs.view();
        let body = |(n, mut column): (usize, ArrayViewMut1<'_, bool>)| {
            let seq = refs.index_axis(Axis(2), n);
            let mut filters = Vec::with_capacity(motif_size);
            let mut gaps = Vec::with_capacity(motif_size.saturating_sub(1));
            for j in 0..combs.ncols() {
                if !gather_convolution(&seq, &combs, j, filter_len, &mut filters, &mut gaps) {
                    continue;
                }
                if estimate_convolution(&cms, &filters, &gaps) >= min_count {
                    column[j] = true;
                }
            }
        };
        if use_parallel {
            bitmap
                .axis_iter_mut(Axis(1))
                .into_par_iter()
                .enumerate()
                .for_each(body);
        } else {
            bitmap.axis_iter_mut(Axis(1)).enumerate().for_each(body);
        }
    }
}
