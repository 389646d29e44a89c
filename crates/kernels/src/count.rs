//! The counting pass: one sketch increment per valid combination per hash
//! row per sequence.
//!
//! The case is dispatched once per pass; the hot loops are monomorphic. The
//! sketch is the only shared mutable state and its increments are atomic, so
//! the pass parallelises over sequences without further coordination and its
//! final counter state does not depend on thread interleaving.

use ndarray::Axis;
use rayon::prelude::*;

use record::{MotifCase, Record};

use crate::hash::{gather_convolution, gather_ordinary, hash_convolution, hash_ordinary};

/// Count every valid combination of every sequence into the record's sketch.
///
/// Running this pass twice doubles every touched counter; callers that reuse
/// a record must treat counting as cumulative.
pub fn count_pass(record: &Record, use_parallel: bool) {
    match record.case() {
        MotifCase::Ordinary => count_ordinary(record, use_parallel),
        MotifCase::Convolution => count_convolution(record, use_parallel),
    }
}

fn count_ordinary(record: &Record, use_parallel: bool) {
    let cms = record.cms();
    let combs = record.combs().view();
    let motif_size = record.motif_size();

    for b in 0..record.num_batches() {
        let refs = record.ref_batch(b);
        let body = |n: usize| {
            let seq = refs.index_axis(Axis(2), n);
            let mut filters = Vec::with_capacity(motif_size);
            for j in 0..combs.ncols() {
                if !gather_ordinary(&seq, &combs, j, &mut filters) {
                    continue;
                }
                for row in 0..cms.depth() {
                    let hash = hash_ordinary(cms, row, &filters);
                    cms.increment(row, cms.fold(hash));
                }
            }
        };
        if use_parallel {
            (0..record.batch_len(b)).into_par_iter().for_each(body);
        } else {
            (0..record.batch_len(b)).for_each(body);
        }
    }
}

fn count_convolution(record: &Record, use_parallel: bool) {
    let cms = record.cms();
    let combs = record.combs().view();
    let motif_size = record.motif_size();
    let filter_len = record.filter_len().unwrap_or(1);

    for b in 0..record.num_batches() {
        let refs = record.ref_batch(b);
        let body = |n: usize| {
            let seq = refs.index_axis(Axis(2), n);
            let mut filters = Vec::with_capacity(motif_size);
            let mut gaps = Vec::with_capacity(motif_size.saturating_sub(1));
            for j in 0..combs.ncols() {
                if !gather_convolution(&seq, &combs, j, filter_len, &mut filters, &mut gaps) {
                    continue;
                }
                for row in 0..cms.depth() {
                    let hash = hash_convolution(cms, row, &filters, &gaps);
                    cms.increment(row, cms.fold(hash));
                }
            }
        };
        if use_parallel {
            (0..record.batch_len(b)).into_par_iter().for_each(body);
        } else {
            (0..record.batch_len(b)).for_each(body);
        }
    }
}
