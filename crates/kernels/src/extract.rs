//! The extraction pass: compact selection bitmaps into motif rows.
//!
//! Extraction is read-only. Rows come out batch by batch, sequences in
//! column order within a batch, so repeated runs over the same record yield
//! the same row stream.

use ndarray::Axis;
use rayon::prelude::*;

use record::{MotifCase, Record, DATA_COL, POS_COL};

use crate::hash::{estimate_convolution, estimate_ordinary, gather_convolution, gather_ordinary};
use crate::rows::{MotifRow, MotifTable};

/// Emit one row per selected (combination, sequence) pair.
///
/// The `count` field is the sketch estimate the selection pass saw; the
/// sketch is not mutated between the two passes, so recomputing it here
/// reproduces the selection-time value.
pub fn extract_pass(record: &Record, use_parallel: bool) -> MotifTable {
    let mut table = MotifTable::empty(record.case(), record.motif_size());
    match record.case() {
        MotifCase::Ordinary => extract_ordinary(record, use_parallel, &mut table),
        MotifCase::Convolution => extract_convolution(record, use_parallel, &mut table),
    }
    table
}

fn extract_ordinary(record: &Record, use_parallel: bool, table: &mut MotifTable) {
    let cms = record.cms();
    let combs = record.combs().view();
    let k = record.motif_size();

    for b in 0..record.num_batches() {
        let refs = record.ref_batch(b);
        let contribs = record.contrib_batch(b);
        let bitmap = record.selection(b);
        let per_seq = |n: usize| {
            let seq = refs.index_axis(Axis(2), n);
            let mut filters = Vec::with_capacity(k);
            let mut out = Vec::new();
            for j in 0..combs.ncols() {
                if !bitmap[[j, n]] {
                    continue;
                }
                if !gather_ordinary(&seq, &combs, j, &mut filters) {
                    continue;
                }
                let contribution = (0..k)
                    .map(|e| contribs[[combs[[e, j]] as usize - 1, n]])
                    .sum();
                out.push(MotifRow {
                    motif: filters.clone(),
                    gaps: Vec::new(),
                    start: None,
                    end: None,
                    data_index: seq[[combs[[k - 1, j]] as usize - 1, DATA_COL]],
                    contribution,
                    count: estimate_ordinary(cms, &filters),
                });
            }
            out
        };
        let batch_rows: Vec<Vec<MotifRow>> = if use_parallel {
            (0..record.batch_len(b)).into_par_iter().map(per_seq).collect()
        } else {
            (0..record.batch_len(b)).map(per_seq).collect()
        };
        table.rows.extend(batch_rows.into_iter().flatten());
    }
}

fn extract_convolution(record: &Record, use_parallel: bool, table: &mut MotifTable) {
    let cms = record.cms();
    let combs = record.combs().view();
    let k = record.motif_size();
    let filter_len = record.filter_len().unwrap_or(1);

    for b in 0..record.num_batches() {
        let refs = record.ref_batch(b);
        let contribs = record.contrib_batch(b);
        let bitmap = record.selection(b);
        let per_seq = |n: usize| {
            let seq = refs.index_axis(Axis(2), n);
            let mut filters = Vec::with_capacity(k);
            let mut gaps = Vec::with_capacity(k.saturating_sub(1));
            let mut out = Vec::new();
            for j in 0..combs.ncols() {
                if !bitmap[[j, n]] {
                    continue;
                }
                if !gather_convolution(&seq, &combs, j, filter_len, &mut filters, &mut gaps) {
                    continue;
                }
                let contribution = (0..k)
                    .map(|e| contribs[[combs[[e, j]] as usize - 1, n]])
                    .sum();
                let first_slot = combs[[0, j]] as usize - 1;
                let last_slot = combs[[k - 1, j]] as usize - 1;
                out.push(MotifRow {
                    motif: filters.clone(),
                    gaps: gaps.clone(),
                    start: Some(seq[[first_slot, POS_COL]]),
                    end: Some(seq[[last_slot, POS_COL]] + filter_len - 1),
                    data_index: seq[[last_slot, DATA_COL]],
                    contribution,
                    count: estimate_convolution(cms, &filters, &gaps),
                });
            }
            out
        };
        let batch_rows: Vec<Vec<MotifRow>> = if use_parallel {
            (0..record.batch_len(b)).into_par_iter().map(per_seq).collect()
        } else {
            (0..record.batch_len(b)).map(per_seq).collect()
        };
        table.rows.extend(batch_rows.into_iter().flatten());
    }
}
