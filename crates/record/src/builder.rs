//! Record construction: normalising an input map into padded batch tensors.
//!
//! A record owns everything one mining run needs: the combination table, the
//! reference and contribution batches, the per-batch selection bitmaps, and
//! a shared handle to the sketch. After construction only two things are ever
//! written: sketch counters (by the counting pass) and selection bitmaps (by
//! the selection pass).

use std::sync::Arc;

use ndarray::{Array2, Array3};

use planner::{plan, PlanRequest};
use sketch::CountMinSketch;

use crate::combs::combinations;
use crate::config::{BatchPolicy, RecordError, RecordParams};
use crate::types::{infer_case, InputMap, MotifCase, DATA_COL, FILTER_COL, POS_COL};

/// Batched, padded view of a corpus, ready for the mining passes.
#[derive(Debug)]
pub struct Record {
    case: MotifCase,
    motif_size: usize,
    filter_len: Option<i32>,
    max_active_len: usize,
    batch_size: usize,
    total_points: usize,
    /// `k x m` slot-index combinations, 1-based, lexicographic columns.
    combs: Array2<i32>,
    /// One `L x R x B_i` tensor per batch.
    ref_batches: Vec<Array3<i32>>,
    /// One `L x B_i` contribution tensor per batch.
    contrib_batches: Vec<Array2<f32>>,
    /// One `m x B_i` bitmap per batch; written only by the selection pass.
    selection: Vec<Array2<bool>>,
    cms: Arc<CountMinSketch>,
}

impl Record {
    pub fn case(&self) -> MotifCase {
        self.case
    }

    pub fn motif_size(&self) -> usize {
        self.motif_size
    }

    /// Filter length; present iff the case is convolution.
    pub fn filter_len(&self) -> Option<i32> {
        self.filter_len
    }

    /// Longest retained sequence length L.
    pub fn max_active_len(&self) -> usize {
        self.max_active_len
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Retained sequence count across all batches.
    pub fn total_points(&self) -> usize {
        self.total_points
    }

    /// Number of combinations m.
    pub fn num_combinations(&self) -> usize {
        self.combs.ncols()
    }

    pub fn num_batches(&self) -> usize {
        self.ref_batches.len()
    }

    /// Sequences in batch `b`.
    pub fn batch_len(&self, b: usize) -> usize {
        self.ref_batches[b].shape()[2]
    }

    pub fn combs(&self) -> &Array2<i32> {
        &self.combs
    }

    pub fn ref_batch(&self, b: usize) -> &Array3<i32> {
        &self.ref_batches[b]
    }

    pub fn contrib_batch(&self, b: usize) -> &Array2<f32> {
        &self.contrib_batches[b]
    }

    pub fn selection(&self, b: usize) -> &Array2<bool> {
        &self.selection[b]
    }

    /// Split borrow for the selection pass: the combination table and the
    /// reference tensor of batch `b` read-only, its bitmap writable.
    pub fn selection_parts_mut(
        &mut self,
        b: usize,
    ) -> (&Array2<i32>, &Array3<i32>, &mut Array2<bool>) {
        (&self.combs, &self.ref_batches[b], &mut self.selection[b])
    }

    pub fn cms(&self) -> &CountMinSketch {
        &self.cms
    }

    /// Clone the shared sketch handle.
    pub fn cms_handle(&self) -> Arc<CountMinSketch> {
        Arc::clone(&self.cms)
    }
}

/// Normalise `map` and lay it out into a [`Record`] attached to `cms`.
///
/// Empty sequences are dropped; convolution sequences are sorted by position
/// in place. The sketch handle is shared, so partitioned callers can thread
/// one sketch through many records.
pub fn build_record(
    mut map: InputMap,
    params: &RecordParams,
    cms: Arc<CountMinSketch>,
) -> Result<Record, RecordError> {
    params.validate()?;

    map.retain(|_, features| !features.is_empty());
    let case = infer_case(&map).ok_or(RecordError::EmptyInput)?;

    if case == MotifCase::Convolution && params.filter_len.is_none() {
        return Err(RecordError::MissingFilterLen);
    }
    let filter_len = match case {
        MotifCase::Ordinary => None,
        MotifCase::Convolution => params.filter_len,
    };

    for (&sequence, features) in &map {
        for feature in features.iter() {
            if feature.case() != case {
                return Err(RecordError::MixedFeatureKinds { sequence });
            }
            if feature.id() < 1 {
                return Err(RecordError::NonPositiveId {
                    sequence,
                    id: feature.id(),
                });
            }
        }
    }

    if case == MotifCase::Convolution {
        for features in map.values_mut() {
            features.sort_by_key(|f| f.position());
        }
    }

    let max_len = map
        .values()
        .map(Vec::len)
        .max()
        .ok_or(RecordError::EmptyInput)?;
    if params.motif_size > max_len {
        return Err(RecordError::MotifSizeExceedsLength {
            motif_size: params.motif_size,
            max_len,
        });
    }

    let total_points = map.len();
    let batch_size = match params.batch {
        BatchPolicy::Fixed(batch_size) => batch_size,
        BatchPolicy::Auto => {
            plan(&PlanRequest {
                total_points,
                max_len,
                motif_size: params.motif_size,
                ref_columns: case.ref_columns(),
                hash_arity: case.hash_arity(params.motif_size),
                sketch_depth: cms.depth(),
                sketch_width: cms.width(),
                target_bytes: params.planning.target_bytes,
                safety: params.planning.safety,
                min_batch: params.planning.min_batch,
                max_batch: params.planning.max_batch,
            })?
            .batch_size
        }
    };

    let combs = combinations(params.motif_size, max_len);
    let num_combs = combs.ncols();
    let ref_columns = case.ref_columns();

    let entries: Vec<_> = map.into_iter().collect();
    let mut ref_batches = Vec::new();
    let mut contrib_batches = Vec::new();
    let mut selection = Vec::new();

    for chunk in entries.chunks(batch_size) {
        let b_len = chunk.len();
        let mut refs = Array3::<i32>::zeros((max_len, ref_columns, b_len));
        let mut contribs = Array2::<f32>::zeros((max_len, b_len));

        for (n, (sequence, features)) in chunk.iter().enumerate() {
            // Constant data-point column: every slot of the sequence carries
            // the caller's id, so any combination row can recover it.
            for i in 0..max_len {
                refs[[i, DATA_COL, n]] = *sequence;
            }
            for (i, feature) in features.iter().enumerate() {
                refs[[i, FILTER_COL, n]] = feature.id();
                if case == MotifCase::Convolution {
                    refs[[i, POS_COL, n]] = feature.position().unwrap_or(0);
                }
                contribs[[i, n]] = feature.contribution();
            }
        }

        ref_batches.push(refs);
        contrib_batches.push(contribs);
        selection.push(Array2::from_elem((num_combs, b_len), false));
    }

    Ok(Record {
        case,
        motif_size: params.motif_size,
        filter_len,
        max_active_len: max_len,
        batch_size,
        total_points,
        combs,
        ref_batches,
        contrib_batches,
        selection,
        cms,
    })
}
