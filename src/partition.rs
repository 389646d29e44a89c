//! Length-partitioned mining: one shared sketch, one record per bucket.
//!
//! Sequences are bucketed by length into windows of `partition_width` slots
//! starting at the shortest retained length. Each bucket becomes its own
//! record — with a combination table and batch size fitted to the bucket's
//! own maximum length — so a corpus mixing short and long sequences never
//! pays the long sequences' combinatorial fan-out for every record. All
//! records share one sketch, so counts accumulate globally; selection stays
//! local to the bucket under scrutiny.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    build_record, emit_stage, emit_warning, ensure_accelerator, infer_case, run_passes,
    CountMinSketch, EnrichConfig, InputMap, MineError, MiningStage, MotifCase, MotifTable,
    RecordError,
};

/// Mine a corpus bucket-by-bucket against one shared sketch.
///
/// Emitted rows are concatenated in bucket order. Counts are global across
/// buckets, but selection only ever inspects the combinations present in the
/// current bucket's record; with `min_count > 1` a motif spread thinly over
/// earlier buckets can therefore be missed. Such calls trigger an advisory
/// telling the caller to mine with `min_count = 1` and filter on the emitted
/// `count` column instead.
pub fn enrich_partitioned(map: InputMap, cfg: &EnrichConfig) -> Result<MotifTable, MineError> {
    cfg.validate()?;
    ensure_accelerator(cfg.accelerator)?;

    let mut map = map;
    map.retain(|_, features| !features.is_empty());
    let case = infer_case(&map).ok_or(RecordError::EmptyInput)?;
    if case == MotifCase::Convolution && cfg.filter_len.is_none() {
        return Err(RecordError::MissingFilterLen.into());
    }

    if cfg.min_count > 1 {
        emit_warning(
            MiningStage::Partition,
            format!(
                "partitioned selection with min_count={} only sees one length bucket at a \
                 time; use min_count=1 and filter rows by their count field downstream",
                cfg.min_count
            ),
        );
    }

    let cms = Arc::new(CountMinSketch::new(
        case.hash_arity(cfg.motif_size),
        &cfg.sketch,
    )?);

    let min_len = map
        .values()
        .map(Vec::len)
        .min()
        .ok_or_else(|| MineError::InternalInvariant("retained corpus has no sequences".into()))?;

    // Buckets cover [min_len + i*w, min_len + (i+1)*w - 1]; empty buckets
    // simply never materialise.
    let mut buckets: BTreeMap<usize, InputMap> = BTreeMap::new();
    for (key, features) in map {
        let bucket = (features.len() - min_len) / cfg.partition_width;
        buckets.entry(bucket).or_default().insert(key, features);
    }

    let mut table = MotifTable::empty(case, cfg.motif_size);
    for (bucket, partition) in buckets {
        let bucket_max = partition.values().map(Vec::len).max().unwrap_or(0);
        if bucket_max < cfg.motif_size {
            // Every sequence here is too short to host a single combination.
            continue;
        }

        let start = Instant::now();
        let mut record = build_record(partition, &cfg.record_params(), Arc::clone(&cms))?;
        emit_stage(
            MiningStage::Build,
            start.elapsed(),
            Some(bucket),
            record.total_points(),
            None,
        );

        let rows = run_passes(&mut record, cfg, Some(bucket));
        table.append(rows);
        // The record, its tensors, and its bitmaps drop here; only the
        // shared sketch survives into the next bucket.
    }

    Ok(table)
}
