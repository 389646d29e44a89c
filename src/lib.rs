//! Workspace umbrella crate for motifmine.
//!
//! Motifmine discovers *enriched k-element motifs* — combinations of k
//! feature ids that recur across a corpus of short variable-length sequences
//! — without materialising the exact frequency table. Combinations are
//! counted into a Count-Min Sketch, selected against a frequency threshold,
//! and compacted into a typed row stream. Two problem cases are supported:
//! **ordinary** motifs (tuples of feature ids) and **convolution** motifs
//! (tuples of filter ids paired with the gaps between their positions).
//!
//! The `motifmine` crate re-exports the sketch, record, planner, and kernel
//! layers so applications can drive the whole pipeline through a single
//! dependency. [`enrich`] runs one record end-to-end; [`enrich_partitioned`]
//! buckets the corpus by sequence length and mines each bucket with its own
//! planned batch size against one shared sketch; [`plan_batch`] exposes the
//! memory planner for diagnostics.
//!
//! ## Quick start
//!
//! ```
//! use motifmine::{enrich, EnrichConfig, Feature, InputMap};
//!
//! let mut map = InputMap::new();
//! for key in 1..=3 {
//!     map.insert(key, vec![
//!         Feature::Ordinary { id: 10, contribution: 1.0 },
//!         Feature::Ordinary { id: 20, contribution: 1.0 },
//!     ]);
//! }
//!
//! let cfg = EnrichConfig::new().with_motif_size(2).with_min_count(2);
//! let table = enrich(map, &cfg).unwrap();
//!
//! assert_eq!(table.len(), 3);
//! assert!(table.rows.iter().all(|row| row.motif == vec![10, 20]));
//! ```
//!
//! ## Observability
//!
//! Structured stage events can be captured by installing a
//! [`MiningEventLogger`] with [`set_mining_logger`]. Each event carries the
//! stage, outcome, latency, and — in the partitioned path — the partition
//! index. The partitioner's `min_count > 1` advisory is emitted through the
//! same hook, falling back to stderr when no logger is installed.
//!
//! ## Errors
//!
//! Failures from any layer converge on [`MineError`], which wraps the source
//! error so callers can distinguish configuration, input, memory, and
//! accelerator failures without depending on the member crates.

pub use kernels::{count_pass, extract_pass, select_pass, MotifRow, MotifTable};
pub use planner::{BatchPlan, PlanError};
pub use record::{
    build_record, infer_case, BatchPolicy, Feature, InputMap, MotifCase, PlanningOptions, Record,
    RecordError, RecordParams, LEGACY_BATCH_SIZE,
};
pub use sketch::{CountMinSketch, SketchConfig, SketchError, DEFAULT_SEED};

pub mod config;
mod partition;

pub use crate::partition::enrich_partitioned;

use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Compute backend the passes should run on.
///
/// This build ships CPU kernels; requesting [`Accelerator::Gpu`] fails with
/// [`MineError::AcceleratorUnavailable`] rather than silently falling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accelerator {
    Cpu,
    Gpu,
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Accelerator::Cpu => "cpu",
            Accelerator::Gpu => "gpu",
        };
        f.write_str(name)
    }
}

/// Configuration for [`enrich`] and [`enrich_partitioned`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Motif size k.
    pub motif_size: usize,
    /// Filter length; required for convolution corpora.
    pub filter_len: Option<i32>,
    /// Sketch error parameters and seed.
    pub sketch: SketchConfig,
    /// Minimum estimated frequency for a combination to be emitted.
    pub min_count: u32,
    /// Batch sizing policy.
    pub batch: BatchPolicy,
    /// Planner knobs for the auto batch policy.
    pub planning: PlanningOptions,
    /// Width of the sequence-length buckets in the partitioned path.
    pub partition_width: usize,
    /// Compute backend.
    pub accelerator: Accelerator,
    /// Run the passes on the rayon pool; sequential execution yields
    /// identical results.
    pub use_parallel: bool,
}

impl EnrichConfig {
    /// Create a configuration with the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the motif size k.
    pub fn with_motif_size(mut self, motif_size: usize) -> Self {
        self.motif_size = motif_size;
        self
    }

    /// Set the filter length (convolution corpora only).
    pub fn with_filter_len(mut self, filter_len: i32) -> Self {
        self.filter_len = Some(filter_len);
        self
    }

    /// Set the enrichment threshold.
    pub fn with_min_count(mut self, min_count: u32) -> Self {
        self.min_count = min_count;
        self
    }

    /// Set the batch policy.
    pub fn with_batch(mut self, batch: BatchPolicy) -> Self {
        self.batch = batch;
        self
    }

    /// Set the sketch seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sketch = self.sketch.with_seed(seed);
        self
    }

    /// Set the length-bucket width for the partitioned path.
    pub fn with_partition_width(mut self, partition_width: usize) -> Self {
        self.partition_width = partition_width;
        self
    }

    /// Toggle rayon parallelism.
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Request a compute backend.
    pub fn with_accelerator(mut self, accelerator: Accelerator) -> Self {
        self.accelerator = accelerator;
        self
    }

    /// Validate every knob that does not depend on the input map.
    pub fn validate(&self) -> Result<(), MineError> {
        self.sketch.validate()?;
        self.record_params().validate()?;
        if self.min_count == 0 {
            return Err(MineError::InvalidMinCount {
                min_count: self.min_count,
            });
        }
        if self.partition_width == 0 {
            return Err(MineError::InvalidPartitionWidth {
                partition_width: self.partition_width,
            });
        }
        Ok(())
    }

    /// Record-construction view of this configuration.
    pub fn record_params(&self) -> RecordParams {
        RecordParams {
            motif_size: self.motif_size,
            filter_len: self.filter_len,
            batch: self.batch,
            planning: self.planning,
        }
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            motif_size: 3,
            filter_len: None,
            sketch: SketchConfig::default(),
            min_count: 1,
            batch: BatchPolicy::Auto,
            planning: PlanningOptions::default(),
            partition_width: 10,
            accelerator: Accelerator::Cpu,
            use_parallel: true,
        }
    }
}

/// Errors that can occur while mining a corpus.
#[derive(Debug, Clone)]
pub enum MineError {
    Sketch(SketchError),
    Record(RecordError),
    Plan(PlanError),
    InvalidMinCount { min_count: u32 },
    InvalidPartitionWidth { partition_width: usize },
    AcceleratorUnavailable { requested: Accelerator },
    InternalInvariant(String),
}

impl fmt::Display for MineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MineError::Sketch(err) => write!(f, "sketch configuration failure: {err}"),
            MineError::Record(err) => write!(f, "record construction failure: {err}"),
            MineError::Plan(err) => write!(f, "memory planning failure: {err}"),
            MineError::InvalidMinCount { min_count } => {
                write!(f, "min_count must be >= 1 (got {min_count})")
            }
            MineError::InvalidPartitionWidth { partition_width } => {
                write!(f, "partition width must be >= 1 (got {partition_width})")
            }
            MineError::AcceleratorUnavailable { requested } => {
                write!(
                    f,
                    "accelerator '{requested}' requested but not available in this build"
                )
            }
            MineError::InternalInvariant(message) => {
                write!(f, "internal invariant violated: {message}")
            }
        }
    }
}

impl Error for MineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MineError::Sketch(err) => Some(err),
            MineError::Record(err) => Some(err),
            MineError::Plan(err) => Some(err),
            MineError::InvalidMinCount { .. }
            | MineError::InvalidPartitionWidth { .. }
            | MineError::AcceleratorUnavailable { .. }
            | MineError::InternalInvariant(_) => None,
        }
    }
}

impl From<SketchError> for MineError {
    fn from(value: SketchError) -> Self {
        MineError::Sketch(value)
    }
}

impl From<RecordError> for MineError {
    fn from(value: RecordError) -> Self {
        MineError::Record(value)
    }
}

impl From<PlanError> for MineError {
    fn from(value: PlanError) -> Self {
        MineError::Plan(value)
    }
}

/// Pipeline stage captured in observability events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningStage {
    Build,
    Count,
    Select,
    Extract,
    Partition,
}

impl fmt::Display for MiningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MiningStage::Build => "build",
            MiningStage::Count => "count",
            MiningStage::Select => "select",
            MiningStage::Extract => "extract",
            MiningStage::Partition => "partition",
        };
        f.write_str(name)
    }
}

/// Outcome of a mining stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningEventStatus {
    Success,
    Warning,
}

impl fmt::Display for MiningEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MiningEventStatus::Success => "success",
            MiningEventStatus::Warning => "warning",
        };
        f.write_str(label)
    }
}

/// Structured observation describing one mining stage.
#[derive(Debug, Clone)]
pub struct MiningEvent {
    pub stage: MiningStage,
    pub status: MiningEventStatus,
    pub latency: Duration,
    /// Bucket index in the partitioned path.
    pub partition: Option<usize>,
    /// Sequences the stage worked over.
    pub sequences: usize,
    /// Rows emitted, for the extract stage.
    pub rows: Option<usize>,
    pub message: Option<String>,
}

impl MiningEvent {
    fn format_key_values(&self, include_timestamp: bool) -> String {
        let mut parts = Vec::new();
        if include_timestamp {
            let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            parts.push(format!("timestamp=\"{ts}\""));
        }
        parts.push(format!("stage={}", self.stage));
        parts.push(format!("status={}", self.status));
        parts.push(format!("latency_us={}", self.latency.as_micros()));
        if let Some(partition) = self.partition {
            parts.push(format!("partition={partition}"));
        }
        parts.push(format!("sequences={}", self.sequences));
        if let Some(rows) = self.rows {
            parts.push(format!("rows={rows}"));
        }
        if let Some(message) = &self.message {
            let message = escape_kv(message);
            parts.push(format!("message=\"{message}\""));
        }
        parts.join(" ")
    }
}

fn escape_kv(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Hook for receiving structured events per mining stage.
pub trait MiningEventLogger: Send + Sync {
    fn log(&self, event: &MiningEvent);
}

/// Simple key-value logger that writes structured events to any writer.
pub struct KeyValueLogger {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    include_timestamp: bool,
}

impl KeyValueLogger {
    /// Create a logger that writes to stdout.
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Create a logger that writes to stderr.
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// Create a logger backed by the provided writer.
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            include_timestamp: true,
        }
    }

    /// Toggle timestamp emission for the structured log line.
    pub fn with_timestamps(mut self, include_timestamp: bool) -> Self {
        self.include_timestamp = include_timestamp;
        self
    }
}

impl MiningEventLogger for KeyValueLogger {
    fn log(&self, event: &MiningEvent) {
        if let Ok(mut writer) = self.writer.lock() {
            let line = event.format_key_values(self.include_timestamp);
            let _ = writeln!(writer, "{line}");
        }
    }
}

/// Install or clear the global mining event logger.
pub fn set_mining_logger(logger: Option<Arc<dyn MiningEventLogger>>) {
    let lock = logger_lock();
    let mut guard = lock
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = logger;
}

fn logger_lock() -> &'static RwLock<Option<Arc<dyn MiningEventLogger>>> {
    static LOGGER: OnceLock<RwLock<Option<Arc<dyn MiningEventLogger>>>> = OnceLock::new();
    LOGGER.get_or_init(|| RwLock::new(None))
}

fn mining_logger() -> Option<Arc<dyn MiningEventLogger>> {
    let guard = logger_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) fn emit_stage(
    stage: MiningStage,
    latency: Duration,
    partition: Option<usize>,
    sequences: usize,
    rows: Option<usize>,
) {
    if let Some(logger) = mining_logger() {
        logger.log(&MiningEvent {
            stage,
            status: MiningEventStatus::Success,
            latency,
            partition,
            sequences,
            rows,
            message: None,
        });
    }
}

/// Emit an advisory; stderr when no logger is installed so the warning is
/// never silently dropped.
pub(crate) fn emit_warning(stage: MiningStage, message: String) {
    let event = MiningEvent {
        stage,
        status: MiningEventStatus::Warning,
        latency: Duration::ZERO,
        partition: None,
        sequences: 0,
        rows: None,
        message: Some(message),
    };
    match mining_logger() {
        Some(logger) => logger.log(&event),
        None => eprintln!("{}", event.format_key_values(false)),
    }
}

pub(crate) fn ensure_accelerator(requested: Accelerator) -> Result<(), MineError> {
    match requested {
        Accelerator::Cpu => Ok(()),
        Accelerator::Gpu => Err(MineError::AcceleratorUnavailable { requested }),
    }
}

/// Mine one corpus end-to-end: build a record, count, select, extract.
///
/// The whole corpus is laid out as a single record (batched internally per
/// the batch policy). For corpora with widely varying sequence lengths,
/// [`enrich_partitioned`] keeps peak memory lower by processing one length
/// bucket at a time.
pub fn enrich(map: InputMap, cfg: &EnrichConfig) -> Result<MotifTable, MineError> {
    cfg.validate()?;
    ensure_accelerator(cfg.accelerator)?;

    let case = infer_case(&map).ok_or(RecordError::EmptyInput)?;
    if case == MotifCase::Convolution && cfg.filter_len.is_none() {
        return Err(RecordError::MissingFilterLen.into());
    }

    let cms = Arc::new(CountMinSketch::new(
        case.hash_arity(cfg.motif_size),
        &cfg.sketch,
    )?);

    let start = Instant::now();
    let mut record = build_record(map, &cfg.record_params(), cms)?;
    emit_stage(
        MiningStage::Build,
        start.elapsed(),
        None,
        record.total_points(),
        None,
    );

    Ok(run_passes(&mut record, cfg, None))
}

/// Count, select, and extract over an already-built record.
pub(crate) fn run_passes(
    record: &mut Record,
    cfg: &EnrichConfig,
    partition: Option<usize>,
) -> MotifTable {
    let sequences = record.total_points();

    let start = Instant::now();
    count_pass(record, cfg.use_parallel);
    emit_stage(
        MiningStage::Count,
        start.elapsed(),
        partition,
        sequences,
        None,
    );

    let start = Instant::now();
    select_pass(record, cfg.min_count, cfg.use_parallel);
    emit_stage(
        MiningStage::Select,
        start.elapsed(),
        partition,
        sequences,
        None,
    );

    let start = Instant::now();
    let table = extract_pass(record, cfg.use_parallel);
    emit_stage(
        MiningStage::Extract,
        start.elapsed(),
        partition,
        sequences,
        Some(table.len()),
    );
    table
}

/// Report the batch size and memory breakdown the planner would choose for
/// a corpus of `total_points` sequences of length up to `max_len`.
pub fn plan_batch(
    total_points: usize,
    max_len: usize,
    case: MotifCase,
    cfg: &EnrichConfig,
) -> Result<BatchPlan, MineError> {
    cfg.validate()?;
    let (depth, width) = cfg.sketch.dims();
    let plan = planner::plan(&planner::PlanRequest {
        total_points,
        max_len,
        motif_size: cfg.motif_size,
        ref_columns: case.ref_columns(),
        hash_arity: case.hash_arity(cfg.motif_size),
        sketch_depth: depth,
        sketch_width: width,
        target_bytes: cfg.planning.target_bytes,
        safety: cfg.planning.safety,
        min_batch: cfg.planning.min_batch,
        max_batch: cfg.planning.max_batch,
    })?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordinary_map(keys: &[i32]) -> InputMap {
        keys.iter()
            .map(|&key| {
                (
                    key,
                    vec![
                        Feature::Ordinary {
                            id: 10,
                            contribution: 1.0,
                        },
                        Feature::Ordinary {
                            id: 20,
                            contribution: 1.0,
                        },
                    ],
                )
            })
            .collect()
    }

    #[test]
    fn config_defaults_match_documentation() {
        let cfg = EnrichConfig::default();
        assert_eq!(cfg.motif_size, 3);
        assert_eq!(cfg.filter_len, None);
        assert_eq!(cfg.min_count, 1);
        assert_eq!(cfg.batch, BatchPolicy::Auto);
        assert_eq!(cfg.partition_width, 10);
        assert_eq!(cfg.accelerator, Accelerator::Cpu);
        assert!(cfg.use_parallel);
        assert_eq!(cfg.sketch.delta, 1e-4);
        assert_eq!(cfg.sketch.epsilon, 5e-5);
    }

    #[test]
    fn config_builder_chain() {
        let cfg = EnrichConfig::new()
            .with_motif_size(2)
            .with_filter_len(8)
            .with_min_count(5)
            .with_seed(42)
            .with_partition_width(4)
            .with_parallel(false)
            .with_batch(BatchPolicy::Fixed(LEGACY_BATCH_SIZE));
        assert_eq!(cfg.motif_size, 2);
        assert_eq!(cfg.filter_len, Some(8));
        assert_eq!(cfg.min_count, 5);
        assert_eq!(cfg.sketch.seed, 42);
        assert_eq!(cfg.partition_width, 4);
        assert!(!cfg.use_parallel);
        assert_eq!(cfg.batch, BatchPolicy::Fixed(500));
    }

    #[test]
    fn config_validate_rejects_bad_knobs() {
        assert!(matches!(
            EnrichConfig::new().with_min_count(0).validate(),
            Err(MineError::InvalidMinCount { min_count: 0 })
        ));
        assert!(matches!(
            EnrichConfig::new().with_partition_width(0).validate(),
            Err(MineError::InvalidPartitionWidth { .. })
        ));
        assert!(matches!(
            EnrichConfig::new().with_motif_size(0).validate(),
            Err(MineError::Record(RecordError::InvalidMotifSize { .. }))
        ));
        let mut cfg = EnrichConfig::new();
        cfg.sketch.delta = 2.0;
        assert!(matches!(
            cfg.validate(),
            Err(MineError::Sketch(SketchError::InvalidDelta { .. }))
        ));
    }

    #[test]
    fn gpu_request_fails_without_backend() {
        let cfg = EnrichConfig::new()
            .with_motif_size(2)
            .with_accelerator(Accelerator::Gpu);
        let result = enrich(ordinary_map(&[1, 2]), &cfg);
        assert!(matches!(
            result,
            Err(MineError::AcceleratorUnavailable {
                requested: Accelerator::Gpu
            })
        ));
    }

    #[test]
    fn enrich_empty_input_is_an_error() {
        let cfg = EnrichConfig::new().with_motif_size(2);
        let result = enrich(InputMap::new(), &cfg);
        assert!(matches!(
            result,
            Err(MineError::Record(RecordError::EmptyInput))
        ));
    }

    #[test]
    fn mine_error_display_and_source() {
        let err = MineError::from(RecordError::EmptyInput);
        assert!(err.to_string().contains("record construction"));
        assert!(err.source().is_some());
        let err = MineError::AcceleratorUnavailable {
            requested: Accelerator::Gpu,
        };
        assert!(err.to_string().contains("gpu"));
        assert!(err.source().is_none());
    }

    #[test]
    fn event_format_includes_context() {
        let event = MiningEvent {
            stage: MiningStage::Extract,
            status: MiningEventStatus::Success,
            latency: Duration::from_micros(250),
            partition: Some(2),
            sequences: 100,
            rows: Some(7),
            message: None,
        };
        let line = event.format_key_values(false);
        assert_eq!(
            line,
            "stage=extract status=success latency_us=250 partition=2 sequences=100 rows=7"
        );
    }

    #[test]
    fn event_message_is_escaped() {
        let event = MiningEvent {
            stage: MiningStage::Partition,
            status: MiningEventStatus::Warning,
            latency: Duration::ZERO,
            partition: None,
            sequences: 0,
            rows: None,
            message: Some("say \"hi\"\n".to_string()),
        };
        let line = event.format_key_values(false);
        assert!(line.contains("message=\"say \\\"hi\\\"\\n\""));
    }
}
