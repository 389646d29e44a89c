//! Input feature types for motif mining.
//!
//! A corpus is a mapping from an integer sequence id to an ordered list of
//! features. All sequences in one corpus must carry the same feature kind;
//! the kind of the first non-empty sequence decides the operating case and
//! is enforced uniformly during record construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Operating case of a whole corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotifCase {
    /// Unordered tuples of feature ids.
    Ordinary,
    /// Ordered tuples of filter ids paired with inter-filter gaps.
    Convolution,
}

impl MotifCase {
    /// Columns per slot in the reference tensor: filter id and data-point id,
    /// plus a position column for convolution.
    pub fn ref_columns(self) -> usize {
        match self {
            MotifCase::Ordinary => 2,
            MotifCase::Convolution => 3,
        }
    }

    /// Coefficient columns per hash row: one per filter, and for convolution
    /// one per inter-filter gap interleaved between them.
    pub fn hash_arity(self, motif_size: usize) -> usize {
        match self {
            MotifCase::Ordinary => motif_size,
            MotifCase::Convolution => 2 * motif_size - 1,
        }
    }
}

impl std::fmt::Display for MotifCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MotifCase::Ordinary => "ordinary",
            MotifCase::Convolution => "convolution",
        };
        f.write_str(name)
    }
}

/// One feature occurrence inside a sequence.
///
/// Ids must be >= 1: zero marks an absent slot in the padded batch tensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Ordinary {
        id: i32,
        contribution: f32,
    },
    Convolution {
        filter_id: i32,
        contribution: f32,
        position: i32,
    },
}

impl Feature {
    /// The case this feature belongs to.
    pub fn case(&self) -> MotifCase {
        match self {
            Feature::Ordinary { .. } => MotifCase::Ordinary,
            Feature::Convolution { .. } => MotifCase::Convolution,
        }
    }

    /// Feature or filter id.
    pub fn id(&self) -> i32 {
        match self {
            Feature::Ordinary { id, .. } => *id,
            Feature::Convolution { filter_id, .. } => *filter_id,
        }
    }

    /// Attribution weight of this occurrence.
    pub fn contribution(&self) -> f32 {
        match self {
            Feature::Ordinary { contribution, .. } => *contribution,
            Feature::Convolution { contribution, .. } => *contribution,
        }
    }

    /// Position within the sequence; `None` for ordinary features.
    pub fn position(&self) -> Option<i32> {
        match self {
            Feature::Ordinary { .. } => None,
            Feature::Convolution { position, .. } => Some(*position),
        }
    }
}

/// A corpus keyed by caller-chosen sequence id.
///
/// `BTreeMap` keeps iteration order stable, which makes batch layout and row
/// emission deterministic for a given input.
pub type InputMap = BTreeMap<i32, Vec<Feature>>;

/// Case of the first non-empty sequence; `None` when every sequence is empty.
pub fn infer_case(map: &InputMap) -> Option<MotifCase> {
    map.values()
        .find(|features| !features.is_empty())
        .map(|features| features[0].case())
}

/// Reference-tensor column holding the filter id (zero = padding).
pub const FILTER_COL: usize = 0;
/// Reference-tensor column holding the caller's sequence id.
pub const DATA_COL: usize = 1;
/// Reference-tensor column holding the position (convolution only).
pub const POS_COL: usize = 2;
