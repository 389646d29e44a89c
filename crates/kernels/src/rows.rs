//! Emitted motif rows and the table that carries them.
//!
//! The table's schema is fully determined by `(case, motif_size)` so that a
//! run with zero selected combinations still hands downstream sinks a typed
//! empty result.

use serde::{Deserialize, Serialize};

use record::MotifCase;

/// One enriched motif occurrence in one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifRow {
    /// Filter ids `m_1..m_k` in combination order.
    pub motif: Vec<i32>,
    /// Inter-filter gaps `d_12..d_{k-1,k}`; empty for ordinary motifs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<i32>,
    /// Position of the first filter (convolution only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i32>,
    /// Last covered position, `pos_k + filter_len - 1` (convolution only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i32>,
    /// The caller's id of the containing sequence.
    pub data_index: i32,
    /// Sum of the k participating contribution values.
    pub contribution: f32,
    /// Sketch estimate at selection time; never below the true count.
    pub count: u32,
}

/// A batch-ordered stream of motif rows with a fixed schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifTable {
    pub case: MotifCase,
    pub motif_size: usize,
    pub rows: Vec<MotifRow>,
}

impl MotifTable {
    /// A table with the right schema and no rows.
    pub fn empty(case: MotifCase, motif_size: usize) -> Self {
        Self {
            case,
            motif_size,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in emission order, independent of row content.
    pub fn column_names(&self) -> Vec<String> {
        let k = self.motif_size;
        let mut names: Vec<String> = (1..=k).map(|e| format!("m{e}")).collect();
        if self.case == MotifCase::Convolution {
            names.extend((1..k).map(|e| format!("d{}_{}", e, e + 1)));
            names.push("start".to_string());
            names.push("end".to_string());
        }
        names.push("data_index".to_string());
        names.push("contribution".to_string());
        names.push("count".to_string());
        names
    }

    /// Move another table's rows onto the end of this one.
    pub fn append(&mut self, mut other: MotifTable) {
        self.rows.append(&mut other.rows);
    }
}
