//! Mining passes for motifmine.
//!
//! Three passes run in order over a built record:
//!
//! 1. **Count** — every valid combination of every sequence increments the
//!    shared sketch, once per hash row.
//! 2. **Select** — every (combination, sequence) pair whose min-over-rows
//!    estimate reaches `min_count` is flagged in the record's bitmap.
//! 3. **Extract** — flagged pairs are compacted into [`MotifRow`]s.
//!
//! Between passes the caller owns synchronisation (on CPU the passes simply
//! return once their loops finish). Each pass takes a `use_parallel` switch;
//! parallel and sequential execution produce identical results.

mod count;
mod extract;
mod hash;
mod rows;
mod select;

pub use crate::count::count_pass;
pub use crate::extract::extract_pass;
pub use crate::rows::{MotifRow, MotifTable};
pub use crate::select::select_pass;
