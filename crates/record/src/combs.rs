//! Enumeration of k-of-L position combinations.
//!
//! The combination table is produced once per record and drives every pass:
//! column `j` holds the `j`-th k-subset of `{1..L}` in lexicographic order,
//! as 1-based slot indices, strictly increasing down the column.

use ndarray::{Array2, ShapeBuilder};

use planner::binomial;

/// Dense `k x m` combination matrix, `m = C(max_len, motif_size)`, columns in
/// lexicographic order. `motif_size > max_len` yields a `k x 0` matrix.
pub fn combinations(motif_size: usize, max_len: usize) -> Array2<i32> {
    let k = motif_size;
    let m = binomial(max_len, k) as usize;
    if m == 0 {
        return Array2::zeros((k, 0));
    }

    let mut data = Vec::with_capacity(k * m);
    let mut current: Vec<i32> = (1..=k as i32).collect();
    loop {
        data.extend_from_slice(&current);
        // Advance the rightmost index that still has headroom.
        let mut e = k;
        loop {
            if e == 0 {
                // Column-major fill: each pushed column is contiguous.
                return Array2::from_shape_vec((k, m).f(), data)
                    .expect("combination table has k * C(L, k) entries");
            }
            e -= 1;
            if current[e] < (max_len - (k - 1 - e)) as i32 {
                current[e] += 1;
                for i in e + 1..k {
                    current[i] = current[i - 1] + 1;
                }
                break;
            }
        }
    }
}
