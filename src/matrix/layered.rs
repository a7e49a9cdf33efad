//! Layered sparse storage for count matrices
//!
//! Count matrices are dominated by small integers. Each row is assigned to
//! the narrowest unsigned type able to hold its largest value, rows of the
//! same width are stored together as one CSC block, and the blocks are
//! stacked with a delayed row bind. Rows therefore move: the returned handle
//! carries row identities mapping each stored row back to its input row.

use super::{Axis, CompressedSparseMatrix, DelayedBind, Matrix, NumericMatrix, SparseValue};
use crate::error::{Result, ScranError};
use std::ops::Add;
use std::sync::Arc;

/// Largest value stored in the 8-bit layer
pub const U8_LIMIT: f64 = u8::MAX as f64;

/// Largest value stored in the 16-bit layer
pub const U16_LIMIT: f64 = u16::MAX as f64;

/// Largest value accepted at all
pub const U32_LIMIT: f64 = u32::MAX as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Width {
    U8,
    U16,
    U32,
}

impl Width {
    fn for_max(max: f64) -> Self {
        if max <= U8_LIMIT {
            Width::U8
        } else if max <= U16_LIMIT {
            Width::U16
        } else {
            Width::U32
        }
    }
}

/// Convert count triplets into the layered representation
///
/// Duplicated coordinates are summed before widths are chosen.
///
/// # Errors
///
/// - Any error from [`CompressedSparseMatrix::from_triplets`]
/// - [`ScranError::InvalidArgument`] if a (summed) value is negative,
///   fractional, non-finite, or larger than `u32::MAX`
///
/// # Example
///
/// ```
/// use scranwasm::matrix::layered;
///
/// // Row 0 needs 16 bits, row 1 fits in 8 bits, so row 1 is stored first
/// let m = layered::from_triplets(2, 2, &[0, 1], &[0, 1], &[1000.0, 3.0])?;
/// assert_eq!(m.row_identities(), Some(&[1, 0][..]));
/// assert_eq!(m.row_vec(0)?, vec![0.0, 3.0]);
/// assert_eq!(m.row_vec(1)?, vec![1000.0, 0.0]);
/// # Ok::<(), scranwasm::ScranError>(())
/// ```
pub fn from_triplets(
    nrow: usize,
    ncol: usize,
    rows: &[usize],
    cols: &[usize],
    values: &[f64],
) -> Result<NumericMatrix> {
    let by_row = CompressedSparseMatrix::from_triplets(nrow, ncol, rows, cols, values, true)?;
    let pointers = by_row.pointers();
    let summed = by_row.values();

    for &v in summed {
        if !(v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= U32_LIMIT) {
            return Err(ScranError::InvalidArgument(format!(
                "layered matrices require non-negative integer counts, found {}",
                v
            )));
        }
    }

    let widths: Vec<Width> = (0..nrow)
        .map(|r| {
            let max = summed[pointers[r]..pointers[r + 1]]
                .iter()
                .fold(0.0f64, |acc, &v| acc.max(v));
            Width::for_max(max)
        })
        .collect();

    // Stable grouping: all 8-bit rows, then 16-bit, then 32-bit
    let mut order: Vec<usize> = (0..nrow).collect();
    order.sort_by_key(|&r| widths[r]);

    let mut blocks: Vec<Arc<dyn Matrix>> = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let width = widths[order[start]];
        let end = start + order[start..].partition_point(|&r| widths[r] == width);
        let members = &order[start..end];
        let block: Arc<dyn Matrix> = match width {
            Width::U8 => Arc::new(build_block::<u8>(&by_row, members, ncol)?),
            Width::U16 => Arc::new(build_block::<u16>(&by_row, members, ncol)?),
            Width::U32 => Arc::new(build_block::<u32>(&by_row, members, ncol)?),
        };
        blocks.push(block);
        start = end;
    }

    let matrix: Arc<dyn Matrix> = match blocks.len() {
        0 => Arc::new(CompressedSparseMatrix::<u8>::new(
            0,
            ncol,
            Vec::new(),
            Vec::new(),
            vec![0; ncol + 1],
            false,
        )?),
        1 => blocks.remove(0),
        _ => Arc::new(DelayedBind::new(Axis::Row, blocks)?),
    };

    log::debug!(
        "Built layered {} x {} matrix with {} non-zero entries",
        nrow,
        ncol,
        summed.len()
    );

    NumericMatrix::new(matrix).with_row_identities(order)
}

/// CSC block holding `members` (rows of `source`, renumbered from zero)
fn build_block<V: SparseValue + Add<Output = V>>(
    source: &CompressedSparseMatrix<f64>,
    members: &[usize],
    ncol: usize,
) -> Result<CompressedSparseMatrix<V>> {
    let pointers = source.pointers();
    let nnz: usize = members.iter().map(|&r| pointers[r + 1] - pointers[r]).sum();

    let mut rows = Vec::with_capacity(nnz);
    let mut cols = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);
    for (local, &r) in members.iter().enumerate() {
        let range = pointers[r]..pointers[r + 1];
        for (&c, &v) in source.indices()[range.clone()].iter().zip(&source.values()[range]) {
            rows.push(local);
            cols.push(c as usize);
            values.push(V::from_f64(v));
        }
    }

    CompressedSparseMatrix::from_triplets(members.len(), ncol, &rows, &cols, &values, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_grouped_by_width() {
        // Row maxima: 70000 (u32), 5 (u8), 300 (u16), 0 (u8, empty)
        let m = from_triplets(
            4,
            3,
            &[0, 1, 2, 0, 1],
            &[0, 1, 2, 2, 0],
            &[70000.0, 5.0, 300.0, 1.0, 2.0],
        )
        .unwrap();

        assert_eq!(m.row_identities(), Some(&[1, 3, 2, 0][..]));
        assert!(m.is_sparse());
        assert_eq!(m.row_vec(0).unwrap(), vec![2.0, 5.0, 0.0]);
        assert_eq!(m.row_vec(1).unwrap(), vec![0.0, 0.0, 0.0]);
        assert_eq!(m.row_vec(2).unwrap(), vec![0.0, 0.0, 300.0]);
        assert_eq!(m.row_vec(3).unwrap(), vec![70000.0, 0.0, 1.0]);
        assert_eq!(m.column_vec(2).unwrap(), vec![0.0, 0.0, 300.0, 1.0]);
    }

    #[test]
    fn test_single_width_is_not_wrapped() {
        let m = from_triplets(2, 2, &[0, 1], &[1, 0], &[1.0, 2.0]).unwrap();
        assert_eq!(m.row_identities(), Some(&[0, 1][..]));
        assert_eq!(m.row_vec(1).unwrap(), vec![2.0, 0.0]);
    }

    #[test]
    fn test_width_boundaries() {
        assert_eq!(Width::for_max(255.0), Width::U8);
        assert_eq!(Width::for_max(256.0), Width::U16);
        assert_eq!(Width::for_max(65535.0), Width::U16);
        assert_eq!(Width::for_max(65536.0), Width::U32);
    }

    #[test]
    fn test_duplicates_summed_before_width_choice() {
        // 200 + 200 no longer fits in 8 bits
        let m = from_triplets(1, 1, &[0, 0], &[0, 0], &[200.0, 200.0]).unwrap();
        assert_eq!(m.row_vec(0).unwrap(), vec![400.0]);
    }

    #[test]
    fn test_rejects_non_counts() {
        let err = from_triplets(1, 1, &[0], &[0], &[1.5]).unwrap_err();
        assert!(matches!(err, ScranError::InvalidArgument(_)));
        let err = from_triplets(1, 1, &[0], &[0], &[-1.0]).unwrap_err();
        assert!(matches!(err, ScranError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_matrix() {
        let m = from_triplets(0, 3, &[], &[], &[]).unwrap();
        assert_eq!((m.nrow(), m.ncol()), (0, 3));
        assert_eq!(m.row_identities(), Some(&[][..]));
    }
}
