//! Whole-matrix consumers built on row/column extraction

use super::parallel;
use crate::matrix::{Axis, Layout, NumericMatrix};

/// Materialize the matrix into a flat buffer in the requested layout
///
/// Work is split across `threads` workers by rows (row-major output) or
/// columns (column-major output), so each block writes a contiguous span.
///
/// # Example
///
/// ```
/// use scranwasm::{Layout, NumericMatrix};
/// use scranwasm::operations::realize_dense;
///
/// let m = NumericMatrix::from_dense(2, 2, vec![1.0, 2.0, 3.0, 4.0], Layout::RowMajor)?;
/// assert_eq!(realize_dense(&m.transpose(), Layout::RowMajor, 2), vec![1.0, 3.0, 2.0, 4.0]);
/// # Ok::<(), scranwasm::ScranError>(())
/// ```
pub fn realize_dense(matrix: &NumericMatrix, layout: Layout, threads: usize) -> Vec<f64> {
    let axis = match layout {
        Layout::RowMajor => Axis::Row,
        Layout::ColumnMajor => Axis::Column,
    };
    let inner = matrix.matrix();
    let n = inner.extent(axis);
    let width = inner.extent(axis.other());

    let blocks = parallel::run(n, threads, |range| {
        let mut extractor = inner.extractor(axis);
        let mut buffer = vec![0.0; range.len() * width];
        if width > 0 {
            for (chunk, index) in buffer.chunks_exact_mut(width).zip(range) {
                extractor.fetch(index, chunk);
            }
        }
        buffer
    });

    let mut out = Vec::with_capacity(n * width);
    for block in blocks {
        out.extend_from_slice(&block);
    }
    out
}

/// Sum of each column
pub fn column_sums(matrix: &NumericMatrix, threads: usize) -> Vec<f64> {
    margin_sums(matrix, Axis::Column, threads)
}

/// Sum of each row
pub fn row_sums(matrix: &NumericMatrix, threads: usize) -> Vec<f64> {
    margin_sums(matrix, Axis::Row, threads)
}

/// Sums along `target`, iterating in whichever direction the matrix prefers
fn margin_sums(matrix: &NumericMatrix, target: Axis, threads: usize) -> Vec<f64> {
    let inner = matrix.matrix();
    let preferred = if inner.prefer_rows() {
        Axis::Row
    } else {
        Axis::Column
    };
    let n = inner.extent(preferred);
    let width = inner.extent(preferred.other());

    if preferred == target {
        // One total per extracted vector
        return parallel::run(n, threads, |range| {
            let mut extractor = inner.extractor(preferred);
            let mut buffer = vec![0.0; width];
            range
                .map(|i| {
                    extractor.fetch(i, &mut buffer);
                    buffer.iter().sum::<f64>()
                })
                .collect::<Vec<f64>>()
        })
        .concat();
    }

    // Each block accumulates partial totals for every target index
    let partials = parallel::run(n, threads, |range| {
        let mut extractor = inner.extractor(preferred);
        let mut buffer = vec![0.0; width];
        let mut totals = vec![0.0; width];
        for i in range {
            extractor.fetch(i, &mut buffer);
            for (t, v) in totals.iter_mut().zip(&buffer) {
                *t += v;
            }
        }
        totals
    });

    let mut totals = vec![0.0; width];
    for partial in partials {
        for (t, v) in totals.iter_mut().zip(&partial) {
            *t += v;
        }
    }
    totals
}
