//! Dense matrix storage

use super::{Axis, Extract, Matrix};
use crate::error::{Result, ScranError};
use std::sync::Arc;

/// Memory order of a dense buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Consecutive values walk along a row: `index = row * ncol + col`
    RowMajor,
    /// Consecutive values walk down a column: `index = col * nrow + row`
    ColumnMajor,
}

impl Layout {
    /// Layout from a boolean column-major flag, as passed across the boundary
    pub fn from_column_major(column_major: bool) -> Self {
        if column_major {
            Layout::ColumnMajor
        } else {
            Layout::RowMajor
        }
    }

    fn contiguous_axis(self) -> Axis {
        match self {
            Layout::RowMajor => Axis::Row,
            Layout::ColumnMajor => Axis::Column,
        }
    }
}

/// Dense matrix over a shared value buffer
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    nrow: usize,
    ncol: usize,
    values: Arc<[f64]>,
    layout: Layout,
}

impl DenseMatrix {
    /// Wrap `values` as an `nrow` x `ncol` matrix
    ///
    /// # Errors
    ///
    /// Returns [`ScranError::LengthMismatch`] if `values.len() != nrow * ncol`.
    ///
    /// # Example
    ///
    /// ```
    /// use scranwasm::matrix::{DenseMatrix, Layout, Matrix, Axis};
    ///
    /// let m = DenseMatrix::new(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Layout::ColumnMajor)?;
    /// let mut col = vec![0.0; 3];
    /// m.extractor(Axis::Column).fetch(1, &mut col);
    /// assert_eq!(col, vec![4.0, 5.0, 6.0]);
    /// # Ok::<(), scranwasm::ScranError>(())
    /// ```
    pub fn new(
        nrow: usize,
        ncol: usize,
        values: impl Into<Arc<[f64]>>,
        layout: Layout,
    ) -> Result<Self> {
        let values = values.into();
        let expected = nrow.checked_mul(ncol).ok_or_else(|| {
            ScranError::InvalidArgument(format!("{} x {} dense matrix is too large", nrow, ncol))
        })?;
        if values.len() != expected {
            return Err(ScranError::LengthMismatch {
                what: "dense buffer",
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            nrow,
            ncol,
            values,
            layout,
        })
    }

    /// Memory order of the underlying buffer
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Underlying values in [`Self::layout`] order
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl Matrix for DenseMatrix {
    fn nrow(&self) -> usize {
        self.nrow
    }

    fn ncol(&self) -> usize {
        self.ncol
    }

    fn is_sparse(&self) -> bool {
        false
    }

    fn prefer_rows(&self) -> bool {
        self.layout == Layout::RowMajor
    }

    fn extractor(&self, axis: Axis) -> Box<dyn Extract + '_> {
        Box::new(DenseExtractor { matrix: self, axis })
    }
}

struct DenseExtractor<'a> {
    matrix: &'a DenseMatrix,
    axis: Axis,
}

impl Extract for DenseExtractor<'_> {
    fn fetch(&mut self, index: usize, out: &mut [f64]) {
        let m = self.matrix;
        if self.axis == m.layout.contiguous_axis() {
            let len = out.len();
            let start = index * len;
            out.copy_from_slice(&m.values[start..start + len]);
        } else {
            // Strided gather across the contiguous dimension
            let stride = m.extent(self.axis);
            for (k, slot) in out.iter_mut().enumerate() {
                *slot = m.values[k * stride + index];
            }
        }
    }
}
