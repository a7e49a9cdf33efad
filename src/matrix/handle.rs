//! Shared matrix handle with optional row identities
//!
//! [`NumericMatrix`] is what callers hold. Cloning it is cheap: the matrix
//! itself sits behind an `Arc` and every transformation returns a new handle
//! wrapping the old one in a delayed node, so handles never observe each
//! other's operations.
//!
//! # Row identities
//!
//! A handle may carry one identity per row, naming the row in some original
//! numbering. Row subsetting and layered loading produce them; binding by
//! identity consumes them. A handle without identities treats row `i` as
//! having identity `i`.
//!
//! # Example
//!
//! ```
//! use scranwasm::{Layout, NumericMatrix};
//!
//! // columns [1, 2, 3] and [4, 5, 6]
//! let m = NumericMatrix::from_dense(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Layout::ColumnMajor)?;
//! let sub = m.subset_columns(&[1])?;
//! assert_eq!(sub.column_vec(0)?, vec![4.0, 5.0, 6.0]);
//!
//! let logged = m.apply_math_op("log1p", None)?.subset_rows(&[2, 0])?;
//! assert_eq!(logged.row_identities(), Some(&[2, 0][..]));
//! # Ok::<(), scranwasm::ScranError>(())
//! ```

use super::{
    Axis, CompressedSparseMatrix, DelayedBind, DelayedSubset, DelayedTranspose, DelayedUnary,
    DenseMatrix, Extract, Layout, MathOp, Matrix, UnaryOp,
};
use crate::error::{Result, ScranError};
use std::collections::HashMap;
use std::sync::Arc;

/// Reference-counted handle to a possibly delayed matrix
#[derive(Debug, Clone)]
pub struct NumericMatrix {
    matrix: Arc<dyn Matrix>,
    identities: Option<Arc<[usize]>>,
}

impl NumericMatrix {
    /// Wrap an existing matrix implementation
    pub fn new(matrix: Arc<dyn Matrix>) -> Self {
        Self {
            matrix,
            identities: None,
        }
    }

    /// Build a dense matrix from a caller buffer
    ///
    /// # Errors
    ///
    /// Returns [`ScranError::LengthMismatch`] if `values.len() != nrow * ncol`.
    pub fn from_dense(
        nrow: usize,
        ncol: usize,
        values: impl Into<Arc<[f64]>>,
        layout: Layout,
    ) -> Result<Self> {
        let dense = DenseMatrix::new(nrow, ncol, values, layout)?;
        Ok(Self::new(Arc::new(dense)))
    }

    /// Build a sparse matrix from coordinate triplets, stored as CSC
    ///
    /// # Errors
    ///
    /// See [`CompressedSparseMatrix::from_triplets`].
    pub fn from_triplets(
        nrow: usize,
        ncol: usize,
        rows: &[usize],
        cols: &[usize],
        values: &[f64],
    ) -> Result<Self> {
        let sparse = CompressedSparseMatrix::from_triplets(nrow, ncol, rows, cols, values, false)?;
        Ok(Self::new(Arc::new(sparse)))
    }

    /// Build a sparse matrix from CSR (`by_row`) or CSC buffers
    ///
    /// # Errors
    ///
    /// See [`CompressedSparseMatrix::new`].
    pub fn from_compressed(
        nrow: usize,
        ncol: usize,
        values: Vec<f64>,
        indices: Vec<u32>,
        pointers: Vec<usize>,
        by_row: bool,
    ) -> Result<Self> {
        let sparse = CompressedSparseMatrix::new(nrow, ncol, values, indices, pointers, by_row)?;
        Ok(Self::new(Arc::new(sparse)))
    }

    /// Attach row identities
    ///
    /// # Errors
    ///
    /// Returns [`ScranError::LengthMismatch`] unless there is exactly one
    /// identity per row.
    pub fn with_row_identities(mut self, identities: impl Into<Arc<[usize]>>) -> Result<Self> {
        let identities = identities.into();
        if identities.len() != self.nrow() {
            return Err(ScranError::LengthMismatch {
                what: "row identities",
                expected: self.nrow(),
                actual: identities.len(),
            });
        }
        self.identities = Some(identities);
        Ok(self)
    }

    /// Number of rows
    pub fn nrow(&self) -> usize {
        self.matrix.nrow()
    }

    /// Number of columns
    pub fn ncol(&self) -> usize {
        self.matrix.ncol()
    }

    /// Whether the matrix is sparse after all delayed operations
    pub fn is_sparse(&self) -> bool {
        self.matrix.is_sparse()
    }

    /// Whether row-wise access is preferred
    pub fn prefer_rows(&self) -> bool {
        self.matrix.prefer_rows()
    }

    /// Underlying matrix implementation
    pub fn matrix(&self) -> &Arc<dyn Matrix> {
        &self.matrix
    }

    /// Row identities, if any were attached or produced
    pub fn row_identities(&self) -> Option<&[usize]> {
        self.identities.as_deref()
    }

    /// Identity of row `i`, defaulting to `i` without a permutation
    ///
    /// # Panics
    ///
    /// Panics if `i >= nrow()`, whether or not identities are attached.
    pub fn row_identity(&self, i: usize) -> usize {
        match &self.identities {
            Some(ids) => ids[i],
            None => {
                assert!(i < self.nrow(), "row {} out of range for {} rows", i, self.nrow());
                i
            }
        }
    }

    /// Whether rows are reorganized relative to their original numbering
    pub fn is_reorganized(&self) -> bool {
        self.identities.is_some()
    }

    /// Drop row identities, leaving the matrix untouched
    pub fn wipe_identities(&mut self) {
        self.identities = None;
    }

    fn derived(&self, matrix: Arc<dyn Matrix>, identities: Option<Arc<[usize]>>) -> Self {
        Self {
            matrix,
            identities,
        }
    }

    /// Keep the rows at `indices`, in that order
    ///
    /// Row `i` of the result has the identity of row `indices[i]` here.
    ///
    /// # Errors
    ///
    /// Returns [`ScranError::IndexOutOfRange`] if any index is `>= nrow`.
    pub fn subset_rows(&self, indices: &[usize]) -> Result<Self> {
        let node = DelayedSubset::new(self.matrix.clone(), Axis::Row, indices.to_vec())?;
        let identities: Arc<[usize]> = indices.iter().map(|&i| self.row_identity(i)).collect();
        Ok(self.derived(Arc::new(node), Some(identities)))
    }

    /// Keep the columns at `indices`, in that order
    ///
    /// # Errors
    ///
    /// Returns [`ScranError::IndexOutOfRange`] if any index is `>= ncol`.
    pub fn subset_columns(&self, indices: &[usize]) -> Result<Self> {
        let node = DelayedSubset::new(self.matrix.clone(), Axis::Column, indices.to_vec())?;
        Ok(self.derived(Arc::new(node), self.identities.clone()))
    }

    /// Swap rows and columns; the result carries no row identities
    pub fn transpose(&self) -> Self {
        self.derived(Arc::new(DelayedTranspose::new(self.matrix.clone())), None)
    }

    /// Combine `op` element-wise with a constant
    ///
    /// # Errors
    ///
    /// Returns [`ScranError::UnknownOperation`] if `op` is not one of
    /// `+ - * /`.
    pub fn apply_scalar_op(&self, op: &str, value: f64, right: bool) -> Result<Self> {
        self.apply(UnaryOp::Scalar {
            op: op.parse()?,
            value,
            right,
        })
    }

    /// Combine `op` element-wise with one value per row or per column
    ///
    /// # Errors
    ///
    /// - [`ScranError::UnknownOperation`] for an unrecognized operator
    /// - [`ScranError::LengthMismatch`] if `values` does not match the extent
    ///   of `margin`
    pub fn apply_vector_op(
        &self,
        op: &str,
        values: &[f64],
        margin: Axis,
        right: bool,
    ) -> Result<Self> {
        self.apply(UnaryOp::Vector {
            op: op.parse()?,
            values: values.into(),
            margin,
            right,
        })
    }

    /// Apply a unary function element-wise; `base` only applies to `log`
    ///
    /// # Errors
    ///
    /// See [`MathOp::parse`].
    pub fn apply_math_op(&self, op: &str, base: Option<f64>) -> Result<Self> {
        self.apply(UnaryOp::Math(MathOp::parse(op, base)?))
    }

    /// Wrap this matrix with an already-parsed operation
    pub fn apply(&self, op: UnaryOp) -> Result<Self> {
        let node = DelayedUnary::new(self.matrix.clone(), op)?;
        Ok(self.derived(Arc::new(node), self.identities.clone()))
    }

    /// Concatenate matrices side by side
    ///
    /// Without `reconcile_by_identity` rows are matched by position and the
    /// result keeps the first matrix's identities. With it, every later
    /// matrix is reordered so that its rows line up with the first matrix's
    /// row identities.
    ///
    /// # Errors
    ///
    /// - [`ScranError::InvalidArgument`] for an empty list
    /// - [`ScranError::DimensionMismatch`] if row counts differ
    /// - [`ScranError::DuplicateIdentity`] if a matrix repeats an identity
    /// - [`ScranError::MissingIdentity`] if a later matrix has a row whose
    ///   identity is absent from the first matrix
    pub fn bind_columns(matrices: &[NumericMatrix], reconcile_by_identity: bool) -> Result<Self> {
        let reference = matrices.first().ok_or_else(|| {
            ScranError::InvalidArgument("at least one matrix is required for binding".to_string())
        })?;

        let children = if reconcile_by_identity {
            reconcile_rows(matrices)?
        } else {
            matrices.iter().map(|m| m.matrix.clone()).collect()
        };

        let node = DelayedBind::new(Axis::Column, children)?;
        Ok(reference.derived(Arc::new(node), reference.identities.clone()))
    }

    /// Stack matrices on top of each other
    ///
    /// If any input carries identities, the result's identities are the
    /// concatenation of each input's identities.
    ///
    /// # Errors
    ///
    /// - [`ScranError::InvalidArgument`] for an empty list
    /// - [`ScranError::DimensionMismatch`] if column counts differ
    pub fn bind_rows(matrices: &[NumericMatrix]) -> Result<Self> {
        let children = matrices.iter().map(|m| m.matrix.clone()).collect();
        let node = DelayedBind::new(Axis::Row, children)?;

        let identities = if matrices.iter().any(|m| m.is_reorganized()) {
            let ids: Arc<[usize]> = matrices
                .iter()
                .flat_map(|m| (0..m.nrow()).map(move |i| m.row_identity(i)))
                .collect();
            Some(ids)
        } else {
            None
        };

        Ok(Self {
            matrix: Arc::new(node),
            identities,
        })
    }

    fn check_fetch(&self, axis: Axis, index: usize, out: &[f64]) -> Result<()> {
        let extent = self.matrix.extent(axis);
        if index >= extent {
            return Err(ScranError::OutOfBounds {
                index,
                extent,
                axis: axis.title(),
            });
        }
        let expected = self.matrix.extent(axis.other());
        if out.len() != expected {
            return Err(ScranError::LengthMismatch {
                what: "output buffer",
                expected,
                actual: out.len(),
            });
        }
        Ok(())
    }

    /// Evaluate row `i` into `out`, which must have `ncol` entries
    ///
    /// # Errors
    ///
    /// - [`ScranError::OutOfBounds`] if `i >= nrow`
    /// - [`ScranError::LengthMismatch`] if `out` has the wrong length
    pub fn row(&self, i: usize, out: &mut [f64]) -> Result<()> {
        self.check_fetch(Axis::Row, i, out)?;
        self.matrix.extractor(Axis::Row).fetch(i, out);
        Ok(())
    }

    /// Evaluate column `j` into `out`, which must have `nrow` entries
    ///
    /// # Errors
    ///
    /// - [`ScranError::OutOfBounds`] if `j >= ncol`
    /// - [`ScranError::LengthMismatch`] if `out` has the wrong length
    pub fn column(&self, j: usize, out: &mut [f64]) -> Result<()> {
        self.check_fetch(Axis::Column, j, out)?;
        self.matrix.extractor(Axis::Column).fetch(j, out);
        Ok(())
    }

    /// Evaluate row `i` into a new vector
    pub fn row_vec(&self, i: usize) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.ncol()];
        self.row(i, &mut out)?;
        Ok(out)
    }

    /// Evaluate column `j` into a new vector
    pub fn column_vec(&self, j: usize) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.nrow()];
        self.column(j, &mut out)?;
        Ok(out)
    }

    /// Cursor for repeated row extraction sharing one extractor
    pub fn rows(&self) -> RowCursor<'_> {
        RowCursor {
            handle: self,
            extractor: self.matrix.extractor(Axis::Row),
        }
    }

    /// Cursor for repeated column extraction sharing one extractor
    pub fn columns(&self) -> ColumnCursor<'_> {
        ColumnCursor {
            handle: self,
            extractor: self.matrix.extractor(Axis::Column),
        }
    }
}

/// Reorders every matrix after the first to the first matrix's identities
fn reconcile_rows(matrices: &[NumericMatrix]) -> Result<Vec<Arc<dyn Matrix>>> {
    let reference = &matrices[0];
    let nrow = reference.nrow();

    let mut reference_ids = HashMap::with_capacity(nrow);
    for i in 0..nrow {
        let id = reference.row_identity(i);
        if reference_ids.insert(id, i).is_some() {
            return Err(ScranError::DuplicateIdentity {
                matrix: 0,
                identity: id,
            });
        }
    }

    let mut children = Vec::with_capacity(matrices.len());
    children.push(reference.matrix.clone());

    for (k, m) in matrices.iter().enumerate().skip(1) {
        // Position in `m` of each reference row
        let mut order = vec![usize::MAX; nrow];
        for i in 0..m.nrow() {
            let id = m.row_identity(i);
            let target = *reference_ids
                .get(&id)
                .ok_or(ScranError::MissingIdentity {
                    matrix: k,
                    identity: id,
                })?;
            if order[target] != usize::MAX {
                return Err(ScranError::DuplicateIdentity {
                    matrix: k,
                    identity: id,
                });
            }
            order[target] = i;
        }

        // Every row matched but some reference rows have no counterpart
        if m.nrow() != nrow {
            return Err(ScranError::DimensionMismatch(format!(
                "matrix {} has {} rows but matrix 0 has {}",
                k,
                m.nrow(),
                nrow
            )));
        }

        let aligned = order.iter().enumerate().all(|(i, &o)| i == o);
        if aligned {
            children.push(m.matrix.clone());
        } else {
            let node = DelayedSubset::new(m.matrix.clone(), Axis::Row, order)?;
            children.push(Arc::new(node));
        }
    }

    Ok(children)
}

/// Repeated row extraction from one handle
pub struct RowCursor<'a> {
    handle: &'a NumericMatrix,
    extractor: Box<dyn Extract + 'a>,
}

impl RowCursor<'_> {
    /// Evaluate row `i` into `out`
    pub fn fetch(&mut self, i: usize, out: &mut [f64]) -> Result<()> {
        self.handle.check_fetch(Axis::Row, i, out)?;
        self.extractor.fetch(i, out);
        Ok(())
    }
}

/// Repeated column extraction from one handle
pub struct ColumnCursor<'a> {
    handle: &'a NumericMatrix,
    extractor: Box<dyn Extract + 'a>,
}

impl ColumnCursor<'_> {
    /// Evaluate column `j` into `out`
    pub fn fetch(&mut self, j: usize, out: &mut [f64]) -> Result<()> {
        self.handle.check_fetch(Axis::Column, j, out)?;
        self.extractor.fetch(j, out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::panic::AssertUnwindSafe;

    fn example() -> NumericMatrix {
        // columns [1, 2, 3] and [4, 5, 6]
        NumericMatrix::from_dense(
            3,
            2,
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            Layout::ColumnMajor,
        )
        .unwrap()
    }

    fn single_column(values: &[f64]) -> NumericMatrix {
        NumericMatrix::from_dense(values.len(), 1, values.to_vec(), Layout::ColumnMajor).unwrap()
    }

    #[test]
    fn test_construct_and_materialize() {
        let m = example();
        assert_eq!((m.nrow(), m.ncol()), (3, 2));
        assert_eq!(m.row_vec(1).unwrap(), vec![2.0, 5.0]);
        assert_eq!(m.column_vec(0).unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(!m.is_reorganized());
        assert!(!m.is_sparse());
    }

    #[test]
    fn test_subset_columns_scenario() {
        let sub = example().subset_columns(&[1]).unwrap();
        assert_eq!(sub.ncol(), 1);
        assert_eq!(sub.column_vec(0).unwrap(), vec![4.0, 5.0, 6.0]);
        assert!(!sub.is_reorganized());
    }

    #[test]
    fn test_subset_rows_tracks_identities() {
        let m = example();
        let first = m.subset_rows(&[2, 0]).unwrap();
        assert_eq!(first.row_identities(), Some(&[2, 0][..]));
        assert_eq!(first.row_vec(0).unwrap(), vec![3.0, 6.0]);

        let second = first.subset_rows(&[1]).unwrap();
        assert_eq!(second.row_identities(), Some(&[0][..]));
        assert_eq!(second.row_vec(0).unwrap(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_subset_out_of_range_produces_nothing() {
        let err = example().subset_rows(&[0, 3]).unwrap_err();
        assert!(matches!(err, ScranError::IndexOutOfRange { index: 3, .. }));

        let err = example().subset_columns(&[2]).unwrap_err();
        assert!(matches!(err, ScranError::IndexOutOfRange { index: 2, .. }));
    }

    #[test]
    fn test_identity_length_checked() {
        let err = example().with_row_identities(vec![0, 1]).unwrap_err();
        assert!(matches!(
            err,
            ScranError::LengthMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_transpose_involution() {
        let m = example();
        let t = m.transpose();
        assert_eq!((t.nrow(), t.ncol()), (2, 3));
        assert_eq!(t.row_vec(1).unwrap(), vec![4.0, 5.0, 6.0]);

        let tt = t.transpose();
        for i in 0..3 {
            assert_eq!(tt.row_vec(i).unwrap(), m.row_vec(i).unwrap());
        }
    }

    #[test]
    fn test_transpose_drops_identities() {
        let m = example().subset_rows(&[0, 1]).unwrap();
        assert!(m.is_reorganized());
        assert!(!m.transpose().is_reorganized());
    }

    #[test]
    fn test_scalar_identities() {
        let m = example();
        let plus_zero = m.apply_scalar_op("+", 0.0, false).unwrap();
        let times_one = m.apply_scalar_op("*", 1.0, false).unwrap();
        for j in 0..2 {
            assert_eq!(plus_zero.column_vec(j).unwrap(), m.column_vec(j).unwrap());
            assert_eq!(times_one.column_vec(j).unwrap(), m.column_vec(j).unwrap());
        }
    }

    #[test]
    fn test_unknown_operations() {
        let m = example();
        assert!(matches!(
            m.apply_scalar_op("^", 2.0, false),
            Err(ScranError::UnknownOperation { .. })
        ));
        assert!(matches!(
            m.apply_math_op("sinh", None),
            Err(ScranError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn test_vector_op_margins() {
        let m = example();
        let per_row = m
            .apply_vector_op("-", &[1.0, 2.0, 3.0], Axis::Row, false)
            .unwrap();
        assert_eq!(per_row.column_vec(1).unwrap(), vec![3.0, 3.0, 3.0]);

        let err = m
            .apply_vector_op("-", &[1.0, 2.0, 3.0], Axis::Column, false)
            .unwrap_err();
        assert!(matches!(err, ScranError::LengthMismatch { .. }));
    }

    #[test]
    fn test_bind_columns_positional_scenario() {
        let a = single_column(&[1.0, 2.0]);
        let b = single_column(&[3.0, 4.0]);
        let bound = NumericMatrix::bind_columns(&[a, b], false).unwrap();
        assert_eq!((bound.nrow(), bound.ncol()), (2, 2));
        assert_eq!(bound.column_vec(0).unwrap(), vec![1.0, 2.0]);
        assert_eq!(bound.column_vec(1).unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_bind_columns_row_mismatch() {
        let a = single_column(&[1.0, 2.0]);
        let b = single_column(&[3.0, 4.0, 5.0]);
        let err = NumericMatrix::bind_columns(&[a.clone(), b.clone()], false).unwrap_err();
        assert!(matches!(err, ScranError::DimensionMismatch(_)));
        let err = NumericMatrix::bind_columns(&[a, b], true).unwrap_err();
        assert!(matches!(err, ScranError::MissingIdentity { matrix: 1, identity: 2 }));
    }

    #[test]
    fn test_bind_columns_by_identity() {
        let reference = single_column(&[10.0, 20.0, 30.0])
            .with_row_identities(vec![5, 6, 7])
            .unwrap();
        // Same rows in a different order
        let other = single_column(&[70.0, 50.0, 60.0])
            .with_row_identities(vec![7, 5, 6])
            .unwrap();

        let bound = NumericMatrix::bind_columns(&[reference, other], true).unwrap();
        assert_eq!(bound.column_vec(1).unwrap(), vec![50.0, 60.0, 70.0]);
        assert_eq!(bound.row_vec(2).unwrap(), vec![30.0, 70.0]);
        assert_eq!(bound.row_identities(), Some(&[5, 6, 7][..]));
    }

    #[test]
    fn test_bind_columns_missing_identity() {
        let reference = single_column(&[1.0, 2.0])
            .with_row_identities(vec![0, 1])
            .unwrap();
        let other = single_column(&[3.0, 4.0])
            .with_row_identities(vec![1, 9])
            .unwrap();
        let err = NumericMatrix::bind_columns(&[reference, other], true).unwrap_err();
        match err {
            ScranError::MissingIdentity { matrix, identity } => {
                assert_eq!(matrix, 1);
                assert_eq!(identity, 9);
            }
            other => panic!("Expected MissingIdentity, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_columns_extra_rows_are_missing_identities() {
        let reference = single_column(&[1.0, 2.0])
            .with_row_identities(vec![0, 1])
            .unwrap();
        let other = single_column(&[3.0, 4.0, 5.0])
            .with_row_identities(vec![0, 1, 2])
            .unwrap();
        let err = NumericMatrix::bind_columns(&[reference.clone(), other], true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reconciliation);
        assert!(matches!(
            err,
            ScranError::MissingIdentity {
                matrix: 1,
                identity: 2
            }
        ));

        // Fewer rows whose identities all match
        let short = single_column(&[6.0]).with_row_identities(vec![1]).unwrap();
        let err = NumericMatrix::bind_columns(&[reference, short], true).unwrap_err();
        assert!(matches!(err, ScranError::DimensionMismatch(_)));
    }

    #[test]
    fn test_row_identity_bounds_agree() {
        let plain = single_column(&[1.0, 2.0]);
        let tagged = plain.clone().with_row_identities(vec![4, 3]).unwrap();
        assert_eq!(plain.row_identity(1), 1);
        assert_eq!(tagged.row_identity(1), 3);
        for m in [plain, tagged] {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| m.row_identity(2)));
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_bind_columns_duplicate_identity() {
        let reference = single_column(&[1.0, 2.0]);
        let other = single_column(&[3.0, 4.0])
            .with_row_identities(vec![1, 1])
            .unwrap();
        let err = NumericMatrix::bind_columns(&[reference, other], true).unwrap_err();
        assert!(matches!(
            err,
            ScranError::DuplicateIdentity {
                matrix: 1,
                identity: 1
            }
        ));
    }

    #[test]
    fn test_bind_rows_identities() {
        let top = single_column(&[1.0]);
        let bottom = single_column(&[2.0, 3.0])
            .with_row_identities(vec![8, 9])
            .unwrap();
        let stacked = NumericMatrix::bind_rows(&[top.clone(), bottom]).unwrap();
        assert_eq!(stacked.column_vec(0).unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(stacked.row_identities(), Some(&[0, 8, 9][..]));

        let plain = NumericMatrix::bind_rows(&[top.clone(), top]).unwrap();
        assert!(!plain.is_reorganized());
    }

    #[test]
    fn test_fetch_bounds() {
        let m = example();
        let mut out = vec![0.0; 2];
        assert!(matches!(
            m.row(3, &mut out),
            Err(ScranError::OutOfBounds { index: 3, .. })
        ));
        let mut short = vec![0.0; 1];
        assert!(matches!(
            m.row(0, &mut short),
            Err(ScranError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_cursors() {
        let m = example().transpose();
        let mut rows = m.rows();
        let mut out = vec![0.0; 3];
        rows.fetch(0, &mut out).unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
        rows.fetch(1, &mut out).unwrap();
        assert_eq!(out, vec![4.0, 5.0, 6.0]);

        let mut cols = m.columns();
        let mut col = vec![0.0; 2];
        cols.fetch(2, &mut col).unwrap();
        assert_eq!(col, vec![3.0, 6.0]);
        assert!(cols.fetch(3, &mut col).is_err());
    }

    #[test]
    fn test_wipe_identities_keeps_data() {
        let mut m = example().subset_rows(&[1]).unwrap();
        m.wipe_identities();
        assert!(!m.is_reorganized());
        assert_eq!(m.row_vec(0).unwrap(), vec![2.0, 5.0]);
    }

    #[test]
    fn test_shared_storage() {
        let m = example();
        let derived = m.subset_columns(&[0]).unwrap();
        // The original handle plus the subset node each hold a reference
        assert_eq!(Arc::strong_count(m.matrix()), 2);
        drop(derived);
        assert_eq!(Arc::strong_count(m.matrix()), 1);
    }
}
