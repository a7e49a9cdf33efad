//! Delayed transposition

use super::{Axis, Extract, Matrix};
use std::sync::Arc;

/// Swaps rows and columns of another matrix without copying
#[derive(Debug)]
pub struct DelayedTranspose {
    inner: Arc<dyn Matrix>,
}

impl DelayedTranspose {
    /// Wrap `inner`
    pub fn new(inner: Arc<dyn Matrix>) -> Self {
        Self { inner }
    }
}

impl Matrix for DelayedTranspose {
    fn nrow(&self) -> usize {
        self.inner.ncol()
    }

    fn ncol(&self) -> usize {
        self.inner.nrow()
    }

    fn is_sparse(&self) -> bool {
        self.inner.is_sparse()
    }

    fn prefer_rows(&self) -> bool {
        !self.inner.prefer_rows()
    }

    fn extractor(&self, axis: Axis) -> Box<dyn Extract + '_> {
        self.inner.extractor(axis.other())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{CompressedSparseMatrix, DenseMatrix, Layout};

    #[test]
    fn test_transpose_dense() {
        let base: Arc<dyn Matrix> = Arc::new(
            DenseMatrix::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Layout::RowMajor).unwrap(),
        );
        let t = DelayedTranspose::new(base);
        assert_eq!((t.nrow(), t.ncol()), (3, 2));
        assert!(!t.prefer_rows());

        let mut row = vec![0.0; 2];
        t.extractor(Axis::Row).fetch(2, &mut row);
        assert_eq!(row, vec![3.0, 6.0]);

        let mut col = vec![0.0; 3];
        t.extractor(Axis::Column).fetch(1, &mut col);
        assert_eq!(col, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_transpose_keeps_sparsity() {
        let base: Arc<dyn Matrix> = Arc::new(
            CompressedSparseMatrix::from_triplets(2, 2, &[0], &[1], &[9.0], false).unwrap(),
        );
        let t = DelayedTranspose::new(base);
        assert!(t.is_sparse());
        let mut row = vec![0.0; 2];
        t.extractor(Axis::Row).fetch(1, &mut row);
        assert_eq!(row, vec![9.0, 0.0]);
    }
}
