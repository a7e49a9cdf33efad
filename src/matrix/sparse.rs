//! Compressed sparse row/column storage
//!
//! A [`CompressedSparseMatrix`] stores the non-zero entries of each *primary*
//! slice (rows for CSR, columns for CSC) contiguously, with `pointers[p]..
//! pointers[p + 1]` delimiting slice `p` inside `values`/`indices`.
//!
//! Extraction along the primary dimension scatters one slice into a zeroed
//! buffer. Extraction along the secondary dimension probes every slice; the
//! extractor remembers its position in each slice so that increasing
//! requests (the common full pass) advance linearly instead of binary
//! searching from scratch.

use super::{Axis, Extract, Matrix};
use crate::error::{Result, ScranError};
use std::fmt;
use std::ops::Add;

/// Value types that can be stored in sparse matrices
pub trait SparseValue: Copy + Send + Sync + fmt::Debug + 'static {
    /// Widen to `f64` for extraction
    fn to_f64(self) -> f64;

    /// Narrow from `f64` (saturating cast)
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_sparse_value {
    ($($t:ty),*) => {
        $(
            impl SparseValue for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_sparse_value!(f64, i32, u8, u16, u32);

/// Sparse matrix in CSR (`by_row`) or CSC form
#[derive(Debug, Clone)]
pub struct CompressedSparseMatrix<V> {
    nrow: usize,
    ncol: usize,
    values: Vec<V>,
    indices: Vec<u32>,
    pointers: Vec<usize>,
    by_row: bool,
}

impl<V: SparseValue> CompressedSparseMatrix<V> {
    /// Build from already-compressed buffers
    ///
    /// # Errors
    ///
    /// - [`ScranError::LengthMismatch`] if `values` and `indices` differ in
    ///   length, or `pointers` is not one longer than the primary extent
    /// - [`ScranError::InvalidSparse`] if pointers do not start at zero, are
    ///   decreasing, do not end at the number of entries, or indices are
    ///   out of range or not strictly increasing within a slice
    pub fn new(
        nrow: usize,
        ncol: usize,
        values: Vec<V>,
        indices: Vec<u32>,
        pointers: Vec<usize>,
        by_row: bool,
    ) -> Result<Self> {
        let (primary, secondary) = if by_row { (nrow, ncol) } else { (ncol, nrow) };

        if values.len() != indices.len() {
            return Err(ScranError::LengthMismatch {
                what: "sparse indices",
                expected: values.len(),
                actual: indices.len(),
            });
        }
        if pointers.len() != primary + 1 {
            return Err(ScranError::LengthMismatch {
                what: "sparse pointers",
                expected: primary + 1,
                actual: pointers.len(),
            });
        }
        if pointers[0] != 0 {
            return Err(ScranError::InvalidSparse(format!(
                "first pointer should be 0, got {}",
                pointers[0]
            )));
        }
        if pointers[primary] != values.len() {
            return Err(ScranError::InvalidSparse(format!(
                "last pointer should equal the number of entries ({}), got {}",
                values.len(),
                pointers[primary]
            )));
        }

        for p in 0..primary {
            let (start, end) = (pointers[p], pointers[p + 1]);
            if end < start {
                return Err(ScranError::InvalidSparse(format!(
                    "pointers decrease at slice {}",
                    p
                )));
            }
            if end > values.len() {
                return Err(ScranError::InvalidSparse(format!(
                    "pointer {} at slice {} exceeds the number of entries ({})",
                    end,
                    p,
                    values.len()
                )));
            }
            let slice = &indices[start..end];
            for (k, &idx) in slice.iter().enumerate() {
                if idx as usize >= secondary {
                    return Err(ScranError::InvalidSparse(format!(
                        "index {} in slice {} exceeds extent {}",
                        idx, p, secondary
                    )));
                }
                if k > 0 && slice[k - 1] >= idx {
                    return Err(ScranError::InvalidSparse(format!(
                        "indices in slice {} are not strictly increasing",
                        p
                    )));
                }
            }
        }

        Ok(Self {
            nrow,
            ncol,
            values,
            indices,
            pointers,
            by_row,
        })
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Whether slices are rows (CSR) rather than columns (CSC)
    pub fn is_row_major(&self) -> bool {
        self.by_row
    }

    /// Stored values
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Secondary indices of the stored values
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Slice boundaries into [`Self::values`]
    pub fn pointers(&self) -> &[usize] {
        &self.pointers
    }

    fn primary_axis(&self) -> Axis {
        if self.by_row {
            Axis::Row
        } else {
            Axis::Column
        }
    }
}

impl<V: SparseValue + Add<Output = V>> CompressedSparseMatrix<V> {
    /// Build from coordinate triplets
    ///
    /// Entries may arrive in any order; duplicated coordinates are summed.
    ///
    /// # Errors
    ///
    /// - [`ScranError::LengthMismatch`] if the three slices differ in length
    /// - [`ScranError::InvalidSparse`] if a coordinate is outside the matrix
    ///
    /// # Example
    ///
    /// ```
    /// use scranwasm::matrix::{CompressedSparseMatrix, Matrix, Axis};
    ///
    /// // [[0, 5],
    /// //  [7, 0]]
    /// let m = CompressedSparseMatrix::from_triplets(2, 2, &[1, 0], &[0, 1], &[7.0, 5.0], false)?;
    /// let mut row = vec![0.0; 2];
    /// m.extractor(Axis::Row).fetch(0, &mut row);
    /// assert_eq!(row, vec![0.0, 5.0]);
    /// # Ok::<(), scranwasm::ScranError>(())
    /// ```
    pub fn from_triplets(
        nrow: usize,
        ncol: usize,
        rows: &[usize],
        cols: &[usize],
        values: &[V],
        by_row: bool,
    ) -> Result<Self> {
        if rows.len() != values.len() {
            return Err(ScranError::LengthMismatch {
                what: "triplet row indices",
                expected: values.len(),
                actual: rows.len(),
            });
        }
        if cols.len() != values.len() {
            return Err(ScranError::LengthMismatch {
                what: "triplet column indices",
                expected: values.len(),
                actual: cols.len(),
            });
        }
        for (&r, &c) in rows.iter().zip(cols) {
            if r >= nrow || c >= ncol {
                return Err(ScranError::InvalidSparse(format!(
                    "triplet ({}, {}) outside {} x {} matrix",
                    r, c, nrow, ncol
                )));
            }
        }
        if nrow > u32::MAX as usize || ncol > u32::MAX as usize {
            return Err(ScranError::InvalidArgument(format!(
                "{} x {} exceeds 32-bit sparse index range",
                nrow, ncol
            )));
        }

        let (primary, major, minor) = if by_row {
            (nrow, rows, cols)
        } else {
            (ncol, cols, rows)
        };

        // Counting sort by primary index
        let mut pointers = vec![0usize; primary + 1];
        for &p in major {
            pointers[p + 1] += 1;
        }
        for p in 0..primary {
            pointers[p + 1] += pointers[p];
        }
        let mut order = vec![0usize; values.len()];
        let mut next = pointers.clone();
        for (k, &p) in major.iter().enumerate() {
            order[next[p]] = k;
            next[p] += 1;
        }

        let mut out_values = Vec::with_capacity(values.len());
        let mut out_indices = Vec::with_capacity(values.len());
        let mut out_pointers = Vec::with_capacity(primary + 1);
        out_pointers.push(0);

        for p in 0..primary {
            let slice = &mut order[pointers[p]..pointers[p + 1]];
            slice.sort_by_key(|&k| minor[k]);

            let mut last: Option<usize> = None;
            for &k in slice.iter() {
                if last == Some(minor[k]) {
                    if let Some(v) = out_values.last_mut() {
                        *v = *v + values[k];
                    }
                } else {
                    out_values.push(values[k]);
                    out_indices.push(minor[k] as u32);
                    last = Some(minor[k]);
                }
            }
            out_pointers.push(out_values.len());
        }

        Ok(Self {
            nrow,
            ncol,
            values: out_values,
            indices: out_indices,
            pointers: out_pointers,
            by_row,
        })
    }
}

impl<V: SparseValue> Matrix for CompressedSparseMatrix<V> {
    fn nrow(&self) -> usize {
        self.nrow
    }

    fn ncol(&self) -> usize {
        self.ncol
    }

    fn is_sparse(&self) -> bool {
        true
    }

    fn prefer_rows(&self) -> bool {
        self.by_row
    }

    fn extractor(&self, axis: Axis) -> Box<dyn Extract + '_> {
        if axis == self.primary_axis() {
            Box::new(PrimaryExtractor { matrix: self })
        } else {
            let primary = self.extent(self.primary_axis());
            Box::new(SecondaryExtractor {
                matrix: self,
                cursors: self.pointers[..primary].to_vec(),
                last: None,
            })
        }
    }
}

struct PrimaryExtractor<'a, V> {
    matrix: &'a CompressedSparseMatrix<V>,
}

impl<V: SparseValue> Extract for PrimaryExtractor<'_, V> {
    fn fetch(&mut self, index: usize, out: &mut [f64]) {
        let m = self.matrix;
        out.fill(0.0);
        let range = m.pointers[index]..m.pointers[index + 1];
        for (&idx, &value) in m.indices[range.clone()].iter().zip(&m.values[range]) {
            out[idx as usize] = value.to_f64();
        }
    }
}

struct SecondaryExtractor<'a, V> {
    matrix: &'a CompressedSparseMatrix<V>,
    /// Per-slice position of the first index >= the last request
    cursors: Vec<usize>,
    last: Option<usize>,
}

impl<V: SparseValue> Extract for SecondaryExtractor<'_, V> {
    fn fetch(&mut self, index: usize, out: &mut [f64]) {
        let m = self.matrix;
        let target = index as u32;
        let forward = matches!(self.last, Some(prev) if index >= prev);

        for (p, slot) in out.iter_mut().enumerate() {
            let (start, end) = (m.pointers[p], m.pointers[p + 1]);
            let pos = if forward {
                let mut c = self.cursors[p];
                while c < end && m.indices[c] < target {
                    c += 1;
                }
                c
            } else {
                start + m.indices[start..end].partition_point(|&x| x < target)
            };
            self.cursors[p] = pos;
            *slot = if pos < end && m.indices[pos] == target {
                m.values[pos].to_f64()
            } else {
                0.0
            };
        }
        self.last = Some(index);
    }
}
