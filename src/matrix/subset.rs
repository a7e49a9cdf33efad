//! Delayed row/column subsetting

use super::{Axis, Extract, Matrix};
use crate::error::{Result, ScranError};
use std::sync::Arc;

/// Selects rows or columns of another matrix by explicit index list
///
/// Indices may repeat and appear in any order.
#[derive(Debug)]
pub struct DelayedSubset {
    inner: Arc<dyn Matrix>,
    axis: Axis,
    indices: Vec<usize>,
}

impl DelayedSubset {
    /// Wrap `inner`, keeping `indices` along `axis`
    ///
    /// # Errors
    ///
    /// Returns [`ScranError::IndexOutOfRange`] for the first index not below
    /// the extent of `axis`.
    pub fn new(inner: Arc<dyn Matrix>, axis: Axis, indices: Vec<usize>) -> Result<Self> {
        let extent = inner.extent(axis);
        if let Some(&index) = indices.iter().find(|&&i| i >= extent) {
            return Err(ScranError::IndexOutOfRange {
                index,
                extent,
                axis: axis.plural(),
            });
        }
        Ok(Self {
            inner,
            axis,
            indices,
        })
    }

    /// Subset dimension
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Selected indices, in output order
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl Matrix for DelayedSubset {
    fn nrow(&self) -> usize {
        match self.axis {
            Axis::Row => self.indices.len(),
            Axis::Column => self.inner.nrow(),
        }
    }

    fn ncol(&self) -> usize {
        match self.axis {
            Axis::Row => self.inner.ncol(),
            Axis::Column => self.indices.len(),
        }
    }

    fn is_sparse(&self) -> bool {
        self.inner.is_sparse()
    }

    fn prefer_rows(&self) -> bool {
        self.inner.prefer_rows()
    }

    fn extractor(&self, axis: Axis) -> Box<dyn Extract + '_> {
        let inner = self.inner.extractor(axis);
        if axis == self.axis {
            Box::new(AlongSubset {
                inner,
                indices: &self.indices,
            })
        } else {
            Box::new(AcrossSubset {
                inner,
                indices: &self.indices,
                buffer: vec![0.0; self.inner.extent(self.axis)],
            })
        }
    }
}

/// Requests along the subset axis are remapped
struct AlongSubset<'a> {
    inner: Box<dyn Extract + 'a>,
    indices: &'a [usize],
}

impl Extract for AlongSubset<'_> {
    fn fetch(&mut self, index: usize, out: &mut [f64]) {
        self.inner.fetch(self.indices[index], out);
    }
}

/// Requests across the subset axis fetch the full slice, then gather
struct AcrossSubset<'a> {
    inner: Box<dyn Extract + 'a>,
    indices: &'a [usize],
    buffer: Vec<f64>,
}

impl Extract for AcrossSubset<'_> {
    fn fetch(&mut self, index: usize, out: &mut [f64]) {
        self.inner.fetch(index, &mut self.buffer);
        for (slot, &i) in out.iter_mut().zip(self.indices) {
            *slot = self.buffer[i];
        }
    }
}
