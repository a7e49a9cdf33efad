//! Delayed concatenation of several matrices

use super::{Axis, Extract, Matrix};
use crate::error::{Result, ScranError};
use std::sync::Arc;

/// Concatenates matrices along one dimension
///
/// With `Axis::Column` the children sit side by side (column binding); with
/// `Axis::Row` they are stacked on top of each other.
#[derive(Debug)]
pub struct DelayedBind {
    axis: Axis,
    children: Vec<Arc<dyn Matrix>>,
    /// `offsets[k]..offsets[k + 1]` is child `k`'s span along `axis`
    offsets: Vec<usize>,
}

impl DelayedBind {
    /// Concatenate `children` along `axis`
    ///
    /// # Errors
    ///
    /// - [`ScranError::InvalidArgument`] if `children` is empty
    /// - [`ScranError::DimensionMismatch`] if the children disagree on the
    ///   extent of the other dimension
    pub fn new(axis: Axis, children: Vec<Arc<dyn Matrix>>) -> Result<Self> {
        let first = children.first().ok_or_else(|| {
            ScranError::InvalidArgument("at least one matrix is required for binding".to_string())
        })?;

        let shared = first.extent(axis.other());
        let mut offsets = Vec::with_capacity(children.len() + 1);
        offsets.push(0);
        for (k, child) in children.iter().enumerate() {
            let extent = child.extent(axis.other());
            if extent != shared {
                return Err(ScranError::DimensionMismatch(format!(
                    "matrix {} has {} {} but matrix 0 has {}",
                    k,
                    extent,
                    axis.other().plural(),
                    shared
                )));
            }
            let total = offsets[k] + child.extent(axis);
            offsets.push(total);
        }

        Ok(Self {
            axis,
            children,
            offsets,
        })
    }

    /// Concatenation dimension
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Number of bound matrices
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Always false; construction rejects empty lists
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn combined(&self) -> usize {
        self.offsets[self.children.len()]
    }
}

impl Matrix for DelayedBind {
    fn nrow(&self) -> usize {
        match self.axis {
            Axis::Row => self.combined(),
            Axis::Column => self.children[0].nrow(),
        }
    }

    fn ncol(&self) -> usize {
        match self.axis {
            Axis::Row => self.children[0].ncol(),
            Axis::Column => self.combined(),
        }
    }

    fn is_sparse(&self) -> bool {
        self.children.iter().all(|c| c.is_sparse())
    }

    fn prefer_rows(&self) -> bool {
        let rows = self.children.iter().filter(|c| c.prefer_rows()).count();
        rows * 2 >= self.children.len()
    }

    fn extractor(&self, axis: Axis) -> Box<dyn Extract + '_> {
        if axis == self.axis {
            Box::new(AlongBind {
                bind: self,
                extractors: self.children.iter().map(|_| None).collect(),
            })
        } else {
            Box::new(AcrossBind {
                offsets: &self.offsets,
                extractors: self.children.iter().map(|c| c.extractor(axis)).collect(),
            })
        }
    }
}

/// Each request is served by a single child; extractors are built on demand
struct AlongBind<'a> {
    bind: &'a DelayedBind,
    extractors: Vec<Option<Box<dyn Extract + 'a>>>,
}

impl Extract for AlongBind<'_> {
    fn fetch(&mut self, index: usize, out: &mut [f64]) {
        let bind = self.bind;
        // Last child whose start is <= index; zero-width children are skipped
        let k = bind.offsets.partition_point(|&o| o <= index) - 1;
        let local = index - bind.offsets[k];
        let extractor = self.extractors[k]
            .get_or_insert_with(|| bind.children[k].extractor(bind.axis));
        extractor.fetch(local, out);
    }
}

/// Each request touches every child, which fill consecutive output spans
struct AcrossBind<'a> {
    offsets: &'a [usize],
    extractors: Vec<Box<dyn Extract + 'a>>,
}

impl Extract for AcrossBind<'_> {
    fn fetch(&mut self, index: usize, out: &mut [f64]) {
        for (k, extractor) in self.extractors.iter_mut().enumerate() {
            extractor.fetch(index, &mut out[self.offsets[k]..self.offsets[k + 1]]);
        }
    }
}
