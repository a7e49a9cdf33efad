//! Matrix storage and delayed operations
//!
//! Every matrix, whether it owns data or wraps another matrix, exposes the
//! same small capability set through the [`Matrix`] trait: its extents, a
//! sparsity flag, an access-order preference, and per-axis extractors.
//!
//! # Organization
//!
//! - [`dense`]: Row- or column-major dense storage
//! - [`sparse`]: CSR/CSC storage generic over the stored value type
//! - [`layered`]: Compact integer storage choosing the narrowest width per row
//! - [`subset`], [`transpose`], [`bind`], [`arith`]: Delayed operation nodes
//! - [`handle`]: [`NumericMatrix`], the shared handle consumed by callers

pub mod arith;
pub mod bind;
pub mod dense;
pub mod handle;
pub mod layered;
pub mod sparse;
pub mod subset;
pub mod transpose;

pub use arith::{ArithOp, DelayedUnary, MathOp, UnaryOp};
pub use bind::DelayedBind;
pub use dense::{DenseMatrix, Layout};
pub use handle::{ColumnCursor, NumericMatrix, RowCursor};
pub use sparse::{CompressedSparseMatrix, SparseValue};
pub use subset::DelayedSubset;
pub use transpose::DelayedTranspose;

use std::fmt;

/// Matrix dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Rows (features, in the usual genes-by-cells orientation)
    Row,
    /// Columns (cells)
    Column,
}

impl Axis {
    /// The opposite dimension
    pub fn other(self) -> Self {
        match self {
            Axis::Row => Axis::Column,
            Axis::Column => Axis::Row,
        }
    }

    pub(crate) fn plural(self) -> &'static str {
        match self {
            Axis::Row => "rows",
            Axis::Column => "columns",
        }
    }

    pub(crate) fn title(self) -> &'static str {
        match self {
            Axis::Row => "Row",
            Axis::Column => "Column",
        }
    }
}

/// Read interface shared by storage and delayed nodes
///
/// Implementations are immutable once constructed, so any number of
/// extractors may run against the same matrix from different threads.
pub trait Matrix: Send + Sync + fmt::Debug {
    /// Number of rows
    fn nrow(&self) -> usize;

    /// Number of columns
    fn ncol(&self) -> usize;

    /// Whether most entries are structural zeros that extraction skips
    fn is_sparse(&self) -> bool;

    /// Whether row-wise extraction is the cheaper access pattern
    fn prefer_rows(&self) -> bool;

    /// Create an extractor returning whole rows (`Axis::Row`) or columns
    fn extractor(&self, axis: Axis) -> Box<dyn Extract + '_>;

    /// Extent of the given dimension
    fn extent(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.nrow(),
            Axis::Column => self.ncol(),
        }
    }
}

/// Fetches fully evaluated rows or columns
///
/// Callers guarantee `index` is below the extent of the extractor's axis and
/// `out` has the length of the opposite extent. [`NumericMatrix`] performs
/// those checks before delegating here.
pub trait Extract {
    /// Write the row or column at `index` into `out`
    fn fetch(&mut self, index: usize, out: &mut [f64]);
}
