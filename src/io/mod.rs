//! I/O module: matrix file readers
//!
//! Readers take a [`DataSource`] (local path or in-memory buffer), detect
//! gzip compression from the content, and build a [`NumericMatrix`] in one
//! pass over the file.

pub mod matrix_market;
pub mod source;

pub use matrix_market::{
    read_matrix_market, read_matrix_market_header, MatrixMarketHeader, ReadOptions,
};
pub use source::{DataSource, MMAP_THRESHOLD};

use crate::error::{Result, ScranError};
use crate::matrix::NumericMatrix;
use std::str::FromStr;

/// On-disk matrix formats this crate can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixFormat {
    /// Matrix Market exchange format, optionally gzip-compressed
    MatrixMarket,
}

impl FromStr for MatrixFormat {
    type Err = ScranError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mtx" | "mm" | "matrix-market" | "matrixmarket" | "mtx.gz" => {
                Ok(MatrixFormat::MatrixMarket)
            }
            _ => Err(ScranError::UnknownOperation {
                kind: "matrix format",
                name: name.to_string(),
            }),
        }
    }
}

/// Read a matrix in the named format
///
/// # Example
///
/// ```
/// use scranwasm::io::{read_matrix, DataSource, ReadOptions};
///
/// let text = b"%%MatrixMarket matrix array real general\n2 1\n1.5\n2.5\n";
/// let m = read_matrix("mtx", &DataSource::from_bytes(text.to_vec()), &ReadOptions::new())?;
/// assert_eq!(m.column_vec(0)?, vec![1.5, 2.5]);
/// # Ok::<(), scranwasm::ScranError>(())
/// ```
pub fn read_matrix(format: &str, source: &DataSource, options: &ReadOptions) -> Result<NumericMatrix> {
    match format.parse::<MatrixFormat>()? {
        MatrixFormat::MatrixMarket => read_matrix_market(source, options),
    }
}
