//! scranwasm: lazy matrix views for single-cell analysis in the browser
//!
//! # Overview
//!
//! scranwasm holds count matrices (genes by cells) behind shared handles and
//! applies subsetting, transposition, binding and element-wise arithmetic
//! lazily: each operation wraps the existing storage in a delayed node, and
//! values are computed only when a row or column is fetched.
//!
//! ## Key Features
//!
//! - **Delayed operations**: Subset, transpose, bind and arithmetic never copy
//! - **Sparse and dense storage**: CSR/CSC generic over value type, row- or
//!   column-major dense
//! - **Layered counts**: 8/16/32-bit integer layers chosen per row
//! - **Row identities**: Track where each row came from across reorganizations
//! - **Boundary-ready**: `extern "C"` handle API and optional `wasm-bindgen`
//!   classes
//!
//! ## Quick Start
//!
//! ```
//! use scranwasm::{Layout, NumericMatrix};
//!
//! # fn main() -> scranwasm::Result<()> {
//! let counts = NumericMatrix::from_dense(2, 3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], Layout::RowMajor)?;
//! let logged = counts.apply_scalar_op("+", 1.0, true)?.apply_math_op("log", Some(2.0))?;
//! let kept = logged.subset_columns(&[2, 0])?;
//!
//! let row = kept.row_vec(0)?;
//! assert!((row[0] - 3.0f64.log2()).abs() < 1e-12);
//! assert_eq!(row[1], 0.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`matrix`]: Storage, delayed nodes and the [`NumericMatrix`] handle
//! - [`io`]: Matrix Market reader with gzip detection
//! - [`operations`]: Parallel materialization and margin sums
//! - [`ffi`]: Handle table and `extern "C"` entry points
//! - `wasm` (feature `wasm`): JavaScript classes via `wasm-bindgen`

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod ffi;
pub mod io;
pub mod matrix;
pub mod operations;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use error::{ErrorKind, Result, ScranError};
pub use io::{read_matrix_market, DataSource, ReadOptions};
pub use matrix::{Axis, Layout, Matrix, NumericMatrix};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
