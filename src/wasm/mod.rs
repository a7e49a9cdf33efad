//! JavaScript bindings via `wasm-bindgen`
//!
//! ```javascript
//! import { NumericMatrix, readMatrixMarket } from "scranwasm";
//!
//! const counts = readMatrixMarket(new Uint8Array(buffer), true);
//! const logged = counts.scalarOp("+", 1, true).mathOp("log", 2);
//! const first = logged.column(0); // Float64Array
//! ```
//!
//! Every fallible method throws a JavaScript `Error` carrying the message of
//! the underlying [`ScranError`].

use crate::error::ScranError;
use crate::io::{read_matrix_market, DataSource, ReadOptions};
use crate::matrix::{layered, Axis, Layout, NumericMatrix};
use js_sys::Float64Array;
use wasm_bindgen::prelude::*;

fn js_error(e: ScranError) -> JsError {
    JsError::new(&e.to_string())
}

fn to_usize(values: &[u32]) -> Vec<usize> {
    values.iter().map(|&v| v as usize).collect()
}

/// Shared handle to a possibly delayed matrix
#[wasm_bindgen(js_name = NumericMatrix)]
pub struct WasmMatrix {
    inner: NumericMatrix,
}

impl From<NumericMatrix> for WasmMatrix {
    fn from(inner: NumericMatrix) -> Self {
        Self { inner }
    }
}

#[wasm_bindgen(js_class = NumericMatrix)]
impl WasmMatrix {
    /// Dense matrix from `nrow * ncol` values
    #[wasm_bindgen(constructor)]
    pub fn new(nrow: usize, ncol: usize, values: &[f64], column_major: bool) -> Result<WasmMatrix, JsError> {
        NumericMatrix::from_dense(nrow, ncol, values, Layout::from_column_major(column_major))
            .map(Into::into)
            .map_err(js_error)
    }

    /// Sparse matrix from coordinate triplets
    #[wasm_bindgen(js_name = fromTriplets)]
    pub fn from_triplets(
        nrow: usize,
        ncol: usize,
        rows: &[u32],
        cols: &[u32],
        values: &[f64],
        use_layered: bool,
    ) -> Result<WasmMatrix, JsError> {
        let rows = to_usize(rows);
        let cols = to_usize(cols);
        let m = if use_layered {
            layered::from_triplets(nrow, ncol, &rows, &cols, values)
        } else {
            NumericMatrix::from_triplets(nrow, ncol, &rows, &cols, values)
        };
        m.map(Into::into).map_err(js_error)
    }

    /// Sparse matrix from CSR (`by_row`) or CSC buffers
    #[wasm_bindgen(js_name = fromCompressed)]
    pub fn from_compressed(
        nrow: usize,
        ncol: usize,
        values: Vec<f64>,
        indices: Vec<u32>,
        pointers: &[u32],
        by_row: bool,
    ) -> Result<WasmMatrix, JsError> {
        NumericMatrix::from_compressed(nrow, ncol, values, indices, to_usize(pointers), by_row)
            .map(Into::into)
            .map_err(js_error)
    }

    /// Number of rows
    #[wasm_bindgen(getter)]
    pub fn nrow(&self) -> usize {
        self.inner.nrow()
    }

    /// Number of columns
    #[wasm_bindgen(getter)]
    pub fn ncol(&self) -> usize {
        self.inner.ncol()
    }

    /// Whether the matrix is sparse
    #[wasm_bindgen(js_name = isSparse)]
    pub fn is_sparse(&self) -> bool {
        self.inner.is_sparse()
    }

    /// Whether rows carry identities
    #[wasm_bindgen(js_name = isReorganized)]
    pub fn is_reorganized(&self) -> bool {
        self.inner.is_reorganized()
    }

    /// Row identities (`0..nrow` when none are attached)
    pub fn identities(&self) -> Vec<u32> {
        (0..self.inner.nrow())
            .map(|i| self.inner.row_identity(i) as u32)
            .collect()
    }

    /// Same matrix with the given row identities
    #[wasm_bindgen(js_name = withRowIdentities)]
    pub fn with_row_identities(&self, identities: &[u32]) -> Result<WasmMatrix, JsError> {
        self.inner
            .clone()
            .with_row_identities(to_usize(identities))
            .map(Into::into)
            .map_err(js_error)
    }

    /// Drop row identities in place
    #[wasm_bindgen(js_name = wipeIdentities)]
    pub fn wipe_identities(&mut self) {
        self.inner.wipe_identities();
    }

    /// Keep the rows at `indices`, in order
    #[wasm_bindgen(js_name = subsetRows)]
    pub fn subset_rows(&self, indices: &[u32]) -> Result<WasmMatrix, JsError> {
        self.inner
            .subset_rows(&to_usize(indices))
            .map(Into::into)
            .map_err(js_error)
    }

    /// Keep the columns at `indices`, in order
    #[wasm_bindgen(js_name = subsetColumns)]
    pub fn subset_columns(&self, indices: &[u32]) -> Result<WasmMatrix, JsError> {
        self.inner
            .subset_columns(&to_usize(indices))
            .map(Into::into)
            .map_err(js_error)
    }

    /// Swap rows and columns
    pub fn transpose(&self) -> WasmMatrix {
        self.inner.transpose().into()
    }

    /// Element-wise arithmetic with a scalar
    #[wasm_bindgen(js_name = scalarOp)]
    pub fn scalar_op(&self, op: &str, value: f64, right: bool) -> Result<WasmMatrix, JsError> {
        self.inner
            .apply_scalar_op(op, value, right)
            .map(Into::into)
            .map_err(js_error)
    }

    /// Element-wise arithmetic with a per-row (`by_row`) or per-column vector
    #[wasm_bindgen(js_name = vectorOp)]
    pub fn vector_op(&self, op: &str, values: &[f64], by_row: bool, right: bool) -> Result<WasmMatrix, JsError> {
        let margin = if by_row { Axis::Row } else { Axis::Column };
        self.inner
            .apply_vector_op(op, values, margin, right)
            .map(Into::into)
            .map_err(js_error)
    }

    /// Element-wise function; `base` is only used by `log`
    #[wasm_bindgen(js_name = mathOp)]
    pub fn math_op(&self, op: &str, base: Option<f64>) -> Result<WasmMatrix, JsError> {
        self.inner
            .apply_math_op(op, base)
            .map(Into::into)
            .map_err(js_error)
    }

    /// Row `i` as a new array
    pub fn row(&self, i: usize) -> Result<Vec<f64>, JsError> {
        self.inner.row_vec(i).map_err(js_error)
    }

    /// Column `j` as a new array
    pub fn column(&self, j: usize) -> Result<Vec<f64>, JsError> {
        self.inner.column_vec(j).map_err(js_error)
    }

    /// Write row `i` into an existing array of length `ncol`
    #[wasm_bindgen(js_name = rowInto)]
    pub fn row_into(&self, i: usize, target: &Float64Array) -> Result<(), JsError> {
        let values = self.inner.row_vec(i).map_err(js_error)?;
        copy_into(&values, target)
    }

    /// Write column `j` into an existing array of length `nrow`
    #[wasm_bindgen(js_name = columnInto)]
    pub fn column_into(&self, j: usize, target: &Float64Array) -> Result<(), JsError> {
        let values = self.inner.column_vec(j).map_err(js_error)?;
        copy_into(&values, target)
    }

    /// Another handle to the same matrix
    #[wasm_bindgen(js_name = clone)]
    pub fn clone_handle(&self) -> WasmMatrix {
        self.inner.clone().into()
    }
}

fn copy_into(values: &[f64], target: &Float64Array) -> Result<(), JsError> {
    if target.length() as usize != values.len() {
        return Err(JsError::new(&format!(
            "Target array has length {}, expected {}",
            target.length(),
            values.len()
        )));
    }
    target.copy_from(values);
    Ok(())
}

/// Ordered collection of matrices to bind
#[wasm_bindgen]
#[derive(Default)]
pub struct MatrixList {
    items: Vec<NumericMatrix>,
}

#[wasm_bindgen]
impl MatrixList {
    /// Empty list
    #[wasm_bindgen(constructor)]
    pub fn new() -> MatrixList {
        MatrixList::default()
    }

    /// Append a matrix (the handle is shared, not copied)
    pub fn push(&mut self, matrix: &WasmMatrix) {
        self.items.push(matrix.inner.clone());
    }

    /// Number of matrices
    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.items.len()
    }

    /// Bind side by side, optionally matching rows by identity
    #[wasm_bindgen(js_name = bindColumns)]
    pub fn bind_columns(&self, reconcile: bool) -> Result<WasmMatrix, JsError> {
        NumericMatrix::bind_columns(&self.items, reconcile)
            .map(Into::into)
            .map_err(js_error)
    }

    /// Stack on top of each other
    #[wasm_bindgen(js_name = bindRows)]
    pub fn bind_rows(&self) -> Result<WasmMatrix, JsError> {
        NumericMatrix::bind_rows(&self.items)
            .map(Into::into)
            .map_err(js_error)
    }
}

/// Parse a Matrix Market file (optionally gzipped) held in memory
#[wasm_bindgen(js_name = readMatrixMarket)]
pub fn read_matrix_market_bytes(bytes: &[u8], use_layered: bool) -> Result<WasmMatrix, JsError> {
    let source = DataSource::from_bytes(bytes);
    read_matrix_market(&source, &ReadOptions::new().layered(use_layered))
        .map(Into::into)
        .map_err(js_error)
}
