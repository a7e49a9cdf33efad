//! C-compatible entry points for JavaScript (or any other host)
//!
//! Matrices live in a process-wide table and cross the boundary as `u32`
//! ids; `0` is never a valid id. Every function returns an `i32` status:
//! `0` on success, otherwise an [`ErrorKind`] code. The message of the most
//! recent failure on the calling thread is available through
//! [`scran_last_error_length`] and [`scran_last_error_copy`] until the next
//! failure replaces it.
//!
//! Buffers are passed as a pointer (a linear-memory offset on wasm32) plus
//! an element count. A null pointer is accepted only with a zero count.
//! Results are written through out-pointers.
//!
//! Handles are cheap to create: derived matrices share storage with their
//! parents, and freeing an id drops only the table's reference.
//!
//! # Safety
//!
//! All functions taking pointers are `unsafe`: each pointer must be valid
//! for the stated number of elements of the stated type, suitably aligned,
//! and not aliased by another argument.

mod registry;

use crate::error::{ErrorKind, ScranError};
use crate::io::{read_matrix_market, DataSource, ReadOptions};
use crate::matrix::{layered, Axis, Layout, NumericMatrix};
use registry::{set_last_error, table, with_last_error};
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Failures specific to the boundary, wrapping library errors
#[derive(Debug, Error)]
enum CallError {
    #[error(transparent)]
    Scran(#[from] ScranError),

    #[error("Unknown matrix handle {0}")]
    UnknownHandle(u32),

    #[error("Null pointer passed for {0} with a non-zero length")]
    NullPointer(&'static str),

    #[error("{0} is not valid UTF-8")]
    NotUtf8(&'static str),

    #[error("Handle table is full")]
    TableFull,
}

impl CallError {
    fn kind(&self) -> ErrorKind {
        match self {
            CallError::Scran(e) => e.kind(),
            CallError::UnknownHandle(_) => ErrorKind::UnknownHandle,
            CallError::NullPointer(_) | CallError::NotUtf8(_) => ErrorKind::Validation,
            CallError::TableFull => ErrorKind::Construction,
        }
    }
}

type CallResult<T> = std::result::Result<T, CallError>;

/// Run `call`, converting errors and panics into a status code
fn guard(call: impl FnOnce() -> CallResult<()>) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            log::debug!("Boundary call failed: {}", e);
            let code = e.kind() as i32;
            set_last_error(e.to_string());
            code
        }
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            set_last_error(format!("Panic: {}", msg));
            ErrorKind::Panic as i32
        }
    }
}

unsafe fn input<'a, T>(ptr: *const T, len: usize, what: &'static str) -> CallResult<&'a [T]> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(CallError::NullPointer(what));
    }
    Ok(std::slice::from_raw_parts(ptr, len))
}

unsafe fn output<'a, T>(ptr: *mut T, len: usize, what: &'static str) -> CallResult<&'a mut [T]> {
    if len == 0 {
        return Ok(&mut []);
    }
    if ptr.is_null() {
        return Err(CallError::NullPointer(what));
    }
    Ok(std::slice::from_raw_parts_mut(ptr, len))
}

unsafe fn write<T>(ptr: *mut T, value: T, what: &'static str) -> CallResult<()> {
    if ptr.is_null() {
        return Err(CallError::NullPointer(what));
    }
    ptr.write(value);
    Ok(())
}

unsafe fn text<'a>(ptr: *const u8, len: usize, what: &'static str) -> CallResult<&'a str> {
    std::str::from_utf8(input(ptr, len, what)?).map_err(|_| CallError::NotUtf8(what))
}

unsafe fn indices(ptr: *const u32, len: usize, what: &'static str) -> CallResult<Vec<usize>> {
    Ok(input(ptr, len, what)?.iter().map(|&i| i as usize).collect())
}

fn lookup(id: u32) -> CallResult<NumericMatrix> {
    table().get(id).cloned().ok_or(CallError::UnknownHandle(id))
}

unsafe fn register(matrix: NumericMatrix, out: *mut u32) -> CallResult<()> {
    if out.is_null() {
        return Err(CallError::NullPointer("output id"));
    }
    let id = table().insert(matrix).ok_or(CallError::TableFull)?;
    out.write(id);
    Ok(())
}

fn margin(by_row: bool) -> Axis {
    if by_row {
        Axis::Row
    } else {
        Axis::Column
    }
}

/// Create a dense matrix from `len == nrow * ncol` values
///
/// # Safety
///
/// `values` must point to `len` `f64`s and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_create_dense(
    nrow: usize,
    ncol: usize,
    values: *const f64,
    len: usize,
    column_major: bool,
    out: *mut u32,
) -> i32 {
    guard(|| {
        let values = input(values, len, "values")?;
        let m = NumericMatrix::from_dense(nrow, ncol, values, Layout::from_column_major(column_major))?;
        register(m, out)
    })
}

/// Create a sparse matrix from `nnz` coordinate triplets
///
/// With `layered`, values must be non-negative integers and the result has
/// reorganized rows.
///
/// # Safety
///
/// `rows` and `cols` must point to `nnz` `u32`s, `values` to `nnz` `f64`s,
/// and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_create_sparse_triplets(
    nrow: usize,
    ncol: usize,
    rows: *const u32,
    cols: *const u32,
    values: *const f64,
    nnz: usize,
    layered: bool,
    out: *mut u32,
) -> i32 {
    guard(|| {
        let rows = indices(rows, nnz, "row indices")?;
        let cols = indices(cols, nnz, "column indices")?;
        let values = input(values, nnz, "values")?;
        let m = if layered {
            layered::from_triplets(nrow, ncol, &rows, &cols, values)?
        } else {
            NumericMatrix::from_triplets(nrow, ncol, &rows, &cols, values)?
        };
        register(m, out)
    })
}

/// Create a sparse matrix from CSR (`by_row`) or CSC buffers
///
/// # Safety
///
/// `values` must point to `nnz` `f64`s, `indices_ptr` to `nnz` `u32`s,
/// `pointers` to `pointers_len` `u32`s, and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_create_compressed_sparse(
    nrow: usize,
    ncol: usize,
    values: *const f64,
    indices_ptr: *const u32,
    nnz: usize,
    pointers: *const u32,
    pointers_len: usize,
    by_row: bool,
    out: *mut u32,
) -> i32 {
    guard(|| {
        let values = input(values, nnz, "values")?.to_vec();
        let idx = input(indices_ptr, nnz, "indices")?.to_vec();
        let ptrs = indices(pointers, pointers_len, "pointers")?;
        let m = NumericMatrix::from_compressed(nrow, ncol, values, idx, ptrs, by_row)?;
        register(m, out)
    })
}

/// Load a Matrix Market file (optionally gzipped) from a UTF-8 path
///
/// # Safety
///
/// `path` must point to `path_len` bytes and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_read_matrix_market(
    path: *const u8,
    path_len: usize,
    layered: bool,
    out: *mut u32,
) -> i32 {
    guard(|| {
        let path = text(path, path_len, "path")?;
        let source = DataSource::from_path(path);
        let m = read_matrix_market(&source, &ReadOptions::new().layered(layered))?;
        register(m, out)
    })
}

/// Load a Matrix Market file (optionally gzipped) from an in-memory buffer
///
/// # Safety
///
/// `bytes` must point to `len` bytes and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_read_matrix_market_buffer(
    bytes: *const u8,
    len: usize,
    layered: bool,
    out: *mut u32,
) -> i32 {
    guard(|| {
        let source = DataSource::from_bytes(input(bytes, len, "buffer")?);
        let m = read_matrix_market(&source, &ReadOptions::new().layered(layered))?;
        register(m, out)
    })
}

/// New handle for the same matrix with the given row identities
///
/// # Safety
///
/// `identities` must point to `len` `u32`s and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_with_row_identities(
    id: u32,
    identities: *const u32,
    len: usize,
    out: *mut u32,
) -> i32 {
    guard(|| {
        let ids = indices(identities, len, "identities")?;
        let m = lookup(id)?.with_row_identities(ids)?;
        register(m, out)
    })
}

/// Keep the rows at the given indices, in order
///
/// # Safety
///
/// `subset` must point to `len` `u32`s and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_subset_rows(id: u32, subset: *const u32, len: usize, out: *mut u32) -> i32 {
    guard(|| {
        let subset = indices(subset, len, "row subset")?;
        let m = lookup(id)?.subset_rows(&subset)?;
        register(m, out)
    })
}

/// Keep the columns at the given indices, in order
///
/// # Safety
///
/// `subset` must point to `len` `u32`s and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_subset_columns(
    id: u32,
    subset: *const u32,
    len: usize,
    out: *mut u32,
) -> i32 {
    guard(|| {
        let subset = indices(subset, len, "column subset")?;
        let m = lookup(id)?.subset_columns(&subset)?;
        register(m, out)
    })
}

unsafe fn lookup_all(ids: *const u32, count: usize) -> CallResult<Vec<NumericMatrix>> {
    let ids = input(ids, count, "matrix ids")?;
    let handles = table();
    ids.iter()
        .map(|&id| handles.get(id).cloned().ok_or(CallError::UnknownHandle(id)))
        .collect()
}

/// Combine matrices side by side, optionally matching rows by identity
///
/// # Safety
///
/// `ids` must point to `count` `u32`s and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_bind_columns(
    ids: *const u32,
    count: usize,
    reconcile: bool,
    out: *mut u32,
) -> i32 {
    guard(|| {
        let matrices = lookup_all(ids, count)?;
        let m = NumericMatrix::bind_columns(&matrices, reconcile)?;
        register(m, out)
    })
}

/// Stack matrices on top of each other
///
/// # Safety
///
/// `ids` must point to `count` `u32`s and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_bind_rows(ids: *const u32, count: usize, out: *mut u32) -> i32 {
    guard(|| {
        let matrices = lookup_all(ids, count)?;
        let m = NumericMatrix::bind_rows(&matrices)?;
        register(m, out)
    })
}

/// Swap rows and columns
///
/// # Safety
///
/// `out` must point to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_transpose(id: u32, out: *mut u32) -> i32 {
    guard(|| {
        let m = lookup(id)?.transpose();
        register(m, out)
    })
}

/// Combine every element `x` with a scalar: `x op value`, or `value op x`
/// when `right` is set
///
/// # Safety
///
/// `op` must point to `op_len` bytes and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_scalar_op(
    id: u32,
    op: *const u8,
    op_len: usize,
    value: f64,
    right: bool,
    out: *mut u32,
) -> i32 {
    guard(|| {
        let op = text(op, op_len, "operation")?;
        let m = lookup(id)?.apply_scalar_op(op, value, right)?;
        register(m, out)
    })
}

/// Combine every element with a per-row (`by_row`) or per-column value
///
/// # Safety
///
/// `op` must point to `op_len` bytes, `values` to `len` `f64`s, and `out`
/// to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_vector_op(
    id: u32,
    op: *const u8,
    op_len: usize,
    values: *const f64,
    len: usize,
    by_row: bool,
    right: bool,
    out: *mut u32,
) -> i32 {
    guard(|| {
        let op = text(op, op_len, "operation")?;
        let values = input(values, len, "values")?;
        let m = lookup(id)?.apply_vector_op(op, values, margin(by_row), right)?;
        register(m, out)
    })
}

/// Apply a named function element-wise; `base` is used by `log` and NaN
/// means the natural logarithm
///
/// # Safety
///
/// `op` must point to `op_len` bytes and `out` to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_math_op(
    id: u32,
    op: *const u8,
    op_len: usize,
    base: f64,
    out: *mut u32,
) -> i32 {
    guard(|| {
        let op = text(op, op_len, "operation")?;
        let base = if base.is_nan() { None } else { Some(base) };
        let m = lookup(id)?.apply_math_op(op, base)?;
        register(m, out)
    })
}

/// Evaluate row `i` into a buffer of `len == ncol` values
///
/// # Safety
///
/// `buffer` must point to `len` writable `f64`s.
#[no_mangle]
pub unsafe extern "C" fn scran_row(id: u32, i: usize, buffer: *mut f64, len: usize) -> i32 {
    guard(|| {
        let buffer = output(buffer, len, "row buffer")?;
        lookup(id)?.row(i, buffer)?;
        Ok(())
    })
}

/// Evaluate column `j` into a buffer of `len == nrow` values
///
/// # Safety
///
/// `buffer` must point to `len` writable `f64`s.
#[no_mangle]
pub unsafe extern "C" fn scran_column(id: u32, j: usize, buffer: *mut f64, len: usize) -> i32 {
    guard(|| {
        let buffer = output(buffer, len, "column buffer")?;
        lookup(id)?.column(j, buffer)?;
        Ok(())
    })
}

/// Number of rows
///
/// # Safety
///
/// `out` must point to one `usize`.
#[no_mangle]
pub unsafe extern "C" fn scran_nrow(id: u32, out: *mut usize) -> i32 {
    guard(|| write(out, lookup(id)?.nrow(), "row count"))
}

/// Number of columns
///
/// # Safety
///
/// `out` must point to one `usize`.
#[no_mangle]
pub unsafe extern "C" fn scran_ncol(id: u32, out: *mut usize) -> i32 {
    guard(|| write(out, lookup(id)?.ncol(), "column count"))
}

/// Write 1 if the matrix is sparse, 0 otherwise
///
/// # Safety
///
/// `out` must point to one `i32`.
#[no_mangle]
pub unsafe extern "C" fn scran_is_sparse(id: u32, out: *mut i32) -> i32 {
    guard(|| write(out, i32::from(lookup(id)?.is_sparse()), "sparse flag"))
}

/// Write 1 if the matrix carries row identities, 0 otherwise
///
/// # Safety
///
/// `out` must point to one `i32`.
#[no_mangle]
pub unsafe extern "C" fn scran_is_reorganized(id: u32, out: *mut i32) -> i32 {
    guard(|| write(out, i32::from(lookup(id)?.is_reorganized()), "reorganized flag"))
}

/// Copy the row identities (`0..nrow` when none are attached) into a
/// buffer of `len == nrow` values
///
/// # Safety
///
/// `buffer` must point to `len` writable `u32`s.
#[no_mangle]
pub unsafe extern "C" fn scran_identities(id: u32, buffer: *mut u32, len: usize) -> i32 {
    guard(|| {
        let m = lookup(id)?;
        if len != m.nrow() {
            return Err(ScranError::LengthMismatch {
                what: "identity buffer",
                expected: m.nrow(),
                actual: len,
            }
            .into());
        }
        let buffer = output(buffer, len, "identity buffer")?;
        for (i, slot) in buffer.iter_mut().enumerate() {
            let identity = m.row_identity(i);
            *slot = u32::try_from(identity).map_err(|_| {
                ScranError::InvalidArgument(format!("row identity {} does not fit in 32 bits", identity))
            })?;
        }
        Ok(())
    })
}

/// Drop the row identities of a handle in place
#[no_mangle]
pub extern "C" fn scran_wipe_identities(id: u32) -> i32 {
    guard(|| {
        table()
            .get_mut(id)
            .ok_or(CallError::UnknownHandle(id))?
            .wipe_identities();
        Ok(())
    })
}

/// New id for the same matrix
///
/// # Safety
///
/// `out` must point to one `u32`.
#[no_mangle]
pub unsafe extern "C" fn scran_clone(id: u32, out: *mut u32) -> i32 {
    guard(|| register(lookup(id)?, out))
}

/// Release an id; storage is dropped once no handle refers to it
#[no_mangle]
pub extern "C" fn scran_free(id: u32) -> i32 {
    guard(|| {
        let released = table().remove(id).ok_or(CallError::UnknownHandle(id))?;
        drop(released);
        Ok(())
    })
}

/// Length in bytes of the last error message on this thread
#[no_mangle]
pub extern "C" fn scran_last_error_length() -> usize {
    with_last_error(str::len)
}

/// Copy up to `capacity` bytes of the last error message, returning the
/// number of bytes written
///
/// # Safety
///
/// `buffer` must point to `capacity` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn scran_last_error_copy(buffer: *mut u8, capacity: usize) -> usize {
    if buffer.is_null() {
        return 0;
    }
    with_last_error(|msg| {
        let n = msg.len().min(capacity);
        std::ptr::copy_nonoverlapping(msg.as_ptr(), buffer, n);
        n
    })
}
